use std::cell::RefCell;
use std::rc::Rc;

use tracing::info;

use crate::app::rewriter::Rewriter;
use crate::cli::config::Overrides;
use crate::dom::document::{Document, NodeId};
use crate::dom::snapshot::PageSnapshot;
use crate::field::identity::key_for;
use crate::status::{ConnectionStatus, LogNotifier};
use crate::store::{JsonFileStore, default_store_path};

/// Opens the settings store and applies command-line/config-file overrides.
pub fn build_rewriter(overrides: &Overrides) -> Rewriter {
    let store_path = overrides
        .store_path
        .clone()
        .unwrap_or_else(default_store_path);
    info!(path = %store_path.display(), "using settings store");

    let store = Rc::new(JsonFileStore::open(store_path));
    Rewriter::ollama(store, Rc::new(LogNotifier))
        .with_overrides(overrides.endpoint.as_deref(), overrides.model.as_deref())
        .with_trace_path(overrides.trace_path.clone())
}

// ============================================================================
// rewrite subcommand
// ============================================================================

pub async fn cmd_rewrite(
    rewriter: &Rewriter,
    page: &str,
    element: &str,
    mode: Option<&str>,
    url: Option<&str>,
    output: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(page)?;
    let snapshot = PageSnapshot::from_json(&content)?;
    let mut doc = Document::from_snapshot(&snapshot);
    if let Some(url) = url {
        doc.set_url(url);
    }

    let target = find_element(&doc, element)
        .ok_or_else(|| format!("no element matching '{}' in {}", element, page))?;

    // A missing model would only fail after the full prompt round trip.
    rewriter.refresh_models().await?;

    let doc = RefCell::new(doc);
    let outcome = rewriter.rewrite(&doc, target, mode).await?;
    eprintln!(
        "Rewrote {} with mode {}: {} chars",
        outcome.element_key,
        outcome.mode,
        outcome.text.chars().count()
    );

    let updated = doc.borrow().to_snapshot(&snapshot.title).to_json()?;
    match output {
        Some(path) => std::fs::write(path, updated)?,
        None => println!("{}", updated),
    }
    Ok(())
}

/// Finds a field by id, then by `name`, then by its element key.
pub fn find_element(doc: &Document, needle: &str) -> Option<NodeId> {
    if let Some(node) = doc.get_element_by_id(needle) {
        return Some(node);
    }
    let elements: Vec<NodeId> = doc
        .descendants(doc.root())
        .into_iter()
        .filter(|n| doc.is_element(*n))
        .collect();
    elements
        .iter()
        .copied()
        .find(|n| doc.attribute(*n, "name") == Some(needle))
        .or_else(|| elements.iter().copied().find(|n| key_for(doc, *n) == needle))
}

// ============================================================================
// models / status subcommands
// ============================================================================

pub async fn cmd_models(rewriter: &Rewriter) -> Result<(), Box<dyn std::error::Error>> {
    let models = rewriter.refresh_models().await?;
    if models.is_empty() {
        println!("No models installed at {}", rewriter.config().endpoint_url);
        return Ok(());
    }
    for model in &models {
        let marker = if *model == rewriter.config().selected_model {
            "*"
        } else {
            " "
        };
        println!("{} {}", marker, model);
    }
    Ok(())
}

/// Returns whether the server is reachable.
pub async fn cmd_status(rewriter: &Rewriter) -> bool {
    let status = rewriter.check_connection().await;
    println!("{}: {}", rewriter.config().endpoint_url, status);
    matches!(status, ConnectionStatus::Connected { .. })
}

// ============================================================================
// modes / add-mode subcommands
// ============================================================================

pub fn cmd_modes(rewriter: &Rewriter) {
    let registry = rewriter.orchestrator().registry();
    let default = registry.default_mode_key();
    for mode in registry.modes() {
        let marker = if mode.key == default { "*" } else { " " };
        let origin = if mode.is_custom { " (custom)" } else { "" };
        match &mode.description {
            Some(d) => println!("{} {:<18} {}{} - {}", marker, mode.key, mode.display_name, origin, d),
            None => println!("{} {:<18} {}{}", marker, mode.key, mode.display_name, origin),
        }
    }
}

pub fn cmd_add_mode(
    rewriter: &Rewriter,
    name: &str,
    prompt: &str,
    description: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mode = rewriter.add_custom_mode(name, prompt, description)?;
    println!("Added mode {} ({})", mode.key, mode.display_name);
    Ok(())
}

// ============================================================================
// config subcommand
// ============================================================================

#[derive(Debug, Default)]
pub struct ConfigChanges {
    pub enabled: Option<bool>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub default_mode: Option<String>,
    pub debug: Option<bool>,
}

pub fn cmd_config(
    rewriter: &Rewriter,
    changes: ConfigChanges,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(enabled) = changes.enabled {
        rewriter.set_enabled(enabled);
    }
    if let Some(endpoint) = &changes.endpoint {
        rewriter.set_endpoint(endpoint);
    }
    if let Some(model) = &changes.model {
        rewriter.set_model(model);
    }
    if let Some(mode) = &changes.default_mode {
        rewriter.set_default_mode(mode)?;
    }
    if let Some(debug) = changes.debug {
        rewriter.set_debug(debug);
    }

    let config = rewriter.config();
    println!("enabled:       {}", config.enabled);
    println!("endpoint:      {}", config.endpoint_url);
    println!("model:         {}", config.selected_model);
    println!(
        "default mode:  {}",
        rewriter.orchestrator().registry().default_mode_key()
    );
    println!("debug:         {}", config.debug);
    println!("rewrite key:   {}", config.keyboard_shortcut);
    println!("modes key:     {}", config.quick_rewrite_shortcut);
    Ok(())
}
