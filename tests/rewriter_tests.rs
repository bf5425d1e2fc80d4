use std::rc::Rc;
use std::time::Instant;

use smart_rewriter::app::rewriter::{RewriteCommand, Rewriter};
use smart_rewriter::config::{Configuration, keys};
use smart_rewriter::dom::events::{DomEvent, KeyPress};
use smart_rewriter::field::tracker::TrackerState;
use smart_rewriter::model::backend::{MockBackend, ModelBackend};
use smart_rewriter::model::error::ModelError;
use smart_rewriter::rewrite::error::RewriteError;
use smart_rewriter::status::{ConnectionStatus, MemoryNotifier};
use smart_rewriter::store::{KeyValueStore, MemoryStore};

mod common;
use crate::common::utils::{GatedBackend, cell, element, textarea_page};

fn rewriter_with(store: Rc<MemoryStore>, backend: Rc<MockBackend>) -> Rewriter {
    Rewriter::new(
        store,
        Rc::new(MemoryNotifier::new()),
        Box::new(move |_endpoint: &str| backend.clone() as Rc<dyn ModelBackend>),
    )
}

fn alt(key: &str) -> KeyPress {
    KeyPress::new(key).alt()
}

// ============================================================================
// Events to commands
// ============================================================================

#[test]
fn alt_r_on_tracked_field_rewrites_with_last_mode() {
    let rewriter = rewriter_with(
        Rc::new(MemoryStore::new()),
        Rc::new(MockBackend::replying("x")),
    );
    let (doc, area) = textarea_page("msg", "text");
    let now = Instant::now();

    assert_eq!(rewriter.handle_event(&doc, &DomEvent::focus(area), now), None);
    let command = rewriter.handle_event(&doc, &DomEvent::key_down(area, alt("r")), now);

    assert_eq!(
        command,
        Some(RewriteCommand::Rewrite {
            element: area,
            mode: None
        })
    );
}

#[test]
fn shortcuts_need_a_live_tracked_field() {
    let rewriter = rewriter_with(
        Rc::new(MemoryStore::new()),
        Rc::new(MockBackend::replying("x")),
    );
    let (mut doc, area) = textarea_page("msg", "text");
    let body = doc.body();
    let now = Instant::now();

    assert_eq!(
        rewriter.handle_event(&doc, &DomEvent::key_down(body, alt("r")), now),
        None
    );

    rewriter.handle_event(&doc, &DomEvent::focus(area), now);
    doc.remove(area);
    assert_eq!(
        rewriter.handle_event(&doc, &DomEvent::key_down(body, alt("r")), now),
        None
    );
}

#[test]
fn mode_selection_and_settings_shortcuts() {
    let rewriter = rewriter_with(
        Rc::new(MemoryStore::new()),
        Rc::new(MockBackend::replying("x")),
    );
    let (doc, area) = textarea_page("msg", "text");
    let now = Instant::now();
    rewriter.handle_event(&doc, &DomEvent::click(area), now);

    assert_eq!(
        rewriter.handle_event(&doc, &DomEvent::key_down(area, alt("R").shift()), now),
        Some(RewriteCommand::ShowModes { element: area })
    );
    assert_eq!(
        rewriter.handle_event(&doc, &DomEvent::key_down(area, alt("S").shift()), now),
        Some(RewriteCommand::ShowSettings)
    );

    let first_key = rewriter.orchestrator().registry().modes()[0].key.clone();
    assert_eq!(
        rewriter.handle_event(&doc, &DomEvent::key_down(area, alt("1")), now),
        Some(RewriteCommand::Rewrite {
            element: area,
            mode: Some(first_key)
        })
    );
}

#[test]
fn disabled_rewriter_ignores_events() {
    let store = Rc::new(MemoryStore::with_values([(keys::ENABLED, "false")]));
    let rewriter = rewriter_with(store, Rc::new(MockBackend::replying("x")));
    let (doc, area) = textarea_page("msg", "text");
    let now = Instant::now();

    rewriter.handle_event(&doc, &DomEvent::focus(area), now);
    assert_eq!(
        rewriter.handle_event(&doc, &DomEvent::key_down(area, alt("r")), now),
        None
    );
}

#[test]
fn custom_shortcut_from_settings() {
    let store = Rc::new(MemoryStore::with_values([(keys::KEYBOARD_SHORTCUT, "Ctrl+Shift+E")]));
    let rewriter = rewriter_with(store, Rc::new(MockBackend::replying("x")));
    let (doc, area) = textarea_page("msg", "text");
    let now = Instant::now();
    rewriter.handle_event(&doc, &DomEvent::focus(area), now);

    let press = KeyPress::new("e").ctrl().shift();
    assert!(matches!(
        rewriter.handle_event(&doc, &DomEvent::key_down(area, press), now),
        Some(RewriteCommand::Rewrite { .. })
    ));
    assert_eq!(
        rewriter.handle_event(&doc, &DomEvent::key_down(area, alt("r")), now),
        None
    );
}

// ============================================================================
// Running commands
// ============================================================================

#[tokio::test]
async fn run_executes_rewrite_commands() {
    let rewriter = rewriter_with(
        Rc::new(MemoryStore::new()),
        Rc::new(MockBackend::replying("Polished.")),
    );
    let (doc, area) = textarea_page("msg", "rough");
    let doc = cell(doc);

    let command = RewriteCommand::Rewrite {
        element: area,
        mode: Some("academic".to_string()),
    };
    let outcome = rewriter.run(&doc, &command).await.unwrap().unwrap();
    assert_eq!(outcome.text, "Polished.");
    assert_eq!(doc.borrow().value(area), Some("Polished."));

    assert!(rewriter.run(&doc, &RewriteCommand::ShowSettings).await.is_none());
}

#[tokio::test]
async fn disabled_rewriter_rejects_rewrites() {
    let backend = Rc::new(MockBackend::replying("never"));
    let rewriter = rewriter_with(Rc::new(MemoryStore::new()), backend.clone());
    rewriter.set_enabled(false);
    let (doc, area) = textarea_page("msg", "text");
    let doc = cell(doc);

    let err = rewriter.rewrite(&doc, area, None).await.unwrap_err();
    assert_eq!(err, RewriteError::Disabled);
    assert!(backend.calls().is_empty());
}

// ============================================================================
// Model server
// ============================================================================

#[tokio::test]
async fn missing_model_switches_to_first_available() {
    let store = Rc::new(MemoryStore::with_values([(keys::SELECTED_MODEL, "gone")]));
    let backend = Rc::new(MockBackend::replying("x").with_models(&["mistral", "phi3"]));
    let rewriter = rewriter_with(store.clone(), backend);

    let models = rewriter.refresh_models().await.unwrap();

    assert_eq!(models, vec!["mistral", "phi3"]);
    assert_eq!(rewriter.config().selected_model, "mistral");
    assert_eq!(rewriter.orchestrator().model(), "mistral");
    assert_eq!(store.get(keys::SELECTED_MODEL).as_deref(), Some("mistral"));
}

#[tokio::test]
async fn available_model_is_kept() {
    let store = Rc::new(MemoryStore::with_values([(keys::SELECTED_MODEL, "phi3")]));
    let backend = Rc::new(MockBackend::replying("x").with_models(&["mistral", "phi3"]));
    let rewriter = rewriter_with(store, backend);

    rewriter.refresh_models().await.unwrap();
    assert_eq!(rewriter.config().selected_model, "phi3");
}

#[tokio::test]
async fn unreachable_server_updates_status() {
    let backend = Rc::new(MockBackend::failing(ModelError::Unreachable(
        "refused".to_string(),
    )));
    let rewriter = rewriter_with(Rc::new(MemoryStore::new()), backend);

    assert!(rewriter.refresh_models().await.is_err());
    assert_eq!(
        rewriter.check_connection().await,
        ConnectionStatus::Disconnected("refused".to_string())
    );
}

#[tokio::test]
async fn connection_check_reports_version() {
    let rewriter = rewriter_with(
        Rc::new(MemoryStore::new()),
        Rc::new(MockBackend::replying("x")),
    );
    assert_eq!(
        rewriter.check_connection().await,
        ConnectionStatus::Connected {
            version: Some("mock".to_string())
        }
    );
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn setters_persist_immediately() {
    let store = Rc::new(MemoryStore::new());
    let rewriter = rewriter_with(store.clone(), Rc::new(MockBackend::replying("x")));

    rewriter.set_model("phi3");
    rewriter.set_endpoint("http://gpu-box:11434/api/generate");
    rewriter.set_debug(true);
    rewriter.set_default_mode("academic").unwrap();
    rewriter.set_enabled(false);

    let reloaded = Configuration::load(store.as_ref());
    assert_eq!(reloaded.selected_model, "phi3");
    assert_eq!(reloaded.endpoint_url, "http://gpu-box:11434/api/generate");
    assert!(reloaded.debug);
    assert_eq!(reloaded.default_mode.as_deref(), Some("academic"));
    assert!(!reloaded.enabled);
}

#[test]
fn unknown_default_mode_is_rejected() {
    let rewriter = rewriter_with(
        Rc::new(MemoryStore::new()),
        Rc::new(MockBackend::replying("x")),
    );
    assert_eq!(
        rewriter.set_default_mode("nope"),
        Err(RewriteError::InvalidMode("nope".to_string()))
    );
}

#[tokio::test]
async fn overrides_are_not_persisted() {
    let store = Rc::new(MemoryStore::with_values([
        (keys::ENDPOINT_URL, "http://saved:11434/api/generate"),
        (keys::SELECTED_MODEL, "saved-model"),
    ]));
    let backend = Rc::new(MockBackend::replying("x").with_models(&["llama3"]));
    let rewriter = rewriter_with(store.clone(), backend)
        .with_overrides(Some("http://other:1/api/generate"), Some("tiny"));

    assert_eq!(rewriter.config().selected_model, "tiny");
    assert_eq!(rewriter.orchestrator().model(), "tiny");

    // Saving unrelated settings and refreshing models both write the store.
    rewriter.set_debug(true);
    rewriter.refresh_models().await.unwrap();
    assert_eq!(rewriter.config().selected_model, "llama3");
    assert_eq!(rewriter.config().endpoint_url, "http://other:1/api/generate");

    let reloaded = Configuration::load(store.as_ref());
    assert!(reloaded.debug);
    assert_eq!(reloaded.endpoint_url, "http://saved:11434/api/generate");
    assert_eq!(reloaded.selected_model, "saved-model");
    assert_eq!(reloaded.models, vec!["llama3"]);
}

#[test]
fn explicit_settings_replace_overridden_values() {
    let store = Rc::new(MemoryStore::new());
    let rewriter = rewriter_with(store.clone(), Rc::new(MockBackend::replying("x")))
        .with_overrides(Some("http://other:1/api/generate"), Some("tiny"));

    rewriter.set_model("phi3");
    rewriter.set_endpoint("http://gpu-box:11434/api/generate");

    let reloaded = Configuration::load(store.as_ref());
    assert_eq!(reloaded.selected_model, "phi3");
    assert_eq!(reloaded.endpoint_url, "http://gpu-box:11434/api/generate");
}

#[test]
fn added_modes_get_unique_keys() {
    let store = Rc::new(MemoryStore::new());
    let rewriter = rewriter_with(store.clone(), Rc::new(MockBackend::replying("x")));

    let first = rewriter
        .add_custom_mode("Pirate", "Talk like a pirate:", Some("arr"))
        .unwrap();
    let second = rewriter
        .add_custom_mode("Pirate", "Talk like a pirate, again:", None)
        .unwrap();

    assert_eq!(first.key, "custom_pirate");
    assert_eq!(second.key, "custom_pirate_2");
    assert!(store.get(keys::CUSTOM_MODES).unwrap().contains("custom_pirate_2"));
}

#[test]
fn disabling_clears_tracked_field() {
    let rewriter = rewriter_with(
        Rc::new(MemoryStore::new()),
        Rc::new(MockBackend::replying("x")),
    );
    let (mut doc, area) = textarea_page("msg", "text");
    let body = doc.body();
    let other = element(&mut doc, body, "input", &[]);
    let now = Instant::now();

    rewriter.handle_event(&doc, &DomEvent::focus(area), now);
    rewriter.set_enabled(false);
    rewriter.set_enabled(true);
    rewriter.handle_event(&doc, &DomEvent::blur(other), now);

    assert_eq!(
        rewriter.handle_event(&doc, &DomEvent::key_down(area, alt("r")), now),
        None
    );
}

#[tokio::test]
async fn events_are_handled_while_a_rewrite_is_pending() {
    let (release, backend) = GatedBackend::new("Polished.");
    let backend = Rc::new(backend);
    let factory_backend = backend.clone();
    let rewriter = Rewriter::new(
        Rc::new(MemoryStore::new()),
        Rc::new(MemoryNotifier::new()),
        Box::new(move |_endpoint: &str| factory_backend.clone() as Rc<dyn ModelBackend>),
    );
    let (mut doc, area) = textarea_page("msg", "rough");
    let body = doc.body();
    let other = element(&mut doc, body, "textarea", &[("id", "other")]);
    let doc = cell(doc);
    let now = Instant::now();

    rewriter.handle_event(&doc.borrow(), &DomEvent::focus(area), now);
    let command = RewriteCommand::Rewrite {
        element: area,
        mode: None,
    };

    let pending = rewriter.run(&doc, &command);
    let meanwhile = async {
        while !rewriter.orchestrator().is_busy() {
            tokio::task::yield_now().await;
        }
        rewriter.handle_event(&doc.borrow(), &DomEvent::blur(area), now);
        rewriter.handle_event(&doc.borrow(), &DomEvent::focus(other), now);
        let shortcut = rewriter
            .handle_event(&doc.borrow(), &DomEvent::key_down(other, alt("r")), now)
            .unwrap();
        let _ = release.send(());
        shortcut
    };
    let (outcome, queued) = tokio::join!(pending, meanwhile);

    assert!(outcome.unwrap().unwrap().applied);
    assert_eq!(doc.borrow().value(area), Some("Polished."));
    assert_eq!(
        queued,
        RewriteCommand::Rewrite {
            element: other,
            mode: None
        }
    );
    assert_eq!(rewriter.tracker().state(), TrackerState::Tracking(other));
    assert_eq!(backend.calls(), 1);
}
