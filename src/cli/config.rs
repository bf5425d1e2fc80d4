use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{Subscriber, warn};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry, reload};

pub const DEFAULT_CONFIG_FILE: &str = "smart-rewriter.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "smart-rewriter",
    version,
    about = "Rewrite text fields in place with a local LLM"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Ollama generate endpoint
    #[arg(long, global = true)]
    pub ollama_endpoint: Option<String>,

    /// Ollama model name
    #[arg(long, global = true)]
    pub ollama_model: Option<String>,

    /// Path to config file (default: smart-rewriter.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Path to the settings store (default: under the user config dir)
    #[arg(long, global = true)]
    pub store: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rewrite one field of a saved page snapshot
    Rewrite {
        /// Page snapshot JSON file
        #[arg(long)]
        page: String,

        /// Field to rewrite: id, name, or element key
        #[arg(long)]
        element: String,

        /// Mode key (default: the field's last-used mode)
        #[arg(long)]
        mode: Option<String>,

        /// Page URL, overriding the one stored in the snapshot
        #[arg(long)]
        url: Option<String>,

        /// Where to write the updated snapshot (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List models offered by the server
    Models,

    /// Check whether the server is reachable
    Status,

    /// List rewrite modes
    Modes,

    /// Add a custom rewrite mode
    AddMode {
        /// Display name; the key is derived from it
        #[arg(long)]
        name: String,

        /// Prompt template sent before the original text
        #[arg(long)]
        prompt: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Show or change persisted settings
    Config {
        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        #[arg(long)]
        disable: bool,

        #[arg(long)]
        endpoint: Option<String>,

        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        default_mode: Option<String>,

        #[arg(long, action = clap::ArgAction::Set)]
        debug: Option<bool>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `smart-rewriter.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OllamaConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    #[serde(default = "default_trace_path")]
    pub path: String,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            path: default_trace_path(),
        }
    }
}

fn default_trace_path() -> String {
    "rewrite_trace.jsonl".to_string()
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            warn!("ignoring malformed config file '{}': {}", config_path, e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Resolution (CLI > config file > persisted store > defaults)
// ============================================================================

/// Settings given on the command line or in the config file. `None` leaves
/// the persisted value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub store_path: Option<PathBuf>,
    pub trace_path: PathBuf,
}

pub fn resolve_overrides(cli: &Cli, config: &AppConfig) -> Overrides {
    Overrides {
        endpoint: cli
            .ollama_endpoint
            .clone()
            .or_else(|| config.ollama.endpoint.clone()),
        model: cli
            .ollama_model
            .clone()
            .or_else(|| config.ollama.model.clone()),
        store_path: cli
            .store
            .clone()
            .or_else(|| config.store.path.clone())
            .map(PathBuf::from),
        trace_path: PathBuf::from(&config.trace.path),
    }
}

/// `tracing` filter for the given `-v` count.
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "smart_rewriter=warn",
        1 => "smart_rewriter=info",
        2 => "smart_rewriter=debug",
        _ => "smart_rewriter=trace",
    }
}

/// `RUST_LOG` when set, otherwise [`log_filter`] for `verbose`.
pub fn env_filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter(verbose)))
}

pub type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Log subscriber writing to `writer`. The returned handle swaps the filter
/// later, once the persisted `debug` flag is known.
pub fn log_subscriber<W>(
    verbose: u8,
    writer: W,
) -> (impl Subscriber + Send + Sync + 'static, FilterHandle)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(env_filter(verbose));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer));
    (subscriber, handle)
}
