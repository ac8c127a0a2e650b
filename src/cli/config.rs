use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_API_BASE;
use crate::scan::watcher::{DEFAULT_DEBOUNCE_MS, DEFAULT_MIN_FIELDS, DEFAULT_TIMEOUT_MS, ScanOptions};

pub const DEFAULT_CONFIG_PATH: &str = "jobfill.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "jobfill",
    version,
    about = "Fill job-application forms from a stored profile"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Backend API base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Bearer token for the backend
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Path to config file (default: jobfill.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wait for a page's form to render and report how many fields appeared
    Scan {
        /// Page snapshot JSON
        #[arg(long)]
        snapshot: String,

        /// Give up after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Field count that ends the wait early
        #[arg(long)]
        min_fields: Option<usize>,

        /// Scripted mutation batches to replay while waiting
        #[arg(long)]
        mutations: Option<String>,
    },

    /// Fill a page snapshot from the profile
    Fill {
        /// Page snapshot JSON
        #[arg(long)]
        snapshot: String,

        /// Profile JSON ({ profile, fieldMappings }); fetched from the API when absent
        #[arg(long)]
        profile: Option<String>,

        /// Domain overrides JSON ({ fieldMappings }); fetched from the API when
        /// the profile is fetched
        #[arg(long)]
        domain_mappings: Option<String>,

        /// Where to write the filled snapshot
        #[arg(short, long)]
        output: Option<String>,

        /// Send unmatched fields to the backend
        #[arg(long)]
        submit_unknown: bool,

        /// JSONL file for per-field decisions
        #[arg(long)]
        trace: Option<String>,
    },

    /// List every fillable field on a page for manual labeling
    Capture {
        /// Page snapshot JSON
        #[arg(long)]
        snapshot: String,

        /// Send the captured fields to the backend
        #[arg(long)]
        submit: bool,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `jobfill.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_min_fields")]
    pub min_fields: usize,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            min_fields: DEFAULT_MIN_FIELDS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TraceConfig {
    pub path: Option<String>,
}

// Serde default helpers
fn default_base_url() -> String { DEFAULT_API_BASE.to_string() }
fn default_timeout_ms() -> u64 { DEFAULT_TIMEOUT_MS }
fn default_min_fields() -> usize { DEFAULT_MIN_FIELDS }
fn default_debounce_ms() -> u64 { DEFAULT_DEBOUNCE_MS }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// CLI values win over the config file, which wins over defaults.
pub fn build_scan_options(
    config: &ScanConfig,
    timeout_ms: Option<u64>,
    min_fields: Option<usize>,
) -> ScanOptions {
    ScanOptions::default()
        .with_timeout_ms(timeout_ms.unwrap_or(config.timeout_ms))
        .with_min_fields(min_fields.unwrap_or(config.min_fields))
        .with_debounce_ms(config.debounce_ms)
}

/// Resolved backend settings.
pub fn resolve_api(cli: &Cli, config: &ApiConfig) -> (String, Option<String>) {
    let base = cli
        .api_url
        .clone()
        .unwrap_or_else(|| config.base_url.clone());
    let token = cli.token.clone().or_else(|| config.token.clone());
    (base, token)
}

/// Map `-v` occurrences to a tracing filter directive.
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
