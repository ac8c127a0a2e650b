use std::io::Write;
use std::time::{Duration, Instant};

use clap::Parser;
use jobfill::api::client::{ApiClient, DEFAULT_API_BASE, SubmitSummary};
use jobfill::cli::commands::{cmd_capture, cmd_fill, cmd_scan, read_json_file};
use jobfill::cli::config::{
    AppConfig, Cli, Commands, DEFAULT_CONFIG_PATH, build_scan_options, load_config, log_filter,
    resolve_api,
};
use jobfill::dom::page::Page;
use jobfill::error::JobFillError;
use jobfill::profile::profile_model::ProfileData;
use jobfill::scan::watcher::{DEFAULT_DEBOUNCE_MS, DEFAULT_MIN_FIELDS, DEFAULT_TIMEOUT_MS};
use serde_json::json;

use crate::common::utils::fixture;

mod common;

fn fixture_str(name: &str) -> String {
    fixture(name).to_string_lossy().into_owned()
}

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_scan_minimal() {
    let cli = Cli::parse_from(["jobfill", "scan", "--snapshot", "page.json"]);
    match cli.command {
        Commands::Scan {
            snapshot,
            timeout_ms,
            min_fields,
            mutations,
        } => {
            assert_eq!(snapshot, "page.json");
            assert!(timeout_ms.is_none());
            assert!(min_fields.is_none());
            assert!(mutations.is_none());
        }
        _ => panic!("Expected Scan command"),
    }
    assert_eq!(cli.verbose, 0);
    assert!(cli.api_url.is_none());
}

#[test]
fn cli_parse_scan_all_args() {
    let cli = Cli::parse_from([
        "jobfill",
        "scan",
        "--snapshot",
        "page.json",
        "--timeout-ms",
        "800",
        "--min-fields",
        "4",
        "--mutations",
        "script.json",
    ]);
    match cli.command {
        Commands::Scan {
            timeout_ms,
            min_fields,
            mutations,
            ..
        } => {
            assert_eq!(timeout_ms, Some(800));
            assert_eq!(min_fields, Some(4));
            assert_eq!(mutations.as_deref(), Some("script.json"));
        }
        _ => panic!("Expected Scan command"),
    }
}

#[test]
fn cli_parse_fill_defaults() {
    let cli = Cli::parse_from(["jobfill", "fill", "--snapshot", "page.json"]);
    match cli.command {
        Commands::Fill {
            snapshot,
            profile,
            domain_mappings,
            output,
            submit_unknown,
            trace,
        } => {
            assert_eq!(snapshot, "page.json");
            assert!(profile.is_none());
            assert!(domain_mappings.is_none());
            assert!(output.is_none());
            assert!(!submit_unknown);
            assert!(trace.is_none());
        }
        _ => panic!("Expected Fill command"),
    }
}

#[test]
fn cli_parse_fill_all_args() {
    let cli = Cli::parse_from([
        "jobfill",
        "fill",
        "--snapshot",
        "page.json",
        "--profile",
        "profile.json",
        "--domain-mappings",
        "overrides.json",
        "-o",
        "filled.json",
        "--submit-unknown",
        "--trace",
        "fill.jsonl",
    ]);
    match cli.command {
        Commands::Fill {
            profile,
            domain_mappings,
            output,
            submit_unknown,
            trace,
            ..
        } => {
            assert_eq!(profile.as_deref(), Some("profile.json"));
            assert_eq!(domain_mappings.as_deref(), Some("overrides.json"));
            assert_eq!(output.as_deref(), Some("filled.json"));
            assert!(submit_unknown);
            assert_eq!(trace.as_deref(), Some("fill.jsonl"));
        }
        _ => panic!("Expected Fill command"),
    }
}

#[test]
fn cli_parse_capture() {
    let cli = Cli::parse_from(["jobfill", "capture", "--snapshot", "page.json", "--submit"]);
    match cli.command {
        Commands::Capture { snapshot, submit } => {
            assert_eq!(snapshot, "page.json");
            assert!(submit);
        }
        _ => panic!("Expected Capture command"),
    }
}

#[test]
fn cli_parse_global_flags() {
    let cli = Cli::parse_from([
        "jobfill",
        "capture",
        "--snapshot",
        "page.json",
        "-vv",
        "--api-url",
        "https://api.example.com",
        "--token",
        "secret",
        "--config",
        "custom.yaml",
    ]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.api_url.as_deref(), Some("https://api.example.com"));
    assert_eq!(cli.token.as_deref(), Some("secret"));
    assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
}

#[test]
fn cli_rejects_missing_snapshot() {
    assert!(Cli::try_parse_from(["jobfill", "scan"]).is_err());
}

// ============================================================================
// Config Loading Tests
// ============================================================================

#[test]
fn load_config_missing_file_gives_defaults() {
    let config = load_config(Some("/definitely/not/here/jobfill.yaml"));
    assert_eq!(config.api.base_url, DEFAULT_API_BASE);
    assert!(config.api.token.is_none());
    assert_eq!(config.scan.timeout_ms, DEFAULT_TIMEOUT_MS);
    assert_eq!(config.scan.min_fields, DEFAULT_MIN_FIELDS);
    assert_eq!(config.scan.debounce_ms, DEFAULT_DEBOUNCE_MS);
    assert!(config.trace.path.is_none());
    assert_eq!(DEFAULT_CONFIG_PATH, "jobfill.yaml");
}

#[test]
fn load_config_from_yaml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "api:\n  base_url: https://api.example.com\n  token: abc123\nscan:\n  timeout_ms: 2500\ntrace:\n  path: fills.jsonl"
    )
    .unwrap();

    let config = load_config(Some(file.path().to_str().unwrap()));
    assert_eq!(config.api.base_url, "https://api.example.com");
    assert_eq!(config.api.token.as_deref(), Some("abc123"));
    assert_eq!(config.scan.timeout_ms, 2500);
    assert_eq!(
        config.scan.min_fields, DEFAULT_MIN_FIELDS,
        "unset keys keep their defaults"
    );
    assert_eq!(config.trace.path.as_deref(), Some("fills.jsonl"));
}

#[test]
fn load_config_malformed_gives_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "scan: [this is: not valid").unwrap();

    let config = load_config(Some(file.path().to_str().unwrap()));
    assert_eq!(config.scan.timeout_ms, DEFAULT_TIMEOUT_MS);
    assert_eq!(config.api.base_url, DEFAULT_API_BASE);
}

// ============================================================================
// Config Builder Tests
// ============================================================================

#[test]
fn scan_options_cli_overrides_config() {
    let mut config = AppConfig::default();
    config.scan.timeout_ms = 9_000;
    config.scan.min_fields = 2;
    config.scan.debounce_ms = 75;

    let options = build_scan_options(&config.scan, Some(1_000), None);
    assert_eq!(options.timeout.as_millis(), 1_000);
    assert_eq!(options.min_fields, 2);
    assert_eq!(options.debounce.as_millis(), 75);

    let options = build_scan_options(&config.scan, None, Some(6));
    assert_eq!(options.timeout.as_millis(), 9_000);
    assert_eq!(options.min_fields, 6);
}

#[test]
fn resolve_api_prefers_cli_values() {
    let mut config = AppConfig::default();
    config.api.token = Some("from-config".into());

    let cli = Cli::parse_from(["jobfill", "capture", "--snapshot", "p.json"]);
    let (base, token) = resolve_api(&cli, &config.api);
    assert_eq!(base, DEFAULT_API_BASE);
    assert_eq!(token.as_deref(), Some("from-config"));

    let cli = Cli::parse_from([
        "jobfill",
        "capture",
        "--snapshot",
        "p.json",
        "--api-url",
        "https://other.example/api",
        "--token",
        "from-cli",
    ]);
    let (base, token) = resolve_api(&cli, &config.api);
    assert_eq!(base, "https://other.example/api");
    assert_eq!(token.as_deref(), Some("from-cli"));
}

#[test]
fn log_filter_by_verbosity() {
    assert_eq!(log_filter(0), "warn");
    assert_eq!(log_filter(1), "info");
    assert_eq!(log_filter(2), "debug");
    assert_eq!(log_filter(3), "trace");
    assert_eq!(log_filter(9), "trace");
}

// ============================================================================
// API Client Tests (no network)
// ============================================================================

#[test]
fn endpoint_joins_segments_under_base_path() {
    let client = ApiClient::new(DEFAULT_API_BASE, None).unwrap();
    let url = client
        .endpoint(&["unknown-fields", "domain", "jobs.example.com"])
        .unwrap();
    assert_eq!(
        url.as_str(),
        "http://localhost:3001/api/unknown-fields/domain/jobs.example.com"
    );

    let url = client.endpoint(&["profile", "fill"]).unwrap();
    assert_eq!(url.as_str(), "http://localhost:3001/api/profile/fill");
}

#[test]
fn endpoint_tolerates_trailing_slash_in_base() {
    let client = ApiClient::new("https://api.example.com/v1/", Some("t".into())).unwrap();
    assert_eq!(client.base_url(), "https://api.example.com/v1/");
    let url = client.endpoint(&["unknown-fields"]).unwrap();
    assert_eq!(url.as_str(), "https://api.example.com/v1/unknown-fields");
}

#[test]
fn endpoint_percent_encodes_segments() {
    let client = ApiClient::new(DEFAULT_API_BASE, None).unwrap();
    let url = client.endpoint(&["unknown-fields", "domain", "a b/c"]).unwrap();
    assert_eq!(
        url.as_str(),
        "http://localhost:3001/api/unknown-fields/domain/a%20b%2Fc",
        "a domain must stay a single path segment"
    );
}

#[test]
fn invalid_base_url_is_rejected() {
    match ApiClient::new("not a url", None) {
        Err(JobFillError::InvalidUrl { url, .. }) => assert_eq!(url, "not a url"),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("expected InvalidUrl"),
    }
    assert!(ApiClient::new("mailto:someone@example.com", None).is_err());
}

#[test]
fn submit_with_no_records_skips_the_request() {
    // Port 9 is discard; the call must return before touching the network.
    let client = ApiClient::new("http://127.0.0.1:9/api", None).unwrap();
    let summary = client.submit_unknown_fields(&[]).unwrap();
    assert_eq!(summary, SubmitSummary::default());
}

#[test]
fn submit_summary_counts_created_entries() {
    let summary: SubmitSummary = serde_json::from_value(json!({
        "message": "Processed 3 fields",
        "created": [{ "id": "a" }, { "id": "b" }],
        "skipped": ["email"]
    }))
    .unwrap();
    assert_eq!(summary.created, 2);
    assert_eq!(summary.skipped, vec!["email"]);
    assert_eq!(summary.message, "Processed 3 fields");

    let empty: SubmitSummary = serde_json::from_value(json!({})).unwrap();
    assert_eq!(empty, SubmitSummary::default());
}

// ============================================================================
// Command Tests (local files only)
// ============================================================================

#[test]
fn read_json_file_reports_context() {
    let profile: ProfileData = read_json_file(&fixture_str("profile.json"), "profile").unwrap();
    assert!(profile.profile.is_some_and(|p| !p.is_empty()));

    match read_json_file::<ProfileData>("/missing/profile.json", "profile") {
        Err(JobFillError::Io { context, .. }) => {
            assert!(context.contains("profile"), "context was {}", context)
        }
        other => panic!("expected Io error, got {:?}", other.map(|_| ())),
    }

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{{ not json").unwrap();
    let result = read_json_file::<ProfileData>(file.path().to_str().unwrap(), "profile");
    assert!(matches!(result, Err(JobFillError::JsonParse { .. })));
}

#[test]
fn cmd_fill_writes_filled_snapshot_and_trace() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("filled.json");
    let trace = dir.path().join("fill.jsonl");
    let cli = Cli::parse_from(["jobfill", "fill", "--snapshot", "unused.json"]);

    cmd_fill(
        &cli,
        &AppConfig::default(),
        &fixture_str("application_form.json"),
        Some(&fixture_str("profile.json")),
        None,
        Some(output.to_str().unwrap()),
        false,
        Some(trace.to_str().unwrap()),
    )
    .unwrap();

    let page = Page::load(&output).unwrap();
    let doc = &page.document;
    let first = doc.element_by_id("first_name").unwrap();
    assert_eq!(doc.value(first).unwrap(), "Ada");
    let last = doc.element_by_id("last_name").unwrap();
    assert_eq!(doc.value(last).unwrap(), "Existing", "pre-filled value kept");

    let lines = std::fs::read_to_string(&trace).unwrap();
    assert_eq!(lines.lines().count(), 9, "one trace line per scanned field");
}

#[test]
fn cmd_scan_returns_near_timeout_despite_late_script_step() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("empty.json");
    let script = dir.path().join("late.json");
    std::fs::write(
        &snapshot,
        json!({ "url": "https://jobs.example.com/apply", "root": { "tag": "body" } }).to_string(),
    )
    .unwrap();
    std::fs::write(
        &script,
        json!([{
            "delayMs": 4000,
            "mutations": [{ "op": "append", "node": { "tag": "input", "attrs": { "name": "late" } } }]
        }])
        .to_string(),
    )
    .unwrap();

    let started = Instant::now();
    cmd_scan(
        &AppConfig::default(),
        snapshot.to_str().unwrap(),
        Some(300),
        Some(1),
        Some(script.to_str().unwrap()),
    )
    .unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(250), "returned early: {:?}", elapsed);
    assert!(
        elapsed < Duration::from_millis(1_500),
        "pending script delay must not outlive the scan: {:?}",
        elapsed
    );
}

#[test]
fn cmd_capture_runs_offline_without_submit() {
    let cli = Cli::parse_from(["jobfill", "capture", "--snapshot", "unused.json"]);
    cmd_capture(
        &cli,
        &AppConfig::default(),
        &fixture_str("application_form.json"),
        false,
    )
    .unwrap();
}

#[test]
fn cmd_capture_missing_snapshot_errors() {
    let cli = Cli::parse_from(["jobfill", "capture", "--snapshot", "unused.json"]);
    let result = cmd_capture(&cli, &AppConfig::default(), "/missing/page.json", false);
    assert!(matches!(result, Err(JobFillError::Io { .. })));
}
