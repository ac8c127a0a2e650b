use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::api::client::ApiClient;
use crate::cli::config::{AppConfig, Cli, build_scan_options, resolve_api};
use crate::dom::mutation::ScriptedBatch;
use crate::dom::page::Page;
use crate::error::JobFillError;
use crate::profile::profile_model::{DomainMappings, ProfileData};
use crate::scan::watcher::{PageFeed, mutation_channel};
use crate::trace::logger::TraceLogger;

// ============================================================================
// scan subcommand
// ============================================================================

pub fn cmd_scan(
    config: &AppConfig,
    snapshot: &str,
    timeout_ms: Option<u64>,
    min_fields: Option<usize>,
    mutations: Option<&str>,
) -> Result<(), JobFillError> {
    let mut page = Page::load(Path::new(snapshot))?;
    let options = build_scan_options(&config.scan, timeout_ms, min_fields);
    let script: Vec<ScriptedBatch> = match mutations {
        Some(path) => read_json_file(path, "mutation script")?,
        None => Vec::new(),
    };

    let (feed, stream) = mutation_channel();
    let finished = Arc::new(AtomicBool::new(false));
    let producer = replay(feed, script, Arc::clone(&finished));

    let report = crate::scan(&mut page, options, stream);
    finished.store(true, Ordering::SeqCst);
    if producer.join().is_err() {
        debug!("mutation replay thread panicked");
    }

    print_json(&report)
}

/// Longest stretch the replay thread sleeps before checking for shutdown.
const REPLAY_POLL: Duration = Duration::from_millis(20);

/// Play a mutation script on its own thread, the way page scripts would
/// render a form after load. The feed is dropped when the script ends; the
/// thread also stops mid-delay once `finished` is set.
fn replay(feed: PageFeed, script: Vec<ScriptedBatch>, finished: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for step in script {
            let due = Instant::now() + Duration::from_millis(step.delay_ms);
            loop {
                if finished.load(Ordering::SeqCst) {
                    return;
                }
                let now = Instant::now();
                if now >= due {
                    break;
                }
                thread::sleep(REPLAY_POLL.min(due - now));
            }
            if !feed.push(step.mutations) {
                break;
            }
        }
    })
}

// ============================================================================
// fill subcommand
// ============================================================================

#[allow(clippy::too_many_arguments)]
pub fn cmd_fill(
    cli: &Cli,
    config: &AppConfig,
    snapshot: &str,
    profile: Option<&str>,
    domain_mappings: Option<&str>,
    output: Option<&str>,
    submit_unknown: bool,
    trace: Option<&str>,
) -> Result<(), JobFillError> {
    let mut page = Page::load(Path::new(snapshot))?;
    let domain = page.domain();

    let needs_api = profile.is_none() || submit_unknown;
    let client = if needs_api {
        let (base, token) = resolve_api(cli, &config.api);
        Some(ApiClient::new(&base, token)?)
    } else {
        None
    };

    let data: ProfileData = match (profile, &client) {
        (Some(path), _) => read_json_file(path, "profile")?,
        (None, Some(client)) => client.fetch_fill_profile()?,
        (None, None) => ProfileData::default(),
    };

    let overrides: DomainMappings = match (domain_mappings, profile, &client) {
        (Some(path), _, _) => read_json_file(path, "domain mappings")?,
        (None, None, Some(client)) if !domain.is_empty() => client.fetch_domain_mappings(&domain)?,
        _ => DomainMappings::default(),
    };

    let tracer = trace
        .map(str::to_string)
        .or_else(|| config.trace.path.clone())
        .map(TraceLogger::new);

    let outcome = crate::fill_with_overrides(&mut page, &data, &overrides, tracer.as_ref());

    if let Some(path) = output {
        page.save(Path::new(path))?;
        info!(path, "wrote filled snapshot");
    }

    if let Some(client) = client.as_ref().filter(|_| submit_unknown) {
        let summary = client.submit_unknown_fields(&outcome.unknown)?;
        eprintln!("Submitted unknown fields: {} created", summary.created);
    }

    print_json(&outcome)
}

// ============================================================================
// capture subcommand
// ============================================================================

pub fn cmd_capture(cli: &Cli, config: &AppConfig, snapshot: &str, submit: bool) -> Result<(), JobFillError> {
    let page = Page::load(Path::new(snapshot))?;
    let records = crate::capture_fields(&page);

    if submit {
        let (base, token) = resolve_api(cli, &config.api);
        let summary = ApiClient::new(&base, token)?.submit_unknown_fields(&records)?;
        eprintln!("Submitted captured fields: {} created", summary.created);
    }

    print_json(&records)
}

// ============================================================================
// Helpers
// ============================================================================

pub fn read_json_file<T: DeserializeOwned>(path: &str, what: &str) -> Result<T, JobFillError> {
    let content = std::fs::read_to_string(path).map_err(|e| JobFillError::Io {
        context: format!("reading {} {}", what, path),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| JobFillError::JsonParse {
        context: format!("{} {}", what, path),
        source: e,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), JobFillError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| JobFillError::JsonSerialize {
        context: "command output".into(),
        source: e,
    })?;
    println!("{}", json);
    Ok(())
}
