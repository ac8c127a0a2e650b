use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::dom::dom_model::Document;
use crate::dom::mutation::{DomMutation, apply_batch};
use crate::scan::scanner::count_fields;

pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_MIN_FIELDS: usize = 1;
pub const DEFAULT_DEBOUNCE_MS: u64 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Upper bound on the whole observed scan.
    pub timeout: Duration,
    /// Field count that resolves the scan early.
    pub min_fields: usize,
    /// Quiet period after a mutation burst before re-scanning.
    pub debounce: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            min_fields: DEFAULT_MIN_FIELDS,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

impl ScanOptions {
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = Duration::from_millis(ms);
        self
    }

    pub fn with_min_fields(mut self, min_fields: usize) -> Self {
        self.min_fields = min_fields;
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce = Duration::from_millis(ms);
        self
    }
}

/// Outcome of an observed scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Threshold met, or at least one field found by the time waiting ended.
    pub success: bool,
    pub field_count: usize,
    /// Waiting ended without reaching the threshold. Besides the deadline
    /// passing, this is also set as soon as the mutation feed closes below
    /// the threshold, since the page can no longer change; it does not
    /// imply the full timeout elapsed.
    pub timed_out: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Initializing,
    Watching,
    Resolved,
    TimedOut,
    Aborted,
}

impl ScanState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ScanState::Resolved | ScanState::TimedOut | ScanState::Aborted)
    }
}

// ============================================================================
// Mutation feed: the page's scripts on one side, the watcher on the other
// ============================================================================

#[derive(Debug)]
pub enum WatchSignal {
    Mutations(Vec<DomMutation>),
    Abort,
}

/// Producer side. Cloneable; usable from any thread.
#[derive(Debug, Clone)]
pub struct PageFeed {
    tx: Sender<WatchSignal>,
    aborted: Arc<AtomicBool>,
}

impl PageFeed {
    /// Deliver a mutation batch. Returns false once the watcher is gone
    /// or the scan was aborted.
    pub fn push(&self, batch: Vec<DomMutation>) -> bool {
        if self.is_aborted() {
            return false;
        }
        self.tx.send(WatchSignal::Mutations(batch)).is_ok()
    }

    /// Cancel the scan. Safe to call any number of times, before or after
    /// the scan has resolved.
    pub fn abort(&self) {
        if !self.aborted.swap(true, Ordering::SeqCst) {
            // The watcher may already have torn down; nothing to cancel then.
            let _ = self.tx.send(WatchSignal::Abort);
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

/// Consumer side, owned by exactly one observed scan.
#[derive(Debug)]
pub struct MutationStream {
    rx: Receiver<WatchSignal>,
}

pub fn mutation_channel() -> (PageFeed, MutationStream) {
    let (tx, rx) = mpsc::channel();
    (
        PageFeed {
            tx,
            aborted: Arc::new(AtomicBool::new(false)),
        },
        MutationStream { rx },
    )
}

/// The registered observer. Dropping it (or calling `teardown`) detaches
/// from the feed; later pushes fail.
struct WatchGuard {
    stream: Option<MutationStream>,
}

impl WatchGuard {
    fn new(stream: MutationStream) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    fn recv_timeout(&self, wait: Duration) -> Result<WatchSignal, RecvTimeoutError> {
        match &self.stream {
            Some(s) => s.rx.recv_timeout(wait),
            None => Err(RecvTimeoutError::Disconnected),
        }
    }

    fn teardown(&mut self) {
        if self.stream.take().is_some() {
            debug!("mutation observer torn down");
        }
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.teardown();
    }
}

// ============================================================================
// Single resolution
// ============================================================================

/// Holds the first terminal state and report; later attempts are ignored.
#[derive(Debug, Default)]
pub struct Resolution {
    settled: Option<(ScanState, ScanReport)>,
}

impl Resolution {
    /// Record the outcome. Returns false if one was already recorded.
    pub fn settle(&mut self, state: ScanState, report: ScanReport) -> bool {
        if self.settled.is_some() {
            debug!(?state, "ignoring second scan resolution");
            return false;
        }
        self.settled = Some((state, report));
        true
    }

    pub fn state(&self) -> Option<ScanState> {
        self.settled.map(|(s, _)| s)
    }

    pub fn report(&self) -> Option<ScanReport> {
        self.settled.map(|(_, r)| r)
    }
}

// ============================================================================
// Observed scan
// ============================================================================

/// Waits for a dynamically rendered form to reach `min_fields` controls,
/// applying the page's mutation batches as they arrive.
///
/// Initializing -> Resolved when the first scan already meets the threshold;
/// otherwise Watching until a debounced re-scan meets it (Resolved), the
/// deadline passes or the feed closes (TimedOut), or the feed aborts (Aborted).
pub struct ObservedScan<'a> {
    doc: &'a mut Document,
    options: ScanOptions,
    state: ScanState,
    resolution: Resolution,
}

impl<'a> ObservedScan<'a> {
    pub fn new(doc: &'a mut Document, options: ScanOptions) -> Self {
        Self {
            doc,
            options,
            state: ScanState::Initializing,
            resolution: Resolution::default(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn run(mut self, stream: MutationStream) -> ScanReport {
        let started = Instant::now();
        let deadline = started + self.options.timeout;

        let count = count_fields(self.doc);
        if count >= self.options.min_fields {
            return self.finish(ScanState::Resolved, count);
        }

        self.state = ScanState::Watching;
        let mut guard = WatchGuard::new(stream);
        let mut rescan_at: Option<Instant> = None;

        let (state, count) = loop {
            let now = Instant::now();
            if now >= deadline {
                break (ScanState::TimedOut, count_fields(self.doc));
            }
            let wake = rescan_at.map_or(deadline, |at| at.min(deadline));

            match guard.recv_timeout(wake.saturating_duration_since(now)) {
                Ok(WatchSignal::Mutations(batch)) => {
                    let applied = apply_batch(self.doc, &batch);
                    debug!(applied, "mutation batch received");
                    rescan_at = Some(Instant::now() + self.options.debounce);
                }
                Ok(WatchSignal::Abort) => {
                    break (ScanState::Aborted, count_fields(self.doc));
                }
                Err(RecvTimeoutError::Timeout) => {
                    if rescan_at.is_some_and(|at| Instant::now() >= at) {
                        rescan_at = None;
                        let count = count_fields(self.doc);
                        debug!(count, "debounced re-scan");
                        if count >= self.options.min_fields {
                            break (ScanState::Resolved, count);
                        }
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    // Nothing else can change the page.
                    let count = count_fields(self.doc);
                    if count >= self.options.min_fields {
                        break (ScanState::Resolved, count);
                    }
                    break (ScanState::TimedOut, count);
                }
            }
        };

        guard.teardown();
        info!(
            ?state,
            count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "observed scan finished"
        );
        self.finish(state, count)
    }

    fn finish(&mut self, state: ScanState, field_count: usize) -> ScanReport {
        let report = ScanReport {
            success: match state {
                ScanState::Resolved => true,
                ScanState::TimedOut => field_count > 0,
                _ => false,
            },
            field_count,
            timed_out: state == ScanState::TimedOut,
        };
        if self.resolution.settle(state, report) {
            self.state = state;
        }
        self.resolution.report().unwrap_or(report)
    }
}
