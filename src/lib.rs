use crate::{
    dom::page::Page,
    field::field_model::{FillOutcome, UnknownFieldRecord},
    profile::profile_model::{DomainMappings, ProfileData, ProfileValueMap},
    scan::watcher::{MutationStream, ObservedScan, ScanOptions, ScanReport},
    trace::logger::TraceLogger,
};

pub mod api;
pub mod cli;
pub mod dom;
pub mod error;
pub mod field;
pub mod fill;
pub mod matching;
pub mod profile;
pub mod scan;
pub mod trace;

// =========================================================================
// Host entry points. None of these return an error: faults inside a pass
// degrade to a partial result.
// =========================================================================

/// Wait (bounded by `options.timeout`) for the page to render at least
/// `options.min_fields` fillable controls, applying the page's mutation
/// batches from `stream` as they arrive.
pub fn scan(page: &mut Page, options: ScanOptions, stream: MutationStream) -> ScanReport {
    ObservedScan::new(&mut page.document, options).run(stream)
}

/// Fill the page from a backend profile payload.
pub fn fill(page: &mut Page, data: &ProfileData) -> FillOutcome {
    let profile = ProfileValueMap::from_profile_data(data);
    fill::orchestrator::fill_page(page, &profile, None)
}

/// Fill with site-specific overrides layered over the profile, optionally
/// logging every per-field decision.
pub fn fill_with_overrides(
    page: &mut Page,
    data: &ProfileData,
    overrides: &DomainMappings,
    tracer: Option<&TraceLogger>,
) -> FillOutcome {
    let profile = ProfileValueMap::from_profile_data(data).with_domain_overrides(overrides);
    fill::orchestrator::fill_page(page, &profile, tracer)
}

/// Report every discovered control for manual labeling.
pub fn capture_fields(page: &Page) -> Vec<UnknownFieldRecord> {
    fill::orchestrator::capture_fields(page)
}
