use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::dom::page::Page;
use crate::field::field_model::{FieldDescriptor, FillOutcome, UnknownFieldRecord};
use crate::field::setter::set_value;
use crate::matching::matcher::match_field;
use crate::profile::profile_model::ProfileValueMap;
use crate::scan::scanner::single_scan;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{FillDecision, FillTraceEvent};

/// One fill pass over the page.
///
/// Pre-filled text-like controls are skipped. Everything else is matched
/// against the profile; a match that the setter could not apply counts as
/// `not_applied`, a miss is reported as an unknown field (once per
/// domain/field name).
pub fn fill_page(page: &mut Page, profile: &ProfileValueMap, tracer: Option<&TraceLogger>) -> FillOutcome {
    let domain = page.domain();
    let fields = single_scan(&page.document);
    let mut outcome = FillOutcome::default();
    let mut reported = HashSet::new();

    for field in &fields {
        let trace = |event: FillTraceEvent| {
            if let Some(t) = tracer {
                t.log(&event);
            }
        };

        if field.has_value {
            outcome.skipped += 1;
            debug!(index = field.index, "already has a value");
            trace(FillTraceEvent::now(&domain, field, FillDecision::Skipped));
            continue;
        }

        match match_field(&field.identifiers, profile) {
            Some(matched) => {
                let node = field.handle.node();
                let decision = if set_value(&mut page.document, node, field.kind, &matched.value) {
                    outcome.filled += 1;
                    debug!(
                        index = field.index,
                        key = %matched.profile_key,
                        strategy = matched.strategy.as_str(),
                        "filled"
                    );
                    FillDecision::Filled
                } else {
                    outcome.not_applied += 1;
                    warn!(
                        index = field.index,
                        key = %matched.profile_key,
                        kind = ?field.kind,
                        "matched but nothing was applied"
                    );
                    FillDecision::NotApplied
                };
                trace(FillTraceEvent::now(&domain, field, decision).with_match(&matched));
            }
            None => {
                debug!(index = field.index, identifiers = ?field.identifiers, "no profile match");
                trace(FillTraceEvent::now(&domain, field, FillDecision::Unknown));
                if let Some(record) = report_once(field, &page.url, &domain, &mut reported) {
                    outcome.unknown.push(record);
                }
            }
        }
    }

    outcome.unknown_count = outcome.unknown.len();
    info!(
        domain = %domain,
        fields = fields.len(),
        filled = outcome.filled,
        skipped = outcome.skipped,
        not_applied = outcome.not_applied,
        unknown = outcome.unknown_count,
        "fill pass complete"
    );
    outcome
}

/// Every reportable control on the page, whether or not the profile could
/// answer it. Used to label fields by hand.
pub fn capture_fields(page: &Page) -> Vec<UnknownFieldRecord> {
    let domain = page.domain();
    let mut reported = HashSet::new();

    let records: Vec<UnknownFieldRecord> = single_scan(&page.document)
        .iter()
        .filter_map(|field| report_once(field, &page.url, &domain, &mut reported))
        .collect();

    info!(domain = %domain, captured = records.len(), "captured fields");
    records
}

fn report_once(
    field: &FieldDescriptor,
    page_url: &str,
    domain: &str,
    reported: &mut HashSet<String>,
) -> Option<UnknownFieldRecord> {
    if !field.is_reportable() {
        return None;
    }
    let record = field.to_unknown_record(page_url, domain);
    reported.insert(record.fingerprint()).then_some(record)
}
