use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::field::field_model::FieldDescriptor;
use crate::matching::matcher::MatchResult;

/// What the fill pass did with one control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillDecision {
    Filled,
    NotApplied,
    Skipped,
    Unknown,
}

/// One JSONL line of the fill decision log.
#[derive(Debug, Serialize)]
pub struct FillTraceEvent {
    pub timestamp_ms: u128,
    pub page_domain: String,

    pub field_index: usize,
    pub field_name: Option<String>,
    pub identifiers: Vec<String>,

    pub decision: FillDecision,
    pub profile_key: Option<String>,
    pub strategy: Option<String>,
}

impl FillTraceEvent {
    pub fn now(page_domain: &str, field: &FieldDescriptor, decision: FillDecision) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            page_domain: page_domain.to_string(),
            field_index: field.index,
            field_name: field.field_name().map(str::to_string),
            identifiers: field.identifiers.clone(),
            decision,
            profile_key: None,
            strategy: None,
        }
    }

    pub fn with_match(mut self, matched: &MatchResult) -> Self {
        self.profile_key = Some(matched.profile_key.clone());
        self.strategy = Some(matched.strategy.as_str().to_string());
        self
    }
}
