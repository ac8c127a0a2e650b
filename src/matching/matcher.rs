use serde::Serialize;

use crate::matching::normalize::{normalize, tokenize};
use crate::matching::patterns::{NORMALIZED_GROUPS, canonical_for};
use crate::profile::profile_model::{ProfileValue, ProfileValueMap};

/// Shortest dictionary pattern allowed to take part in substring matching.
pub const MIN_PATTERN_LEN: usize = 3;

/// Shortest identifier word considered by the word-overlap fallback.
pub const MIN_WORD_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    DirectKey,
    NormalizedKey,
    PatternDictionary,
    WordOverlap,
}

impl MatchStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStrategy::DirectKey => "direct_key",
            MatchStrategy::NormalizedKey => "normalized_key",
            MatchStrategy::PatternDictionary => "pattern_dictionary",
            MatchStrategy::WordOverlap => "word_overlap",
        }
    }
}

/// The winning profile entry for one control.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub profile_key: String,
    pub value: ProfileValue,
    pub strategy: MatchStrategy,
}

impl MatchResult {
    fn new(key: &str, value: &ProfileValue, strategy: MatchStrategy) -> Self {
        Self {
            profile_key: key.to_string(),
            value: value.clone(),
            strategy,
        }
    }
}

/// Resolve a control's identifiers against the profile.
///
/// Strategies run in a fixed order and the first hit wins; inside a strategy
/// identifiers are tried in extraction order, then profile keys in insertion
/// order. There is no scoring: the same inputs always pick the same entry.
pub fn match_field(identifiers: &[String], profile: &ProfileValueMap) -> Option<MatchResult> {
    direct_key(identifiers, profile)
        .or_else(|| normalized_key(identifiers, profile))
        .or_else(|| pattern_dictionary(identifiers, profile))
        .or_else(|| word_overlap(identifiers, profile))
}

fn direct_key(identifiers: &[String], profile: &ProfileValueMap) -> Option<MatchResult> {
    identifiers.iter().find_map(|id| {
        let value = profile.get(id).filter(|v| !v.is_null())?;
        Some(MatchResult::new(id, value, MatchStrategy::DirectKey))
    })
}

fn normalized_key(identifiers: &[String], profile: &ProfileValueMap) -> Option<MatchResult> {
    for id in identifiers {
        let normalized = normalize(id);
        if normalized.is_empty() {
            continue;
        }
        for (key, value) in profile.iter() {
            if !value.is_null() && normalize(key) == normalized {
                return Some(MatchResult::new(key, value, MatchStrategy::NormalizedKey));
            }
        }
    }
    None
}

fn pattern_dictionary(identifiers: &[String], profile: &ProfileValueMap) -> Option<MatchResult> {
    for id in identifiers {
        let normalized = normalize(id);
        if normalized.is_empty() {
            continue;
        }
        for canonical in canonical_candidates(&normalized) {
            if let Some((key, value)) = lookup_canonical(canonical, profile) {
                return Some(MatchResult::new(key, value, MatchStrategy::PatternDictionary));
            }
        }
    }
    None
}

/// Canonical keys an identifier may refer to: the exact reverse-index hit
/// first, then every group with a pattern contained in (or containing) it.
pub fn canonical_candidates(normalized: &str) -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = canonical_for(normalized).into_iter().collect();

    for (key, patterns) in NORMALIZED_GROUPS.iter() {
        if keys.contains(key) {
            continue;
        }
        let hit = patterns.iter().any(|p| {
            p.len() >= MIN_PATTERN_LEN
                && (normalized.contains(p.as_str()) || p.contains(normalized))
        });
        if hit {
            keys.push(*key);
        }
    }
    keys
}

/// Find a non-blank profile entry for a canonical key, by normalized equality
/// first and then substring containment either way.
fn lookup_canonical<'a>(
    canonical: &str,
    profile: &'a ProfileValueMap,
) -> Option<(&'a str, &'a ProfileValue)> {
    let target = normalize(canonical);

    profile
        .iter()
        .find(|(key, value)| !value.is_blank() && normalize(key) == target)
        .or_else(|| {
            profile.iter().find(|(key, value)| {
                let key = normalize(key);
                !value.is_blank()
                    && key.len() >= MIN_PATTERN_LEN
                    && (key.contains(&target) || target.contains(&key))
            })
        })
}

fn word_overlap(identifiers: &[String], profile: &ProfileValueMap) -> Option<MatchResult> {
    for id in identifiers {
        for word in tokenize(id).into_iter().filter(|w| w.len() >= MIN_WORD_LEN) {
            for (key, value) in profile.iter() {
                if value.is_blank() {
                    continue;
                }
                let overlaps = tokenize(key)
                    .iter()
                    .any(|kw| kw.contains(&word) || word.contains(kw.as_str()));
                if overlaps {
                    return Some(MatchResult::new(key, value, MatchStrategy::WordOverlap));
                }
            }
        }
    }
    None
}
