use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

// ============================================================================
// Scalar profile values
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    Null,
}

/// Strings that turn a checkbox on.
const TRUTHY: [&str; 4] = ["true", "yes", "1", "Yes"];

impl ProfileValue {
    /// Scalars map directly; arrays of scalars are joined with `", "`;
    /// objects are not profile values.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(ProfileValue::Null),
            Value::Bool(b) => Some(ProfileValue::Bool(*b)),
            Value::Number(n) => Some(ProfileValue::Number(n.clone())),
            Value::String(s) => Some(ProfileValue::Text(s.clone())),
            Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(|i| ProfileValue::from_json(i)?.as_text())
                    .collect();
                Some(ProfileValue::Text(parts.join(", ")))
            }
            Value::Object(_) => None,
        }
    }

    pub fn text(value: &str) -> Self {
        ProfileValue::Text(value.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ProfileValue::Null)
    }

    /// Null or the empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            ProfileValue::Null => true,
            ProfileValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Text written into an input. `None` for null.
    pub fn as_text(&self) -> Option<String> {
        match self {
            ProfileValue::Bool(b) => Some(b.to_string()),
            ProfileValue::Number(n) => Some(n.to_string()),
            ProfileValue::Text(s) => Some(s.clone()),
            ProfileValue::Null => None,
        }
    }

    /// Checkbox coercion: `true`, `"true"`, `"yes"`, `"Yes"`, `"1"` and `1` are on.
    pub fn is_truthy(&self) -> bool {
        match self {
            ProfileValue::Bool(b) => *b,
            ProfileValue::Number(n) => n.as_f64() == Some(1.0),
            ProfileValue::Text(s) => TRUTHY.contains(&s.as_str()),
            ProfileValue::Null => false,
        }
    }
}

impl From<&str> for ProfileValue {
    fn from(value: &str) -> Self {
        ProfileValue::text(value)
    }
}

impl From<bool> for ProfileValue {
    fn from(value: bool) -> Self {
        ProfileValue::Bool(value)
    }
}

// ============================================================================
// ProfileValueMap: ordered key -> value source for one fill pass
// ============================================================================

/// Profile record bookkeeping that never describes the applicant.
const RECORD_METADATA_KEYS: [&str; 4] = ["id", "userId", "createdAt", "updatedAt"];

/// Insertion-ordered map. Re-inserting a key replaces its value but keeps
/// its original position, so iteration order is stable across merges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileValueMap {
    entries: Vec<(String, ProfileValue)>,
}

impl ProfileValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: ProfileValue) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ProfileValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProfileValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Layer every scalar of a JSON object on top of this map.
    pub fn merge_json(&mut self, source: &Map<String, Value>) {
        for (key, value) in source {
            if let Some(v) = ProfileValue::from_json(value) {
                self.insert(key, v);
            }
        }
    }

    /// Generic profile attributes first, then the backend's field mappings.
    pub fn from_profile_data(data: &ProfileData) -> Self {
        let mut map = ProfileValueMap::new();
        if let Some(profile) = &data.profile {
            for (key, value) in profile {
                if RECORD_METADATA_KEYS.contains(&key.as_str()) {
                    continue;
                }
                if let Some(v) = ProfileValue::from_json(value) {
                    map.insert(key, v);
                }
            }
        }
        map.merge_json(&data.field_mappings);
        map.synthesize_full_name();
        map
    }

    /// Domain-scoped values captured for this site win on collision.
    pub fn with_domain_overrides(mut self, overrides: &DomainMappings) -> Self {
        self.merge_json(&overrides.field_mappings);
        self
    }

    /// Fill `fullName` from first + last name when it is missing or blank.
    pub fn synthesize_full_name(&mut self) {
        if self.get("fullName").is_some_and(|v| !v.is_blank()) {
            return;
        }
        let parts: Vec<String> = ["firstName", "lastName"]
            .iter()
            .filter_map(|k| self.get(k).and_then(ProfileValue::as_text))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !parts.is_empty() {
            self.insert("fullName", ProfileValue::Text(parts.join(" ")));
        }
    }
}

impl<K: Into<String>> FromIterator<(K, ProfileValue)> for ProfileValueMap {
    fn from_iter<I: IntoIterator<Item = (K, ProfileValue)>>(iter: I) -> Self {
        let mut map = ProfileValueMap::new();
        for (k, v) in iter {
            let key: String = k.into();
            map.insert(&key, v);
        }
        map
    }
}

impl Serialize for ProfileValueMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ============================================================================
// Backend payloads
// ============================================================================

/// `GET /profile/fill` response: the stored profile plus backend-built mappings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    #[serde(default)]
    pub profile: Option<Map<String, Value>>,
    #[serde(default)]
    pub field_mappings: Map<String, Value>,
}

/// `GET /unknown-fields/domain/{domain}` response: values the user labeled
/// by hand for this site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainMappings {
    #[serde(default)]
    pub field_mappings: Map<String, Value>,
}
