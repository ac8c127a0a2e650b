use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::dom::dom_model::{Document, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Select,
    Checkbox,
    Radio,
    ContentEditable,
}

/// `<input type>` values that never take profile data.
const EXCLUDED_INPUT_TYPES: [&str; 7] = [
    "hidden", "submit", "button", "file", "image", "reset", "password",
];

/// Classify an element as a fillable control, or `None` if it is not one.
///
/// Besides native inputs this recognizes contenteditable regions and ARIA
/// `textbox` / `checkbox` / `radio` widgets that ATS front-ends render as divs.
pub fn control_kind(doc: &Document, node: NodeId) -> Option<FieldKind> {
    let el = doc.element(node).ok()?;

    match el.tag.as_str() {
        "input" => {
            let input_type = el.attr("type").unwrap_or("text").to_ascii_lowercase();
            if EXCLUDED_INPUT_TYPES.contains(&input_type.as_str()) {
                return None;
            }
            Some(match input_type.as_str() {
                "checkbox" => FieldKind::Checkbox,
                "radio" => FieldKind::Radio,
                _ => FieldKind::Text,
            })
        }
        "textarea" => Some(FieldKind::Textarea),
        "select" => Some(FieldKind::Select),
        _ => match el.attr("role") {
            Some("checkbox") | Some("switch") => Some(FieldKind::Checkbox),
            Some("radio") => Some(FieldKind::Radio),
            Some("textbox") => Some(FieldKind::ContentEditable),
            _ if is_editable_root(doc, node) => Some(FieldKind::ContentEditable),
            _ => None,
        },
    }
}

fn is_editable(doc: &Document, node: NodeId) -> bool {
    matches!(
        doc.attr(node, "contenteditable").ok().flatten(),
        Some("") | Some("true") | Some("plaintext-only")
    )
}

/// Only the outermost element of a contenteditable region counts.
fn is_editable_root(doc: &Document, node: NodeId) -> bool {
    is_editable(doc, node) && !doc.ancestors(node).iter().any(|a| is_editable(doc, *a))
}

/// Value reported as `fieldType` for a control.
pub fn field_type(doc: &Document, node: NodeId, kind: FieldKind) -> String {
    let attr = |name: &str| doc.attr(node, name).ok().flatten().map(str::to_string);
    match kind {
        FieldKind::Textarea => "textarea".into(),
        FieldKind::Select if doc.has_attr(node, "multiple") => "select-multiple".into(),
        FieldKind::Select => "select-one".into(),
        FieldKind::ContentEditable => attr("role").unwrap_or_else(|| "contenteditable".into()),
        FieldKind::Text | FieldKind::Checkbox | FieldKind::Radio => {
            if doc.tag(node).is_ok_and(|t| t == "input") {
                attr("type")
                    .map(|t| t.to_ascii_lowercase())
                    .unwrap_or_else(|| "text".into())
            } else {
                attr("role").unwrap_or_else(|| "text".into())
            }
        }
    }
}

// ============================================================================
// Scan results
// ============================================================================

/// Handle to a control owned by the scan that discovered it.
#[derive(Debug, PartialEq, Eq)]
pub struct ControlHandle(NodeId);

impl ControlHandle {
    pub(crate) fn new(node: NodeId) -> Self {
        Self(node)
    }

    pub fn node(&self) -> NodeId {
        self.0
    }
}

/// One control found by a scan, with everything the matcher and the
/// unknown-field report need. Lives only for the pass that created it.
#[derive(Debug)]
pub struct FieldDescriptor {
    pub index: usize,
    pub handle: ControlHandle,
    pub tag: String,
    pub kind: FieldKind,
    pub field_type: String,
    pub has_value: bool,
    pub identifiers: Vec<String>,
    pub name: Option<String>,
    pub dom_id: Option<String>,
    pub placeholder: Option<String>,
    pub label: Option<String>,
}

impl FieldDescriptor {
    /// `name`, then `id`, then the first identifier.
    pub fn field_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.dom_id.as_deref())
            .or(self.identifiers.first().map(String::as_str))
    }

    /// Whether the control carries anything a person could label later.
    pub fn is_reportable(&self) -> bool {
        !self.identifiers.is_empty() || self.name.is_some() || self.dom_id.is_some()
    }

    pub fn to_unknown_record(&self, page_url: &str, page_domain: &str) -> UnknownFieldRecord {
        UnknownFieldRecord {
            field_name: self
                .field_name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("field_{}", self.index)),
            field_label: self.label.clone(),
            field_type: self.field_type.clone(),
            placeholder: self.placeholder.clone(),
            page_url: page_url.to_string(),
            page_domain: page_domain.to_string(),
        }
    }
}

/// A fillable control nothing in the profile could answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownFieldRecord {
    pub field_name: String,
    pub field_label: Option<String>,
    pub field_type: String,
    pub placeholder: Option<String>,
    pub page_url: String,
    pub page_domain: String,
}

impl UnknownFieldRecord {
    /// Stable identity of the record within a site: SHA-1 of domain and field name.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha1::new();
        hasher.update(self.page_domain.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.field_name.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Counters and unknown fields from one fill pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillOutcome {
    pub filled: usize,
    pub skipped: usize,
    /// Matched, but the setter found nothing to change (e.g. no select option fit).
    pub not_applied: usize,
    pub unknown_count: usize,
    pub unknown: Vec<UnknownFieldRecord>,
}
