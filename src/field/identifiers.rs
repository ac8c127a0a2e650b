use tracing::warn;

use crate::dom::dom_model::{Document, NodeId};
use crate::error::DomError;
use crate::field::field_model::control_kind;
use crate::matching::normalize::clean_label;

/// Label-like text longer than this is treated as prose, not a field name.
pub const MAX_NEARBY_LABEL_LEN: usize = 50;

/// How far up the tree to look for a form-group style container.
const MAX_CONTAINER_DEPTH: usize = 5;

/// Test/automation attributes ATS front-ends put on their controls.
const DATA_ATTRIBUTES: [&str; 6] = [
    "data-testid",
    "data-test",
    "data-qa",
    "data-automation-id",
    "data-field",
    "data-field-name",
];

/// Class fragments that mark a wrapper holding one question and its label.
const CONTAINER_CLASS_HINTS: [&str; 7] = [
    "form-group",
    "form-field",
    "form-item",
    "input-group",
    "field",
    "question",
    "application-",
];

// ============================================================================
// IdentifierSource: one independent way of naming a control
// ============================================================================

/// Produces candidate identifiers for a control from one kind of DOM signal.
/// Sources are pure; the extractor concatenates them in a fixed order.
pub trait IdentifierSource: Sync {
    fn name(&self) -> &'static str;

    fn collect(&self, doc: &Document, control: NodeId, out: &mut Vec<String>) -> Result<(), DomError>;
}

/// Plain attribute values, in the listed order.
pub struct Attributes(pub &'static [&'static str]);

impl IdentifierSource for Attributes {
    fn name(&self) -> &'static str {
        "attributes"
    }

    fn collect(&self, doc: &Document, control: NodeId, out: &mut Vec<String>) -> Result<(), DomError> {
        let el = doc.element(control)?;
        for attr in self.0 {
            if let Some(value) = el.attr(attr) {
                out.push(value.to_string());
            }
        }
        Ok(())
    }
}

/// Text of the elements named by `aria-labelledby`.
pub struct LabelledBy;

impl IdentifierSource for LabelledBy {
    fn name(&self) -> &'static str {
        "aria-labelledby"
    }

    fn collect(&self, doc: &Document, control: NodeId, out: &mut Vec<String>) -> Result<(), DomError> {
        if let Some(text) = labelledby_text(doc, control)? {
            out.push(text);
        }
        Ok(())
    }
}

/// `autocomplete` tokens such as `given-name`; the on/off switches say nothing.
pub struct Autocomplete;

impl IdentifierSource for Autocomplete {
    fn name(&self) -> &'static str {
        "autocomplete"
    }

    fn collect(&self, doc: &Document, control: NodeId, out: &mut Vec<String>) -> Result<(), DomError> {
        if let Some(value) = doc.attr(control, "autocomplete")? {
            if !matches!(value.trim(), "" | "on" | "off") {
                out.push(value.to_string());
            }
        }
        Ok(())
    }
}

/// `<label for="...">` pointing at the control's id.
pub struct ForLabel;

impl IdentifierSource for ForLabel {
    fn name(&self) -> &'static str {
        "label[for]"
    }

    fn collect(&self, doc: &Document, control: NodeId, out: &mut Vec<String>) -> Result<(), DomError> {
        if let Some(id) = doc.attr(control, "id")? {
            out.extend(doc.labels_for(id).into_iter().map(|l| label_text(doc, l)));
        }
        Ok(())
    }
}

/// An ancestor `<label>` wrapping the control, without the control's own text.
pub struct WrappingLabel;

impl IdentifierSource for WrappingLabel {
    fn name(&self) -> &'static str {
        "wrapping label"
    }

    fn collect(&self, doc: &Document, control: NodeId, out: &mut Vec<String>) -> Result<(), DomError> {
        doc.element(control)?;
        if let Some(label) = doc.closest(control, "label") {
            out.push(label_text(doc, label));
        }
        Ok(())
    }
}

/// A short label/span/div right before the control.
pub struct PrecedingSibling;

impl IdentifierSource for PrecedingSibling {
    fn name(&self) -> &'static str {
        "preceding sibling"
    }

    fn collect(&self, doc: &Document, control: NodeId, out: &mut Vec<String>) -> Result<(), DomError> {
        let Some(sibling) = doc.previous_element_sibling(control) else {
            return Ok(());
        };
        if matches!(doc.tag(sibling)?, "label" | "span" | "div" | "p" | "legend" | "strong") {
            push_short(out, label_text(doc, sibling));
        }
        Ok(())
    }
}

/// Labels inside the nearest form-group style wrapper that holds only this
/// question (one control, or one radio/checkbox group).
pub struct FieldContainer;

impl IdentifierSource for FieldContainer {
    fn name(&self) -> &'static str {
        "field container"
    }

    fn collect(&self, doc: &Document, control: NodeId, out: &mut Vec<String>) -> Result<(), DomError> {
        let name = doc.attr(control, "name")?.map(str::to_string);

        for ancestor in doc.ancestors(control).into_iter().take(MAX_CONTAINER_DEPTH) {
            if !is_field_container(doc, ancestor)? {
                continue;
            }
            if !holds_single_question(doc, ancestor, control, name.as_deref()) {
                return Ok(());
            }
            for label in label_like_descendants(doc, ancestor) {
                push_short(out, label_text(doc, label));
            }
            return Ok(());
        }
        Ok(())
    }
}

/// Label-like elements in the immediate parent; the grandparent is consulted
/// only when the parent has none and holds no other question.
pub struct NearbyLabels;

impl NearbyLabels {
    fn collect_in(
        doc: &Document,
        scope: NodeId,
        control: NodeId,
        own_id: &str,
        out: &mut Vec<String>,
    ) -> Result<(), DomError> {
        for label in label_like_descendants(doc, scope) {
            // A label bound to, or wrapping, some other control describes that control.
            if let Some(target) = doc.attr(label, "for")? {
                if target != own_id {
                    continue;
                }
            }
            let wraps_other = doc
                .descendants(label)
                .into_iter()
                .any(|n| n != control && control_kind(doc, n).is_some());
            if !wraps_other {
                push_short(out, label_text(doc, label));
            }
        }
        Ok(())
    }
}

impl IdentifierSource for NearbyLabels {
    fn name(&self) -> &'static str {
        "nearby labels"
    }

    fn collect(&self, doc: &Document, control: NodeId, out: &mut Vec<String>) -> Result<(), DomError> {
        let own_id = doc.attr(control, "id")?.unwrap_or_default().to_string();
        let name = doc.attr(control, "name")?.map(str::to_string);
        let Some(parent) = doc.parent_element(control) else {
            return Ok(());
        };

        let mut found = Vec::new();
        Self::collect_in(doc, parent, control, &own_id, &mut found)?;

        if found.is_empty() {
            if let Some(grandparent) = doc.parent_element(parent) {
                if holds_single_question(doc, grandparent, control, name.as_deref()) {
                    Self::collect_in(doc, grandparent, control, &own_id, &mut found)?;
                }
            }
        }

        out.extend(found);
        Ok(())
    }
}

/// Extraction order: attributes, ARIA, automation hooks, then the
/// increasingly distant label heuristics.
pub static IDENTIFIER_SOURCES: &[&dyn IdentifierSource] = &[
    &Attributes(&["name", "id", "placeholder", "aria-label"]),
    &LabelledBy,
    &Attributes(&DATA_ATTRIBUTES),
    &Autocomplete,
    &ForLabel,
    &WrappingLabel,
    &PrecedingSibling,
    &FieldContainer,
    &NearbyLabels,
];

// ============================================================================
// Aggregation
// ============================================================================

/// Every candidate identifier for a control: cleaned, non-empty, first
/// occurrence kept. A DOM fault in any source yields an empty list.
pub fn identifiers_for(doc: &Document, control: NodeId) -> Vec<String> {
    identifiers_from(IDENTIFIER_SOURCES, doc, control)
}

pub fn identifiers_from(
    sources: &[&dyn IdentifierSource],
    doc: &Document,
    control: NodeId,
) -> Vec<String> {
    let mut raw = Vec::new();
    for source in sources {
        if let Err(e) = source.collect(doc, control, &mut raw) {
            warn!(source = source.name(), error = %e, "identifier extraction failed");
            return Vec::new();
        }
    }

    let mut identifiers: Vec<String> = Vec::with_capacity(raw.len());
    for candidate in raw {
        let cleaned = clean_label(&candidate);
        if !cleaned.is_empty() && !identifiers.contains(&cleaned) {
            identifiers.push(cleaned);
        }
    }
    identifiers
}

/// Human-readable label for the unknown-field report.
pub fn field_label(doc: &Document, control: NodeId) -> Option<String> {
    let mut candidates: Vec<String> = Vec::new();

    if let Some(id) = doc.attr(control, "id").ok().flatten() {
        candidates.extend(doc.labels_for(id).into_iter().map(|l| label_text(doc, l)));
    }
    if let Some(label) = doc.closest(control, "label") {
        candidates.push(label_text(doc, label));
    }
    if let Ok(Some(text)) = labelledby_text(doc, control) {
        candidates.push(text);
    }
    for attr in ["placeholder", "aria-label"] {
        if let Some(value) = doc.attr(control, attr).ok().flatten() {
            candidates.push(clean_label(value));
        }
    }

    candidates.into_iter().find(|c| !c.is_empty())
}

// ============================================================================
// Helpers
// ============================================================================

fn label_text(doc: &Document, node: NodeId) -> String {
    clean_label(&doc.text_excluding_controls(node))
}

fn push_short(out: &mut Vec<String>, text: String) {
    if !text.is_empty() && text.chars().count() < MAX_NEARBY_LABEL_LEN {
        out.push(text);
    }
}

fn labelledby_text(doc: &Document, control: NodeId) -> Result<Option<String>, DomError> {
    let Some(ids) = doc.attr(control, "aria-labelledby")? else {
        return Ok(None);
    };
    let text = ids
        .split_whitespace()
        .filter_map(|id| doc.element_by_id(id))
        .map(|n| label_text(doc, n))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Ok((!text.is_empty()).then_some(text))
}

fn is_label_like(doc: &Document, node: NodeId) -> bool {
    doc.tag(node).is_ok_and(|t| t == "label" || t == "legend") || doc.class_contains(node, "label")
}

fn label_like_descendants(doc: &Document, scope: NodeId) -> Vec<NodeId> {
    doc.descendants(scope)
        .into_iter()
        .filter(|n| is_label_like(doc, *n))
        .collect()
}

fn is_field_container(doc: &Document, node: NodeId) -> Result<bool, DomError> {
    if doc.tag(node)? == "fieldset" || doc.attr(node, "role")? == Some("group") {
        return Ok(true);
    }
    Ok(CONTAINER_CLASS_HINTS
        .iter()
        .any(|hint| doc.class_contains(node, hint)))
}

fn holds_single_question(doc: &Document, container: NodeId, control: NodeId, name: Option<&str>) -> bool {
    doc.descendants(container)
        .into_iter()
        .filter(|n| control_kind(doc, *n).is_some())
        .all(|n| {
            n == control
                || name.is_some_and(|name| doc.attr(n, "name").ok().flatten() == Some(name))
        })
}
