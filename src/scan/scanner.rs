use tracing::debug;

use crate::dom::dom_model::{Document, NodeId};
use crate::field::field_model::{ControlHandle, FieldDescriptor, control_kind, field_type};
use crate::field::identifiers::{field_label, identifiers_for};
use crate::field::visibility::{has_existing_value, is_fillable, is_visible};

/// Every visible, fillable control on the page, in document order.
///
/// Synchronous and total: a control whose DOM reads fail is either filtered
/// out by the visibility checks or described with no identifiers.
pub fn single_scan(doc: &Document) -> Vec<FieldDescriptor> {
    let mut fields = Vec::new();

    for node in doc.elements() {
        let Some(kind) = control_kind(doc, node) else {
            continue;
        };
        if !is_visible(doc, node) || !is_fillable(doc, node) {
            continue;
        }

        let index = fields.len();
        fields.push(FieldDescriptor {
            index,
            handle: ControlHandle::new(node),
            tag: doc.tag(node).unwrap_or_default().to_string(),
            kind,
            field_type: field_type(doc, node, kind),
            has_value: has_existing_value(doc, node, kind),
            identifiers: identifiers_for(doc, node),
            name: non_empty_attr(doc, node, "name"),
            dom_id: non_empty_attr(doc, node, "id"),
            placeholder: non_empty_attr(doc, node, "placeholder"),
            label: field_label(doc, node),
        });
    }

    debug!(fields = fields.len(), "single scan complete");
    fields
}

/// Number of controls a single scan would return.
pub fn count_fields(doc: &Document) -> usize {
    doc.elements()
        .into_iter()
        .filter(|n| control_kind(doc, *n).is_some() && is_visible(doc, *n) && is_fillable(doc, *n))
        .count()
}

fn non_empty_attr(doc: &Document, node: NodeId, name: &str) -> Option<String> {
    doc.attr(node, name)
        .ok()
        .flatten()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
