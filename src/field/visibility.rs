use crate::dom::dom_model::{Document, NodeId};
use crate::error::DomError;
use crate::field::field_model::FieldKind;

/// Whether the control would be rendered: neither it nor any ancestor is
/// hidden, and its layout box (when known) has an area.
///
/// A DOM fault counts as not visible.
pub fn is_visible(doc: &Document, node: NodeId) -> bool {
    check_visible(doc, node).unwrap_or(false)
}

fn check_visible(doc: &Document, node: NodeId) -> Result<bool, DomError> {
    if is_hidden(doc, node)? {
        return Ok(false);
    }

    if let Some(layout) = doc.element(node)?.layout {
        if layout.width <= 0.0 || layout.height <= 0.0 {
            return Ok(false);
        }
    }

    for ancestor in doc.ancestors(node) {
        if is_hidden(doc, ancestor)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn is_hidden(doc: &Document, node: NodeId) -> Result<bool, DomError> {
    let el = doc.element(node)?;
    let style = &el.style;

    let display_none = style.display.as_deref() == Some("none");
    let visibility_hidden = matches!(style.visibility.as_deref(), Some("hidden") | Some("collapse"));
    let transparent = style.opacity.is_some_and(|o| (o * 100.0).round() == 0.0);

    Ok(el.has_attr("hidden") || display_none || visibility_hidden || transparent)
}

/// Whether the user could type into / toggle the control right now.
pub fn is_fillable(doc: &Document, node: NodeId) -> bool {
    check_fillable(doc, node).unwrap_or(false)
}

fn check_fillable(doc: &Document, node: NodeId) -> Result<bool, DomError> {
    let el = doc.element(node)?;

    if el.has_attr("disabled") || el.has_attr("readonly") {
        return Ok(false);
    }
    if el.attr("aria-disabled") == Some("true") || el.attr("aria-readonly") == Some("true") {
        return Ok(false);
    }

    // Controls inside a disabled fieldset are disabled too.
    let in_disabled_fieldset = doc
        .ancestors(node)
        .into_iter()
        .any(|a| doc.tag(a).is_ok_and(|t| t == "fieldset") && doc.has_attr(a, "disabled"));

    Ok(!in_disabled_fieldset)
}

/// Text-like controls that already hold something are left alone.
/// Checkboxes and radios never count as pre-filled.
pub fn has_existing_value(doc: &Document, node: NodeId, kind: FieldKind) -> bool {
    match kind {
        FieldKind::Checkbox | FieldKind::Radio => false,
        FieldKind::ContentEditable => !doc.text_content(node).trim().is_empty(),
        FieldKind::Text | FieldKind::Textarea | FieldKind::Select => doc
            .value(node)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false),
    }
}
