use tracing::{debug, warn};

use crate::dom::dom_model::{Document, EventKind, NodeId, SelectOption};
use crate::error::DomError;
use crate::field::field_model::FieldKind;
use crate::matching::normalize::normalize;
use crate::profile::profile_model::ProfileValue;

/// Events raised after a text value is written. `input`/`change` feed
/// value-diffing frameworks; the key pair satisfies keystroke listeners.
pub const TEXT_INPUT_EVENTS: [EventKind; 5] = [
    EventKind::Input,
    EventKind::Change,
    EventKind::KeyDown,
    EventKind::KeyUp,
    EventKind::Blur,
];

pub const CONTENT_EDITABLE_EVENTS: [EventKind; 3] =
    [EventKind::Input, EventKind::Change, EventKind::Blur];

pub const TOGGLE_EVENTS: [EventKind; 2] = [EventKind::Change, EventKind::Click];

/// Write `value` into a control. Returns true iff the control was changed;
/// writing the value it already holds dispatches nothing.
///
/// Text values go through the prototype-level setter so a framework's value
/// tracker still holds the old value when the synthetic events arrive.
/// Handlers on the page may rewrite the value afterwards; that is not checked.
pub fn set_value(doc: &mut Document, node: NodeId, kind: FieldKind, value: &ProfileValue) -> bool {
    let result = match kind {
        FieldKind::Text | FieldKind::Textarea => set_text(doc, node, value),
        FieldKind::ContentEditable => set_content_editable(doc, node, value),
        FieldKind::Checkbox => set_checkbox(doc, node, value),
        FieldKind::Radio => set_radio(doc, node, value),
        FieldKind::Select => set_select(doc, node, value),
    };

    match result {
        Ok(applied) => applied,
        Err(e) => {
            warn!(node = node.0, error = %e, "value setter failed");
            false
        }
    }
}

fn dispatch_all(doc: &mut Document, node: NodeId, events: &[EventKind]) -> Result<(), DomError> {
    for kind in events {
        doc.dispatch(node, *kind)?;
    }
    Ok(())
}

fn set_text(doc: &mut Document, node: NodeId, value: &ProfileValue) -> Result<bool, DomError> {
    let Some(text) = value.as_text() else {
        return Ok(false);
    };
    if doc.value(node)? == text {
        return Ok(false);
    }
    doc.set_value_native(node, &text)?;
    dispatch_all(doc, node, &TEXT_INPUT_EVENTS)?;
    Ok(true)
}

fn set_content_editable(doc: &mut Document, node: NodeId, value: &ProfileValue) -> Result<bool, DomError> {
    let Some(text) = value.as_text() else {
        return Ok(false);
    };
    if doc.text_content(node) == text {
        return Ok(false);
    }
    doc.set_text_content(node, &text)?;
    dispatch_all(doc, node, &CONTENT_EDITABLE_EVENTS)?;
    Ok(true)
}

fn set_checkbox(doc: &mut Document, node: NodeId, value: &ProfileValue) -> Result<bool, DomError> {
    let want = value.is_truthy();
    if doc.is_checked(node)? == want {
        return Ok(false);
    }
    doc.set_checked(node, want)?;
    dispatch_all(doc, node, &TOGGLE_EVENTS)?;
    Ok(true)
}

fn set_radio(doc: &mut Document, node: NodeId, value: &ProfileValue) -> Result<bool, DomError> {
    let wanted = normalize(&value.as_text().unwrap_or_default());
    let own = normalize(&radio_value(doc, node)?);
    if wanted.is_empty() || own.is_empty() {
        return Ok(false);
    }

    let fits = own == wanted || own.contains(&wanted) || wanted.contains(&own);
    if !fits || doc.is_checked(node)? {
        return Ok(false);
    }

    doc.set_checked(node, true)?;
    dispatch_all(doc, node, &TOGGLE_EVENTS)?;
    Ok(true)
}

/// Native radios answer with their `value`; ARIA radios with `data-value`,
/// their accessible name, or their text.
fn radio_value(doc: &Document, node: NodeId) -> Result<String, DomError> {
    let el = doc.element(node)?;
    if el.tag == "input" {
        return Ok(el.attr("value").unwrap_or("on").to_string());
    }
    Ok(el
        .attr("data-value")
        .or(el.attr("aria-label"))
        .map(str::to_string)
        .unwrap_or_else(|| doc.text_content(node).trim().to_string()))
}

fn set_select(doc: &mut Document, node: NodeId, value: &ProfileValue) -> Result<bool, DomError> {
    let wanted = normalize(&value.as_text().unwrap_or_default());
    if wanted.is_empty() {
        return Ok(false);
    }

    let options = doc.options(node)?;
    let Some(option) = pick_option(&options, &wanted) else {
        debug!(node = node.0, wanted = %wanted, "no select option fits");
        return Ok(false);
    };

    if doc.value(node)? == option.value {
        return Ok(false);
    }

    let chosen = option.value.clone();
    doc.set_value_native(node, &chosen)?;
    doc.dispatch(node, EventKind::Change)?;
    Ok(true)
}

/// Exact match on option value or text first, then containment either way.
/// Two-letter codes would otherwise hit inside unrelated names ("at" in
/// "united states").
pub fn pick_option<'a>(options: &'a [SelectOption], wanted: &str) -> Option<&'a SelectOption> {
    let forms = |o: &SelectOption| [normalize(&o.value), normalize(&o.text)];

    options
        .iter()
        .find(|o| forms(o).iter().any(|f| !f.is_empty() && f == wanted))
        .or_else(|| {
            options.iter().find(|o| {
                forms(o)
                    .iter()
                    .any(|f| !f.is_empty() && (f.contains(wanted) || wanted.contains(f.as_str())))
            })
        })
}
