use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dom::dom_model::{ComputedStyle, Document, NodeId};
use crate::dom::snapshot::SnapshotNode;
use crate::error::DomError;

/// A change made to the page by its own scripts. Targets are addressed by
/// element `id` attribute; `Append` without a parent goes under the top-level
/// element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DomMutation {
    Append {
        #[serde(default)]
        parent: Option<String>,
        node: SnapshotNode,
    },
    SetAttribute {
        target: String,
        name: String,
        value: String,
    },
    RemoveAttribute {
        target: String,
        name: String,
    },
    SetStyle {
        target: String,
        style: ComputedStyle,
    },
    SetValue {
        target: String,
        value: String,
    },
}

fn resolve(doc: &Document, target: &str) -> Result<NodeId, DomError> {
    doc.element_by_id(target)
        .ok_or_else(|| DomError::UnknownTarget(target.to_string()))
}

pub fn apply(doc: &mut Document, mutation: &DomMutation) -> Result<(), DomError> {
    match mutation {
        DomMutation::Append { parent, node } => {
            let parent = match parent {
                Some(target) => resolve(doc, target)?,
                None => doc
                    .children(doc.root())
                    .iter()
                    .copied()
                    .find(|c| doc.is_element(*c))
                    .unwrap_or(doc.root()),
            };
            doc.append_subtree(parent, node)?;
        }
        DomMutation::SetAttribute {
            target,
            name,
            value,
        } => {
            let id = resolve(doc, target)?;
            doc.set_attr(id, name, value)?;
        }
        DomMutation::RemoveAttribute { target, name } => {
            let id = resolve(doc, target)?;
            doc.remove_attr(id, name)?;
        }
        DomMutation::SetStyle { target, style } => {
            let id = resolve(doc, target)?;
            doc.set_style(id, style.clone())?;
        }
        DomMutation::SetValue { target, value } => {
            let id = resolve(doc, target)?;
            doc.set_value_property(id, value)?;
        }
    }
    Ok(())
}

/// Apply a batch, skipping (and logging) mutations whose target is gone.
/// Returns how many were applied.
pub fn apply_batch(doc: &mut Document, batch: &[DomMutation]) -> usize {
    batch
        .iter()
        .filter(|m| match apply(doc, m) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "skipping page mutation");
                false
            }
        })
        .count()
}

/// One step of a scripted page: wait `delay_ms`, then deliver `mutations`
/// as a single batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptedBatch {
    #[serde(default)]
    pub delay_ms: u64,
    pub mutations: Vec<DomMutation>,
}
