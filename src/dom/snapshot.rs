use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dom::dom_model::{ComputedStyle, Document, Element, LayoutBox, NodeId, NodeKind};
use crate::error::DomError;

/// Serialized page as produced by the DOM extractor: URL, title and the
/// element tree rooted at `<body>` (or `<html>`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub root: SnapshotNode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotNode {
    Text { text: String },
    Element(SnapshotElement),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotElement {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "ComputedStyle::is_empty")]
    pub style: ComputedStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutBox>,
    /// Live value of a form control; falls back to the `value` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub checked: bool,
    /// Element is driven by a framework value tracker.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub controlled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

impl Document {
    pub fn from_snapshot(root: &SnapshotNode) -> Result<Self, DomError> {
        let mut doc = Document::new();
        let document_root = doc.root();
        doc.append_subtree(document_root, root)?;
        Ok(doc)
    }

    /// Materialize a snapshot subtree under `parent`, returning the new node.
    pub fn append_subtree(&mut self, parent: NodeId, node: &SnapshotNode) -> Result<NodeId, DomError> {
        match node {
            SnapshotNode::Text { text } => self.create_text(parent, text),
            SnapshotNode::Element(source) => {
                let mut el = Element::new(&source.tag);
                el.attrs = source.attrs.clone();
                el.style = source.style.clone();
                el.layout = source.layout;
                el.checked = source.checked || source.attrs.contains_key("checked");

                let id = self.create_element(parent, el)?;
                for child in &source.children {
                    self.append_subtree(id, child)?;
                }

                let value = initial_value(self, id, source)?;
                let el = self.element_mut(id)?;
                if source.controlled {
                    el.tracked_value = Some(value.clone());
                }
                el.value = value;
                Ok(id)
            }
        }
    }

    pub fn to_snapshot(&self) -> Option<SnapshotNode> {
        let top = self.children(self.root()).first().copied()?;
        self.node_to_snapshot(top)
    }

    fn node_to_snapshot(&self, id: NodeId) -> Option<SnapshotNode> {
        if let Ok(el) = self.element(id) {
            let is_control = matches!(el.tag.as_str(), "input" | "textarea" | "select");
            // Textarea value is carried explicitly; its initial text is dropped.
            let children = if el.tag == "textarea" {
                Vec::new()
            } else {
                self.children(id)
                    .iter()
                    .filter_map(|c| self.node_to_snapshot(*c))
                    .collect()
            };
            return Some(SnapshotNode::Element(SnapshotElement {
                tag: el.tag.clone(),
                attrs: el.attrs.clone(),
                style: el.style.clone(),
                layout: el.layout,
                value: is_control.then(|| el.value.clone()),
                checked: el.checked,
                controlled: el.tracked_value.is_some(),
                children,
            }));
        }

        self.text_node(id).map(|text| SnapshotNode::Text {
            text: text.to_string(),
        })
    }

    fn text_node(&self, id: NodeId) -> Option<&str> {
        match self.node_kind(id)? {
            NodeKind::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

fn initial_value(doc: &Document, id: NodeId, source: &SnapshotElement) -> Result<String, DomError> {
    if let Some(value) = &source.value {
        return Ok(value.clone());
    }

    match source.tag.to_ascii_lowercase().as_str() {
        "textarea" => Ok(doc.text_content(id)),
        "select" => {
            let options = doc.options(id)?;
            Ok(options
                .iter()
                .find(|o| doc.has_attr(o.node, "selected"))
                .or(options.first())
                .map(|o| o.value.clone())
                .unwrap_or_default())
        }
        _ => Ok(source.attrs.get("value").cloned().unwrap_or_default()),
    }
}
