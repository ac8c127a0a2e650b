use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DomError;

// ============================================================================
// Arena document: the live page the fill engine reads and mutates
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
}

/// Subset of the computed style the visibility filter looks at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputedStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
}

impl ComputedStyle {
    pub fn is_empty(&self) -> bool {
        self.display.is_none() && self.visibility.is_none() && self.opacity.is_none()
    }
}

/// Bounding box size. Absent when the snapshot carries no layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutBox {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub style: ComputedStyle,
    pub layout: Option<LayoutBox>,
    pub value: String,
    pub checked: bool,
    /// Last value the page's framework saw (React-style value tracker).
    /// `None` for uncontrolled elements.
    pub tracked_value: Option<String>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            style: ComputedStyle::default(),
            layout: None,
            value: String::new(),
            checked: false,
            tracked_value: None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Input,
    Change,
    KeyDown,
    KeyUp,
    Focus,
    Blur,
    Click,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchedEvent {
    pub target: NodeId,
    pub kind: EventKind,
    /// Whether a framework value tracker registered a change on this event.
    pub observed_by_framework: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub node: NodeId,
    pub value: String,
    pub text: String,
}

/// Tags whose text never belongs to a surrounding label.
const CONTROL_TAGS: [&str; 3] = ["input", "textarea", "select"];

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    events: Vec<DispatchedEvent>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            root: NodeId(0),
            events: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.nodes.get(id.0).ok_or(DomError::MissingNode(id))
    }

    pub(crate) fn node_kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    pub fn element(&self, id: NodeId) -> Result<&Element, DomError> {
        match &self.node(id)?.kind {
            NodeKind::Element(el) => Ok(el),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, DomError> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.kind) {
            Some(NodeKind::Element(el)) => Ok(el),
            Some(_) => Err(DomError::NotAnElement(id)),
            None => Err(DomError::MissingNode(id)),
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_ok()
    }

    fn push_node(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId, DomError> {
        match self.node(parent)?.kind {
            NodeKind::Text(_) => return Err(DomError::NotAnElement(parent)),
            NodeKind::Document | NodeKind::Element(_) => {}
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    pub fn create_element(&mut self, parent: NodeId, element: Element) -> Result<NodeId, DomError> {
        self.push_node(parent, NodeKind::Element(element))
    }

    pub fn create_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, DomError> {
        self.push_node(parent, NodeKind::Text(text.to_string()))
    }

    // ------------------------------------------------------------------------
    // Tree navigation
    // ------------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.is_element(*p))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Element ancestors, nearest first. The document node is not included.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent_element(id);
        while let Some(p) = current {
            out.push(p);
            current = self.parent_element(p);
        }
        out
    }

    /// Element descendants in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if self.is_element(next) {
                out.push(next);
            }
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.root)
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|c| *c == id)?;
        siblings[..pos]
            .iter()
            .rev()
            .copied()
            .find(|s| self.is_element(*s))
    }

    /// Nearest ancestor with the given tag.
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.ancestors(id)
            .into_iter()
            .find(|a| self.tag(*a).is_ok_and(|t| t == tag))
    }

    pub fn element_by_id(&self, dom_id: &str) -> Option<NodeId> {
        if dom_id.is_empty() {
            return None;
        }
        self.elements()
            .into_iter()
            .find(|n| self.attr(*n, "id").ok().flatten() == Some(dom_id))
    }

    /// `label[for="<dom_id>"]` elements.
    pub fn labels_for(&self, dom_id: &str) -> Vec<NodeId> {
        if dom_id.is_empty() {
            return Vec::new();
        }
        self.elements()
            .into_iter()
            .filter(|n| {
                self.tag(*n).is_ok_and(|t| t == "label")
                    && self.attr(*n, "for").ok().flatten() == Some(dom_id)
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    pub fn tag(&self, id: NodeId) -> Result<&str, DomError> {
        Ok(self.element(id)?.tag.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Result<Option<&str>, DomError> {
        Ok(self.element(id)?.attr(name))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_ok_and(|el| el.has_attr(name))
    }

    /// `[class*="needle"]`
    pub fn class_contains(&self, id: NodeId, needle: &str) -> bool {
        self.attr(id, "class")
            .ok()
            .flatten()
            .is_some_and(|c| c.to_lowercase().contains(needle))
    }

    pub fn text_content(&self, id: NodeId) -> String {
        match self.nodes.get(id.0).map(|n| &n.kind) {
            Some(NodeKind::Text(text)) => text.clone(),
            Some(_) => self
                .children(id)
                .iter()
                .map(|c| self.text_content(*c))
                .collect(),
            None => String::new(),
        }
    }

    /// Text content with the subtrees of nested form controls left out.
    pub fn text_excluding_controls(&self, id: NodeId) -> String {
        match self.nodes.get(id.0).map(|n| &n.kind) {
            Some(NodeKind::Text(text)) => text.clone(),
            Some(NodeKind::Element(el)) if CONTROL_TAGS.contains(&el.tag.as_str()) => String::new(),
            Some(_) => self
                .children(id)
                .iter()
                .map(|c| self.text_excluding_controls(*c))
                .collect(),
            None => String::new(),
        }
    }

    pub fn value(&self, id: NodeId) -> Result<String, DomError> {
        Ok(self.element(id)?.value.clone())
    }

    /// `<option>` children of a select, including those inside `<optgroup>`.
    pub fn options(&self, select: NodeId) -> Result<Vec<SelectOption>, DomError> {
        self.element(select)?;
        Ok(self
            .descendants(select)
            .into_iter()
            .filter(|n| self.tag(*n).is_ok_and(|t| t == "option"))
            .map(|n| {
                let text = self.text_content(n).trim().to_string();
                let value = self
                    .attr(n, "value")
                    .ok()
                    .flatten()
                    .map(str::to_string)
                    .unwrap_or_else(|| text.clone());
                SelectOption {
                    node: n,
                    value,
                    text,
                }
            })
            .collect())
    }

    /// Native inputs use `checked`; ARIA widgets use `aria-checked`.
    pub fn is_checked(&self, id: NodeId) -> Result<bool, DomError> {
        let el = self.element(id)?;
        if el.tag == "input" {
            Ok(el.checked)
        } else {
            Ok(el.attr("aria-checked") == Some("true"))
        }
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.element_mut(id)?
            .attrs
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        self.element_mut(id)?.attrs.remove(name);
        Ok(())
    }

    pub fn set_style(&mut self, id: NodeId, style: ComputedStyle) -> Result<(), DomError> {
        self.element_mut(id)?.style = style;
        Ok(())
    }

    /// Assignment through the element instance (`el.value = v`). A framework
    /// value tracker intercepts this and records `v` as already seen.
    pub fn set_value_property(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        let el = self.element_mut(id)?;
        el.value = value.to_string();
        if el.tracked_value.is_some() {
            el.tracked_value = Some(value.to_string());
        }
        Ok(())
    }

    /// Assignment through the prototype-level setter, bypassing any
    /// instance interceptor. The tracker keeps its stale value, so the next
    /// `input`/`change` event is seen as a change.
    pub fn set_value_native(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        self.element_mut(id)?.value = value.to_string();
        Ok(())
    }

    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> Result<(), DomError> {
        let (is_input, is_radio, name) = {
            let el = self.element(id)?;
            (
                el.tag == "input",
                el.attr("type").is_some_and(|t| t.eq_ignore_ascii_case("radio")),
                el.attr("name").map(str::to_string),
            )
        };

        if !is_input {
            return self.set_attr(id, "aria-checked", if checked { "true" } else { "false" });
        }

        if checked && is_radio {
            if let Some(name) = name {
                let form = self.closest(id, "form");
                let group: Vec<NodeId> = self
                    .elements()
                    .into_iter()
                    .filter(|n| {
                        *n != id
                            && self
                                .attr(*n, "type")
                                .ok()
                                .flatten()
                                .is_some_and(|t| t.eq_ignore_ascii_case("radio"))
                            && self.attr(*n, "name").ok().flatten() == Some(name.as_str())
                            && self.closest(*n, "form") == form
                    })
                    .collect();
                for other in group {
                    self.element_mut(other)?.checked = false;
                }
            }
        }

        self.element_mut(id)?.checked = checked;
        Ok(())
    }

    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        self.element(id)?;
        let old = std::mem::take(&mut self.nodes[id.0].children);
        for child in old {
            self.nodes[child.0].parent = None;
        }
        if !text.is_empty() {
            self.create_text(id, text)?;
        }
        Ok(())
    }

    /// Dispatch an event at `id`. Returns whether a framework value tracker
    /// observed a value change.
    pub fn dispatch(&mut self, id: NodeId, kind: EventKind) -> Result<bool, DomError> {
        let el = self.element_mut(id)?;
        let observed = matches!(kind, EventKind::Input | EventKind::Change)
            && el.tracked_value.as_ref().is_some_and(|t| *t != el.value);
        if observed {
            el.tracked_value = Some(el.value.clone());
        }
        self.events.push(DispatchedEvent {
            target: id,
            kind,
            observed_by_framework: observed,
        });
        Ok(observed)
    }

    pub fn events(&self) -> &[DispatchedEvent] {
        &self.events
    }

    pub fn events_for(&self, id: NodeId) -> Vec<EventKind> {
        self.events
            .iter()
            .filter(|e| e.target == id)
            .map(|e| e.kind)
            .collect()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}
