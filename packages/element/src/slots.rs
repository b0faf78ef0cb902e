//! Slot projection: light-DOM children captured at connection and
//! relocated into `<slot>` placeholders of the rendered output.

use std::collections::BTreeMap;
use tracing::{debug, warn};
use webcell_dom::{parse_fragment, Document, NodeId, NodeType};

pub const DEFAULT_SLOT: &str = "default";

/// One captured piece of light DOM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotContent {
    Node(NodeId),
    /// Raw markup from a `<script type="text/template">` child, parsed on projection
    Template(String),
}

#[derive(Debug, Default)]
pub struct Slots {
    named: BTreeMap<String, Vec<SlotContent>>,
    default: Vec<SlotContent>,
    /// The host's children as grabbed, in order
    light: Vec<NodeId>,
}

/// `<script type="text/template">`
pub fn is_template_marker(doc: &Document, node: NodeId) -> bool {
    doc.tag_name(node).as_deref() == Some("script")
        && doc.attribute(node, "type").as_deref() == Some("text/template")
}

fn is_blank_text(doc: &Document, node: NodeId) -> bool {
    doc.node_type(node) == NodeType::Text && doc.text(node).map_or(true, |t| t.trim().is_empty())
}

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the host's children out and file them by their `slot` attribute.
    pub fn grab(doc: &Document, host: NodeId) -> Self {
        let mut slots = Slots::new();
        for child in doc.children(host) {
            doc.remove(child);
            slots.light.push(child);
            let content = if is_template_marker(doc, child) {
                SlotContent::Template(doc.text_content(child))
            } else {
                SlotContent::Node(child)
            };
            match doc.attribute(child, "slot") {
                Some(name) if !name.is_empty() => slots.named.entry(name).or_default().push(content),
                _ => slots.default.push(content),
            }
        }
        debug!(
            named = slots.named.len(),
            default = slots.default.len(),
            "captured light DOM"
        );
        slots
    }

    pub fn named(&self, name: &str) -> Option<&[SlotContent]> {
        if name == DEFAULT_SLOT {
            return Some(self.default.as_slice());
        }
        self.named.get(name).map(Vec::as_slice)
    }

    pub fn default_content(&self) -> &[SlotContent] {
        &self.default
    }

    pub fn names(&self) -> Vec<String> {
        self.named.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.default.is_empty()
    }

    pub fn clear(&mut self) {
        self.named.clear();
        self.default.clear();
        self.light.clear();
    }

    /// Move the grabbed children back under `host`, wherever they were projected.
    pub fn restore(&self, doc: &Document, host: NodeId) {
        for node in &self.light {
            doc.append_child(host, *node);
        }
    }

    /// Replace every placeholder under `root` with captured content and
    /// return the projected nodes.
    ///
    /// With `clone` set the captured nodes stay untouched and copies are
    /// projected. A named placeholder with nothing captured adopts its own
    /// fallback children as the slot content.
    pub fn apply(&mut self, doc: &Document, root: NodeId, clone: bool) -> Vec<NodeId> {
        let mut projected = Vec::new();

        for placeholder in placeholders(doc, root) {
            let name = doc.attribute(placeholder, "name").filter(|n| !n.is_empty());
            let contents = match &name {
                Some(name) => match self.named.get(name) {
                    Some(contents) => contents.clone(),
                    None => {
                        let fallback: Vec<SlotContent> = doc
                            .children(placeholder)
                            .into_iter()
                            .map(SlotContent::Node)
                            .collect();
                        self.named.insert(name.clone(), fallback.clone());
                        fallback
                    }
                },
                None if !self.default.is_empty() => self.default.clone(),
                None => doc.children(placeholder).into_iter().map(SlotContent::Node).collect(),
            };

            let nodes: Vec<NodeId> = contents
                .iter()
                .flat_map(|content| instantiate(doc, content, clone))
                .filter(|node| !is_blank_text(doc, *node))
                .collect();
            doc.replace_with(placeholder, &nodes);
            projected.extend(nodes);
        }

        projected
    }
}

fn instantiate(doc: &Document, content: &SlotContent, clone: bool) -> Vec<NodeId> {
    match content {
        SlotContent::Node(node) if clone => vec![doc.clone_node(*node, true)],
        SlotContent::Node(node) => vec![*node],
        SlotContent::Template(markup) => match parse_fragment(doc, markup) {
            Ok(fragment) => doc.children(fragment),
            Err(error) => {
                warn!(%error, "failed to instantiate slot template");
                Vec::new()
            }
        },
    }
}

/// Placeholders owned by this render, in document order. Nested custom
/// elements keep their own placeholders.
fn placeholders(doc: &Document, root: NodeId) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut stack: Vec<NodeId> = doc.children(root).into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        match doc.tag_name(node) {
            Some(tag) if tag == "slot" => found.push(node),
            Some(tag) if tag.contains('-') => {}
            _ => stack.extend(doc.children(node).into_iter().rev()),
        }
    }
    found
}
