//! Virtual nodes and the render backend contract.
//!
//! A reactive component describes its output as a [`VNode`] tree; a
//! [`RenderBackend`] commits that tree into a target element.

use crate::document::{Document, NodeId};
use crate::event::Event;
use std::fmt;
use std::rc::Rc;
use webcell_expression::Value;

/// Event handler attached to a virtual element.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Event)>);

impl Handler {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}

/// Virtual DOM node
#[derive(Debug, Clone)]
pub enum VNode {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        properties: Vec<(String, Value)>,
        handlers: Vec<(String, Handler)>,
        children: Vec<VNode>,
        /// Explicit key for list items
        key: Option<String>,
    },

    Text { content: String },

    Comment { content: String },
}

impl VNode {
    pub fn element(tag: impl Into<String>) -> Self {
        VNode::Element {
            tag: tag.into(),
            attributes: Vec::new(),
            properties: Vec::new(),
            handlers: Vec::new(),
            children: Vec::new(),
            key: None,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text {
            content: content.into(),
        }
    }

    pub fn comment(content: impl Into<String>) -> Self {
        VNode::Comment {
            content: content.into(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let VNode::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.push((key.into(), value.into()));
        }
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        if let VNode::Element {
            ref mut properties, ..
        } = self
        {
            properties.push((key.into(), value));
        }
        self
    }

    pub fn on(mut self, event: impl Into<String>, handler: impl Fn(&Event) + 'static) -> Self {
        if let VNode::Element {
            ref mut handlers, ..
        } = self
        {
            handlers.push((event.into(), Handler::new(handler)));
        }
        self
    }

    pub fn with_child(mut self, child: VNode) -> Self {
        if let VNode::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, new_children: Vec<VNode>) -> Self {
        if let VNode::Element {
            ref mut children, ..
        } = self
        {
            children.extend(new_children);
        }
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        if let VNode::Element {
            key: ref mut node_key,
            ..
        } = self
        {
            *node_key = Some(key.into());
        }
        self
    }

    /// Build real nodes for this tree. The result is detached.
    pub fn materialize(&self, doc: &Document) -> NodeId {
        match self {
            VNode::Text { content } => doc.create_text(content),
            VNode::Comment { content } => doc.create_comment(content),
            VNode::Element {
                tag,
                attributes,
                properties,
                handlers,
                children,
                ..
            } => {
                let element = doc.create_element(tag);
                for (name, value) in attributes {
                    doc.set_attribute(element, name, value);
                }
                for (name, value) in properties {
                    doc.set_property(element, name, value.clone());
                }
                for (event, handler) in handlers {
                    let handler = handler.clone();
                    doc.add_event_listener(element, event, move |e| handler.call(e));
                }
                for child in children {
                    let node = child.materialize(doc);
                    doc.append_child(element, node);
                }
                element
            }
        }
    }
}

/// Commits virtual trees into the document.
pub trait RenderBackend {
    /// Render `tree` as the content of `target`; returns the top-level nodes.
    fn render(&self, tree: &[VNode], target: NodeId, doc: &Document) -> Vec<NodeId>;

    /// Remove whatever was rendered into `target`.
    fn unmount(&self, target: NodeId, doc: &Document) {
        doc.clear_children(target);
    }
}

/// Backend that discards the previous output and materialises the new tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceChildren;

impl RenderBackend for ReplaceChildren {
    fn render(&self, tree: &[VNode], target: NodeId, doc: &Document) -> Vec<NodeId> {
        doc.clear_children(target);
        tree.iter()
            .map(|node| {
                let id = node.materialize(doc);
                doc.append_child(target, id);
                id
            })
            .collect()
    }
}
