//! # Host Document
//!
//! A single-threaded node arena standing in for the page's document object
//! model. [`Document`] is a cheap-clone handle; every clone sees the same tree.
//!
//! Nodes are never freed: removing a node detaches it, and its [`NodeId`]
//! stays valid so it can be re-inserted (slot projection relies on this).
//!
//! Custom elements plug in through [`ElementHooks`], stored as a weak
//! reference on the node. The document calls the hooks for:
//!
//! - connection and disconnection (insertion under / removal from the root)
//! - attribute changes, only when the stored value actually changes
//! - property reads and writes, before falling back to the node's own map

use crate::event::{Event, Listener, ListenerId};
use crate::scheduler::Scheduler;
use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{trace, warn};
use webcell_expression::Value;

/// Index of a node in its document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Document,
    Element,
    Text,
    Comment,
    Fragment,
}

/// Lifecycle and property interception for upgraded custom elements.
pub trait ElementHooks {
    /// Lets the element layer recover its concrete host from the node.
    fn as_any(&self) -> &dyn Any;

    fn connected(&self) {}

    fn disconnected(&self) {}

    fn attribute_changed(&self, name: &str, old: Option<&str>, new: Option<&str>);

    /// Intercept a property read. `None` falls through to the node.
    fn get_property(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Intercept a property write. `false` falls through to the node.
    fn set_property(&self, _name: &str, _value: &Value) -> bool {
        false
    }
}

/// One recorded change to the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Every `set_attribute` call is recorded, even when the value is unchanged.
    AttributeSet {
        node: NodeId,
        name: String,
        value: String,
    },
    AttributeRemoved {
        node: NodeId,
        name: String,
    },
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    CharacterData {
        node: NodeId,
        value: String,
    },
}

impl Mutation {
    /// True for attribute writes/removals on `node`.
    pub fn is_attribute_write_on(&self, node: NodeId) -> bool {
        match self {
            Mutation::AttributeSet { node: n, .. } | Mutation::AttributeRemoved { node: n, .. } => *n == node,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
enum Kind {
    Document,
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        properties: BTreeMap<String, Value>,
    },
    Text(String),
    Comment(String),
    Fragment,
}

struct Node {
    kind: Kind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<Listener>,
    hooks: Option<Weak<dyn ElementHooks>>,
}

impl Node {
    fn new(kind: Kind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
            hooks: None,
        }
    }
}

struct Tree {
    nodes: Vec<Node>,
    mutations: Vec<Mutation>,
    next_listener: u64,
}

struct DocumentInner {
    tree: RefCell<Tree>,
    scheduler: Scheduler,
}

/// Shared handle to a document tree.
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

/// Non-owning document handle, for callbacks stored inside the tree.
#[derive(Clone)]
pub struct WeakDocument {
    inner: Weak<DocumentInner>,
}

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.inner.upgrade().map(|inner| Document { inner })
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.tree().nodes.len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::with_scheduler(Scheduler::new())
    }

    /// Document sharing an existing microtask queue.
    pub fn with_scheduler(scheduler: Scheduler) -> Self {
        Self {
            inner: Rc::new(DocumentInner {
                tree: RefCell::new(Tree {
                    nodes: vec![Node::new(Kind::Document)],
                    mutations: Vec::new(),
                    next_listener: 0,
                }),
                scheduler,
            }),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn tree(&self) -> Ref<'_, Tree> {
        self.inner.tree.borrow()
    }

    fn tree_mut(&self) -> RefMut<'_, Tree> {
        self.inner.tree.borrow_mut()
    }

    fn alloc(&self, kind: Kind) -> NodeId {
        let mut tree = self.tree_mut();
        tree.nodes.push(Node::new(kind));
        NodeId(tree.nodes.len() - 1)
    }

    // Node creation

    /// Create a detached element. Tag names are lowercased.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.alloc(Kind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            properties: BTreeMap::new(),
        })
    }

    pub fn create_text(&self, text: &str) -> NodeId {
        self.alloc(Kind::Text(text.to_string()))
    }

    pub fn create_comment(&self, text: &str) -> NodeId {
        self.alloc(Kind::Comment(text.to_string()))
    }

    pub fn create_fragment(&self) -> NodeId {
        self.alloc(Kind::Fragment)
    }

    // Inspection

    pub fn node_type(&self, id: NodeId) -> NodeType {
        match self.tree().nodes[id.0].kind {
            Kind::Document => NodeType::Document,
            Kind::Element { .. } => NodeType::Element,
            Kind::Text(_) => NodeType::Text,
            Kind::Comment(_) => NodeType::Comment,
            Kind::Fragment => NodeType::Fragment,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.node_type(id) == NodeType::Element
    }

    pub fn tag_name(&self, id: NodeId) -> Option<String> {
        match &self.tree().nodes[id.0].kind {
            Kind::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    /// Data of a text or comment node.
    pub fn text(&self, id: NodeId) -> Option<String> {
        match &self.tree().nodes[id.0].kind {
            Kind::Text(text) | Kind::Comment(text) => Some(text.clone()),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree().nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.tree().nodes[id.0].children.clone()
    }

    /// All descendants in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let tree = self.tree();
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = tree.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(tree.nodes[next.0].children.iter().rev().copied());
        }
        out
    }

    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut nodes = vec![id];
        nodes.extend(self.descendants(id));
        nodes
    }

    /// True when `node` is `ancestor` or inside it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let tree = self.tree();
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = tree.nodes[id.0].parent;
        }
        false
    }

    /// True when the node is attached under the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.root(), id)
    }

    // Tree mutation

    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `child` before `reference` (or at the end). Inserting a
    /// fragment moves the fragment's children instead.
    pub fn insert_before(&self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        let nodes = if self.node_type(child) == NodeType::Fragment {
            self.children(child)
        } else {
            vec![child]
        };
        for node in nodes {
            self.insert_one(parent, node, reference);
        }
    }

    fn insert_one(&self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if self.contains(child, parent) {
            warn!(parent = %parent, child = %child, "refusing to insert a node into its own subtree");
            return;
        }

        let was_connected = self.is_connected(child);
        self.detach(child);
        if was_connected {
            self.notify_disconnected(child);
        }

        {
            let mut guard = self.tree_mut();
            let tree = &mut *guard;
            let siblings = &mut tree.nodes[parent.0].children;
            let index = reference
                .and_then(|r| siblings.iter().position(|c| *c == r))
                .unwrap_or(siblings.len());
            siblings.insert(index, child);
            tree.nodes[child.0].parent = Some(parent);
            tree.mutations.push(Mutation::ChildList {
                target: parent,
                added: vec![child],
                removed: Vec::new(),
            });
        }

        if self.is_connected(child) {
            self.notify_connected(child);
        }
    }

    fn detach(&self, child: NodeId) -> bool {
        let mut guard = self.tree_mut();
        let tree = &mut *guard;
        let Some(parent) = tree.nodes[child.0].parent.take() else {
            return false;
        };
        tree.nodes[parent.0].children.retain(|c| *c != child);
        tree.mutations.push(Mutation::ChildList {
            target: parent,
            added: Vec::new(),
            removed: vec![child],
        });
        true
    }

    /// Detach a node from its parent.
    pub fn remove(&self, id: NodeId) {
        let was_connected = self.is_connected(id);
        if self.detach(id) && was_connected {
            self.notify_disconnected(id);
        }
    }

    /// Replace `old` with `replacements`, in order.
    pub fn replace_with(&self, old: NodeId, replacements: &[NodeId]) {
        let Some(parent) = self.parent(old) else {
            return;
        };
        for node in replacements {
            self.insert_before(parent, *node, Some(old));
        }
        self.remove(old);
    }

    /// Detach every child; returns the removed nodes.
    pub fn clear_children(&self, id: NodeId) -> Vec<NodeId> {
        let children = self.children(id);
        for child in &children {
            self.remove(*child);
        }
        children
    }

    /// Copy a node. Attributes are copied; properties, listeners and hooks are not.
    pub fn clone_node(&self, id: NodeId, deep: bool) -> NodeId {
        let kind = match &self.tree().nodes[id.0].kind {
            Kind::Element {
                tag, attributes, ..
            } => Kind::Element {
                tag: tag.clone(),
                attributes: attributes.clone(),
                properties: BTreeMap::new(),
            },
            Kind::Document => Kind::Fragment,
            other => other.clone(),
        };
        let copy = self.alloc(kind);
        if deep {
            for child in self.children(id) {
                let child_copy = self.clone_node(child, true);
                self.append_child(copy, child_copy);
            }
        }
        copy
    }

    // Lifecycle notifications

    fn hooks_in(&self, id: NodeId) -> Vec<(NodeId, Rc<dyn ElementHooks>)> {
        self.subtree(id)
            .into_iter()
            .filter_map(|node| self.hooks(node).map(|hooks| (node, hooks)))
            .collect()
    }

    fn notify_connected(&self, id: NodeId) {
        for (node, hooks) in self.hooks_in(id) {
            // Earlier callbacks may have moved this node again
            if self.is_connected(node) {
                hooks.connected();
            }
        }
    }

    fn notify_disconnected(&self, id: NodeId) {
        for (node, hooks) in self.hooks_in(id) {
            if !self.is_connected(node) {
                hooks.disconnected();
            }
        }
    }

    pub fn set_hooks(&self, id: NodeId, hooks: Weak<dyn ElementHooks>) {
        self.tree_mut().nodes[id.0].hooks = Some(hooks);
    }

    pub fn clear_hooks(&self, id: NodeId) {
        self.tree_mut().nodes[id.0].hooks = None;
    }

    pub fn hooks(&self, id: NodeId) -> Option<Rc<dyn ElementHooks>> {
        self.tree().nodes[id.0].hooks.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_upgraded(&self, id: NodeId) -> bool {
        self.hooks(id).is_some()
    }

    // Attributes

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        match &self.tree().nodes[id.0].kind {
            Kind::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Attributes in insertion order.
    pub fn attributes(&self, id: NodeId) -> Vec<(String, String)> {
        match &self.tree().nodes[id.0].kind {
            Kind::Element { attributes, .. } => attributes.clone(),
            _ => Vec::new(),
        }
    }

    pub fn set_attribute(&self, id: NodeId, name: &str, value: &str) {
        let (old, hooks) = {
            let mut guard = self.tree_mut();
            let tree = &mut *guard;
            let node = &mut tree.nodes[id.0];
            let Kind::Element { attributes, .. } = &mut node.kind else {
                return;
            };
            tree.mutations.push(Mutation::AttributeSet {
                node: id,
                name: name.to_string(),
                value: value.to_string(),
            });
            let old = match attributes.iter_mut().find(|(n, _)| n == name) {
                Some((_, existing)) => {
                    if existing.as_str() == value {
                        return;
                    }
                    Some(std::mem::replace(existing, value.to_string()))
                }
                None => {
                    attributes.push((name.to_string(), value.to_string()));
                    None
                }
            };
            (old, node.hooks.as_ref().and_then(Weak::upgrade))
        };

        if let Some(hooks) = hooks {
            hooks.attribute_changed(name, old.as_deref(), Some(value));
        }
    }

    pub fn remove_attribute(&self, id: NodeId, name: &str) {
        let (old, hooks) = {
            let mut guard = self.tree_mut();
            let tree = &mut *guard;
            let node = &mut tree.nodes[id.0];
            let Kind::Element { attributes, .. } = &mut node.kind else {
                return;
            };
            let Some(index) = attributes.iter().position(|(n, _)| n == name) else {
                return;
            };
            let (_, old) = attributes.remove(index);
            tree.mutations.push(Mutation::AttributeRemoved {
                node: id,
                name: name.to_string(),
            });
            (old, node.hooks.as_ref().and_then(Weak::upgrade))
        };

        if let Some(hooks) = hooks {
            hooks.attribute_changed(name, Some(&old), None);
        }
    }

    // Properties

    /// Read a DOM property, through the element's hooks first.
    pub fn property(&self, id: NodeId, name: &str) -> Value {
        if let Some(value) = self.hooks(id).and_then(|hooks| hooks.get_property(name)) {
            return value;
        }
        match name {
            "className" => Value::String(self.attribute(id, "class").unwrap_or_default()),
            "htmlFor" => Value::String(self.attribute(id, "for").unwrap_or_default()),
            "id" => Value::String(self.attribute(id, "id").unwrap_or_default()),
            "textContent" => Value::String(self.text_content(id)),
            "tagName" => self
                .tag_name(id)
                .map(|tag| Value::String(tag.to_ascii_uppercase()))
                .unwrap_or_default(),
            _ => match &self.tree().nodes[id.0].kind {
                Kind::Element { properties, .. } => properties.get(name).cloned().unwrap_or_default(),
                _ => Value::Undefined,
            },
        }
    }

    /// Write a DOM property, through the element's hooks first.
    pub fn set_property(&self, id: NodeId, name: &str, value: Value) {
        if let Some(hooks) = self.hooks(id) {
            if hooks.set_property(name, &value) {
                return;
            }
        }
        let text = || {
            if value.is_nullish() {
                String::new()
            } else {
                value.to_display_string()
            }
        };
        match name {
            "className" => self.set_attribute(id, "class", &text()),
            "htmlFor" => self.set_attribute(id, "for", &text()),
            "id" => self.set_attribute(id, "id", &text()),
            "textContent" => self.set_text_content(id, &text()),
            _ => {
                if let Kind::Element { properties, .. } = &mut self.tree_mut().nodes[id.0].kind {
                    properties.insert(name.to_string(), value);
                }
            }
        }
    }

    // Text

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        match &self.tree().nodes[id.0].kind {
            Kind::Text(text) | Kind::Comment(text) => return text.clone(),
            _ => {}
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|node| match self.node_type(node) {
                NodeType::Text => self.text(node),
                _ => None,
            })
            .collect()
    }

    /// Set character data, or replace an element's children with one text node.
    pub fn set_text_content(&self, id: NodeId, text: &str) {
        let is_data = {
            let mut guard = self.tree_mut();
            let tree = &mut *guard;
            match &mut tree.nodes[id.0].kind {
                Kind::Text(data) | Kind::Comment(data) => {
                    if data.as_str() != text {
                        *data = text.to_string();
                        tree.mutations.push(Mutation::CharacterData {
                            node: id,
                            value: text.to_string(),
                        });
                    }
                    true
                }
                _ => false,
            }
        };
        if is_data {
            return;
        }
        self.clear_children(id);
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node);
        }
    }

    // Events

    pub fn add_event_listener(&self, id: NodeId, event_type: &str, callback: impl Fn(&Event) + 'static) -> ListenerId {
        let mut tree = self.tree_mut();
        tree.next_listener += 1;
        let listener_id = ListenerId(tree.next_listener);
        tree.nodes[id.0].listeners.push(Listener {
            id: listener_id,
            event_type: event_type.to_string(),
            callback: Rc::new(callback),
        });
        listener_id
    }

    /// Returns whether the listener was registered.
    pub fn remove_event_listener(&self, id: NodeId, listener: ListenerId) -> bool {
        let mut tree = self.tree_mut();
        let listeners = &mut tree.nodes[id.0].listeners;
        let before = listeners.len();
        listeners.retain(|l| l.id != listener);
        before != listeners.len()
    }

    pub fn listener_count(&self, id: NodeId, event_type: &str) -> usize {
        self.tree().nodes[id.0]
            .listeners
            .iter()
            .filter(|l| l.event_type == event_type)
            .count()
    }

    fn has_listener(&self, id: NodeId, listener: ListenerId) -> bool {
        self.tree().nodes[id.0].listeners.iter().any(|l| l.id == listener)
    }

    /// Dispatch to the target's listeners, then up the ancestor chain when
    /// the event bubbles. Returns `false` if the default was prevented.
    pub fn dispatch_event(&self, target: NodeId, event: &Event) -> bool {
        trace!(event = event.event_type(), target = %target, "dispatch");
        event.target.set(Some(target));

        let mut path = vec![target];
        if event.bubbles() {
            let mut current = self.parent(target);
            while let Some(node) = current {
                path.push(node);
                current = self.parent(node);
            }
        }

        for node in path {
            // Snapshot so listeners may mutate the tree
            let listeners: Vec<Listener> = self.tree().nodes[node.0]
                .listeners
                .iter()
                .filter(|l| l.event_type == event.event_type())
                .cloned()
                .collect();

            event.current_target.set(Some(node));
            for listener in listeners {
                if self.has_listener(node, listener.id) {
                    (listener.callback)(event);
                }
            }
            if event.propagation_stopped() {
                break;
            }
        }

        event.current_target.set(None);
        !event.default_prevented()
    }

    // Mutation log

    /// Drain recorded mutations.
    pub fn take_mutations(&self) -> Vec<Mutation> {
        std::mem::take(&mut self.tree_mut().mutations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct Recorder {
        log: RefCell<Vec<String>>,
        intercept: Cell<bool>,
    }

    impl ElementHooks for Recorder {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn connected(&self) {
            self.log.borrow_mut().push("connected".into());
        }

        fn disconnected(&self) {
            self.log.borrow_mut().push("disconnected".into());
        }

        fn attribute_changed(&self, name: &str, old: Option<&str>, new: Option<&str>) {
            self.log
                .borrow_mut()
                .push(format!("{}: {:?} -> {:?}", name, old, new));
        }

        fn set_property(&self, name: &str, value: &Value) -> bool {
            if self.intercept.get() {
                self.log.borrow_mut().push(format!("set {} = {}", name, value));
            }
            self.intercept.get()
        }
    }

    #[test]
    fn test_attribute_hooks_fire_only_on_change() {
        let doc = Document::new();
        let el = doc.create_element("x-widget");
        let recorder = Rc::new(Recorder::default());
        let weak: Weak<dyn ElementHooks> = Rc::downgrade(&(recorder.clone() as Rc<dyn ElementHooks>));
        doc.set_hooks(el, weak);

        doc.set_attribute(el, "count", "1");
        doc.set_attribute(el, "count", "1");
        doc.set_attribute(el, "count", "2");
        doc.remove_attribute(el, "count");
        doc.remove_attribute(el, "count");

        assert_eq!(
            *recorder.log.borrow(),
            vec![
                "count: None -> Some(\"1\")",
                "count: Some(\"1\") -> Some(\"2\")",
                "count: Some(\"2\") -> None",
            ]
        );

        // Redundant writes are still visible in the mutation log
        let writes = doc
            .take_mutations()
            .into_iter()
            .filter(|m| m.is_attribute_write_on(el))
            .count();
        assert_eq!(writes, 4);
    }

    #[test]
    fn test_connect_and_disconnect_notifications() {
        let doc = Document::new();
        let wrapper = doc.create_element("div");
        let el = doc.create_element("x-widget");
        doc.append_child(wrapper, el);

        let recorder = Rc::new(Recorder::default());
        let hooks: Rc<dyn ElementHooks> = recorder.clone();
        doc.set_hooks(el, Rc::downgrade(&hooks));

        doc.append_child(doc.root(), wrapper);
        assert!(doc.is_connected(el));
        doc.remove(wrapper);
        assert!(!doc.is_connected(el));

        assert_eq!(*recorder.log.borrow(), vec!["connected", "disconnected"]);
    }

    #[test]
    fn test_property_interception_and_reserved_names() {
        let doc = Document::new();
        let el = doc.create_element("label");

        doc.set_property(el, "className", Value::from("title"));
        doc.set_property(el, "htmlFor", Value::from("name"));
        doc.set_property(el, "value", Value::Number(3.0));
        assert_eq!(doc.attribute(el, "class").as_deref(), Some("title"));
        assert_eq!(doc.attribute(el, "for").as_deref(), Some("name"));
        assert_eq!(doc.property(el, "value"), Value::Number(3.0));

        let recorder = Rc::new(Recorder::default());
        recorder.intercept.set(true);
        let hooks: Rc<dyn ElementHooks> = recorder.clone();
        doc.set_hooks(el, Rc::downgrade(&hooks));
        doc.set_property(el, "value", Value::Number(4.0));
        assert_eq!(doc.property(el, "value"), Value::Number(3.0));
        assert_eq!(*recorder.log.borrow(), vec!["set value = 4"]);
    }

    #[test]
    fn test_dispatch_bubbles_and_reports_prevent_default() {
        let doc = Document::new();
        let parent = doc.create_element("div");
        let child = doc.create_element("button");
        doc.append_child(parent, child);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        doc.add_event_listener(child, "click", move |event| {
            s.borrow_mut().push(("child", event.current_target()));
        });
        let s = seen.clone();
        doc.add_event_listener(parent, "click", move |event| {
            s.borrow_mut().push(("parent", event.current_target()));
            event.prevent_default();
        });

        assert!(doc.dispatch_event(child, &Event::new("click")));
        assert_eq!(seen.borrow().len(), 1);

        let allowed = doc.dispatch_event(child, &Event::new("click").bubbling().cancelable());
        assert!(!allowed);
        assert_eq!(
            seen.borrow()[1..],
            [("child", Some(child)), ("parent", Some(parent))]
        );
    }

    #[test]
    fn test_listener_removed_during_dispatch_does_not_fire() {
        let doc = Document::new();
        let el = doc.create_element("div");
        let fired = Rc::new(Cell::new(0));

        let second: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let (d, s) = (doc.clone(), second.clone());
        doc.add_event_listener(el, "ping", move |_| {
            if let Some(id) = s.get() {
                d.remove_event_listener(el, id);
            }
        });
        let f = fired.clone();
        second.set(Some(doc.add_event_listener(el, "ping", move |_| f.set(f.get() + 1))));

        doc.dispatch_event(el, &Event::new("ping"));
        assert_eq!(fired.get(), 0);
        assert_eq!(doc.listener_count(el, "ping"), 1);
    }

    #[test]
    fn test_fragment_insertion_moves_children() {
        let doc = Document::new();
        let fragment = doc.create_fragment();
        let a = doc.create_text("a");
        let b = doc.create_element("b");
        doc.append_child(fragment, a);
        doc.append_child(fragment, b);

        let host = doc.create_element("div");
        let marker = doc.create_comment("marker");
        doc.append_child(host, marker);
        doc.insert_before(host, fragment, Some(marker));

        assert_eq!(doc.children(host), vec![a, b, marker]);
        assert!(doc.children(fragment).is_empty());
    }

    #[test]
    fn test_replace_with_and_clone() {
        let doc = Document::new();
        let host = doc.create_element("div");
        let slot = doc.create_element("slot");
        doc.append_child(host, slot);
        let text = doc.create_text("hello");
        doc.replace_with(slot, &[text]);
        assert_eq!(doc.children(host), vec![text]);
        assert_eq!(doc.parent(slot), None);

        doc.set_attribute(host, "class", "box");
        let copy = doc.clone_node(host, true);
        assert_eq!(doc.attribute(copy, "class").as_deref(), Some("box"));
        assert_eq!(doc.text_content(copy), "hello");
        assert_ne!(doc.children(copy), doc.children(host));
    }

    #[test]
    fn test_set_text_content_on_element() {
        let doc = Document::new();
        let el = doc.create_element("p");
        doc.append_child(el, doc.create_element("b"));
        doc.set_text_content(el, "plain");
        assert_eq!(doc.children(el).len(), 1);
        assert_eq!(doc.text_content(el), "plain");
    }
}
