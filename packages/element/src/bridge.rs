//! Virtual-DOM bridge: mounts a [`ReactiveComponent`] through a
//! [`RenderBackend`] and keeps the [`AdapterHandle`] current.

use crate::handle::AdapterHandle;
use crate::property_bag::PropertyBag;
use std::fmt;
use std::rc::Rc;
use webcell_dom::{Document, NodeId, RenderBackend, ReplaceChildren, VNode};
use webcell_expression::{Object, Value};

/// A component that renders virtual nodes from properties and its own state.
pub trait ReactiveComponent {
    /// State created on first mount.
    fn initial_state(&self, _props: &PropertyBag) -> Object {
        Object::new()
    }

    fn render(&self, cx: &RenderContext<'_>) -> Vec<VNode>;
}

/// Inputs of one render call.
pub struct RenderContext<'a> {
    props: &'a PropertyBag,
    state: &'a Object,
    handle: &'a AdapterHandle,
    document: &'a Document,
}

impl<'a> RenderContext<'a> {
    pub fn props(&self) -> &PropertyBag {
        self.props
    }

    pub fn prop(&self, name: &str) -> Value {
        self.props.get(name)
    }

    pub fn state(&self) -> &Object {
        self.state
    }

    /// The property when the host forwards one, otherwise the component's own state.
    pub fn value(&self, name: &str) -> Value {
        match self.props.get(name) {
            Value::Undefined => self.state.get(name).cloned().unwrap_or_default(),
            value => value,
        }
    }

    /// Owned handle, for event handlers that update state later.
    pub fn handle(&self) -> AdapterHandle {
        self.handle.clone()
    }

    pub fn document(&self) -> &Document {
        self.document
    }
}

/// Renders a reactive component into a host element.
#[derive(Clone)]
pub struct VirtualDomBridge {
    component: Rc<dyn ReactiveComponent>,
    backend: Rc<dyn RenderBackend>,
}

impl fmt::Debug for VirtualDomBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VirtualDomBridge")
    }
}

impl VirtualDomBridge {
    pub fn new(component: impl ReactiveComponent + 'static) -> Self {
        Self {
            component: Rc::new(component),
            backend: Rc::new(ReplaceChildren),
        }
    }

    pub fn with_backend(mut self, backend: impl RenderBackend + 'static) -> Self {
        self.backend = Rc::new(backend);
        self
    }

    /// Render and commit; the handle holds `{properties, state}` afterwards.
    pub fn render(&self, doc: &Document, target: NodeId, props: &PropertyBag, handle: &AdapterHandle) -> Vec<NodeId> {
        if !handle.is_mounted() {
            handle.commit(props.to_object(), self.component.initial_state(props));
        }

        let state = handle.state();
        let tree = self.component.render(&RenderContext {
            props,
            state: &state,
            handle,
            document: doc,
        });
        let nodes = self.backend.render(&tree, target, doc);

        handle.commit(props.to_object(), handle.state());
        nodes
    }

    pub fn unmount(&self, doc: &Document, target: NodeId, handle: &AdapterHandle) {
        self.backend.unmount(target, doc);
        handle.reset();
    }
}
