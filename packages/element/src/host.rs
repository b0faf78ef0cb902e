//! # Host Element
//!
//! The reconciliation engine behind every upgraded custom element. A host
//! keeps two property bags:
//!
//! - **external**: the public value, reflected to attributes and handed out
//!   in output events
//! - **internal**: what the rendered subtree receives
//!
//! They differ when the mounted subtree owns a value as live state. State
//! flows bottom-up: an assignment to a state-owned name renders once with
//! the override (`pre-state-change`) and then hands the value back to the
//! subtree (`post-state-change`).
//!
//! Attribute changes, property writes and generic render requests are each
//! coalesced into one microtask per batch cycle.

use crate::batch::Batch;
use crate::binding::{Diagnostic, TemplateBinder};
use crate::bridge::VirtualDomBridge;
use crate::codec::{self, CodecContext, Decoded, Encoded, FunctionBridge};
use crate::component::{ComponentClass, ComponentKind};
use crate::config::{ComponentConfig, EventMapping, MapperOutcome, PropType};
use crate::handle::AdapterHandle;
use crate::naming::{camel_to_kebab, output_event_name};
use crate::property_bag::PropertyBag;
use crate::registry::WeakRegistry;
use crate::slots::Slots;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, instrument, warn};
use webcell_dom::{parse_fragment, Document, ElementHooks, Event, NodeId};
use webcell_expression::{EvalError, EvalResult, ExpressionCompiler, Object, Value};

/// Handle to an upgraded element. Cloning shares the element.
#[derive(Clone)]
pub struct HostElement {
    inner: Rc<HostInner>,
}

struct HostInner {
    this: Weak<HostInner>,
    class: ComponentClass,
    doc: Document,
    node: NodeId,
    registry: Option<WeakRegistry>,
    codec: CodecContext,
    internal: RefCell<PropertyBag>,
    external: RefCell<PropertyBag>,
    default_callbacks: Object,
    handle: AdapterHandle,
    slots: RefCell<Slots>,
    binder: RefCell<TemplateBinder>,
    /// Hosts upgraded inside this host's subtree; dropped once their node leaves it
    nested: RefCell<Vec<HostElement>>,
    attribute_batch: RefCell<Batch>,
    property_batch: RefCell<Batch>,
    render_batch: RefCell<Batch>,
    batching: Cell<bool>,
    suppress_attribute_echo: Cell<bool>,
    connected: Cell<bool>,
    instantiated: Cell<bool>,
    rendering: Cell<bool>,
    render_count: Cell<usize>,
    post_state_pending: Cell<bool>,
    takeover: RefCell<BTreeSet<String>>,
}

impl fmt::Debug for HostElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostElement")
            .field("class", &self.inner.class.name())
            .field("node", &self.inner.node)
            .field("connected", &self.inner.connected.get())
            .field("external", &*self.inner.external.borrow())
            .finish()
    }
}

impl HostElement {
    /// Upgrade `node` to a host of `class`. The host starts disconnected;
    /// inserting the node into the document connects it.
    pub fn new(class: ComponentClass, doc: &Document, node: NodeId) -> Self {
        Self::attach(class, doc, node, None)
    }

    pub(crate) fn attach(class: ComponentClass, doc: &Document, node: NodeId, registry: Option<WeakRegistry>) -> Self {
        let batching = class.config().batch_updates();
        let inner = Rc::new_cyclic(|this: &Weak<HostInner>| {
            let bridge: Weak<dyn FunctionBridge> = this.clone();
            let default_callbacks = class
                .config()
                .output_events()
                .into_iter()
                .map(|name| {
                    let callback = default_callback(this.clone(), &name);
                    (name, callback)
                })
                .collect();

            HostInner {
                this: this.clone(),
                class,
                doc: doc.clone(),
                node,
                registry,
                codec: CodecContext {
                    compiler: ExpressionCompiler::new(),
                    bridge: Some(bridge),
                },
                internal: RefCell::new(PropertyBag::new()),
                external: RefCell::new(PropertyBag::new()),
                default_callbacks,
                handle: AdapterHandle::new(),
                slots: RefCell::new(Slots::new()),
                binder: RefCell::new(TemplateBinder::default()),
                nested: RefCell::new(Vec::new()),
                attribute_batch: RefCell::new(Batch::new()),
                property_batch: RefCell::new(Batch::new()),
                render_batch: RefCell::new(Batch::new()),
                batching: Cell::new(batching),
                suppress_attribute_echo: Cell::new(false),
                connected: Cell::new(false),
                instantiated: Cell::new(false),
                rendering: Cell::new(false),
                render_count: Cell::new(0),
                post_state_pending: Cell::new(false),
                takeover: RefCell::new(BTreeSet::new()),
            }
        });

        let weak: Weak<HostInner> = Rc::downgrade(&inner);
        let hooks: Weak<dyn ElementHooks> = weak.clone();
        doc.set_hooks(node, hooks);

        inner.handle.on_state_change(move |_| {
            if let Some(inner) = weak.upgrade() {
                HostElement { inner }.request_render("state");
            }
        });

        let host = Self { inner };
        debug!(tag = %host.tag_name(), class = host.inner.class.name(), "element upgraded");
        host
    }

    /// The live host upgraded for `node`, if any.
    pub fn from_node(doc: &Document, node: NodeId) -> Option<HostElement> {
        let hooks = doc.hooks(node)?;
        let inner = hooks.as_any().downcast_ref::<HostInner>()?;
        inner.host()
    }

    pub fn node(&self) -> NodeId {
        self.inner.node
    }

    pub fn nested_hosts(&self) -> Vec<HostElement> {
        self.inner.nested.borrow().clone()
    }

    pub fn document(&self) -> &Document {
        &self.inner.doc
    }

    pub fn class(&self) -> &ComponentClass {
        &self.inner.class
    }

    pub fn config(&self) -> &ComponentConfig {
        self.inner.class.config()
    }

    pub fn handle(&self) -> &AdapterHandle {
        &self.inner.handle
    }

    pub fn tag_name(&self) -> String {
        self.inner.doc.tag_name(self.inner.node).unwrap_or_default()
    }

    /// Connected through the lifecycle and still attached to the document.
    pub fn is_connected(&self) -> bool {
        self.inner.connected.get() && self.inner.doc.is_connected(self.inner.node)
    }

    /// Completed render passes since creation.
    pub fn render_count(&self) -> usize {
        self.inner.render_count.get()
    }

    pub fn is_batching(&self) -> bool {
        self.inner.batching.get()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.inner.binder.borrow().diagnostics()
    }

    pub fn external_properties(&self) -> Object {
        self.inner.external.borrow().to_object()
    }

    pub fn internal_properties(&self) -> Object {
        self.inner.internal.borrow().to_object()
    }

    pub fn slot_names(&self) -> Vec<String> {
        self.inner.slots.borrow().names()
    }

    pub fn ptr_eq(&self, other: &HostElement) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn defer(&self, task: impl FnOnce(HostElement) + 'static) {
        let weak = Rc::downgrade(&self.inner);
        self.inner.doc.scheduler().queue_microtask(move || {
            if let Some(inner) = weak.upgrade() {
                task(HostElement { inner });
            }
        });
    }

    // Property access

    /// Live state of the mounted subtree first, then its committed
    /// property, then the external value.
    pub fn get_property(&self, name: &str) -> Value {
        if let Some(value) = self.state_value(name) {
            return value;
        }

        let pending = self.inner.property_batch.borrow().is_pending(name)
            || self.inner.attribute_batch.borrow().is_pending(name);
        if !pending {
            if let Some(value) = self.inner.handle.property(name) {
                if !value.is_undefined() {
                    return value;
                }
            }
        }

        self.inner.external.borrow().get(name)
    }

    fn state_value(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.inner.handle.state_value(name) {
            return Some(value);
        }
        match self.inner.handle.state_value("modelState") {
            Some(Value::Object(model)) => model.get(name).cloned(),
            _ => None,
        }
    }

    /// Current value of the subtree: live state, else committed property.
    fn adapter_value(&self, name: &str) -> Option<Value> {
        self.state_value(name)
            .or_else(|| self.inner.handle.property(name))
    }

    /// Write `name` (and its alias) into both bags, then schedule a render.
    pub fn set_property(&self, name: &str, value: Value) {
        let names = self.write(name, &value);
        debug!(tag = %self.tag_name(), property = name, "property set");

        if !self.inner.connected.get() {
            return;
        }

        if self.inner.batching.get() {
            let schedule = {
                let mut batch = self.inner.property_batch.borrow_mut();
                let mut schedule = false;
                for name in &names {
                    schedule |= batch.absorb(name, value.clone());
                }
                schedule
            };
            if schedule {
                debug!(tag = %self.tag_name(), "property batch scheduled");
                self.defer(|host| host.settle_property_batch());
            }
            return;
        }

        let state_owned = names.iter().any(|n| self.inner.handle.owns(n));
        if state_owned {
            self.inner.takeover.borrow_mut().extend(names);
            if !value.is_undefined() {
                self.render("pre-state-change");
                if !self.inner.post_state_pending.replace(true) {
                    self.defer(|host| host.finish_state_takeover());
                }
            } else if !self.inner.post_state_pending.get() {
                self.render("property");
            }
            return;
        }

        self.render("property");
        let patch: Object = names.into_iter().map(|n| (n, value.clone())).collect();
        self.reflect_external_properties(&patch);
        self.trigger_output_events();
    }

    /// Write into both bags for the alias group of `name`.
    fn write(&self, name: &str, value: &Value) -> Vec<String> {
        let names = self.config().alias_group(name);
        {
            let mut internal = self.inner.internal.borrow_mut();
            let mut external = self.inner.external.borrow_mut();
            for name in &names {
                internal.set(name.clone(), value.clone());
                external.set(name.clone(), value.clone());
            }
        }
        names
    }

    fn settle_property_batch(&self) {
        let patch = self.inner.property_batch.borrow_mut().settle();
        if !self.is_connected() {
            debug!(tag = %self.tag_name(), "element disconnected, property batch dropped");
            return;
        }
        self.render("properties");
        self.reflect_external_properties(&patch);
        self.trigger_output_events();
    }

    fn finish_state_takeover(&self) {
        self.inner.post_state_pending.set(false);
        let names = std::mem::take(&mut *self.inner.takeover.borrow_mut());
        if !self.is_connected() {
            return;
        }
        {
            let mut internal = self.inner.internal.borrow_mut();
            for name in &names {
                internal.set(name.clone(), Value::Undefined);
            }
        }
        self.render("post-state-change");

        let patch: Object = {
            let external = self.inner.external.borrow();
            names.iter().map(|n| (n.clone(), external.get(n))).collect()
        };
        self.reflect_external_properties(&patch);
        self.trigger_output_events();
    }

    /// Add alias entries missing from `patch`.
    fn expand_aliases(&self, patch: &Object) -> Object {
        let mut expanded = patch.clone();
        for (name, value) in patch {
            if let Some(alias) = self.config().alias_of(name) {
                expanded.entry(alias.to_string()).or_insert_with(|| value.clone());
            }
        }
        expanded
    }

    // Reflection

    /// Merge `patch` into the external bag and write reflected entries to
    /// attributes. Attribute callbacks caused by these writes are ignored.
    pub fn reflect_external_properties(&self, patch: &Object) {
        let patch = self.expand_aliases(patch);
        self.inner.external.borrow_mut().merge(&patch);

        let inner = &self.inner;
        let suppressed = inner.suppress_attribute_echo.replace(true);
        for name in self.config().reflected() {
            let Some(value) = patch.get(name) else {
                continue;
            };
            let Some(ty) = self.config().property_type(name) else {
                continue;
            };
            let attribute = camel_to_kebab(name);
            let current = inner.doc.attribute(inner.node, &attribute);
            match codec::encode(name, value, ty, current.as_deref()) {
                Encoded::Set(text) => inner.doc.set_attribute(inner.node, &attribute, &text),
                Encoded::Remove => inner.doc.remove_attribute(inner.node, &attribute),
                Encoded::Unchanged => {}
            }
        }
        inner.suppress_attribute_echo.set(suppressed);
    }

    /// Reflect externally, then forward the patch internally except for
    /// names the subtree owns as state.
    pub fn reflect_properties(&self, patch: &Object) {
        let patch = self.expand_aliases(patch);
        self.reflect_external_properties(&patch);

        let owned = self.inner.handle.state_owned_names();
        let config = self.config();
        let mut internal = self.inner.internal.borrow_mut();
        for (name, value) in &patch {
            if owned.contains(name) && !config.is_controllable(name) {
                internal.set(name.clone(), Value::Undefined);
            } else {
                internal.set(name.clone(), value.clone());
            }
        }
        for name in owned {
            if !config.is_controllable(&name) && internal.contains(&name) {
                internal.set(name, Value::Undefined);
            }
        }
    }

    /// Turn an outgoing event back into property updates.
    pub fn reflect_event_to_properties(&self, event: &str, args: &[Value]) {
        let outcome = match self.config().event_mapping(event) {
            Some(EventMapping::Mapper(mapper)) => {
                let mapper = mapper.clone();
                mapper(args, self)
            }
            _ => MapperOutcome::Unhandled,
        };
        self.apply_event_outcome(event, outcome, args);
    }

    fn apply_event_outcome(&self, event: &str, outcome: MapperOutcome, args: &[Value]) {
        let (external, internal) = match outcome {
            MapperOutcome::Deferred(resolve) => {
                debug!(tag = %self.tag_name(), event, "event mapper deferred");
                let event = event.to_string();
                let args = args.to_vec();
                self.defer(move |host| host.apply_event_outcome(&event, resolve(), &args));
                return;
            }
            MapperOutcome::Patch(external) => (external, None),
            MapperOutcome::Split(external, internal) => (external, Some(internal)),
            MapperOutcome::Unhandled => (self.event_patch(args), None),
        };

        if external.is_empty() && internal.as_ref().map_or(true, Object::is_empty) {
            return;
        }

        let batching = self.inner.batching.replace(false);
        self.reflect_properties(&external);
        if let Some(internal) = internal {
            let internal = self.expand_aliases(&internal);
            self.inner.internal.borrow_mut().merge(&internal);
        }
        self.render("event");
        self.inner.batching.set(batching);
    }

    /// Patch derived from an unmapped event argument.
    fn event_patch(&self, args: &[Value]) -> Object {
        let Some(Value::Object(first)) = args.first() else {
            return Object::new();
        };

        if matches!(first.get("persist"), Some(Value::Function(_))) {
            let target = first.get("currentTarget").and_then(Value::as_object);
            let external = self.inner.external.borrow().to_object();
            let mut patch = Object::new();
            for name in self.config().known_names() {
                let resampled = target
                    .and_then(|t| t.get(&name).cloned())
                    .or_else(|| self.adapter_value(&name));
                if let Some(value) = resampled {
                    if external.get(&name) != Some(&value) {
                        patch.insert(name, value);
                    }
                }
            }
            return patch;
        }

        match first.get("detail") {
            Some(Value::Object(detail)) if detail.get("value").map_or(false, |v| !v.is_nullish()) => detail.clone(),
            _ => first.clone(),
        }
    }

    /// Dispatch every output event with the external snapshot.
    pub fn trigger_output_events(&self) {
        let snapshot = Value::Object(self.external_properties());
        for name in self.config().output_events() {
            let detail = Value::object([("parameters", Value::Array(vec![snapshot.clone()]))]);
            let event = Event::custom(output_event_name(&name), detail);
            self.inner.doc.dispatch_event(self.inner.node, &event);
        }
    }

    /// Call a declared method.
    pub fn call_method(&self, name: &str, args: &[Value]) -> EvalResult<Value> {
        match self.inner.class.methods().get(name) {
            Some(method) => {
                let method = method.clone();
                method(self, args)
            }
            None => Err(EvalError::NotCallable {
                callee: format!("this.{}", name),
            }),
        }
    }

    // Attributes

    /// Decode a changed observed attribute and schedule a render.
    pub fn attribute_changed(&self, attribute: &str, _old: Option<&str>, new: Option<&str>) {
        if self.inner.suppress_attribute_echo.get() || !self.inner.connected.get() {
            return;
        }
        let Some((property, pre_evaluate)) = self.config().attribute_property(attribute) else {
            return;
        };
        let Some(value) = self.decode_attribute(&property, pre_evaluate, new) else {
            return;
        };

        let names = self.write(&property, &value);
        let schedule = {
            let mut batch = self.inner.attribute_batch.borrow_mut();
            let mut schedule = false;
            for name in &names {
                schedule |= batch.absorb(name, value.clone());
            }
            schedule
        };
        if schedule {
            debug!(tag = %self.tag_name(), attribute, "attribute batch scheduled");
            self.defer(|host| host.settle_attribute_batch());
        }
    }

    fn settle_attribute_batch(&self) {
        self.inner.attribute_batch.borrow_mut().settle();
        if !self.is_connected() {
            return;
        }
        self.render("attributes");
        self.trigger_output_events();
    }

    fn decode_attribute(&self, property: &str, pre_evaluate: bool, raw: Option<&str>) -> Option<Value> {
        if pre_evaluate {
            return Some(codec::pre_evaluate(property, raw, &self.inner.codec));
        }
        let ty = self.config().property_type(property).unwrap_or(PropType::Generic);
        match codec::decode(property, raw, ty, &self.inner.codec) {
            Decoded::Value(value) => Some(value),
            Decoded::Skip => None,
        }
    }

    // Lifecycle

    /// Capture slots, seed from attributes, render and reflect.
    pub fn connect(&self) {
        let inner = &self.inner;
        if inner.connected.replace(true) {
            return;
        }
        debug!(tag = %self.tag_name(), "connected");

        *inner.slots.borrow_mut() = Slots::grab(&inner.doc, inner.node);

        for (attribute, raw) in inner.doc.attributes(inner.node) {
            let Some((property, pre_evaluate)) = self.config().attribute_property(&attribute) else {
                continue;
            };
            if let Some(value) = self.decode_attribute(&property, pre_evaluate, Some(&raw)) {
                self.write(&property, &value);
            }
        }

        self.render("connected");
        let snapshot = self.external_properties();
        self.reflect_external_properties(&snapshot);
    }

    /// Tear down listeners and rendered output. Captured light DOM goes back
    /// under the host so the next connection grabs it again.
    pub fn disconnect(&self) {
        let inner = &self.inner;
        if !inner.connected.replace(false) {
            return;
        }
        debug!(tag = %self.tag_name(), "disconnected");

        inner.binder.borrow_mut().clear(&inner.doc);
        match inner.class.kind() {
            ComponentKind::Template(_) => {
                inner.doc.clear_children(inner.node);
            }
            ComponentKind::Reactive(bridge) => bridge.unmount(&inner.doc, inner.node, &inner.handle),
        }
        {
            let mut slots = inner.slots.borrow_mut();
            slots.restore(&inner.doc, inner.node);
            slots.clear();
        }
        inner
            .nested
            .borrow_mut()
            .retain(|host| inner.doc.contains(inner.node, host.node()));
        inner.handle.reset();
        inner.instantiated.set(false);
        inner.takeover.borrow_mut().clear();
    }

    // Rendering

    /// Render now, or on the next render batch when batching.
    pub fn request_render(&self, reason: &str) {
        if !self.inner.connected.get() {
            return;
        }
        if !self.inner.batching.get() {
            self.render(reason);
            return;
        }
        if self.inner.render_batch.borrow_mut().try_schedule() {
            let reason = reason.to_string();
            self.defer(move |host| {
                host.inner.render_batch.borrow_mut().settle();
                host.render(&reason);
            });
        }
    }

    /// One render pass. Listeners of the cancelable `render` event may veto it.
    #[instrument(level = "debug", skip(self), fields(tag = %self.tag_name()))]
    pub fn render(&self, reason: &str) {
        let inner = &self.inner;
        if !self.is_connected() {
            debug!(reason, "element not connected, render skipped");
            return;
        }
        if inner.rendering.get() {
            debug!(reason, "render requested during render, deferred");
            let reason = reason.to_string();
            self.defer(move |host| host.render(&reason));
            return;
        }

        let scope = self.scope();
        let notification = Event::custom(
            "render",
            Value::object([
                ("reason", Value::from(reason)),
                ("scope", Value::Object(scope.clone())),
            ]),
        )
        .cancelable();
        if !inner.doc.dispatch_event(inner.node, &notification) {
            debug!(reason, "render vetoed");
            return;
        }

        inner.rendering.set(true);
        inner.render_count.set(inner.render_count.get() + 1);
        match inner.class.kind() {
            ComponentKind::Template(markup) => self.render_template(markup, &scope),
            ComponentKind::Reactive(bridge) => self.render_reactive(bridge, &scope),
        }
        inner.rendering.set(false);
    }

    fn render_template(&self, markup: &str, scope: &Object) {
        let inner = &self.inner;
        if !inner.instantiated.get() {
            match parse_fragment(&inner.doc, markup) {
                Ok(fragment) => {
                    inner.doc.clear_children(inner.node);
                    inner.doc.append_child(inner.node, fragment);
                    inner.instantiated.set(true);
                }
                Err(error) => {
                    warn!(tag = %self.tag_name(), %error, "template failed to parse");
                    return;
                }
            }
            let projected = inner
                .slots
                .borrow_mut()
                .apply(&inner.doc, inner.node, self.config().clone_slots());
            if !self.config().evaluate_slots() {
                inner.binder.borrow_mut().exclude(projected);
            }
        }

        self.upgrade_nested();
        inner
            .handle
            .commit(self.render_props().to_object(), Object::new());

        let roots = inner.doc.children(inner.node);
        let names: Vec<String> = scope.keys().cloned().collect();
        let mut binder = inner.binder.borrow_mut();
        binder.compile(&inner.doc, &roots, &names);
        binder.evaluate(&inner.doc, &roots, scope);
    }

    fn render_reactive(&self, bridge: &VirtualDomBridge, scope: &Object) {
        let inner = &self.inner;
        let props = self.render_props();
        bridge.render(&inner.doc, inner.node, &props, &inner.handle);

        let projected = inner
            .slots
            .borrow_mut()
            .apply(&inner.doc, inner.node, self.config().clone_slots());
        self.upgrade_nested();

        if self.config().evaluate_slots() && !projected.is_empty() {
            let names: Vec<String> = scope.keys().cloned().collect();
            let mut binder = inner.binder.borrow_mut();
            binder.compile(&inner.doc, &projected, &names);
            binder.evaluate(&inner.doc, &projected, scope);
        }
    }

    /// Upgrade custom elements in the fresh output and drop hosts whose
    /// node was replaced.
    fn upgrade_nested(&self) {
        let inner = &self.inner;
        let fresh = match inner.registry.as_ref().and_then(WeakRegistry::upgrade) {
            Some(registry) => registry.upgrade_untracked(&inner.doc, inner.node),
            None => Vec::new(),
        };
        let mut nested = inner.nested.borrow_mut();
        nested.retain(|host| inner.doc.contains(inner.node, host.node()));
        nested.extend(fresh);
    }

    /// Internal properties plus default callbacks for unset output events.
    fn render_props(&self) -> PropertyBag {
        let mut props = self.inner.internal.borrow().clone();
        for (name, callback) in &self.inner.default_callbacks {
            if !matches!(props.get_opt(name), Some(Value::Function(_))) {
                props.set(name.clone(), callback.clone());
            }
        }
        props
    }

    /// Scope for bindings: every declared name, `props` and `this`.
    pub fn scope(&self) -> Object {
        let props = self.render_props().to_object();
        let mut scope: Object = self
            .config()
            .known_names()
            .into_iter()
            .map(|name| (name, Value::Undefined))
            .collect();
        scope.extend(props.clone());
        scope.insert("props".to_string(), Value::Object(props));
        scope.insert("this".to_string(), self.this_value());
        scope
    }

    fn this_value(&self) -> Value {
        let mut this = self.external_properties();

        for name in self.inner.class.methods().keys() {
            let weak = Rc::downgrade(&self.inner);
            let method = name.clone();
            let function = Value::function(name, move |args: &[Value]| match weak.upgrade() {
                Some(inner) => HostElement { inner }.call_method(&method, args),
                None => Ok(Value::Undefined),
            });
            this.insert(name.clone(), function);
        }

        let weak = Rc::downgrade(&self.inner);
        this.insert(
            "setProperty".to_string(),
            Value::function("setProperty", move |args: &[Value]| {
                if let (Some(inner), Some(name)) = (weak.upgrade(), args.first()) {
                    let value = args.get(1).cloned().unwrap_or_default();
                    HostElement { inner }.set_property(&name.to_display_string(), value);
                }
                Ok(Value::Undefined)
            }),
        );

        let weak = Rc::downgrade(&self.inner);
        this.insert(
            "getProperty".to_string(),
            Value::function("getProperty", move |args: &[Value]| {
                Ok(match (weak.upgrade(), args.first()) {
                    (Some(inner), Some(name)) => HostElement { inner }.get_property(&name.to_display_string()),
                    _ => Value::Undefined,
                })
            }),
        );

        Value::Object(this)
    }

    /// Forward a callback invocation as a DOM event.
    fn forward_call(&self, property: &str, args: &[Value]) {
        if self.config().is_render_property(property) {
            return;
        }
        let detail = Value::object([("parameters", Value::Array(args.to_vec()))]);
        let event = Event::custom(output_event_name(property), detail);
        self.inner.doc.dispatch_event(self.inner.node, &event);
    }
}

fn default_callback(host: Weak<HostInner>, property: &str) -> Value {
    let name = property.to_string();
    Value::function(property, move |args: &[Value]| {
        if let Some(inner) = host.upgrade() {
            inner.before_call(&name, args);
            inner.after_call(&name, args);
        }
        Ok(Value::Undefined)
    })
}

impl HostInner {
    fn host(&self) -> Option<HostElement> {
        self.this.upgrade().map(|inner| HostElement { inner })
    }
}

impl FunctionBridge for HostInner {
    fn before_call(&self, property: &str, args: &[Value]) {
        if let Some(host) = self.host() {
            if host.config().is_output_event(property) {
                host.reflect_event_to_properties(property, args);
            }
        }
    }

    fn after_call(&self, property: &str, args: &[Value]) {
        if let Some(host) = self.host() {
            host.forward_call(property, args);
        }
    }
}

impl ElementHooks for HostInner {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn connected(&self) {
        if let Some(host) = self.host() {
            host.connect();
        }
    }

    fn disconnected(&self) {
        if let Some(host) = self.host() {
            host.disconnect();
        }
    }

    fn attribute_changed(&self, name: &str, old: Option<&str>, new: Option<&str>) {
        if let Some(host) = self.host() {
            host.attribute_changed(name, old, new);
        }
    }

    fn get_property(&self, name: &str) -> Option<Value> {
        let host = self.host()?;
        host.config().is_known(name).then(|| host.get_property(name))
    }

    fn set_property(&self, name: &str, value: &Value) -> bool {
        match self.host() {
            Some(host) if host.config().is_known(name) => {
                host.set_property(name, value.clone());
                true
            }
            _ => false,
        }
    }
}
