//! Component type descriptors.

use crate::bridge::{ReactiveComponent, VirtualDomBridge};
use crate::config::ComponentConfig;
use crate::host::HostElement;
use crate::naming::tag_from_class_name;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use webcell_dom::RenderBackend;
use webcell_expression::{EvalResult, Value};

/// Method callable from bindings as `this.<name>(...)`.
pub type Method = Rc<dyn Fn(&HostElement, &[Value]) -> EvalResult<Value>>;

#[derive(Clone, Debug)]
pub enum ComponentKind {
    /// Declarative markup, instantiated once per connection and re-bound on every pass
    Template(Rc<str>),
    /// Virtual-DOM component re-rendered through a backend
    Reactive(VirtualDomBridge),
}

/// Everything needed to instantiate hosts of one component type.
#[derive(Clone)]
pub struct ComponentClass {
    name: String,
    config: Rc<ComponentConfig>,
    kind: ComponentKind,
    methods: Rc<BTreeMap<String, Method>>,
}

impl fmt::Debug for ComponentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentClass")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ComponentClass {
    pub fn template(name: impl Into<String>, config: ComponentConfig, markup: impl Into<String>) -> Self {
        let markup: String = markup.into();
        Self::with_kind(name, config, ComponentKind::Template(Rc::from(markup)))
    }

    pub fn reactive(name: impl Into<String>, config: ComponentConfig, component: impl ReactiveComponent + 'static) -> Self {
        Self::with_kind(name, config, ComponentKind::Reactive(VirtualDomBridge::new(component)))
    }

    fn with_kind(name: impl Into<String>, config: ComponentConfig, kind: ComponentKind) -> Self {
        Self {
            name: name.into(),
            config: Rc::new(config),
            kind,
            methods: Rc::new(BTreeMap::new()),
        }
    }

    /// Replace the render backend of a reactive component.
    pub fn with_backend(mut self, backend: impl RenderBackend + 'static) -> Self {
        if let ComponentKind::Reactive(bridge) = self.kind {
            self.kind = ComponentKind::Reactive(bridge.with_backend(backend));
        }
        self
    }

    pub fn with_method(
        mut self,
        name: impl Into<String>,
        method: impl Fn(&HostElement, &[Value]) -> EvalResult<Value> + 'static,
    ) -> Self {
        Rc::make_mut(&mut self.methods).insert(name.into(), Rc::new(method));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ComponentConfig {
        &self.config
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    pub fn methods(&self) -> &BTreeMap<String, Method> {
        &self.methods
    }

    /// Markup of a template component.
    pub fn template_markup(&self) -> Option<&str> {
        match &self.kind {
            ComponentKind::Template(markup) => Some(markup),
            ComponentKind::Reactive(_) => None,
        }
    }

    pub fn default_tag(&self) -> String {
        tag_from_class_name(&self.name)
    }
}
