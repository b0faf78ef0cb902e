//! # Component Configuration
//!
//! Static, per-type tables that drive the attribute codec and the
//! reconciliation engine. A [`ComponentConfig`] is assembled once through
//! [`ComponentConfigBuilder`] and never mutated afterwards.
//!
//! ```rust,ignore
//! let config = ComponentConfig::builder()
//!     .property("count", PropType::Number)
//!     .property("onChange", PropType::Function)
//!     .alias("value", "count")
//!     .reflect("count")
//!     .build();
//!
//! assert_eq!(config.observed_attributes(), ["-count", "-on-change", "-value", "count", "on-change", "value"]);
//! ```

use crate::host::HostElement;
use crate::naming::{camel_to_kebab, kebab_to_camel};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;
use webcell_expression::{Object, Value};

/// Declared type of a property; selects the codec path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropType {
    Boolean,
    Number,
    String,
    Function,
    Json,
    #[default]
    #[serde(alias = "any")]
    Generic,
}

impl fmt::Display for PropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropType::Boolean => "boolean",
            PropType::Number => "number",
            PropType::String => "string",
            PropType::Function => "function",
            PropType::Json => "json",
            PropType::Generic => "generic",
        };
        f.write_str(name)
    }
}

/// Result of an event-to-property mapper.
pub enum MapperOutcome {
    /// Merged into the external properties
    Patch(Object),
    /// `(external, internal)` patches
    Split(Object, Object),
    /// Fall through to the default handling
    Unhandled,
    /// Resolved on a later microtask
    Deferred(Box<dyn FnOnce() -> MapperOutcome>),
}

impl fmt::Debug for MapperOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapperOutcome::Patch(patch) => f.debug_tuple("Patch").field(patch).finish(),
            MapperOutcome::Split(external, internal) => {
                f.debug_tuple("Split").field(external).field(internal).finish()
            }
            MapperOutcome::Unhandled => f.write_str("Unhandled"),
            MapperOutcome::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

pub type Mapper = Rc<dyn Fn(&[Value], &HostElement) -> MapperOutcome>;

/// How an output event maps back onto properties.
#[derive(Clone)]
pub enum EventMapping {
    Passthrough,
    Mapper(Mapper),
}

impl EventMapping {
    pub fn mapper(f: impl Fn(&[Value], &HostElement) -> MapperOutcome + 'static) -> Self {
        EventMapping::Mapper(Rc::new(f))
    }
}

impl fmt::Debug for EventMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventMapping::Passthrough => f.write_str("Passthrough"),
            EventMapping::Mapper(_) => f.write_str("Mapper"),
        }
    }
}

/// Immutable per-type configuration.
#[derive(Debug, Clone)]
pub struct ComponentConfig {
    property_types: BTreeMap<String, PropType>,
    aliases: BTreeMap<String, String>,
    reflect: Vec<String>,
    event_mappings: BTreeMap<String, EventMapping>,
    render_properties: BTreeSet<String>,
    controllable: BTreeSet<String>,
    batch_updates: bool,
    clone_slots: bool,
    evaluate_slots: bool,
    observed_attributes: Vec<String>,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        ComponentConfigBuilder::default().build()
    }
}

impl ComponentConfig {
    pub fn builder() -> ComponentConfigBuilder {
        ComponentConfigBuilder::default()
    }

    pub fn property_types(&self) -> &BTreeMap<String, PropType> {
        &self.property_types
    }

    /// Declared type, looking through the alias index.
    pub fn property_type(&self, name: &str) -> Option<PropType> {
        self.property_types.get(name).copied().or_else(|| {
            self.alias_of(name)
                .and_then(|alias| self.property_types.get(alias).copied())
        })
    }

    pub fn alias_of(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    /// `name` followed by its alias, if any.
    pub fn alias_group(&self, name: &str) -> Vec<String> {
        let mut names = vec![name.to_string()];
        if let Some(alias) = self.alias_of(name) {
            names.push(alias.to_string());
        }
        names
    }

    /// Declared directly or reachable through an alias.
    pub fn is_known(&self, name: &str) -> bool {
        self.property_types.contains_key(name) || self.aliases.contains_key(name)
    }

    /// Every declared property and alias name.
    pub fn known_names(&self) -> BTreeSet<String> {
        self.property_types
            .keys()
            .chain(self.aliases.keys())
            .cloned()
            .collect()
    }

    pub fn reflected(&self) -> &[String] {
        &self.reflect
    }

    pub fn is_reflected(&self, name: &str) -> bool {
        self.reflect.iter().any(|r| r == name)
    }

    pub fn event_mapping(&self, name: &str) -> Option<&EventMapping> {
        self.event_mappings.get(name)
    }

    pub fn is_render_property(&self, name: &str) -> bool {
        self.render_properties.contains(name)
    }

    pub fn is_controllable(&self, name: &str) -> bool {
        self.controllable.contains(name)
    }

    /// Explicitly mapped events plus function-typed, non-render properties.
    pub fn output_events(&self) -> Vec<String> {
        let mut names: Vec<String> = self.event_mappings.keys().cloned().collect();
        for (name, ty) in &self.property_types {
            if *ty == PropType::Function && !self.is_render_property(name) && !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    pub fn is_output_event(&self, name: &str) -> bool {
        self.event_mappings.contains_key(name)
            || (self.property_types.get(name) == Some(&PropType::Function) && !self.is_render_property(name))
    }

    pub fn batch_updates(&self) -> bool {
        self.batch_updates
    }

    pub fn clone_slots(&self) -> bool {
        self.clone_slots
    }

    pub fn evaluate_slots(&self) -> bool {
        self.evaluate_slots
    }

    pub fn observed_attributes(&self) -> &[String] {
        &self.observed_attributes
    }

    /// Map an observed attribute to `(property, pre_evaluate)`.
    pub fn attribute_property(&self, attribute: &str) -> Option<(String, bool)> {
        let (name, pre_evaluate) = match attribute.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (attribute, false),
        };
        let property = kebab_to_camel(name);
        self.is_known(&property).then_some((property, pre_evaluate))
    }
}

/// Collects configuration entries; `build` derives the closed tables.
#[derive(Debug, Clone)]
pub struct ComponentConfigBuilder {
    property_types: BTreeMap<String, PropType>,
    aliases: BTreeMap<String, String>,
    reflect: Vec<String>,
    event_mappings: BTreeMap<String, EventMapping>,
    render_properties: BTreeSet<String>,
    controllable: BTreeSet<String>,
    batch_updates: bool,
    clone_slots: bool,
    evaluate_slots: bool,
}

impl Default for ComponentConfigBuilder {
    fn default() -> Self {
        Self {
            property_types: BTreeMap::new(),
            aliases: BTreeMap::new(),
            reflect: Vec::new(),
            event_mappings: BTreeMap::new(),
            render_properties: BTreeSet::new(),
            controllable: BTreeSet::new(),
            batch_updates: true,
            clone_slots: false,
            evaluate_slots: true,
        }
    }
}

impl ComponentConfigBuilder {
    /// Start from a parent type's tables; later entries override.
    pub fn extends(mut self, parent: &ComponentConfig) -> Self {
        self.property_types.extend(parent.property_types.clone());
        self.aliases.extend(parent.aliases.clone());
        for name in &parent.reflect {
            if !self.reflect.contains(name) {
                self.reflect.push(name.clone());
            }
        }
        self.event_mappings.extend(parent.event_mappings.clone());
        self.render_properties.extend(parent.render_properties.iter().cloned());
        self.controllable.extend(parent.controllable.iter().cloned());
        self.batch_updates = parent.batch_updates;
        self.clone_slots = parent.clone_slots;
        self.evaluate_slots = parent.evaluate_slots;
        self
    }

    pub fn property(mut self, name: impl Into<String>, ty: PropType) -> Self {
        self.property_types.insert(name.into(), ty);
        self
    }

    /// Declare `a` and `b` as names for the same property.
    pub fn alias(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.aliases.insert(a.into(), b.into());
        self
    }

    /// Mirror a property onto its attribute. Order is kept; repeats are ignored.
    pub fn reflect(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.reflect.contains(&name) {
            self.reflect.push(name);
        }
        self
    }

    pub fn map_event(mut self, name: impl Into<String>, mapping: EventMapping) -> Self {
        self.event_mappings.insert(name.into(), mapping);
        self
    }

    /// Function property that only feeds rendering and never forwards a DOM event.
    pub fn render_property(mut self, name: impl Into<String>) -> Self {
        self.render_properties.insert(name.into());
        self
    }

    pub fn controllable(mut self, name: impl Into<String>) -> Self {
        self.controllable.insert(name.into());
        self
    }

    pub fn batch_updates(mut self, enabled: bool) -> Self {
        self.batch_updates = enabled;
        self
    }

    pub fn clone_slots(mut self, enabled: bool) -> Self {
        self.clone_slots = enabled;
        self
    }

    pub fn evaluate_slots(mut self, enabled: bool) -> Self {
        self.evaluate_slots = enabled;
        self
    }

    pub fn build(self) -> ComponentConfig {
        let mut aliases = self.aliases.clone();
        for (a, b) in &self.aliases {
            aliases.entry(b.clone()).or_insert_with(|| a.clone());
        }

        let mut observed = BTreeSet::new();
        for name in self.property_types.keys().chain(aliases.keys()) {
            let attribute = camel_to_kebab(name);
            observed.insert(format!("-{}", attribute));
            observed.insert(attribute);
        }

        ComponentConfig {
            property_types: self.property_types,
            aliases,
            reflect: self.reflect,
            event_mappings: self.event_mappings,
            render_properties: self.render_properties,
            controllable: self.controllable,
            batch_updates: self.batch_updates,
            clone_slots: self.clone_slots,
            evaluate_slots: self.evaluate_slots,
            observed_attributes: observed.into_iter().collect(),
        }
    }
}
