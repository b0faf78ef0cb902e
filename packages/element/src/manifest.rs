use crate::component::ComponentClass;
use crate::config::{ComponentConfig, EventMapping, PropType};
use crate::error::{ElementError, ElementResult};
use crate::registry::Registry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_MANIFEST_NAME: &str = "webcell.json";

/// Component manifest file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub components: Vec<ComponentManifest>,
}

/// One template component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentManifest {
    pub name: String,

    /// Defaults to a tag derived from `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default)]
    pub template: String,

    /// Name of an earlier component whose tables are inherited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    #[serde(default)]
    pub property_types: BTreeMap<String, PropType>,

    #[serde(default)]
    pub property_aliases: BTreeMap<String, String>,

    #[serde(default)]
    pub properties_to_reflect_as_attributes: Vec<String>,

    /// `true` entries map the event back onto properties
    #[serde(default)]
    pub event_to_property_mapping: BTreeMap<String, bool>,

    #[serde(default)]
    pub render_properties: Vec<String>,

    #[serde(default)]
    pub controllable: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_updates: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_slots: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluate_slots: Option<bool>,
}

impl Manifest {
    /// Load a manifest file
    pub fn load(path: impl AsRef<Path>) -> ElementResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> ElementResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build every component in order, resolving `extends` against earlier entries.
    pub fn classes(&self) -> ElementResult<Vec<(Option<String>, ComponentClass)>> {
        let mut built: BTreeMap<&str, (ComponentConfig, String)> = BTreeMap::new();
        let mut classes = Vec::new();

        for component in &self.components {
            let parent = match &component.extends {
                Some(parent) => Some(built.get(parent.as_str()).ok_or_else(|| ElementError::UnknownParent {
                    name: component.name.clone(),
                    parent: parent.clone(),
                })?),
                None => None,
            };

            let config = component.config(parent.map(|(config, _)| config));
            let template = match (component.template.is_empty(), parent) {
                (true, Some((_, template))) => template.clone(),
                _ => component.template.clone(),
            };

            classes.push((
                component.tag.clone(),
                ComponentClass::template(component.name.clone(), config.clone(), template.clone()),
            ));
            built.insert(&component.name, (config, template));
        }

        Ok(classes)
    }

    /// Define every component; returns the installed tags.
    pub fn define_all(&self, registry: &Registry) -> ElementResult<Vec<String>> {
        self.classes()?
            .into_iter()
            .map(|(tag, class)| registry.define(tag.as_deref(), class))
            .collect()
    }
}

impl ComponentManifest {
    pub fn config(&self, parent: Option<&ComponentConfig>) -> ComponentConfig {
        let mut builder = ComponentConfig::builder();
        if let Some(parent) = parent {
            builder = builder.extends(parent);
        }
        for (name, ty) in &self.property_types {
            builder = builder.property(name, *ty);
        }
        for (a, b) in &self.property_aliases {
            builder = builder.alias(a, b);
        }
        for name in &self.properties_to_reflect_as_attributes {
            builder = builder.reflect(name);
        }
        for (name, _) in self.event_to_property_mapping.iter().filter(|(_, enabled)| **enabled) {
            builder = builder.map_event(name, EventMapping::Passthrough);
        }
        for name in &self.render_properties {
            builder = builder.render_property(name);
        }
        for name in &self.controllable {
            builder = builder.controllable(name);
        }
        if let Some(enabled) = self.batch_updates {
            builder = builder.batch_updates(enabled);
        }
        if let Some(enabled) = self.clone_slots {
            builder = builder.clone_slots(enabled);
        }
        if let Some(enabled) = self.evaluate_slots {
            builder = builder.evaluate_slots(enabled);
        }
        builder.build()
    }
}
