use std::collections::btree_map;
use webcell_expression::{Object, Value};

/// Named property values with an explicit lookup/update interface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    values: Object,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// `undefined` when absent.
    pub fn get(&self, name: &str) -> Value {
        self.values.get(name).cloned().unwrap_or_default()
    }

    pub fn get_opt(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Last write wins per name.
    pub fn merge(&mut self, patch: &Object) {
        for (name, value) in patch {
            self.values.insert(name.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.values.iter()
    }

    pub fn to_object(&self) -> Object {
        self.values.clone()
    }
}

impl From<Object> for PropertyBag {
    fn from(values: Object) -> Self {
        Self { values }
    }
}

impl<'a> IntoIterator for &'a PropertyBag {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
