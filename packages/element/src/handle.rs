//! Adapter handle: the mounted subtree's live `{properties, state}`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use webcell_expression::{Object, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdapterSnapshot {
    pub properties: Object,
    pub state: Object,
}

type StateListener = Rc<dyn Fn(&Object)>;

/// Shared reference the render backend populates after every commit.
/// Empty until the first mount.
#[derive(Clone, Default)]
pub struct AdapterHandle {
    snapshot: Rc<RefCell<Option<AdapterSnapshot>>>,
    listener: Rc<RefCell<Option<StateListener>>>,
}

impl fmt::Debug for AdapterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AdapterHandle").field(&self.snapshot.borrow()).finish()
    }
}

impl AdapterHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self) -> bool {
        self.snapshot.borrow().is_some()
    }

    pub fn snapshot(&self) -> Option<AdapterSnapshot> {
        self.snapshot.borrow().clone()
    }

    /// Current state; empty before mount.
    pub fn state(&self) -> Object {
        self.snapshot
            .borrow()
            .as_ref()
            .map(|s| s.state.clone())
            .unwrap_or_default()
    }

    pub fn properties(&self) -> Object {
        self.snapshot
            .borrow()
            .as_ref()
            .map(|s| s.properties.clone())
            .unwrap_or_default()
    }

    pub fn state_value(&self, name: &str) -> Option<Value> {
        self.snapshot
            .borrow()
            .as_ref()
            .and_then(|s| s.state.get(name).cloned())
    }

    pub fn property(&self, name: &str) -> Option<Value> {
        self.snapshot
            .borrow()
            .as_ref()
            .and_then(|s| s.properties.get(name).cloned())
    }

    /// Names the subtree currently owns as state, including one level of
    /// a nested `modelState` object.
    pub fn state_owned_names(&self) -> Vec<String> {
        let state = self.state();
        let mut names: Vec<String> = state.keys().cloned().collect();
        if let Some(Value::Object(model)) = state.get("modelState") {
            names.extend(model.keys().cloned());
        }
        names
    }

    pub fn owns(&self, name: &str) -> bool {
        self.state_owned_names().iter().any(|n| n == name)
    }

    /// Record the committed properties and state.
    pub fn commit(&self, properties: Object, state: Object) {
        *self.snapshot.borrow_mut() = Some(AdapterSnapshot { properties, state });
    }

    /// Merge into the live state and notify the host.
    pub fn set_state(&self, patch: Object) {
        {
            let mut snapshot = self.snapshot.borrow_mut();
            let current = snapshot.get_or_insert_with(AdapterSnapshot::default);
            for (name, value) in &patch {
                current.state.insert(name.clone(), value.clone());
            }
        }
        let listener = self.listener.borrow().clone();
        if let Some(listener) = listener {
            listener(&patch);
        }
    }

    pub fn on_state_change(&self, listener: impl Fn(&Object) + 'static) {
        *self.listener.borrow_mut() = Some(Rc::new(listener));
    }

    /// Back to the unmounted state.
    pub fn reset(&self) {
        *self.snapshot.borrow_mut() = None;
    }
}
