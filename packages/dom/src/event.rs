use crate::document::NodeId;
use std::cell::Cell;
use std::rc::Rc;
use webcell_expression::Value;

/// Handle returned by `add_event_listener`, used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

pub type ListenerFn = Rc<dyn Fn(&Event)>;

/// A dispatched DOM event.
#[derive(Debug)]
pub struct Event {
    event_type: String,
    detail: Value,
    bubbles: bool,
    cancelable: bool,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
    pub(crate) target: Cell<Option<NodeId>>,
    pub(crate) current_target: Cell<Option<NodeId>>,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            detail: Value::Undefined,
            bubbles: false,
            cancelable: false,
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
            target: Cell::new(None),
            current_target: Cell::new(None),
        }
    }

    /// Custom event carrying `detail`.
    pub fn custom(event_type: impl Into<String>, detail: Value) -> Self {
        Self::new(event_type).with_detail(detail)
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }

    pub fn bubbling(mut self) -> Self {
        self.bubbles = true;
        self
    }

    pub fn cancelable(mut self) -> Self {
        self.cancelable = true;
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn detail(&self) -> &Value {
        &self.detail
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn is_cancelable(&self) -> bool {
        self.cancelable
    }

    /// Only has an effect on cancelable events.
    pub fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.set(true);
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    /// Snapshot as an expression value, for handing the event to bindings.
    pub fn to_value(&self) -> Value {
        let node = |id: Option<NodeId>| id.map(|id| Value::Number(id.index() as f64)).unwrap_or(Value::Null);
        Value::object([
            ("type", Value::from(self.event_type.as_str())),
            ("detail", self.detail.clone()),
            ("bubbles", Value::Boolean(self.bubbles)),
            ("cancelable", Value::Boolean(self.cancelable)),
            ("defaultPrevented", Value::Boolean(self.default_prevented())),
            ("target", node(self.target())),
            ("currentTarget", node(self.current_target())),
        ])
    }
}

#[derive(Clone)]
pub(crate) struct Listener {
    pub id: ListenerId,
    pub event_type: String,
    pub callback: ListenerFn,
}
