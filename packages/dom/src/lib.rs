//! Host document model for webcell.
//!
//! Provides the mutable node tree custom elements live in, DOM-style events,
//! the microtask queue batching runs on, HTML parsing, and the virtual-node
//! render backend contract.

pub mod document;
pub mod error;
pub mod event;
pub mod markup;
pub mod scheduler;
pub mod serialize;
pub mod vdom;

pub use document::{Document, ElementHooks, Mutation, NodeId, NodeType, WeakDocument};
pub use error::{MarkupError, MarkupResult};
pub use event::{Event, ListenerFn, ListenerId};
pub use markup::{parse_fragment, set_inner_html};
pub use scheduler::Scheduler;
pub use vdom::{Handler, RenderBackend, ReplaceChildren, VNode};
