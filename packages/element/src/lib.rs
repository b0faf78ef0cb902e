//! Custom-element adapter.
//!
//! A [`ComponentClass`] pairs an immutable [`ComponentConfig`] with either
//! declarative template markup or a [`ReactiveComponent`]. Registering it in
//! a [`Registry`] upgrades matching elements of a [`webcell_dom::Document`]
//! into [`HostElement`]s, which reconcile attributes, properties, slots and
//! template bindings.

pub mod batch;
pub mod binding;
pub mod bridge;
pub mod codec;
pub mod component;
pub mod config;
pub mod error;
pub mod handle;
pub mod host;
pub mod manifest;
pub mod naming;
pub mod property_bag;
pub mod registry;
pub mod slots;

#[cfg(test)]
mod tests_binding;
#[cfg(test)]
mod tests_reconcile;
#[cfg(test)]
mod tests_slots;

pub use batch::{Batch, BatchState};
pub use binding::{BindingTarget, Diagnostic, DiagnosticKind, TemplateBinder};
pub use bridge::{ReactiveComponent, RenderContext, VirtualDomBridge};
pub use codec::{decode, encode, pre_evaluate, CodecContext, Decoded, Encoded, FunctionBridge};
pub use component::{ComponentClass, ComponentKind, Method};
pub use config::{ComponentConfig, ComponentConfigBuilder, EventMapping, Mapper, MapperOutcome, PropType};
pub use error::{ElementError, ElementResult};
pub use handle::{AdapterHandle, AdapterSnapshot};
pub use host::HostElement;
pub use manifest::{ComponentManifest, Manifest, DEFAULT_MANIFEST_NAME};
pub use property_bag::PropertyBag;
pub use registry::{Registry, WeakRegistry};
pub use slots::{SlotContent, Slots};
