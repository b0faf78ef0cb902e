//! Element registry: maps tags to component classes and upgrades matching
//! elements.
//!
//! The document only keeps weak hooks, so something must own each host.
//! Hosts made through [`Registry::create`] and [`Registry::upgrade`] are
//! owned by the registry; hosts a component's render upgrades are owned by
//! that component and go away with the node they were upgraded for.

use crate::component::ComponentClass;
use crate::error::{ElementError, ElementResult};
use crate::host::HostElement;
use crate::naming::validate_tag;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use tracing::{debug, info};
use webcell_dom::{Document, NodeId};

#[derive(Default)]
struct RegistryInner {
    definitions: RefCell<BTreeMap<String, ComponentClass>>,
    hosts: RefCell<Vec<HostElement>>,
}

/// Shared registry handle.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Rc<RegistryInner>,
}

#[derive(Clone)]
pub struct WeakRegistry(Weak<RegistryInner>);

impl WeakRegistry {
    pub fn upgrade(&self) -> Option<Registry> {
        self.0.upgrade().map(|inner| Registry { inner })
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("tags", &self.tags())
            .field("hosts", &self.inner.hosts.borrow().len())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downgrade(&self) -> WeakRegistry {
        WeakRegistry(Rc::downgrade(&self.inner))
    }

    /// Install `class` under `tag`, or under a tag derived from the class name.
    pub fn define(&self, tag: Option<&str>, class: ComponentClass) -> ElementResult<String> {
        let tag = tag.map(str::to_string).unwrap_or_else(|| class.default_tag());
        validate_tag(&tag).map_err(|reason| ElementError::InvalidTag {
            tag: tag.clone(),
            reason,
        })?;

        let mut definitions = self.inner.definitions.borrow_mut();
        if definitions.contains_key(&tag) {
            return Err(ElementError::DuplicateTag(tag));
        }
        info!(tag = %tag, class = class.name(), "component defined");
        definitions.insert(tag.clone(), class);
        Ok(tag)
    }

    pub fn get(&self, tag: &str) -> Option<ComponentClass> {
        self.inner.definitions.borrow().get(tag).cloned()
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.inner.definitions.borrow().contains_key(tag)
    }

    pub fn tags(&self) -> Vec<String> {
        self.inner.definitions.borrow().keys().cloned().collect()
    }

    /// Create a detached, upgraded element.
    pub fn create(&self, doc: &Document, tag: &str) -> ElementResult<HostElement> {
        let class = self
            .get(tag)
            .ok_or_else(|| ElementError::UnknownTag(tag.to_string()))?;
        let node = doc.create_element(tag);
        Ok(self.attach(class, doc, node))
    }

    /// Upgrade every defined element in the subtree of `root`, `root`
    /// included, connecting those already in the document.
    pub fn upgrade(&self, doc: &Document, root: NodeId) -> Vec<HostElement> {
        let upgraded = self.upgrade_untracked(doc, root);
        self.inner.hosts.borrow_mut().extend(upgraded.iter().cloned());
        upgraded
    }

    /// Like [`Registry::upgrade`], leaving ownership of the new hosts to the caller.
    pub(crate) fn upgrade_untracked(&self, doc: &Document, root: NodeId) -> Vec<HostElement> {
        let mut candidates = vec![root];
        candidates.extend(doc.descendants(root));

        let mut upgraded = Vec::new();
        for node in candidates {
            if doc.is_upgraded(node) {
                continue;
            }
            let Some(class) = doc.tag_name(node).and_then(|tag| self.get(&tag)) else {
                continue;
            };
            let host = HostElement::attach(class, doc, node, Some(self.downgrade()));
            if doc.is_connected(node) {
                host.connect();
            }
            upgraded.push(host);
        }

        if !upgraded.is_empty() {
            debug!(count = upgraded.len(), "upgraded elements");
        }
        upgraded
    }

    /// The live host upgraded for `node`, if any.
    pub fn host(&self, doc: &Document, node: NodeId) -> Option<HostElement> {
        HostElement::from_node(doc, node)
    }

    /// Hosts owned by the registry itself.
    pub fn hosts(&self) -> Vec<HostElement> {
        self.inner.hosts.borrow().clone()
    }

    fn attach(&self, class: ComponentClass, doc: &Document, node: NodeId) -> HostElement {
        let host = HostElement::attach(class, doc, node, Some(self.downgrade()));
        self.inner.hosts.borrow_mut().push(host.clone());
        host
    }
}
