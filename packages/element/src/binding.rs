//! # Template Binding Compiler
//!
//! Two passes over a rendered subtree:
//!
//! 1. [`TemplateBinder::compile`] walks the nodes depth-first and compiles
//!    every `bind-*` / `data-bind-*` attribute and every text node holding
//!    `${...}` against the current scope names. Results are cached per node.
//! 2. [`TemplateBinder::evaluate`] calls the compiled functions with the
//!    scope values and routes the results into the DOM.
//!
//! Elements whose tag contains `-` are opaque: their own bound attributes
//! are applied, their contents belong to the nested component.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, instrument, warn};
use webcell_dom::{Document, Event, ListenerId, NodeId, NodeType};
use webcell_expression::{has_interpolation, CompiledExpression, CompiledTemplate, ExpressionCompiler, Object, Value};

use crate::naming::dom_property_name;
use crate::slots::is_template_marker;

pub const BINDING_PREFIXES: [&str; 2] = ["data-bind-", "bind-"];

/// Extra names visible to event handler bodies.
pub const EVENT_NAMES: [&str; 2] = ["event", "parameters"];

/// Where a bound expression's result goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingTarget {
    Attribute(String),
    Property(String),
    /// Object spread into attributes
    Attributes,
    /// Object spread into properties
    Properties,
    Event(String),
}

impl BindingTarget {
    /// Recognise a binding attribute name.
    pub fn parse(attribute: &str) -> Option<Self> {
        let rest = BINDING_PREFIXES
            .iter()
            .find_map(|prefix| attribute.strip_prefix(prefix))?;

        if let Some(name) = rest.strip_prefix("attribute-") {
            return (!name.is_empty()).then(|| BindingTarget::Attribute(name.to_string()));
        }
        if let Some(name) = rest.strip_prefix("property-") {
            return (!name.is_empty()).then(|| BindingTarget::Property(dom_property_name(name)));
        }
        if let Some(name) = rest.strip_prefix("on-") {
            return (!name.is_empty()).then(|| BindingTarget::Event(name.to_string()));
        }
        match rest {
            "attributes" => Some(BindingTarget::Attributes),
            "properties" => Some(BindingTarget::Properties),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledBinding {
    pub target: BindingTarget,
    pub attribute: String,
    pub expression: CompiledExpression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Compile,
    Evaluation,
}

/// A contained binding failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub node: NodeId,
    pub expression: String,
    pub message: String,
    pub scope: Vec<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DiagnosticKind::Compile => "compile",
            DiagnosticKind::Evaluation => "evaluation",
        };
        write!(f, "{} error on {} in `{}`: {}", kind, self.node, self.expression, self.message)
    }
}

/// Compiled state of one node.
#[derive(Debug, Default)]
pub struct CacheEntry {
    pub children: Vec<NodeId>,
    pub error: Option<String>,
    pub scope_names: Vec<String>,
    pub template: Option<String>,
    pub template_function: Option<CompiledTemplate>,
    pub bindings: Vec<CompiledBinding>,
    listeners: BTreeMap<String, ListenerId>,
}

impl CacheEntry {
    pub fn listener_events(&self) -> Vec<&str> {
        self.listeners.keys().map(String::as_str).collect()
    }
}

type Diagnostics = Rc<RefCell<Vec<Diagnostic>>>;

pub struct TemplateBinder {
    compiler: ExpressionCompiler,
    cache: BTreeMap<NodeId, CacheEntry>,
    scope: Rc<RefCell<Object>>,
    diagnostics: Diagnostics,
    excluded: BTreeSet<NodeId>,
}

impl fmt::Debug for TemplateBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateBinder")
            .field("cached", &self.cache.len())
            .field("diagnostics", &self.diagnostics.borrow().len())
            .finish()
    }
}

impl Default for TemplateBinder {
    fn default() -> Self {
        Self::new(ExpressionCompiler::new())
    }
}

impl TemplateBinder {
    pub fn new(compiler: ExpressionCompiler) -> Self {
        Self {
            compiler,
            cache: BTreeMap::new(),
            scope: Rc::new(RefCell::new(Object::new())),
            diagnostics: Rc::new(RefCell::new(Vec::new())),
            excluded: BTreeSet::new(),
        }
    }

    pub fn entry(&self, node: NodeId) -> Option<&CacheEntry> {
        self.cache.get(&node)
    }

    pub fn cached_nodes(&self) -> usize {
        self.cache.len()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.borrow_mut())
    }

    /// Leave `nodes` and their subtrees unbound.
    pub fn exclude(&mut self, nodes: impl IntoIterator<Item = NodeId>) {
        self.excluded.extend(nodes);
    }

    /// Compile every node under `roots` not compiled yet.
    #[instrument(level = "debug", skip_all, fields(roots = roots.len()))]
    pub fn compile(&mut self, doc: &Document, roots: &[NodeId], names: &[String]) {
        for node in walk(doc, roots, &self.excluded) {
            if self.cache.contains_key(&node) {
                continue;
            }
            let entry = self.compile_node(doc, node, names);
            self.cache.insert(node, entry);
        }
    }

    fn compile_node(&self, doc: &Document, node: NodeId, names: &[String]) -> CacheEntry {
        let mut entry = CacheEntry {
            children: doc.children(node),
            scope_names: names.to_vec(),
            ..CacheEntry::default()
        };

        match doc.node_type(node) {
            NodeType::Element => {
                for (attribute, source) in doc.attributes(node) {
                    let Some(target) = BindingTarget::parse(&attribute) else {
                        continue;
                    };
                    let compiled = match &target {
                        BindingTarget::Event(_) => {
                            let mut event_names = names.to_vec();
                            event_names.extend(EVENT_NAMES.iter().map(|n| n.to_string()));
                            self.compiler.compile(&source, &event_names)
                        }
                        _ => self.compiler.compile(&source, names),
                    };
                    match compiled {
                        Ok(expression) => {
                            // A later binding of the same target replaces the earlier one
                            entry.bindings.retain(|b| b.target != target);
                            entry.bindings.push(CompiledBinding {
                                target,
                                attribute,
                                expression,
                            });
                        }
                        Err(error) => {
                            self.report(DiagnosticKind::Compile, node, &source, error.to_string(), names);
                            entry.error = Some(error.to_string());
                        }
                    }
                }
            }
            NodeType::Text => {
                let text = doc.text(node).unwrap_or_default();
                if has_interpolation(&text) {
                    match self.compiler.compile_template(&text, names) {
                        Ok(template) => entry.template_function = Some(template),
                        Err(error) => {
                            self.report(DiagnosticKind::Compile, node, &text, error.to_string(), names);
                            entry.error = Some(error.to_string());
                        }
                    }
                    entry.template = Some(text);
                }
            }
            _ => {}
        }

        entry
    }

    /// Apply every compiled binding under `roots` with values from `scope`.
    #[instrument(level = "debug", skip_all, fields(roots = roots.len()))]
    pub fn evaluate(&mut self, doc: &Document, roots: &[NodeId], scope: &Object) {
        *self.scope.borrow_mut() = scope.clone();

        for node in walk(doc, roots, &self.excluded) {
            let Some(entry) = self.cache.get_mut(&node) else {
                continue;
            };
            let values: Vec<Value> = entry
                .scope_names
                .iter()
                .map(|name| scope.get(name).cloned().unwrap_or_default())
                .collect();

            for binding in &entry.bindings {
                match &binding.target {
                    BindingTarget::Event(event) => {
                        if let Some(previous) = entry.listeners.remove(event) {
                            doc.remove_event_listener(node, previous);
                        }
                        let id = install_listener(
                            doc,
                            node,
                            event,
                            binding.expression.clone(),
                            &self.scope,
                            &self.diagnostics,
                        );
                        entry.listeners.insert(event.clone(), id);
                    }
                    target => match binding.expression.call(&values) {
                        Ok(value) => apply(doc, node, target, value),
                        Err(error) => {
                            report(
                                &self.diagnostics,
                                DiagnosticKind::Evaluation,
                                node,
                                binding.expression.source(),
                                error.to_string(),
                                &entry.scope_names,
                            );
                        }
                    },
                }
            }

            if let Some(template) = &entry.template_function {
                match template.render(&values) {
                    Ok(text) => {
                        if doc.text(node).as_deref() != Some(text.as_str()) {
                            doc.set_text_content(node, &text);
                        }
                    }
                    Err(error) => {
                        report(
                            &self.diagnostics,
                            DiagnosticKind::Evaluation,
                            node,
                            entry.template.as_deref().unwrap_or_default(),
                            error.to_string(),
                            &entry.scope_names,
                        );
                    }
                }
            }
        }
    }

    /// Remove installed listeners and forget every compiled node.
    pub fn clear(&mut self, doc: &Document) {
        for (node, entry) in std::mem::take(&mut self.cache) {
            for (_, listener) in entry.listeners {
                doc.remove_event_listener(node, listener);
            }
        }
        self.scope.borrow_mut().clear();
        self.excluded.clear();
        debug!("binding cache cleared");
    }

    fn report(&self, kind: DiagnosticKind, node: NodeId, expression: &str, message: String, names: &[String]) {
        report(&self.diagnostics, kind, node, expression, message, names);
    }
}

fn install_listener(
    doc: &Document,
    node: NodeId,
    event: &str,
    expression: CompiledExpression,
    scope: &Rc<RefCell<Object>>,
    diagnostics: &Diagnostics,
) -> ListenerId {
    let scope = scope.clone();
    let diagnostics = diagnostics.clone();

    doc.add_event_listener(node, event, move |fired: &Event| {
        let event_value = fired.to_value();
        let parameters = match fired.detail().get_member("parameters") {
            Ok(parameters @ Value::Array(_)) => parameters,
            _ => Value::Array(vec![event_value.clone()]),
        };
        let snapshot = {
            let mut shared = scope.borrow_mut();
            shared.insert("event".to_string(), event_value);
            shared.insert("parameters".to_string(), parameters);
            shared.clone()
        };

        let values: Vec<Value> = expression
            .names()
            .iter()
            .map(|name| snapshot.get(name).cloned().unwrap_or_default())
            .collect();
        if let Err(error) = expression.call(&values) {
            report(
                &diagnostics,
                DiagnosticKind::Evaluation,
                node,
                expression.source(),
                error.to_string(),
                expression.names(),
            );
        }
    })
}

fn report(diagnostics: &Diagnostics, kind: DiagnosticKind, node: NodeId, expression: &str, message: String, names: &[String]) {
    match kind {
        DiagnosticKind::Compile => {
            warn!(%node, expression, scope = ?names, error = %message, "binding failed to compile")
        }
        DiagnosticKind::Evaluation => {
            warn!(%node, expression, scope = ?names, error = %message, "binding failed to evaluate")
        }
    }
    diagnostics.borrow_mut().push(Diagnostic {
        kind,
        node,
        expression: expression.to_string(),
        message,
        scope: names.to_vec(),
    });
}

fn apply(doc: &Document, node: NodeId, target: &BindingTarget, value: Value) {
    match target {
        BindingTarget::Attribute(name) => apply_attribute(doc, node, name, &value),
        BindingTarget::Property(name) => apply_property(doc, node, name, value),
        BindingTarget::Attributes => {
            if let Value::Object(entries) = value {
                for (name, value) in &entries {
                    apply_attribute(doc, node, name, value);
                }
            }
        }
        BindingTarget::Properties => {
            if let Value::Object(entries) = value {
                for (name, value) in entries {
                    apply_property(doc, node, &name, value);
                }
            }
        }
        BindingTarget::Event(_) => {}
    }
}

fn apply_attribute(doc: &Document, node: NodeId, name: &str, value: &Value) {
    match value {
        Value::Undefined | Value::Null | Value::Boolean(false) => {
            if doc.has_attribute(node, name) {
                doc.remove_attribute(node, name);
            }
        }
        Value::Boolean(true) => {
            if doc.attribute(node, name).as_deref() != Some("") {
                doc.set_attribute(node, name, "");
            }
        }
        other => {
            let text = other.to_display_string();
            if doc.attribute(node, name).as_deref() != Some(text.as_str()) {
                doc.set_attribute(node, name, &text);
            }
        }
    }
}

fn apply_property(doc: &Document, node: NodeId, name: &str, value: Value) {
    if doc.property(node, name) != value {
        doc.set_property(node, name, value);
    }
}

/// Nodes visited by both passes, in document order.
fn walk(doc: &Document, roots: &[NodeId], excluded: &BTreeSet<NodeId>) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    let mut stack: Vec<NodeId> = roots.iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        if excluded.contains(&node) {
            continue;
        }
        nodes.push(node);
        let opaque = match doc.tag_name(node) {
            Some(tag) => tag.contains('-') || tag == "script" || is_template_marker(doc, node),
            None => false,
        };
        if !opaque {
            stack.extend(doc.children(node).into_iter().rev());
        }
    }
    nodes
}
