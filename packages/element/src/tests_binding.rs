/// Binding tests - attribute, property and event bindings and their failure policy
use crate::*;
use webcell_dom::{Document, Event, NodeId};
use webcell_expression::{ExpressionCompiler, Object, Value};

fn define(registry: &Registry, tag: &str, class: ComponentClass) {
    registry.define(Some(tag), class).unwrap();
}

fn connect(doc: &Document, registry: &Registry, tag: &str, attributes: &[(&str, &str)]) -> HostElement {
    let host = registry.create(doc, tag).unwrap();
    for (name, value) in attributes {
        doc.set_attribute(host.node(), name, value);
    }
    doc.append_child(doc.root(), host.node());
    host
}

fn find(doc: &Document, root: NodeId, tag: &str) -> NodeId {
    doc.descendants(root)
        .into_iter()
        .find(|node| doc.tag_name(*node).as_deref() == Some(tag))
        .unwrap()
}

fn labeled() -> ComponentConfig {
    ComponentConfig::builder()
        .property("label", PropType::String)
        .property("count", PropType::Number)
        .build()
}

#[cfg(test)]
mod binding_tests {
    use super::*;

    #[test]
    fn test_parse_binding_targets() {
        assert_eq!(
            BindingTarget::parse("bind-attribute-title"),
            Some(BindingTarget::Attribute("title".into()))
        );
        assert_eq!(
            BindingTarget::parse("data-bind-property-class"),
            Some(BindingTarget::Property("className".into()))
        );
        assert_eq!(
            BindingTarget::parse("bind-property-tab-index"),
            Some(BindingTarget::Property("tabIndex".into()))
        );
        assert_eq!(BindingTarget::parse("bind-attributes"), Some(BindingTarget::Attributes));
        assert_eq!(BindingTarget::parse("bind-properties"), Some(BindingTarget::Properties));
        assert_eq!(
            BindingTarget::parse("bind-on-click"),
            Some(BindingTarget::Event("click".into()))
        );
        assert_eq!(BindingTarget::parse("bind-on-"), None);
        assert_eq!(BindingTarget::parse("title"), None);
    }

    #[test]
    fn test_malformed_binding_leaves_sibling() {
        let registry = Registry::new();
        define(
            &registry,
            "x-button",
            ComponentClass::template(
                "Button",
                labeled(),
                r#"<button bind-on-click="this.x(" bind-attribute-title="label">go</button>"#,
            ),
        );
        let doc = Document::new();
        let host = connect(&doc, &registry, "x-button", &[("label", "Save")]);
        let button = find(&doc, host.node(), "button");

        assert_eq!(doc.attribute(button, "title").as_deref(), Some("Save"));
        assert_eq!(doc.listener_count(button, "click"), 0);

        let diagnostics = host.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::Compile);
        assert_eq!(diagnostics[0].expression, "this.x(");
        assert_eq!(diagnostics[0].node, button);

        // Clicking does nothing and raises nothing
        assert!(doc.dispatch_event(button, &Event::new("click")));
    }

    #[test]
    fn test_event_binding_replaces_and_rebinds() {
        let registry = Registry::new();
        let class = ComponentClass::template(
            "Stepper",
            labeled(),
            r#"<button bind-on-click="this.bump(1)" data-bind-on-click="this.bump(2)">${count}</button>"#,
        )
        .with_method("bump", |host, args| {
            let by = args.first().map(Value::to_number).unwrap_or(1.0);
            let current = host.get_property("count").to_number();
            let current = if current.is_nan() { 0.0 } else { current };
            host.set_property("count", Value::Number(current + by));
            Ok(Value::Undefined)
        });
        define(&registry, "x-stepper", class);
        let doc = Document::new();
        let host = connect(&doc, &registry, "x-stepper", &[("count", "0")]);
        let button = find(&doc, host.node(), "button");
        assert_eq!(doc.listener_count(button, "click"), 1);

        doc.dispatch_event(button, &Event::new("click"));
        doc.scheduler().run_until_idle();
        assert_eq!(host.get_property("count"), Value::Number(2.0));
        assert_eq!(doc.inner_html(host.node()), r#"<button bind-on-click="this.bump(1)" data-bind-on-click="this.bump(2)">2</button>"#);

        // Re-rendering keeps exactly one listener
        assert_eq!(doc.listener_count(button, "click"), 1);
    }

    #[test]
    fn test_event_scope_carries_event_and_parameters() {
        let registry = Registry::new();
        define(
            &registry,
            "x-echo",
            ComponentClass::template(
                "Echo",
                labeled(),
                r#"<input bind-on-input='this.setProperty("label", event.type + ":" + parameters.length)'>"#,
            ),
        );
        let doc = Document::new();
        let host = connect(&doc, &registry, "x-echo", &[]);
        let input = find(&doc, host.node(), "input");

        let detail = Value::object([("parameters", Value::Array(vec![Value::Null, Value::Null]))]);
        doc.dispatch_event(input, &Event::custom("input", detail));
        assert_eq!(host.get_property("label"), Value::from("input:2"));

        doc.dispatch_event(input, &Event::new("input"));
        assert_eq!(host.get_property("label"), Value::from("input:1"));
    }

    #[test]
    fn test_property_and_attribute_bindings() {
        let registry = Registry::new();
        define(
            &registry,
            "x-link",
            ComponentClass::template(
                "Link",
                labeled(),
                concat!(
                    r#"<a bind-property-class="label" bind-attributes="{href: '/items/' + count, hidden: count > 5}">"#,
                    r#"<span bind-properties="{textContent: label}"></span></a>"#
                ),
            ),
        );
        let doc = Document::new();
        let host = connect(&doc, &registry, "x-link", &[("label", "big"), ("count", "3")]);
        let link = find(&doc, host.node(), "a");

        assert_eq!(doc.attribute(link, "class").as_deref(), Some("big"));
        assert_eq!(doc.attribute(link, "href").as_deref(), Some("/items/3"));
        assert!(!doc.has_attribute(link, "hidden"));
        assert_eq!(doc.text_content(link), "big");

        host.set_property("count", Value::Number(9.0));
        doc.scheduler().run_until_idle();
        assert_eq!(doc.attribute(link, "href").as_deref(), Some("/items/9"));
        assert_eq!(doc.attribute(link, "hidden").as_deref(), Some(""));
    }

    #[test]
    fn test_evaluation_error_keeps_previous_content() {
        let registry = Registry::new();
        define(
            &registry,
            "x-broken",
            ComponentClass::template("Broken", labeled(), "<p>${missing.deep}</p><span>${label}</span>"),
        );
        let doc = Document::new();
        let host = connect(&doc, &registry, "x-broken", &[("label", "fine")]);

        assert_eq!(doc.inner_html(host.node()), "<p>${missing.deep}</p><span>fine</span>");
        let diagnostics = host.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::Evaluation);
        assert!(diagnostics[0].scope.contains(&"label".to_string()));
    }

    #[test]
    fn test_nested_custom_element_is_opaque() {
        let registry = Registry::new();
        define(
            &registry,
            "x-outer",
            ComponentClass::template(
                "Outer",
                labeled(),
                r#"<x-unknown bind-attribute-data-label="label"><b>${label}</b></x-unknown>"#,
            ),
        );
        let doc = Document::new();
        let host = connect(&doc, &registry, "x-outer", &[("label", "out")]);
        let inner = find(&doc, host.node(), "x-unknown");

        assert_eq!(doc.attribute(inner, "data-label").as_deref(), Some("out"));
        assert_eq!(doc.text_content(inner), "${label}");
    }

    #[test]
    fn test_binder_on_plain_subtree() {
        let doc = Document::new();
        let root = doc.create_element("div");
        webcell_dom::set_inner_html(&doc, root, r#"<p bind-attribute-title="a + b">${a}-${b}</p>"#).unwrap();
        let roots = doc.children(root);

        let mut binder = TemplateBinder::new(ExpressionCompiler::new());
        let names = vec!["a".to_string(), "b".to_string()];
        binder.compile(&doc, &roots, &names);
        assert_eq!(binder.cached_nodes(), 2);

        let scope = Object::from([
            ("a".to_string(), Value::Number(1.0)),
            ("b".to_string(), Value::Number(2.0)),
        ]);
        binder.evaluate(&doc, &roots, &scope);
        assert_eq!(doc.inner_html(root), r#"<p bind-attribute-title="a + b" title="3">1-2</p>"#);
        assert!(binder.diagnostics().is_empty());

        binder.clear(&doc);
        assert_eq!(binder.cached_nodes(), 0);
    }

    #[test]
    fn test_true_attribute_is_not_rewritten() {
        let doc = Document::new();
        let root = doc.create_element("div");
        webcell_dom::set_inner_html(&doc, root, r#"<input bind-attribute-disabled="off">"#).unwrap();
        let roots = doc.children(root);
        let input = roots[0];

        let mut binder = TemplateBinder::new(ExpressionCompiler::new());
        binder.compile(&doc, &roots, &["off".to_string()]);
        let scope = Object::from([("off".to_string(), Value::Boolean(true))]);

        binder.evaluate(&doc, &roots, &scope);
        assert_eq!(doc.attribute(input, "disabled").as_deref(), Some(""));

        doc.take_mutations();
        binder.evaluate(&doc, &roots, &scope);
        assert!(!doc.take_mutations().iter().any(|m| m.is_attribute_write_on(input)));
    }
}
