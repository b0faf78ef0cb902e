/// Slot projection tests - capture, placement, fallbacks and deferred templates
use crate::*;
use webcell_dom::{set_inner_html, Document, NodeId, VNode};
use webcell_expression::Value;

/// Renders a wrapper with a `header` placeholder and a default placeholder.
struct Frame;

impl ReactiveComponent for Frame {
    fn render(&self, _cx: &RenderContext<'_>) -> Vec<VNode> {
        vec![VNode::element("div")
            .with_child(VNode::element("slot").with_attr("name", "header"))
            .with_child(VNode::element("slot"))]
    }
}

fn host_with_light_dom(doc: &Document, registry: &Registry, tag: &str, light_dom: &str) -> HostElement {
    let host = registry.create(doc, tag).unwrap();
    set_inner_html(doc, host.node(), light_dom).unwrap();
    doc.append_child(doc.root(), host.node());
    host
}

fn light_dom_host(doc: &Document, light_dom: &str) -> NodeId {
    let host = doc.create_element("x-host");
    set_inner_html(doc, host, light_dom).unwrap();
    host
}

#[cfg(test)]
mod slot_tests {
    use super::*;

    #[test]
    fn test_grab_files_children_by_slot() {
        let doc = Document::new();
        let host = light_dom_host(&doc, r#"<h1 slot="header">Title</h1><p>one</p><p>two</p>"#);

        let slots = Slots::grab(&doc, host);
        assert!(doc.children(host).is_empty());
        assert_eq!(slots.names(), vec!["header".to_string()]);
        assert_eq!(slots.named("header").map(<[_]>::len), Some(1));
        assert_eq!(slots.default_content().len(), 2);
    }

    #[test]
    fn test_template_marker_kept_as_text() {
        let doc = Document::new();
        let host = light_dom_host(&doc, r#"<script type="text/template"><b>${label}</b></script>"#);

        let slots = Slots::grab(&doc, host);
        assert_eq!(
            slots.default_content(),
            &[SlotContent::Template("<b>${label}</b>".to_string())]
        );
    }

    #[test]
    fn test_template_projection() {
        let registry = Registry::new();
        registry
            .define(
                Some("x-card"),
                ComponentClass::template(
                    "Card",
                    ComponentConfig::builder().property("label", PropType::String).build(),
                    r#"<header><slot name="header"></slot></header><main><slot></slot></main>"#,
                ),
            )
            .unwrap();
        let doc = Document::new();
        let host = host_with_light_dom(
            &doc,
            &registry,
            "x-card",
            "<h1 slot=\"header\">Title</h1>\n  <p>one</p>\n  <p>two</p>\n",
        );

        let expected = r#"<header><h1 slot="header">Title</h1></header><main><p>one</p><p>two</p></main>"#;
        assert_eq!(doc.inner_html(host.node()), expected);

        host.set_property("label", Value::from("again"));
        doc.scheduler().run_until_idle();
        assert_eq!(host.render_count(), 2);
        assert_eq!(doc.inner_html(host.node()), expected);
    }

    #[test]
    fn test_reactive_projection_is_idempotent() {
        let registry = Registry::new();
        registry
            .define(Some("x-frame"), ComponentClass::reactive("Frame", ComponentConfig::default(), Frame))
            .unwrap();
        let doc = Document::new();
        let host = host_with_light_dom(&doc, &registry, "x-frame", r#"<p>body</p><h2 slot="header">Head</h2>"#);

        let expected = r#"<div><h2 slot="header">Head</h2><p>body</p></div>"#;
        assert_eq!(doc.inner_html(host.node()), expected);

        host.render("manual");
        host.render("manual");
        assert_eq!(doc.inner_html(host.node()), expected);
    }

    #[test]
    fn test_reinserted_host_keeps_light_dom() {
        let registry = Registry::new();
        registry
            .define(
                Some("x-card"),
                ComponentClass::template("Card", ComponentConfig::default(), "<main><slot></slot></main>"),
            )
            .unwrap();
        let doc = Document::new();
        let host = host_with_light_dom(&doc, &registry, "x-card", "<p>one</p>");
        assert_eq!(doc.inner_html(host.node()), "<main><p>one</p></main>");

        doc.remove(host.node());
        assert_eq!(doc.inner_html(host.node()), "<p>one</p>");

        doc.append_child(doc.root(), host.node());
        assert_eq!(doc.inner_html(host.node()), "<main><p>one</p></main>");
        assert_eq!(host.render_count(), 2);
    }

    #[test]
    fn test_moved_reactive_host_keeps_light_dom() {
        let registry = Registry::new();
        registry
            .define(Some("x-frame"), ComponentClass::reactive("Frame", ComponentConfig::default(), Frame))
            .unwrap();
        let doc = Document::new();
        let host = host_with_light_dom(&doc, &registry, "x-frame", r#"<h2 slot="header">Head</h2><p>body</p>"#);
        let expected = r#"<div><h2 slot="header">Head</h2><p>body</p></div>"#;
        assert_eq!(doc.inner_html(host.node()), expected);

        let aside = doc.create_element("aside");
        doc.append_child(doc.root(), aside);
        doc.append_child(aside, host.node());

        assert!(host.is_connected());
        assert_eq!(doc.inner_html(host.node()), expected);
    }

    #[test]
    fn test_named_fallback_is_captured() {
        let registry = Registry::new();
        registry
            .define(
                Some("x-icon"),
                ComponentClass::template(
                    "Icon",
                    ComponentConfig::default(),
                    r#"<span><slot name="icon"><i>default</i></slot></span><slot>empty</slot>"#,
                ),
            )
            .unwrap();
        let doc = Document::new();
        let host = host_with_light_dom(&doc, &registry, "x-icon", "");

        assert_eq!(doc.inner_html(host.node()), "<span><i>default</i></span>empty");
        assert_eq!(host.slot_names(), vec!["icon".to_string()]);
    }

    #[test]
    fn test_deferred_template_is_bound() {
        let registry = Registry::new();
        registry
            .define(
                Some("x-panel"),
                ComponentClass::template(
                    "Panel",
                    ComponentConfig::builder().property("label", PropType::String).build(),
                    "<section><slot></slot></section>",
                ),
            )
            .unwrap();
        let doc = Document::new();
        let host = registry.create(&doc, "x-panel").unwrap();
        set_inner_html(&doc, host.node(), r#"<script type="text/template"><b>${label}</b></script>"#).unwrap();
        doc.set_attribute(host.node(), "label", "hi");
        doc.append_child(doc.root(), host.node());

        assert_eq!(doc.inner_html(host.node()), "<section><b>hi</b></section>");
    }

    #[test]
    fn test_clone_slots_leaves_captured_nodes() {
        let doc = Document::new();
        let host = light_dom_host(&doc, "<p>shared</p>");
        let mut slots = Slots::grab(&doc, host);
        let captured = match slots.default_content() {
            [SlotContent::Node(node)] => *node,
            other => panic!("unexpected slot content {:?}", other),
        };

        let target = doc.create_element("div");
        set_inner_html(&doc, target, "<slot></slot>").unwrap();
        let projected = slots.apply(&doc, target, true);

        assert_eq!(projected.len(), 1);
        assert_ne!(projected[0], captured);
        assert_eq!(doc.parent(captured), None);
        assert_eq!(doc.inner_html(target), "<p>shared</p>");
    }
}
