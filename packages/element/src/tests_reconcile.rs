/// Reconciliation tests - batching, aliases, reflection and state takeover
use crate::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use webcell_dom::{Document, Event, VNode};
use webcell_expression::{format_number, Object, Value};

/// Button showing `count`; clicking bumps its own state and reports through `onChange`.
struct Counter;

impl ReactiveComponent for Counter {
    fn initial_state(&self, _props: &PropertyBag) -> Object {
        Object::from([("count".to_string(), Value::Number(0.0))])
    }

    fn render(&self, cx: &RenderContext<'_>) -> Vec<VNode> {
        let count = cx.value("count").to_number();
        let handle = cx.handle();
        let on_change = cx.prop("onChange");
        vec![VNode::element("button")
            .on("click", move |_| {
                let next = count + 1.0;
                handle.set_state(Object::from([("count".to_string(), Value::Number(next))]));
                if let Value::Function(callback) = &on_change {
                    let _ = callback.call(&[Value::object([("count", Value::Number(next))])]);
                }
            })
            .with_child(VNode::text(format_number(count)))]
    }
}

fn counter_config() -> ComponentConfigBuilder {
    ComponentConfig::builder()
        .property("count", PropType::Number)
        .property("onChange", PropType::Function)
}

fn mount(component: ComponentClass) -> (Document, HostElement) {
    let doc = Document::new();
    let registry = Registry::new();
    registry.define(Some("x-test"), component).unwrap();
    let host = registry.create(&doc, "x-test").unwrap();
    doc.append_child(doc.root(), host.node());
    (doc, host)
}

fn mount_counter(config: ComponentConfig) -> (Document, HostElement) {
    mount(ComponentClass::reactive("Counter", config, Counter))
}

fn mount_template(config: ComponentConfig, markup: &str) -> (Document, HostElement) {
    mount(ComponentClass::template("Probe", config, markup))
}

/// Render passes observed through the `render` notification.
fn count_renders(doc: &Document, host: &HostElement) -> Rc<Cell<usize>> {
    let renders = Rc::new(Cell::new(0));
    let r = renders.clone();
    doc.add_event_listener(host.node(), "render", move |_| r.set(r.get() + 1));
    renders
}

#[cfg(test)]
mod reconcile_tests {
    use super::*;

    #[test]
    fn test_boolean_batch_renders_once() {
        let config = ComponentConfig::builder()
            .property("open", PropType::Boolean)
            .reflect("open")
            .build();
        let (doc, host) = mount_template(config, "<p>${open}</p>");
        assert_eq!(host.render_count(), 1);

        host.set_property("open", Value::Boolean(false));
        host.set_property("open", Value::Boolean(true));
        host.set_property("open", Value::Boolean(true));
        assert_eq!(host.render_count(), 1);

        doc.scheduler().run_until_idle();
        assert_eq!(host.render_count(), 2);
        assert_eq!(doc.attribute(host.node(), "open").as_deref(), Some(""));
        assert_eq!(doc.inner_html(host.node()), "<p>true</p>");
    }

    #[test]
    fn test_alias_both_directions() {
        let config = ComponentConfig::builder()
            .property("count", PropType::Number)
            .alias("value", "count")
            .build();
        let (doc, host) = mount_template(config, "<span>${count}</span>");

        host.set_property("value", Value::Number(7.0));
        assert_eq!(host.get_property("count"), Value::Number(7.0));
        doc.scheduler().run_until_idle();
        assert_eq!(host.get_property("count"), Value::Number(7.0));

        host.set_property("count", Value::Number(9.0));
        assert_eq!(host.get_property("value"), Value::Number(9.0));
        doc.scheduler().run_until_idle();
        assert_eq!(host.get_property("value"), Value::Number(9.0));

        // The alias attribute decodes with the aliased type
        doc.set_attribute(host.node(), "value", "4");
        doc.scheduler().run_until_idle();
        assert_eq!(host.get_property("count"), Value::Number(4.0));
        assert_eq!(doc.inner_html(host.node()), "<span>4</span>");
    }

    #[test]
    fn test_attribute_at_connect_is_not_rewritten() {
        let config = ComponentConfig::builder()
            .property("count", PropType::Number)
            .reflect("count")
            .build();
        let doc = Document::new();
        let registry = Registry::new();
        registry
            .define(Some("x-count"), ComponentClass::template("Count", config, "<b>${count}</b>"))
            .unwrap();
        let host = registry.create(&doc, "x-count").unwrap();
        doc.set_attribute(host.node(), "count", "3");
        doc.take_mutations();

        doc.append_child(doc.root(), host.node());
        doc.scheduler().run_until_idle();

        assert_eq!(host.get_property("count"), Value::Number(3.0));
        assert_eq!(doc.property(host.node(), "count"), Value::Number(3.0));
        assert_eq!(doc.inner_html(host.node()), "<b>3</b>");
        assert!(!doc
            .take_mutations()
            .iter()
            .any(|m| m.is_attribute_write_on(host.node())));
    }

    #[test]
    fn test_reflection_does_not_echo() {
        let config = ComponentConfig::builder()
            .property("count", PropType::Number)
            .reflect("count")
            .build();
        let (doc, host) = mount_template(config, "<b>${count}</b>");

        host.set_property("count", Value::Number(4.0));
        doc.scheduler().run_until_idle();
        assert_eq!(doc.attribute(host.node(), "count").as_deref(), Some("4"));
        assert_eq!(host.render_count(), 2);
        assert_eq!(doc.scheduler().pending(), 0);

        host.set_property("count", Value::Undefined);
        doc.scheduler().run_until_idle();
        assert!(!doc.has_attribute(host.node(), "count"));
        assert_eq!(host.render_count(), 3);
    }

    #[test]
    fn test_attribute_changes_coalesce() {
        let config = ComponentConfig::builder()
            .property("label", PropType::String)
            .property("size", PropType::Number)
            .build();
        let (doc, host) = mount_template(config, "<i>${label}:${size}</i>");

        doc.set_attribute(host.node(), "label", "a");
        doc.set_attribute(host.node(), "label", "b");
        doc.set_attribute(host.node(), "size", "2");
        assert_eq!(doc.scheduler().pending(), 1);

        doc.scheduler().run_until_idle();
        assert_eq!(host.render_count(), 2);
        assert_eq!(doc.inner_html(host.node()), "<i>b:2</i>");
    }

    #[test]
    fn test_pre_evaluated_attribute() {
        let config = ComponentConfig::builder().property("count", PropType::String).build();
        let doc = Document::new();
        let registry = Registry::new();
        registry
            .define(Some("x-pre"), ComponentClass::template("Pre", config, "<b>${count}</b>"))
            .unwrap();
        let host = registry.create(&doc, "x-pre").unwrap();
        doc.set_attribute(host.node(), "-count", "Math.max(2, 5)");
        doc.append_child(doc.root(), host.node());

        assert_eq!(host.get_property("count"), Value::Number(5.0));
        assert_eq!(host.internal_properties()["count"], Value::Number(5.0));
    }

    #[test]
    fn test_state_takeover_renders_twice_before_output_events() {
        let (doc, host) = mount_counter(counter_config().batch_updates(false).build());
        let renders = count_renders(&doc, &host);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let (s, r) = (seen.clone(), renders.clone());
        doc.add_event_listener(host.node(), "change", move |_| s.borrow_mut().push(r.get()));

        host.set_property("count", Value::Number(5.0));
        assert_eq!(doc.inner_html(host.node()), "<button>5</button>");
        host.set_property("count", Value::Undefined);
        assert_eq!(renders.get(), 1);

        doc.scheduler().run_until_idle();
        assert_eq!(*seen.borrow(), vec![2]);
        assert_eq!(host.get_property("count"), Value::Number(0.0));
        assert_eq!(doc.inner_html(host.node()), "<button>0</button>");
    }

    #[test]
    fn test_subtree_callback_reflects_and_forwards() {
        let config = counter_config().batch_updates(false).reflect("count").build();
        let (doc, host) = mount_counter(config);

        let forwarded = Rc::new(RefCell::new(Vec::new()));
        let f = forwarded.clone();
        doc.add_event_listener(host.node(), "change", move |event: &Event| {
            f.borrow_mut().push(event.detail().clone());
        });

        let button = doc.children(host.node())[0];
        doc.dispatch_event(button, &Event::new("click"));

        assert_eq!(host.get_property("count"), Value::Number(1.0));
        assert_eq!(doc.attribute(host.node(), "count").as_deref(), Some("1"));
        assert_eq!(doc.inner_html(host.node()), "<button>1</button>");
        // State-owned names are not pushed back down
        assert_eq!(host.internal_properties()["count"], Value::Undefined);

        let forwarded = forwarded.borrow();
        assert_eq!(forwarded.len(), 1);
        let parameters = forwarded[0].get_member("parameters").unwrap();
        assert_eq!(
            parameters,
            Value::Array(vec![Value::object([("count", Value::Number(1.0))])])
        );
    }

    #[test]
    fn test_function_attribute_runs_body() {
        let config = counter_config().batch_updates(false).build();
        let doc = Document::new();
        let registry = Registry::new();
        registry
            .define(Some("x-counter"), ComponentClass::reactive("Counter", config, Counter))
            .unwrap();
        let host = registry.create(&doc, "x-counter").unwrap();
        doc.set_attribute(host.node(), "on-change", "parameters.length +");
        doc.append_child(doc.root(), host.node());

        // A handler that does not compile is undefined; the subtree gets the default callback
        assert!(host.internal_properties()["onChange"].is_undefined());
        assert!(matches!(host.get_property("onChange"), Value::Function(_)));

        doc.set_attribute(host.node(), "on-change", "firstParameter.count * 10");
        let callback = host.get_property("onChange");
        let Value::Function(callback) = callback else {
            panic!("expected a compiled handler, got {:?}", callback);
        };
        let result = callback.call(&[Value::object([("count", Value::Number(2.0))])]).unwrap();
        assert_eq!(result, Value::Number(20.0));
    }

    #[test]
    fn test_controllable_accepts_patch() {
        let patch = Object::from([("count".to_string(), Value::Number(3.0))]);

        let (_doc, host) = mount_counter(counter_config().batch_updates(false).build());
        host.reflect_properties(&patch);
        assert_eq!(host.internal_properties()["count"], Value::Undefined);
        assert_eq!(host.external_properties()["count"], Value::Number(3.0));

        let config = counter_config().batch_updates(false).controllable("count").build();
        let (_doc, host) = mount_counter(config);
        host.reflect_properties(&patch);
        assert_eq!(host.internal_properties()["count"], Value::Number(3.0));
    }

    #[test]
    fn test_synthetic_event_resamples_current_target() {
        let (_doc, host) = mount_counter(counter_config().batch_updates(false).build());
        let event = Value::object([
            ("persist", Value::function("persist", |_| Ok(Value::Undefined))),
            ("currentTarget", Value::object([("count", Value::Number(8.0))])),
        ]);

        host.reflect_event_to_properties("onChange", &[event]);
        assert_eq!(host.external_properties()["count"], Value::Number(8.0));
    }

    #[test]
    fn test_detail_value_unwrapped() {
        let config = ComponentConfig::builder()
            .property("value", PropType::String)
            .property("onInput", PropType::Function)
            .build();
        let (_doc, host) = mount_template(config, "<em>${value}</em>");
        let event = Value::object([("detail", Value::object([("value", Value::from("typed"))]))]);

        host.reflect_event_to_properties("onInput", &[event]);
        assert_eq!(host.get_property("value"), Value::from("typed"));
        // Batching is restored afterwards
        assert!(host.is_batching());
    }

    #[test]
    fn test_deferred_mapper() {
        let config = ComponentConfig::builder()
            .property("label", PropType::String)
            .property("onPick", PropType::Function)
            .map_event(
                "onPick",
                EventMapping::mapper(|args, _host| {
                    let picked = args.first().cloned().unwrap_or_default();
                    MapperOutcome::Deferred(Box::new(move || {
                        MapperOutcome::Patch(Object::from([("label".to_string(), picked)]))
                    }))
                }),
            )
            .build();
        let (doc, host) = mount_template(config, "<em>${label}</em>");

        host.reflect_event_to_properties("onPick", &[Value::from("blue")]);
        assert!(host.get_property("label").is_undefined());

        doc.scheduler().run_until_idle();
        assert_eq!(host.get_property("label"), Value::from("blue"));
        assert_eq!(doc.inner_html(host.node()), "<em>blue</em>");
    }

    #[test]
    fn test_render_veto() {
        let config = ComponentConfig::builder().property("label", PropType::String).build();
        let (doc, host) = mount_template(config, "<em>${label}</em>");
        doc.add_event_listener(host.node(), "render", |event: &Event| event.prevent_default());

        host.set_property("label", Value::from("x"));
        doc.scheduler().run_until_idle();
        assert_eq!(host.render_count(), 1);
        assert_eq!(doc.inner_html(host.node()), "<em></em>");
    }

    #[test]
    fn test_batch_after_disconnect_is_dropped() {
        let config = ComponentConfig::builder().property("label", PropType::String).build();
        let (doc, host) = mount_template(config, "<em>${label}</em>");

        host.set_property("label", Value::from("late"));
        doc.remove(host.node());
        doc.scheduler().run_until_idle();

        assert!(!host.is_connected());
        assert_eq!(host.render_count(), 1);
        assert_eq!(host.external_properties()["label"], Value::from("late"));
    }

    #[test]
    fn test_output_events_once_per_batch() {
        let config = ComponentConfig::builder()
            .property("count", PropType::Number)
            .property("onValueChange", PropType::Function)
            .build();
        let (doc, host) = mount_template(config, "<b>${count}</b>");

        let snapshots = Rc::new(RefCell::new(Vec::new()));
        let s = snapshots.clone();
        doc.add_event_listener(host.node(), "value-change", move |event: &Event| {
            s.borrow_mut().push(event.detail().get_member("parameters").unwrap());
        });

        host.set_property("count", Value::Number(1.0));
        host.set_property("count", Value::Number(2.0));
        doc.scheduler().run_until_idle();

        let snapshots = snapshots.borrow();
        assert_eq!(snapshots.len(), 1);
        let Value::Array(parameters) = &snapshots[0] else {
            panic!("parameters must be an array");
        };
        assert_eq!(parameters[0].get_member("count").unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_render_property_is_not_forwarded() {
        let config = ComponentConfig::builder()
            .property("onSelect", PropType::Function)
            .property("onChange", PropType::Function)
            .render_property("onSelect")
            .build();
        let (doc, host) = mount_template(config, "<b></b>");
        doc.set_attribute(host.node(), "on-select", "firstParameter");
        doc.set_attribute(host.node(), "on-change", "firstParameter");
        doc.scheduler().run_until_idle();

        let fired = Rc::new(RefCell::new(Vec::new()));
        for event in ["select", "change"] {
            let f = fired.clone();
            doc.add_event_listener(host.node(), event, move |event: &Event| {
                f.borrow_mut().push(event.event_type().to_string());
            });
        }

        for name in ["onSelect", "onChange"] {
            let Value::Function(callback) = host.get_property(name) else {
                panic!("{} should hold a compiled handler", name);
            };
            assert_eq!(callback.call(&[Value::Number(1.0)]).unwrap(), Value::Number(1.0));
        }
        assert_eq!(*fired.borrow(), vec!["change".to_string()]);
    }

    #[test]
    fn test_state_changes_coalesce_into_one_render() {
        let (doc, host) = mount_counter(counter_config().build());
        let renders = count_renders(&doc, &host);

        for count in [1.0, 2.0, 3.0] {
            host.handle()
                .set_state(Object::from([("count".to_string(), Value::Number(count))]));
        }
        assert_eq!(renders.get(), 0);
        assert_eq!(doc.scheduler().pending(), 1);

        doc.scheduler().run_until_idle();
        assert_eq!(renders.get(), 1);
        assert_eq!(doc.inner_html(host.node()), "<button>3</button>");
        assert_eq!(host.get_property("count"), Value::Number(3.0));
    }
}
