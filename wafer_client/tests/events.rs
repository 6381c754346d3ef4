// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener registration and event dispatch.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wafer_client::{ClientDocument, EmitOptions};
use wafer_core::{
    Definition, Error, EventHandler, HostExt, ListenerOptions, Prop, PropType, Target,
};
use wafer_dom::NodeId;

type Log = Rc<RefCell<Vec<String>>>;

fn record(log: &Log, label: &'static str) -> EventHandler<ClientDocument> {
    let log = Rc::clone(log);
    EventHandler::<ClientDocument>::new(move |_, _, event| {
        log.borrow_mut().push(format!("{label}:{:?}", event.phase()));
        Ok(())
    })
}

fn capturing(handler: EventHandler<ClientDocument>) -> EventHandler<ClientDocument> {
    handler.options(ListenerOptions {
        capture: true,
        ..ListenerOptions::default()
    })
}

fn first(doc: &ClientDocument, root: NodeId, selector: &str) -> NodeId {
    doc.tree().query_selector(root, selector).unwrap().unwrap()
}

/// `<div><p><span></span></p></div>` with handles to each element.
fn nested() -> (ClientDocument, [NodeId; 3]) {
    let mut doc = ClientDocument::new();
    let body = doc.document();
    doc.set_inner_html(body, "<div><p><span></span></p></div>")
        .unwrap();
    let nodes = ["div", "p", "span"].map(|tag| first(&doc, body, tag));
    (doc, nodes)
}

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

#[test]
fn capture_then_target_then_bubble() {
    let (mut doc, [div, p, span]) = nested();
    let log = Log::default();
    doc.add_event_listener(div, "click", &record(&log, "div")).unwrap();
    doc.add_event_listener(span, "click", &record(&log, "span")).unwrap();
    doc.add_event_listener(p, "click", &capturing(record(&log, "p"))).unwrap();
    doc.add_event_listener(span, "click", &capturing(record(&log, "span-capture")))
        .unwrap();
    doc.add_event_listener(div, "click", &capturing(record(&log, "div"))).unwrap();
    doc.add_event_listener(p, "click", &record(&log, "p")).unwrap();

    assert!(doc.click(span).unwrap());
    assert_eq!(
        entries(&log),
        [
            "div:Capture",
            "p:Capture",
            "span-capture:Target",
            "span:Target",
            "p:Bubble",
            "div:Bubble",
        ]
    );
}

#[test]
fn non_bubbling_events_skip_the_bubble_phase() {
    let (mut doc, [div, _, span]) = nested();
    let log = Log::default();
    doc.add_event_listener(div, "ping", &record(&log, "div")).unwrap();
    doc.add_event_listener(div, "ping", &capturing(record(&log, "div"))).unwrap();
    doc.add_event_listener(span, "ping", &record(&log, "span")).unwrap();

    let options = EmitOptions {
        bubbles: false,
        ..EmitOptions::default()
    };
    doc.emit(span, "ping", None, options).unwrap();
    assert_eq!(entries(&log), ["div:Capture", "span:Target"]);
}

#[test]
fn stop_propagation_finishes_the_current_node() {
    let (mut doc, [div, p, span]) = nested();
    let log = Log::default();
    let stop = EventHandler::<ClientDocument>::new(|_, _, event| {
        event.stop_propagation();
        Ok(())
    });
    doc.add_event_listener(p, "click", &stop).unwrap();
    doc.add_event_listener(p, "click", &record(&log, "p")).unwrap();
    doc.add_event_listener(div, "click", &record(&log, "div")).unwrap();

    doc.click(span).unwrap();
    assert_eq!(entries(&log), ["p:Bubble"]);
}

#[test]
fn stop_immediate_propagation_skips_remaining_listeners() {
    let (mut doc, [div, p, span]) = nested();
    let log = Log::default();
    let stop = EventHandler::<ClientDocument>::new(|_, _, event| {
        event.stop_immediate_propagation();
        Ok(())
    });
    doc.add_event_listener(p, "click", &stop).unwrap();
    doc.add_event_listener(p, "click", &record(&log, "p")).unwrap();
    doc.add_event_listener(div, "click", &record(&log, "div")).unwrap();

    doc.click(span).unwrap();
    assert_eq!(entries(&log), Vec::<String>::new());
}

#[test]
fn once_listeners_run_once() {
    let (mut doc, [_, _, span]) = nested();
    let log = Log::default();
    let once = record(&log, "span").options(ListenerOptions {
        once: true,
        ..ListenerOptions::default()
    });
    doc.add_event_listener(span, "click", &once).unwrap();
    assert_eq!(doc.listener_count(span, "click"), 1);

    doc.click(span).unwrap();
    doc.click(span).unwrap();
    assert_eq!(entries(&log), ["span:Target"]);
    assert_eq!(doc.listener_count(span, "click"), 0);
}

#[test]
fn duplicate_listeners_are_ignored() {
    let (mut doc, [_, _, span]) = nested();
    let log = Log::default();
    let handler = record(&log, "span");
    doc.add_event_listener(span, "click", &handler).unwrap();
    doc.add_event_listener(span, "click", &handler).unwrap();
    assert_eq!(doc.listener_count(span, "click"), 1);

    // A capture registration of the same handler is a different listener.
    doc.add_event_listener(span, "click", &capturing(handler.clone()))
        .unwrap();
    assert_eq!(doc.listener_count(span, "click"), 2);
    assert_eq!(doc.listener_count(span, "input"), 0);
}

#[test]
fn prevent_default_is_reported_unless_passive() {
    let (mut doc, [div, p, span]) = nested();
    let cancel = EventHandler::<ClientDocument>::new(|_, _, event| {
        event.prevent_default();
        Ok(())
    });
    let passive = cancel.clone().options(ListenerOptions {
        passive: true,
        ..ListenerOptions::default()
    });
    doc.add_event_listener(p, "click", &passive).unwrap();
    assert!(doc.click(span).unwrap());

    doc.add_event_listener(div, "click", &cancel).unwrap();
    assert!(!doc.click(span).unwrap());
}

#[test]
fn emitted_detail_reaches_listeners() {
    let (mut doc, [div, _, span]) = nested();
    let seen: Rc<RefCell<Vec<Value>>> = Rc::default();
    let sink = Rc::clone(&seen);
    let handler = EventHandler::<ClientDocument>::new(move |_, _, event| {
        sink.borrow_mut().push(event.detail().clone());
        Ok(())
    });
    doc.add_event_listener(div, "select", &handler).unwrap();

    doc.emit(span, "select", Some(json!({ "id": 3 })), EmitOptions::default())
        .unwrap();
    doc.emit(span, "select", None, EmitOptions::default()).unwrap();
    assert_eq!(*seen.borrow(), [json!({ "id": 3 }), json!({})]);
}

#[test]
fn listener_errors_end_the_dispatch() {
    let (mut doc, [div, p, span]) = nested();
    let log = Log::default();
    let fail = EventHandler::<ClientDocument>::new(|_, _, _| Err(Error::callback("nope")));
    doc.add_event_listener(p, "click", &fail).unwrap();
    doc.add_event_listener(div, "click", &record(&log, "div")).unwrap();

    let err = doc.click(span).unwrap_err();
    assert!(matches!(err, Error::Callback(_)), "unexpected error {err:?}");
    assert_eq!(entries(&log), Vec::<String>::new());
}

fn shadowed(doc: &mut ClientDocument) -> (NodeId, NodeId, NodeId) {
    doc.define(
        "x-button",
        Definition::builder().template("<button></button>").build(),
    )
    .unwrap();
    let body = doc.document();
    doc.set_inner_html(body, "<div><x-button></x-button></div>")
        .unwrap();
    let div = first(doc, body, "div");
    let host = first(doc, body, "x-button");
    let shadow = doc.tree().shadow_root(host).unwrap();
    let button = first(doc, shadow, "button");
    (div, host, button)
}

#[test]
fn composed_events_are_retargeted_to_the_host() {
    let mut doc = ClientDocument::new();
    let (div, host, button) = shadowed(&mut doc);
    let targets: Rc<RefCell<Vec<(NodeId, NodeId)>>> = Rc::default();
    for node in [div, host, button] {
        let sink = Rc::clone(&targets);
        let handler = EventHandler::<ClientDocument>::new(move |_, this, event| {
            sink.borrow_mut().push((this, event.target()));
            Ok(())
        });
        doc.add_event_listener(node, "click", &handler).unwrap();
    }

    doc.click(button).unwrap();
    assert_eq!(
        *targets.borrow(),
        [(button, button), (host, host), (div, host)]
    );
}

#[test]
fn uncomposed_events_stay_inside_the_shadow_tree() {
    let mut doc = ClientDocument::new();
    let (div, host, button) = shadowed(&mut doc);
    let log = Log::default();
    doc.add_event_listener(div, "ping", &record(&log, "div")).unwrap();
    doc.add_event_listener(host, "ping", &record(&log, "host")).unwrap();
    doc.add_event_listener(button, "ping", &record(&log, "button"))
        .unwrap();

    let options = EmitOptions {
        composed: false,
        ..EmitOptions::default()
    };
    doc.emit(button, "ping", None, options).unwrap();
    assert_eq!(entries(&log), ["button:Target"]);
}

#[test]
fn declared_events_bind_when_the_component_connects() {
    let mut doc = ClientDocument::new();
    doc.define(
        "x-counter",
        Definition::<ClientDocument>::builder()
            .template("<button></button>")
            .prop(
                "count",
                Prop::new(PropType::Number)
                    .initial(0)
                    .target(Target::new("$button").text()),
            )
            .event(
                "$button",
                "click",
                EventHandler::<ClientDocument>::new(|host, this, _| {
                    let count = host.prop(this, "count").and_then(Value::as_i64).unwrap_or(0);
                    host.set_prop(this, "count", count + 1)
                }),
            )
            .build(),
    )
    .unwrap();
    let el = doc.create_element("x-counter").unwrap();
    let shadow = doc.tree().shadow_root(el).unwrap();
    let button = first(&doc, shadow, "button");
    assert_eq!(doc.listener_count(button, "click"), 0);

    let body = doc.document();
    doc.append_child(body, el).unwrap();
    doc.update_done(el).unwrap();
    assert_eq!(doc.listener_count(button, "click"), 1);
    assert_eq!(doc.inner_html(shadow), "<button>0</button>");

    doc.click(button).unwrap();
    doc.click(button).unwrap();
    doc.update_done(el).unwrap();
    assert_eq!(doc.prop(el, "count"), Some(&json!(2)));
    assert_eq!(doc.inner_html(shadow), "<button>2</button>");
}
