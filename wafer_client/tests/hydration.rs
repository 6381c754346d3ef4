// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Picking up server-rendered markup.

use pretty_assertions::assert_eq;
use serde_json::json;
use wafer_client::{ClientDocument, ClientOptions};
use wafer_core::{Definition, Host, HostExt, Prop, PropType, Repeat, Target, items_of};
use wafer_dom::NodeId;
use wafer_server::Registry;

fn greeting<H: Host>() -> Definition<H> {
    Definition::builder()
        .template("<h1></h1><p></p>")
        .prop(
            "name",
            Prop::new(PropType::String)
                .initial("World")
                .target(Target::new("$h1").text()),
        )
        .prop(
            "count",
            Prop::new(PropType::Number)
                .initial(0)
                .target(Target::new("$p").text()),
        )
        .build()
}

fn list<H: Host>() -> Definition<H> {
    Definition::builder()
        .template("<ul></ul>")
        .prop(
            "items",
            Prop::new(PropType::Array).target(Target::new("$ul").dom(|host, ul, items, _| {
                Repeat::new("<li></li>")
                    .target(Target::new("self").text())
                    .run(host, ul, items_of(items))
            })),
        )
        .build()
}

fn server_render<F: Fn() -> Definition<wafer_server::ServerDocument>>(
    tag: &str,
    definition: F,
    html: &str,
) -> String {
    wafer_server::render(html, Registry::new().define(tag, definition())).unwrap()
}

fn first(doc: &ClientDocument, root: NodeId, selector: &str) -> NodeId {
    doc.tree().query_selector(root, selector).unwrap().unwrap()
}

fn hydrate(
    options: ClientOptions,
    tag: &str,
    definition: Definition<ClientDocument>,
    html: &str,
) -> (ClientDocument, NodeId) {
    let mut doc = ClientDocument::with_options(options);
    doc.define(tag, definition).unwrap();
    let body = doc.document();
    doc.set_inner_html(body, html).unwrap();
    let el = first(&doc, body, tag);
    doc.update_done(el).unwrap();
    (doc, el)
}

const NO_DSD: ClientOptions = ClientOptions {
    declarative_shadow_dom: false,
};

#[test]
fn server_output_hydrates_with_declarative_shadow_dom() {
    let html = server_render("x-greeting", greeting, r#"<x-greeting name="Ada"></x-greeting>"#);
    let (mut doc, el) = hydrate(ClientOptions::default(), "x-greeting", greeting(), &html);

    let shadow = doc.tree().shadow_root(el).unwrap();
    assert_eq!(doc.inner_html(shadow), "<h1>Ada</h1><p>0</p>");
    assert_eq!(doc.prop(el, "name"), Some(&json!("Ada")));
    assert_eq!(doc.prop(el, "count"), Some(&json!(0)));
    assert_eq!(doc.tree().children(el).count(), 0, "template left behind");

    let h1 = first(&doc, shadow, "h1");
    doc.set_prop(el, "count", 5).unwrap();
    doc.update_done(el).unwrap();
    assert_eq!(doc.inner_html(shadow), "<h1>Ada</h1><p>5</p>");
    assert_eq!(first(&doc, shadow, "h1"), h1);
}

#[test]
fn server_output_hydrates_by_adopting_the_template() {
    let html = server_render("x-greeting", greeting, r#"<x-greeting name="Ada"></x-greeting>"#);
    let (mut doc, el) = hydrate(NO_DSD, "x-greeting", greeting(), &html);

    let shadow = doc.tree().shadow_root(el).unwrap();
    assert_eq!(doc.inner_html(shadow), "<h1>Ada</h1><p>0</p>");
    assert_eq!(doc.tree().children(el).count(), 0, "template not adopted");

    doc.set_prop(el, "name", "Grace").unwrap();
    doc.update_done(el).unwrap();
    assert_eq!(doc.inner_html(shadow), "<h1>Grace</h1><p>0</p>");
}

#[test]
fn first_cycle_leaves_server_content_and_attributes_alone() {
    let definition = Definition::<ClientDocument>::builder()
        .template("<b></b>")
        .prop("name", Prop::new(PropType::String).target(Target::new("$b").text()))
        .prop("mood", Prop::new(PropType::String).initial("happy").reflect())
        .build();
    let (mut doc, el) = hydrate(
        ClientOptions::default(),
        "x-name",
        definition,
        r#"<x-name name="Ada" wafer-ssr><template shadowroot="open"><b>Server</b></template></x-name>"#,
    );

    let shadow = doc.tree().shadow_root(el).unwrap();
    assert_eq!(doc.inner_html(shadow), "<b>Server</b>");
    assert_eq!(doc.outer_html(el), r#"<x-name name="Ada" wafer-ssr></x-name>"#);
    assert_eq!(doc.prop(el, "mood"), Some(&json!("happy")));

    doc.set_prop(el, "mood", "calm").unwrap();
    doc.request_update(el, Some(&["name"])).unwrap();
    doc.update_done(el).unwrap();
    assert_eq!(doc.inner_html(shadow), "<b>Ada</b>");
    assert_eq!(
        doc.outer_html(el),
        r#"<x-name name="Ada" wafer-ssr mood="calm"></x-name>"#
    );
}

#[test]
fn template_stays_until_the_component_is_defined() {
    let mut doc = ClientDocument::with_options(NO_DSD);
    let body = doc.document();
    doc.set_inner_html(
        body,
        r#"<x-name name="Ada" wafer-ssr><template shadowroot="open"><b>Ada</b></template></x-name>"#,
    )
    .unwrap();
    let el = first(&doc, body, "x-name");
    assert_eq!(doc.tree().shadow_root(el), None);
    assert_eq!(doc.tree().children(el).count(), 1);

    doc.define(
        "x-name",
        Definition::builder()
            .template("<b></b>")
            .prop("name", Prop::new(PropType::String).target(Target::new("$b").text()))
            .build(),
    )
    .unwrap();
    doc.update_done(el).unwrap();

    let shadow = doc.tree().shadow_root(el).unwrap();
    assert_eq!(doc.inner_html(shadow), "<b>Ada</b>");
    assert_eq!(doc.tree().children(el).count(), 0);
}

#[test]
fn declarative_shadow_roots_attach_to_any_element() {
    let mut doc = ClientDocument::new();
    let body = doc.document();
    doc.set_inner_html(
        body,
        r#"<div><template shadowrootmode="open"><span>inside</span></template><i>light</i></div>"#,
    )
    .unwrap();
    let div = first(&doc, body, "div");

    let shadow = doc.tree().shadow_root(div).unwrap();
    assert_eq!(doc.inner_html(shadow), "<span>inside</span>");
    assert_eq!(doc.inner_html(div), "<i>light</i>");
}

#[test]
fn hydrated_repeat_keeps_server_items() {
    let html = server_render("x-list", list, r#"<x-list items="[1,2,3]"></x-list>"#);
    let (mut doc, el) = hydrate(ClientOptions::default(), "x-list", list(), &html);

    let shadow = doc.tree().shadow_root(el).unwrap();
    let ul = first(&doc, shadow, "ul");
    let before: Vec<NodeId> = doc.tree().children(ul).collect();
    assert_eq!(before.len(), 3);

    doc.set_prop(el, "items", json!([3, 1])).unwrap();
    doc.update_done(el).unwrap();

    let after: Vec<NodeId> = doc.tree().children(ul).collect();
    assert_eq!(after, vec![before[2], before[0]]);
    assert_eq!(
        doc.inner_html(ul),
        r#"<li wafer-key="3">3</li><li wafer-key="1">1</li>"#
    );
}
