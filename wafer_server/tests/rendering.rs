// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering components to HTML.

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wafer_core::{Definition, Host, HostExt, Prop, PropType, Repeat, Target, items_of, to_text};
use wafer_server::{Registry, ServerDocument, render};

fn document(tag: &str, definition: Definition<ServerDocument>) -> ServerDocument {
    ServerDocument::new(Registry::new().define(tag, definition))
}

fn render_one(html: &str, definition: Definition<ServerDocument>) -> String {
    render(html, Registry::new().define("wafer-test", definition)).unwrap()
}

fn first(doc: &ServerDocument, root: wafer_dom::NodeId, selector: &str) -> wafer_dom::NodeId {
    doc.tree().query_selector(root, selector).unwrap().unwrap()
}

#[test]
fn renders_shadow_content_into_a_template() {
    let mut doc = document(
        "wafer-test",
        Definition::builder().template("<h1>Test</h1>").build(),
    );
    let el = doc.create_component("wafer-test").unwrap();
    doc.connect(el).unwrap();

    assert_eq!(
        doc.outer_html(el),
        r#"<wafer-test wafer-ssr><template shadowroot="open"><h1>Test</h1></template></wafer-test>"#
    );
    let shadow = doc.shadow_root(el).unwrap();
    assert_eq!(
        doc.outer_html(shadow),
        r#"<template shadowroot="open"><h1>Test</h1></template>"#
    );
}

#[test]
fn renders_light_content_into_the_element() {
    let mut doc = document(
        "wafer-test",
        Definition::builder().template("<h1>Test</h1>").light().build(),
    );
    let el = doc.create_component("wafer-test").unwrap();
    doc.connect(el).unwrap();

    assert_eq!(doc.outer_html(el), "<wafer-test wafer-ssr><h1>Test</h1></wafer-test>");
    assert_eq!(doc.shadow_root(el), None);
}

#[test]
fn closed_shadow_mode_is_written_out() {
    let html = render_one(
        "<wafer-test></wafer-test>",
        Definition::builder()
            .template("<p></p>")
            .shadow(wafer_dom::ShadowMode::Closed)
            .build(),
    );
    assert_eq!(
        html,
        r#"<wafer-test wafer-ssr><template shadowroot="closed"><p></p></template></wafer-test>"#
    );
}

#[test]
fn light_children_stay_before_the_shadow_template() {
    let html = render_one(
        "<wafer-test><span>Chris</span></wafer-test>",
        Definition::builder().template("<h1>Hi <slot></slot></h1>").build(),
    );
    assert_eq!(
        html,
        concat!(
            "<wafer-test wafer-ssr><span>Chris</span>",
            r#"<template shadowroot="open"><h1>Hi <slot></slot></h1></template>"#,
            "</wafer-test>"
        )
    );
}

#[test]
fn text_targets_in_shadow_and_light_content() {
    let shadow = render_one(
        r#"<wafer-test name="Chris"></wafer-test>"#,
        Definition::builder()
            .template(r#"<h1>Hi <span id="name"></span></h1>"#)
            .prop(
                "name",
                Prop::new(PropType::String)
                    .reflect()
                    .target(Target::new("$#name").text()),
            )
            .build(),
    );
    assert_eq!(
        shadow,
        concat!(
            r#"<wafer-test name="Chris" wafer-ssr><template shadowroot="open">"#,
            r#"<h1>Hi <span id="name">Chris</span></h1>"#,
            "</template></wafer-test>"
        )
    );

    let light = render_one(
        r#"<wafer-test name="Chris"><span id="name"></span></wafer-test>"#,
        Definition::builder()
            .prop(
                "name",
                Prop::new(PropType::String)
                    .reflect()
                    .target(Target::new("#name").text()),
            )
            .build(),
    );
    assert_eq!(
        light,
        concat!(
            r#"<wafer-test name="Chris" wafer-ssr><span id="name">Chris</span>"#,
            r#"<template shadowroot="open"></template></wafer-test>"#
        )
    );
}

#[test]
fn property_targets_set_script_values() {
    let mut doc = document(
        "wafer-test",
        Definition::builder()
            .template(r#"<input type="checkbox">"#)
            .prop(
                "on",
                Prop::new(PropType::Boolean)
                    .reflect()
                    .target(Target::new("$input").property("checked")),
            )
            .build(),
    );
    let el = doc.create_component("wafer-test").unwrap();
    doc.set_attribute(el, "on", "").unwrap();
    doc.connect(el).unwrap();

    assert_eq!(
        doc.outer_html(el),
        r#"<wafer-test on wafer-ssr><template shadowroot="open"><input type="checkbox"></template></wafer-test>"#
    );
    let shadow = doc.shadow_root(el).unwrap();
    let input = first(&doc, shadow, "input");
    assert_eq!(doc.prop(input, "checked"), Some(&json!(true)));
}

#[test]
fn attribute_targets_in_shadow_and_light_content() {
    let definition = |light: bool| {
        let builder = Definition::builder().template(r#"<input type="checkbox">"#);
        let builder = if light { builder.light() } else { builder };
        let selector = if light { "input" } else { "$input" };
        builder
            .prop(
                "on",
                Prop::new(PropType::Boolean)
                    .reflect()
                    .target(Target::new(selector).attribute("checked")),
            )
            .build()
    };

    assert_eq!(
        render_one("<wafer-test on></wafer-test>", definition(false)),
        r#"<wafer-test on wafer-ssr><template shadowroot="open"><input type="checkbox" checked></template></wafer-test>"#
    );
    assert_eq!(
        render_one("<wafer-test on></wafer-test>", definition(true)),
        r#"<wafer-test on wafer-ssr><input type="checkbox" checked></wafer-test>"#
    );
}

#[test]
fn derived_values_feed_the_target() {
    let html = render_one(
        r#"<wafer-test test="foo"></wafer-test>"#,
        Definition::builder()
            .template("<div>test</div>")
            .prop(
                "test",
                Prop::new(PropType::String).reflect().target(
                    Target::new("$div")
                        .using(|_, value, _, _| Some(json!(format!("bar {}", to_text(value)))))
                        .attribute("class"),
                ),
            )
            .build(),
    );
    assert_eq!(
        html,
        r#"<wafer-test test="foo" wafer-ssr><template shadowroot="open"><div class="bar foo">test</div></template></wafer-test>"#
    );
}

#[test]
fn dom_targets_build_content() {
    let html = render_one(
        r#"<wafer-test test="foo"></wafer-test>"#,
        Definition::<ServerDocument>::builder()
            .template("<div>test</div>")
            .light()
            .prop(
                "test",
                Prop::new(PropType::String).reflect().target(Target::new("div").dom(
                    |host: &mut ServerDocument, el, value, _| {
                        let heading = host.stamp("<h1></h1>")?;
                        host.set_text_content(heading, &to_text(value))?;
                        host.set_text_content(el, "")?;
                        host.insert_before(el, heading, None)
                    },
                )),
            )
            .build(),
    );
    assert_eq!(html, r#"<wafer-test test="foo" wafer-ssr><div><h1>foo</h1></div></wafer-test>"#);
}

#[test]
fn computed_selectors_and_self() {
    let html = render_one(
        r#"<wafer-test active="3"></wafer-test>"#,
        Definition::builder()
            .template(r#"<div id="item-1">1</div><div id="item-2">2</div><div id="item-3">3</div>"#)
            .prop(
                "active",
                Prop::new(PropType::Number)
                    .reflect()
                    .target(
                        Target::computed(|value| format!("$#item-{}", to_text(value)))
                            .attribute("active"),
                    )
                    .target(Target::new("self").attribute("test")),
            )
            .build(),
    );
    assert_eq!(
        html,
        concat!(
            r#"<wafer-test active="3" wafer-ssr test="3"><template shadowroot="open">"#,
            r#"<div id="item-1">1</div><div id="item-2">2</div><div id="item-3" active="3">3</div>"#,
            "</template></wafer-test>"
        )
    );
}

#[test]
fn null_removes_reflected_and_targeted_attributes() {
    let mut doc = document(
        "wafer-test",
        Definition::builder()
            .template(r#"<div test="blah"></div>"#)
            .prop(
                "active",
                Prop::new(PropType::Number)
                    .reflect()
                    .target(Target::new("$div").attribute("test")),
            )
            .build(),
    );
    let root = doc.parse(r#"<wafer-test active="3"></wafer-test>"#).unwrap();
    let el = first(&doc, root, "wafer-test");
    assert_eq!(
        doc.outer_html(el),
        r#"<wafer-test active="3" wafer-ssr><template shadowroot="open"><div test="3"></div></template></wafer-test>"#
    );

    doc.set_prop(el, "active", Value::Null).unwrap();
    doc.update_done(el).unwrap();
    assert_eq!(
        doc.outer_html(el),
        r#"<wafer-test wafer-ssr><template shadowroot="open"><div></div></template></wafer-test>"#
    );
}

#[test]
fn document_targets_reach_outside_the_component() {
    let mut doc = document(
        "wafer-test",
        Definition::builder()
            .prop("title", Prop::new(PropType::String).target(Target::new("@title").text()))
            .build(),
    );
    let root = doc.parse("<title></title><wafer-test></wafer-test>").unwrap();
    let el = first(&doc, root, "wafer-test");
    let title = first(&doc, root, "title");

    doc.set_prop(el, "title", "Yo!!").unwrap();
    doc.update_done(el).unwrap();
    assert_eq!(doc.tree().text_content(title), "Yo!!");
}

#[test]
fn every_property_is_reflected_for_hydration() {
    let html = render_one(
        "<wafer-test></wafer-test>",
        Definition::builder()
            .prop("count", Prop::new(PropType::Number).initial(2))
            .prop("label", Prop::new(PropType::String).initial("a & <b>"))
            .prop("config", Prop::new(PropType::Object).initial(json!({"x": "y"})))
            .prop("off", Prop::new(PropType::Boolean).initial(false))
            .build(),
    );
    assert_eq!(
        html,
        concat!(
            r#"<wafer-test wafer-ssr count="2" label="a &amp; &lt;b&gt;" "#,
            r#"config="{&quot;x&quot;:&quot;y&quot;}">"#,
            r#"<template shadowroot="open"></template></wafer-test>"#
        )
    );
}

#[test]
fn server_only_components_keep_only_reflected_attributes() {
    let registry = Registry::new().define_server_only(
        "wafer-test",
        Definition::builder()
            .prop("title", Prop::new(PropType::String).initial("bar"))
            .prop("size", Prop::new(PropType::Number).reflect().initial(4))
            .build(),
    );
    let mut doc = ServerDocument::new(registry);
    let root = doc.parse(r#"<wafer-test title="foo"></wafer-test>"#).unwrap();
    let el = first(&doc, root, "wafer-test");

    assert_eq!(
        doc.outer_html(el),
        r#"<wafer-test size="4"><template shadowroot="open"></template></wafer-test>"#
    );
    assert_eq!(doc.prop(el, "title"), Some(&json!("foo")));
}

#[test]
fn nested_components_render_inside_out() {
    let registry = Registry::new()
        .define("x-outer", Definition::builder().template("<x-inner></x-inner>").build())
        .define(
            "x-inner",
            Definition::builder()
                .template("<b></b>")
                .prop(
                    "label",
                    Prop::new(PropType::String)
                        .initial("in")
                        .target(Target::new("$b").text()),
                )
                .build(),
        );
    let html = render("<x-outer></x-outer>", registry).unwrap();
    assert_eq!(
        html,
        concat!(
            r#"<x-outer wafer-ssr><template shadowroot="open">"#,
            r#"<x-inner wafer-ssr label="in"><template shadowroot="open"><b>in</b></template></x-inner>"#,
            "</template></x-outer>"
        )
    );
}

#[test]
fn constructed_but_unconnected_components_are_not_marked() {
    let mut doc = document(
        "wafer-test-0",
        Definition::builder()
            .prop("test", Prop::new(PropType::String).reflect().initial("foo"))
            .build(),
    );
    let el = doc.create_component("wafer-test-0").unwrap();
    doc.set_prop(el, "test", "bar").unwrap();
    doc.update_done(el).unwrap();

    assert_eq!(
        doc.outer_html(el),
        r#"<wafer-test-0 test="bar"><template shadowroot="open"></template></wafer-test-0>"#
    );
    assert!(!doc.component(el).unwrap().is_connected());
}

#[test]
fn unregistered_tags_are_not_components() {
    let mut doc = ServerDocument::new(Registry::new());
    assert!(matches!(
        doc.create_component("x-nope"),
        Err(wafer_core::Error::NotAComponent(_))
    ));
    assert_eq!(
        render(r#"<x-nope a="1"></x-nope>"#, Registry::new()).unwrap(),
        r#"<x-nope a="1"></x-nope>"#
    );
}

fn list<H: Host>() -> Definition<H> {
    Definition::builder()
        .template("<div></div>")
        .prop(
            "items",
            Prop::new(PropType::Array).target(Target::new("$div").dom(|host, div, items, _| {
                Repeat::new("<span></span>")
                    .target(Target::new("self").text())
                    .run(host, div, items_of(items))
            })),
        )
        .build()
}

#[test]
fn repeat_renders_keyed_items() {
    let html = render(
        r#"<wafer-test items="[1,2,3]"></wafer-test>"#,
        Registry::new().define("wafer-test", list()),
    )
    .unwrap();
    assert_eq!(
        html,
        concat!(
            r#"<wafer-test items="[1,2,3]" wafer-ssr><template shadowroot="open"><div>"#,
            r#"<span wafer-key="1">1</span><span wafer-key="2">2</span><span wafer-key="3">3</span>"#,
            "</div></template></wafer-test>"
        )
    );
}

#[test]
fn repeat_keeps_surviving_items_when_reordering() {
    let mut doc = document("wafer-test", list());
    let root = doc.parse(r#"<wafer-test items="[1,2,3]"></wafer-test>"#).unwrap();
    let el = first(&doc, root, "wafer-test");
    let shadow = doc.shadow_root(el).unwrap();
    let div = first(&doc, shadow, "div");
    let before = doc.children(div);

    doc.set_prop(el, "items", json!([4, 3, 5, 2, 6, 1])).unwrap();
    doc.update_done(el).unwrap();

    let after = doc.children(div);
    let keys: Vec<String> = after
        .iter()
        .map(|child| doc.attribute(*child, "wafer-key").unwrap())
        .collect();
    assert_eq!(keys, ["4", "3", "5", "2", "6", "1"]);
    assert_eq!(after[1], before[2]);
    assert_eq!(after[3], before[1]);
    assert_eq!(after[5], before[0]);

    doc.set_prop(el, "items", json!([])).unwrap();
    doc.update_done(el).unwrap();
    assert!(doc.children(div).is_empty());
    assert!(!doc.tree().is_alive(after[0]));
}

#[test]
fn repeat_stamps_table_rows() {
    let rows = Definition::<ServerDocument>::builder()
        .template("<table><tbody></tbody></table>")
        .prop(
            "items",
            Prop::new(PropType::Array).target(Target::<ServerDocument>::new("$tbody").dom(|host, tbody, items, _| {
                Repeat::new("<tr><td></td></tr>")
                    .target(Target::new("td").text())
                    .run(host, tbody, items_of(items))
            })),
        )
        .build();
    let html = render_one(r#"<wafer-test items="[1,2]"></wafer-test>"#, rows);
    assert_eq!(
        html,
        concat!(
            r#"<wafer-test items="[1,2]" wafer-ssr><template shadowroot="open"><table><tbody>"#,
            r#"<tr wafer-key="1"><td>1</td></tr><tr wafer-key="2"><td>2</td></tr>"#,
            "</tbody></table></template></wafer-test>"
        )
    );
}
