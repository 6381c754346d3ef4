// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! HTML parsing into the arena.

use scraper::{ElementRef, Html, Node};

use crate::{NodeId, Tree};

impl Tree {
    /// Parses an HTML fragment and returns a detached fragment node holding
    /// the top-level nodes.
    ///
    /// Parsing is error tolerant: malformed markup is repaired the way a
    /// browser would repair it. `<template>` contents become ordinary
    /// children of the template element.
    ///
    /// ```rust
    /// use wafer_dom::Tree;
    ///
    /// let mut tree = Tree::default();
    /// let fragment = tree.parse_fragment("<p>Hi <b>there</b></p><!-- note -->");
    /// assert_eq!(tree.inner_html(fragment), "<p>Hi <b>there</b></p><!-- note -->");
    /// ```
    pub fn parse_fragment(&mut self, html: &str) -> NodeId {
        let parsed = Html::parse_fragment(html);
        let fragment = self.create_fragment();
        self.convert_children(fragment, parsed.root_element());
        tracing::trace!(len = html.len(), nodes = self.descendants(fragment).len(), "parsed fragment");
        fragment
    }

    /// Parses HTML the way the contents of a `<template>` element are parsed
    /// and returns a detached fragment node holding the top-level nodes.
    ///
    /// Unlike [`parse_fragment`](Self::parse_fragment), table parts such as
    /// `<tr>` and `<td>` survive at the top level.
    ///
    /// ```rust
    /// use wafer_dom::Tree;
    ///
    /// let mut tree = Tree::default();
    /// let fragment = tree.parse_template("<tr><td>1</td></tr>");
    /// assert_eq!(tree.inner_html(fragment), "<tr><td>1</td></tr>");
    /// ```
    pub fn parse_template(&mut self, html: &str) -> NodeId {
        let parsed = Html::parse_fragment(&format!("<template>{html}</template>"));
        let root = parsed.root_element();
        let contents = root
            .children()
            .find_map(ElementRef::wrap)
            .filter(|element| element.value().name() == "template")
            .unwrap_or(root);
        let fragment = self.create_fragment();
        self.convert_children(fragment, contents);
        tracing::trace!(len = html.len(), nodes = self.descendants(fragment).len(), "parsed template");
        fragment
    }

    fn convert_children(&mut self, parent: NodeId, source: ElementRef<'_>) {
        for child in source.children() {
            let node = match child.value() {
                Node::Text(text) => self.create_text(text),
                Node::Comment(comment) => self.create_comment(comment),
                Node::Element(element) => {
                    let node = self.create_element_with(element.name(), element.attrs());
                    if let Some(element) = ElementRef::wrap(child) {
                        self.convert_children(node, element);
                    }
                    node
                }
                _ => continue,
            };
            self.push_built(parent, node);
        }
    }
}
