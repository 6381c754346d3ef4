// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! HTML serialization.

use crate::escape::{escape_attribute, escape_text};
use crate::types::{Markup, NodeKind, RAW_TEXT_ELEMENTS, VOID_ELEMENTS};
use crate::{NodeId, Tree};

impl Tree {
    /// Serializes a node including its own tag.
    ///
    /// Shadow roots are not serialized; attributes with an empty value are
    /// written as bare names.
    #[must_use]
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(&mut out, id, false);
        out
    }

    /// Serializes the children of a node.
    #[must_use]
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let raw_text = self
            .tag_name(id)
            .is_some_and(|name| RAW_TEXT_ELEMENTS.contains(&name));
        for child in self.child_nodes(id) {
            self.write_node(&mut out, *child, raw_text);
        }
        out
    }

    fn write_node(&self, out: &mut String, id: NodeId, raw_text: bool) {
        let escaped = self.markup() == Markup::Escaped;
        match self.kind(id) {
            None => {}
            Some(NodeKind::Text(text)) => {
                if escaped || raw_text {
                    out.push_str(text);
                } else {
                    out.push_str(&escape_text(text));
                }
            }
            Some(NodeKind::Comment(text)) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Some(NodeKind::Element(element)) => {
                out.push('<');
                out.push_str(element.name());
                for attr in &element.attrs {
                    out.push(' ');
                    out.push_str(&attr.name);
                    if !attr.value.is_empty() {
                        out.push_str("=\"");
                        if escaped {
                            out.push_str(&attr.value);
                        } else {
                            out.push_str(&escape_attribute(&attr.value));
                        }
                        out.push('"');
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&element.name()) {
                    return;
                }
                out.push_str(&self.inner_html(id));
                out.push_str("</");
                out.push_str(element.name());
                out.push('>');
            }
            Some(_) => out.push_str(&self.inner_html(id)),
        }
    }
}
