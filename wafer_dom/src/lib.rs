// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wafer DOM: an arena HTML tree for driving components outside a browser.
//!
//! The tree stores documents, fragments, elements, text, comments and shadow
//! roots in a single arena addressed by generational [`NodeId`]s. It provides
//! what a reactive component layer needs from a document:
//!
//! - attribute and text access under a [`Markup`] storage policy
//! - script-side per-node values ("expandos"), such as an input's `checked`
//! - shadow roots ([`Tree::attach_shadow`])
//! - HTML parsing ([`Tree::parse_fragment`], [`Tree::parse_template`]) and serialization
//!   ([`Tree::outer_html`], [`Tree::inner_html`])
//! - selector queries ([`Selector`], [`Tree::query_selector_all`])
//! - a template stamp cache ([`TemplateCache`])
//!
//! ## Example
//!
//! ```rust
//! use wafer_dom::{Markup, Tree};
//!
//! let mut tree = Tree::new(Markup::Escaped);
//! let root = tree.parse_fragment("<ul><li>one</li></ul>");
//! let ul = tree.query_selector(root, "ul").unwrap().unwrap();
//!
//! let li = tree.create_element("li");
//! tree.set_text_content(li, "<two>").unwrap();
//! tree.append_child(ul, li).unwrap();
//!
//! assert_eq!(tree.inner_html(root), "<ul><li>one</li><li>&lt;two&gt;</li></ul>");
//! ```

mod error;
mod escape;
mod parse;
mod selector;
mod serialize;
mod template;
mod tree;
mod types;

pub use error::Error;
pub use escape::{escape, unescape};
pub use selector::Selector;
pub use template::TemplateCache;
pub use tree::Tree;
pub use types::{Attribute, Element, Markup, NodeId, NodeKind, ShadowMode};
