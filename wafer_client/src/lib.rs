// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wafer Client: a live document for Wafer components.
//!
//! [`ClientDocument`] implements [`wafer_core::Host`] with real shadow roots
//! and DOM-style events. It models the parts of a browser document a
//! component relies on:
//!
//! - **Definitions and upgrades.** [`ClientDocument::define`] registers a
//!   tag. Elements with that tag become components when created, when
//!   inserted into the document, or when the definition arrives after them.
//! - **Hydration.** Markup rendered by `wafer_server` carries `wafer-ssr`.
//!   Such a component keeps its server-rendered content, reads its state
//!   from its attributes, and skips reflection and targets in its first
//!   cycle. Its shadow content comes either from declarative shadow DOM at
//!   parse time or, when that is off, from adopting the
//!   `<template shadowroot>` child at upgrade.
//! - **Events.** Listeners dispatch in capture, target and bubble order,
//!   with composed events retargeted across shadow boundaries.
//!   [`ClientDocument::emit`] and [`ClientDocument::click`] fire events.
//!
//! ## Example
//!
//! ```rust
//! use wafer_client::{ClientDocument, ClientOptions};
//! use wafer_core::{Definition, HostExt, Prop, PropType, Target};
//!
//! let mut doc = ClientDocument::with_options(ClientOptions { declarative_shadow_dom: false });
//! doc.define(
//!     "x-name",
//!     Definition::builder()
//!         .template("<b></b>")
//!         .prop("name", Prop::new(PropType::String).reflect().target(Target::new("$b").text()))
//!         .build(),
//! )
//! .unwrap();
//!
//! // Server output: the content is already there and stays untouched.
//! let body = doc.document();
//! doc.set_inner_html(
//!     body,
//!     r#"<x-name name="Ada" wafer-ssr><template shadowroot="open"><b>Ada</b></template></x-name>"#,
//! )
//! .unwrap();
//! let el = doc.tree().query_selector(body, "x-name").unwrap().unwrap();
//! doc.update_done(el).unwrap();
//! let shadow = doc.tree().shadow_root(el).unwrap();
//! assert_eq!(doc.inner_html(shadow), "<b>Ada</b>");
//!
//! // From here on the component is live.
//! doc.set_prop(el, "name", "Grace").unwrap();
//! doc.update_done(el).unwrap();
//! assert_eq!(doc.inner_html(shadow), "<b>Grace</b>");
//! ```

mod dispatch;
mod document;

pub use dispatch::EmitOptions;
pub use document::{ClientDocument, ClientOptions};
