// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wafer Server: render Wafer components to HTML.
//!
//! [`ServerDocument`] implements [`wafer_core::Host`] over an escaped
//! [`wafer_dom::Tree`]. The same component definitions that run in a live
//! document run here; the differences are in what the document does:
//!
//! - Shadow content is written into a `<template shadowroot="open">` child,
//!   ready for declarative shadow DOM or for adoption during hydration.
//! - Every property is reflected to its attribute, so the markup carries the
//!   component's full state. Components registered with
//!   [`Registry::define_server_only`] reflect only `reflect` properties.
//! - Connected components are marked with `wafer-ssr`, which tells the client
//!   to skip its first round of target application.
//! - Event listeners are dropped.
//!
//! ## Example
//!
//! ```rust
//! use wafer_core::{Definition, Host, Prop, PropType, Repeat, Target, items_of};
//! use wafer_server::{Registry, render};
//!
//! // Generic over the host, so the client can register the same component.
//! fn list<H: Host>() -> Definition<H> {
//!     Definition::builder()
//!         .template("<ul></ul>")
//!         .prop(
//!             "items",
//!             Prop::new(PropType::Array).target(Target::new("$ul").dom(|host, ul, items, _| {
//!                 Repeat::new("<li></li>")
//!                     .target(Target::new("self").text())
//!                     .run(host, ul, items_of(items))
//!             })),
//!         )
//!         .build()
//! }
//!
//! let registry = Registry::new().define("x-list", list());
//! let html = render(r#"<x-list items="[1,2]"></x-list>"#, registry).unwrap();
//! assert_eq!(
//!     html,
//!     concat!(
//!         r#"<x-list items="[1,2]" wafer-ssr><template shadowroot="open"><ul>"#,
//!         r#"<li wafer-key="1">1</li><li wafer-key="2">2</li>"#,
//!         "</ul></template></x-list>",
//!     )
//! );
//! ```

mod document;
mod registry;

pub use document::{ServerDocument, render};
pub use registry::{Registry, RegistryEntry};
