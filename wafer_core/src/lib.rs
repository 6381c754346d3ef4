// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wafer Core: the reactive engine behind Wafer components.
//!
//! A component is an element with declared properties. Writing a property
//! does not touch the tree; it queues the value and schedules an update
//! cycle. When the cycle runs, all writes since the last one are merged,
//! `changed` sees what changed, attributes are reflected, and each changed
//! property's [`Target`]s are applied to the nodes their selectors resolve
//! to. Finally `updated` sees the values from before the cycle.
//!
//! The engine never names a concrete tree. It is written against the
//! [`Host`] trait, and every operation a component offers lives on
//! [`HostExt`], which every host gets for free. The server adapter
//! (`wafer_server`) and the live document (`wafer_client`) both implement
//! [`Host`], so components behave the same when rendered to HTML and when
//! hydrated in a document.
//!
//! ## Key pieces
//!
//! - [`Definition`] / [`Prop`] / [`Target`]: what a component declares.
//! - [`Component`]: per-instance state kept by the host.
//! - [`HostExt`]: `prop`, `set_prop`, `request_update`, `update_done` and
//!   friends.
//! - [`TaskQueue`]: the queue update cycles wait in until the next
//!   [`HostExt::flush`] or [`HostExt::update_done`].
//! - [`Repeat`]: keyed list reconciliation.
//! - [`apply`]: selector resolution with the `self`, `$` and `@` forms.
//!
//! ## Values
//!
//! Property values are [`serde_json::Value`]s, with `None` standing for a
//! property that has no value yet. Integral numbers are normalized, so `3.0`
//! and `3` are the same value. [`to_text`] renders values into attributes
//! and text.

mod component;
mod definition;
mod engine;
mod error;
mod event;
mod host;
mod repeat;
mod schedule;
mod target;
mod value;

pub use component::Component;
pub use definition::{
    ChangeMap, ChangedCallback, Definition, DefinitionBuilder, Prop, PropId, UpdatedCallback,
};
pub use engine::HostExt;
pub use error::{BoxError, Error};
pub use event::{
    Event, EventBinding, EventHandler, Handler, Listener, ListenerOptions, Phase, bind_event,
};
pub use host::{Context, Host};
pub use repeat::{InitFn, KeyFn, Repeat, items_of};
pub use schedule::TaskQueue;
pub use target::{DomFn, Target, TargetSelector, UseFn, apply, update_targets_with};
pub use value::{PropType, normalize, number, to_text};

/// Attribute holding a list item's key.
pub const WAFER_KEY: &str = "wafer-key";

/// Attribute marking a component rendered on the server.
pub const WAFER_SSR: &str = "wafer-ssr";
