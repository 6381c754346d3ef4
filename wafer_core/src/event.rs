// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event handlers, listener records, and the event payload.
//!
//! A component declares handlers per selector and event name; at first
//! connect each declared handler is bound to every node the selector
//! resolves to (see [`apply`](crate::apply)). Binding the same handler to the
//! same node twice is a no-op, which lets list items be re-bound on every
//! reconciliation.

use core::cell::Cell;
use core::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::trace;

use crate::target::apply;
use crate::{Error, Host};

/// An event handler.
///
/// Receives the host, the node the handler is bound to (its `this`), and the
/// event as seen at the current node.
pub type Handler<H> =
    Rc<dyn Fn(&mut H, <H as Host>::Node, &Event<<H as Host>::Node>) -> Result<(), Error>>;

/// Listener flags, as accepted by `addEventListener`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ListenerOptions {
    /// Run during the capture phase instead of the bubble phase.
    pub capture: bool,
    /// Remove the listener after its first call.
    pub once: bool,
    /// The listener never cancels the event; `prevent_default` is ignored.
    pub passive: bool,
}

/// A handler plus the options it is bound with.
pub struct EventHandler<H: Host> {
    handler: Handler<H>,
    this: Option<H::Node>,
    options: ListenerOptions,
}

impl<H: Host> Clone for EventHandler<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Rc::clone(&self.handler),
            this: self.this,
            options: self.options,
        }
    }
}

impl<H: Host> fmt::Debug for EventHandler<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler")
            .field("this", &self.this)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<H: Host> EventHandler<H> {
    /// Wraps a handler. By default it is bound to the element the binding
    /// was made from.
    pub fn new(
        handler: impl Fn(&mut H, H::Node, &Event<H::Node>) -> Result<(), Error> + 'static,
    ) -> Self {
        Self {
            handler: Rc::new(handler),
            this: None,
            options: ListenerOptions::default(),
        }
    }

    /// Binds the handler to an explicit node instead.
    #[must_use]
    pub fn bound_to(mut self, this: H::Node) -> Self {
        self.this = Some(this);
        self
    }

    /// Sets the listener options.
    #[must_use]
    pub fn options(mut self, options: ListenerOptions) -> Self {
        self.options = options;
        self
    }
}

/// A declared binding: handler for `name` events on nodes matching
/// `selector`.
pub struct EventBinding<H: Host> {
    selector: String,
    name: String,
    handler: EventHandler<H>,
}

impl<H: Host> fmt::Debug for EventBinding<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBinding")
            .field("selector", &self.selector)
            .field("name", &self.name)
            .field("handler", &self.handler)
            .finish()
    }
}

impl<H: Host> EventBinding<H> {
    /// Creates a binding.
    pub fn new(selector: impl Into<String>, name: impl Into<String>, handler: EventHandler<H>) -> Self {
        Self {
            selector: selector.into(),
            name: name.into(),
            handler,
        }
    }

    /// Selector resolved from the bound element.
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The handler.
    #[must_use]
    pub fn handler(&self) -> &EventHandler<H> {
        &self.handler
    }

    /// Binds the handler to every node the selector resolves to from `el`.
    pub fn bind(&self, host: &mut H, el: H::Node) -> Result<(), Error> {
        bind_event(host, el, &self.selector, &self.name, &self.handler)
    }
}

/// A listener as stored on a node.
pub struct Listener<H: Host> {
    handler: Handler<H>,
    this: H::Node,
    options: ListenerOptions,
}

impl<H: Host> Clone for Listener<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Rc::clone(&self.handler),
            this: self.this,
            options: self.options,
        }
    }
}

impl<H: Host> fmt::Debug for Listener<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("this", &self.this)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<H: Host> Listener<H> {
    /// Creates a listener from a bare handler.
    pub fn new(handler: Handler<H>, this: H::Node, options: ListenerOptions) -> Self {
        Self {
            handler,
            this,
            options,
        }
    }

    /// The node the handler runs as.
    #[must_use]
    pub fn this(&self) -> H::Node {
        self.this
    }

    /// The listener options.
    #[must_use]
    pub fn options(&self) -> ListenerOptions {
        self.options
    }

    /// Whether adding `other` next to `self` would be a duplicate.
    ///
    /// Listeners are the same when they share the handler, the bound node,
    /// and the capture flag.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.handler, &other.handler)
            && self.this == other.this
            && self.options.capture == other.options.capture
    }

    /// Runs the handler for `event`.
    pub fn call(&self, host: &mut H, event: &Event<H::Node>) -> Result<(), Error> {
        (self.handler)(host, self.this, event)
    }
}

/// Binds `handler` for `name` events on every node `selector` resolves to
/// from `el`.
pub fn bind_event<H: Host>(
    host: &mut H,
    el: H::Node,
    selector: &str,
    name: &str,
    handler: &EventHandler<H>,
) -> Result<(), Error> {
    let this = handler.this.unwrap_or(el);
    apply(host, el, selector, |host, target| {
        trace!(?target, event = name, "binding listener");
        let listener = Listener::new(Rc::clone(&handler.handler), this, handler.options);
        host.add_listener(target, name, listener);
        Ok(())
    })
}

/// Dispatch phase of an event at the current node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Travelling from the root down to the target.
    Capture,
    /// At the target.
    Target,
    /// Travelling from the target back up to the root.
    Bubble,
}

#[derive(Debug, Default)]
struct Flags {
    stopped: Cell<bool>,
    stopped_immediately: Cell<bool>,
    default_prevented: Cell<bool>,
}

/// An event as seen by a listener.
///
/// Clones share their propagation and cancellation flags, so a copy handed to
/// one listener can stop the dispatch for the rest.
#[derive(Clone, Debug)]
pub struct Event<N> {
    name: Rc<str>,
    detail: Rc<Value>,
    bubbles: bool,
    composed: bool,
    target: N,
    current_target: N,
    phase: Phase,
    passive: bool,
    flags: Rc<Flags>,
}

impl<N: Copy> Event<N> {
    /// Creates an event aimed at `target`.
    pub fn new(name: &str, detail: Value, bubbles: bool, composed: bool, target: N) -> Self {
        Self {
            name: name.into(),
            detail: Rc::new(detail),
            bubbles,
            composed,
            target,
            current_target: target,
            phase: Phase::Target,
            passive: false,
            flags: Rc::default(),
        }
    }

    /// The view of this event for a listener at `current`, with `target`
    /// already retargeted for that listener's tree.
    #[must_use]
    pub fn at(&self, current: N, target: N, phase: Phase, passive: bool) -> Self {
        Self {
            current_target: current,
            target,
            phase,
            passive,
            ..self.clone()
        }
    }

    /// Event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The payload.
    #[must_use]
    pub fn detail(&self) -> &Value {
        &self.detail
    }

    /// Whether the event bubbles.
    #[must_use]
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Whether the event crosses shadow boundaries.
    #[must_use]
    pub fn composed(&self) -> bool {
        self.composed
    }

    /// The target as seen from the current node's tree.
    #[must_use]
    pub fn target(&self) -> N {
        self.target
    }

    /// The node whose listener is running.
    #[must_use]
    pub fn current_target(&self) -> N {
        self.current_target
    }

    /// The dispatch phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Stops the event after the current node's listeners.
    pub fn stop_propagation(&self) {
        self.flags.stopped.set(true);
    }

    /// Stops the event before the next listener, even on the same node.
    pub fn stop_immediate_propagation(&self) {
        self.flags.stopped.set(true);
        self.flags.stopped_immediately.set(true);
    }

    /// Cancels the event's default action, unless the listener is passive.
    pub fn prevent_default(&self) {
        if !self.passive {
            self.flags.default_prevented.set(true);
        }
    }

    /// Whether a listener cancelled the event.
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.flags.default_prevented.get()
    }

    /// Whether propagation to further nodes was stopped.
    #[must_use]
    pub fn propagation_stopped(&self) -> bool {
        self.flags.stopped.get()
    }

    /// Whether propagation to further listeners was stopped.
    #[must_use]
    pub fn immediate_propagation_stopped(&self) -> bool {
        self.flags.stopped_immediately.get()
    }
}
