// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event listeners and dispatch.
//!
//! Dispatch first builds the route: one step per node and phase, capture
//! from the root down to the target, then target and bubble back up. The
//! route is then walked in order:
//!
//! - Listeners on a step run in registration order.
//! - `stop_propagation` ends the walk after the current step's listeners.
//! - `stop_immediate_propagation` also skips the rest of the current step.
//! - The walk returns whether the default action may run.
//!
//! A composed event crosses shadow boundaries. Listeners outside a shadow
//! tree see the event as if it came from the shadow host.

use hashbrown::HashMap;
use serde_json::{Value, json};
use smallvec::SmallVec;
use tracing::trace;
use wafer_core::{Error, Event, EventHandler, Listener, Phase, bind_event};
use wafer_dom::NodeId;

use crate::ClientDocument;

/// Listeners registered per node, in registration order.
#[derive(Default)]
pub(crate) struct Listeners {
    by_node: HashMap<NodeId, Vec<(String, Listener<ClientDocument>)>>,
}

impl core::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Listeners")
            .field("nodes", &self.by_node.len())
            .finish_non_exhaustive()
    }
}

impl Listeners {
    /// Adds a listener unless an identical one is already registered.
    pub(crate) fn add(&mut self, node: NodeId, name: &str, listener: Listener<ClientDocument>) {
        let list = self.by_node.entry(node).or_default();
        if list
            .iter()
            .any(|(existing, other)| existing == name && other.same_as(&listener))
        {
            trace!(?node, event = name, "listener already registered");
            return;
        }
        list.push((name.to_owned(), listener));
    }

    pub(crate) fn forget(&mut self, node: NodeId) {
        self.by_node.remove(&node);
    }

    fn count(&self, node: NodeId, name: &str) -> usize {
        self.by_node
            .get(&node)
            .map_or(0, |list| list.iter().filter(|(n, _)| n == name).count())
    }

    fn matching(
        &self,
        node: NodeId,
        name: &str,
        capture: bool,
    ) -> SmallVec<[Listener<ClientDocument>; 2]> {
        self.by_node
            .get(&node)
            .into_iter()
            .flatten()
            .filter(|(n, listener)| n == name && listener.options().capture == capture)
            .map(|(_, listener)| listener.clone())
            .collect()
    }

    fn remove(&mut self, node: NodeId, name: &str, listener: &Listener<ClientDocument>) {
        if let Some(list) = self.by_node.get_mut(&node) {
            list.retain(|(n, other)| !(n == name && other.same_as(listener)));
        }
    }
}

/// Options for [`ClientDocument::emit`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EmitOptions {
    /// Whether the event bubbles.
    pub bubbles: bool,
    /// Whether the event crosses shadow boundaries.
    pub composed: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            bubbles: true,
            composed: true,
        }
    }
}

/// One entry of a dispatch route.
#[derive(Copy, Clone, Debug)]
struct Step {
    node: NodeId,
    target: NodeId,
    phase: Phase,
    capture: bool,
}

impl ClientDocument {
    /// Adds a listener for `name` events on `node`.
    ///
    /// Adding the same handler twice with the same capture flag registers it
    /// once.
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        name: &str,
        handler: &EventHandler<Self>,
    ) -> Result<(), Error> {
        bind_event(self, node, "self", name, handler)
    }

    /// Number of listeners for `name` registered on `node`.
    #[must_use]
    pub fn listener_count(&self, node: NodeId, name: &str) -> usize {
        self.listeners.count(node, name)
    }

    /// Dispatches `event` from its target and returns `false` if a listener
    /// prevented the default action.
    ///
    /// The first listener error ends the dispatch and is returned.
    pub fn dispatch_event(&mut self, event: &Event<NodeId>) -> Result<bool, Error> {
        let route = self.route(event);
        trace!(node = ?event.target(), event = event.name(), steps = route.len(), "dispatching");
        for step in route {
            if !self.tree.is_alive(step.node) {
                continue;
            }
            for listener in self.listeners.matching(step.node, event.name(), step.capture) {
                let options = listener.options();
                if options.once {
                    self.listeners.remove(step.node, event.name(), &listener);
                }
                let view = event.at(step.node, step.target, step.phase, options.passive);
                listener.call(self, &view)?;
                if event.immediate_propagation_stopped() {
                    break;
                }
            }
            if event.propagation_stopped() {
                break;
            }
        }
        Ok(!event.default_prevented())
    }

    /// Dispatches a custom event. The detail defaults to an empty object.
    ///
    /// ```rust
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// use serde_json::json;
    /// use wafer_client::{ClientDocument, EmitOptions};
    /// use wafer_core::EventHandler;
    ///
    /// let mut doc = ClientDocument::new();
    /// let body = doc.document();
    /// doc.set_inner_html(body, "<div><p></p></div>").unwrap();
    /// let div = doc.tree().query_selector(body, "div").unwrap().unwrap();
    /// let p = doc.tree().query_selector(body, "p").unwrap().unwrap();
    ///
    /// let seen = Rc::new(Cell::new(false));
    /// let flag = Rc::clone(&seen);
    /// let handler = EventHandler::<ClientDocument>::new(move |_, _, event| {
    ///     flag.set(event.detail() == &json!({}));
    ///     Ok(())
    /// });
    /// doc.add_event_listener(div, "ping", &handler).unwrap();
    ///
    /// assert!(doc.emit(p, "ping", None, EmitOptions::default()).unwrap());
    /// assert!(seen.get());
    /// ```
    pub fn emit(
        &mut self,
        target: NodeId,
        name: &str,
        detail: Option<Value>,
        options: EmitOptions,
    ) -> Result<bool, Error> {
        let detail = detail.unwrap_or_else(|| json!({}));
        let event = Event::new(name, detail, options.bubbles, options.composed, target);
        self.dispatch_event(&event)
    }

    /// Dispatches a bubbling, composed `click` at `target`.
    pub fn click(&mut self, target: NodeId) -> Result<bool, Error> {
        let event = Event::new("click", Value::Null, true, true, target);
        self.dispatch_event(&event)
    }

    /// The dispatch route of `event`: capture steps root first, then target
    /// and bubble steps back up.
    fn route(&self, event: &Event<NodeId>) -> Vec<Step> {
        let target = event.target();
        let mut path: SmallVec<[NodeId; 16]> = SmallVec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.tree.parent(node).or_else(|| {
                if event.composed() {
                    self.tree.shadow_host(node)
                } else {
                    None
                }
            });
        }

        let mut route = Vec::with_capacity(path.len() * 2);
        for &node in path.iter().rev() {
            let seen = self.retarget(target, node);
            let phase = if seen == node {
                Phase::Target
            } else {
                Phase::Capture
            };
            route.push(Step {
                node,
                target: seen,
                phase,
                capture: true,
            });
        }
        for &node in &path {
            let seen = self.retarget(target, node);
            let phase = if seen == node {
                Phase::Target
            } else if event.bubbles() {
                Phase::Bubble
            } else {
                continue;
            };
            route.push(Step {
                node,
                target: seen,
                phase,
                capture: false,
            });
        }
        route
    }

    /// `target` as seen from `listener`: hosts stand in for nodes inside
    /// shadow trees the listener is not part of.
    fn retarget(&self, mut target: NodeId, listener: NodeId) -> NodeId {
        loop {
            let mut root = target;
            while let Some(parent) = self.tree.parent(root) {
                root = parent;
            }
            match self.tree.shadow_host(root) {
                Some(host) if !self.tree.is_inclusive_ancestor(root, listener) => target = host,
                _ => return target,
            }
        }
    }
}
