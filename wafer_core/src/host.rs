// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The capability contract a tree must offer to drive components.

use core::fmt::Debug;
use core::hash::Hash;

use serde_json::Value;

use crate::Error;
use crate::component::Component;
use crate::event::Listener;
use crate::schedule::TaskQueue;

/// Where a host runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Context {
    /// A live document: real shadow roots, events, hydration.
    Client,
    /// Rendering to HTML: every property is reflected so the markup carries
    /// the full state.
    Server,
}

/// A document the engine can drive.
///
/// Implementors own the tree, the per-node component state, and the task
/// queue. The engine reaches the tree only through these methods, so the same
/// update cycle, target application and list reconciliation run unchanged on
/// every implementor.
///
/// Node-level reads on a stale or non-element node return `None`/empty rather
/// than failing; writes return an error.
pub trait Host: Sized + 'static {
    /// Handle to a node in the host's tree.
    type Node: Copy + Eq + Hash + Debug + 'static;

    /// Where this host runs.
    fn context(&self) -> Context;

    /// Decoded value of an attribute.
    fn attribute(&self, node: Self::Node, name: &str) -> Option<String>;

    /// Whether the attribute is present.
    fn has_attribute(&self, node: Self::Node, name: &str) -> bool;

    /// Writes an attribute without notifying the owning component, returning
    /// the previous decoded value.
    fn write_attribute(
        &mut self,
        node: Self::Node,
        name: &str,
        value: &str,
    ) -> Result<Option<String>, Error>;

    /// Removes an attribute without notifying the owning component, returning
    /// the previous decoded value.
    fn erase_attribute(&mut self, node: Self::Node, name: &str) -> Result<Option<String>, Error>;

    /// Replaces the node's children with a single text node.
    fn set_text_content(&mut self, node: Self::Node, text: &str) -> Result<(), Error>;

    /// A script-side value stored on the node itself.
    fn expando(&self, node: Self::Node, name: &str) -> Option<&Value>;

    /// Stores a script-side value on the node.
    fn set_expando(&mut self, node: Self::Node, name: &str, value: Value) -> Result<(), Error>;

    /// Removes and returns a script-side value.
    fn take_expando(&mut self, node: Self::Node, name: &str) -> Option<Value>;

    /// The next element sibling.
    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    /// Element children in order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// The node's shadow root, or its stand-in.
    fn shadow_root(&self, node: Self::Node) -> Option<Self::Node>;

    /// The top-most ancestor, crossing shadow boundaries.
    fn root(&self, node: Self::Node) -> Self::Node;

    /// All descendants of `root` matching `selector`, in tree order.
    fn query_selector_all(&self, root: Self::Node, selector: &str)
    -> Result<Vec<Self::Node>, Error>;

    /// Inserts `child` before `reference`, or appends when `reference` is
    /// `None`.
    fn insert_before(
        &mut self,
        parent: Self::Node,
        child: Self::Node,
        reference: Option<Self::Node>,
    ) -> Result<(), Error>;

    /// Detaches and drops a node and its subtree.
    fn remove(&mut self, node: Self::Node);

    /// Stamps `html` and returns its first element, detached.
    fn stamp(&mut self, html: &str) -> Result<Self::Node, Error>;

    /// Registers an event listener. Hosts that never dispatch may drop it.
    fn add_listener(&mut self, node: Self::Node, name: &str, listener: Listener<Self>);

    /// Component state of a node, if it is a component.
    fn component(&self, node: Self::Node) -> Option<&Component<Self>>;

    /// Mutable component state of a node, if it is a component.
    fn component_mut(&mut self, node: Self::Node) -> Option<&mut Component<Self>>;

    /// The queue of scheduled update cycles.
    fn tasks(&mut self) -> &mut TaskQueue<Self::Node>;
}
