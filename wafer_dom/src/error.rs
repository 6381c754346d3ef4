// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised by tree operations.

use crate::NodeId;

/// Failure of a tree operation or selector query.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A selector string could not be parsed.
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector {
        /// The selector as written.
        selector: String,
        /// What the parser stumbled on.
        reason: String,
    },
    /// The node was removed from the tree (or never existed).
    #[error("node {0:?} is no longer part of the tree")]
    StaleNode(NodeId),
    /// An element-only operation was applied to another kind of node.
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
    /// The insertion would make a node its own ancestor, or put a node
    /// somewhere nodes of its kind cannot live.
    #[error("cannot insert {child:?} into {parent:?}")]
    HierarchyRequest {
        /// The prospective parent.
        parent: NodeId,
        /// The node being inserted.
        child: NodeId,
    },
    /// The reference node of an insertion is not a child of the parent.
    #[error("{reference:?} is not a child of {parent:?}")]
    NotAChild {
        /// The parent the insertion targeted.
        parent: NodeId,
        /// The reference node that was expected among its children.
        reference: NodeId,
    },
    /// A template that must produce an element produced none.
    #[error("template `{0}` contains no element")]
    EmptyTemplate(String),
}
