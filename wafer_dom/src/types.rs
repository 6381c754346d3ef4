// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the tree: node identifiers, node kinds, and storage policy.

use core::fmt;

use smallvec::SmallVec;

/// Identifier for a node in a [`Tree`](crate::Tree).
///
/// This is a small, copyable handle that stays stable while the node lives and
/// becomes invalid once the node is removed.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On creation, a fresh slot is allocated with generation `1`.
/// - On [`Tree::remove`](crate::Tree::remove), the slots of the node and its
///   subtree are freed; any `NodeId` pointing at them is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new,
///   distinct `NodeId`.
///
/// Stale `NodeId`s never alias a different live node because the generation
/// must match. Use [`Tree::is_alive`](crate::Tree::is_alive) to check.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.0, self.1)
    }
}

/// Encapsulation mode of a shadow root.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ShadowMode {
    /// Reachable from outside the host.
    #[default]
    Open,
    /// Only reachable by the host's own machinery.
    Closed,
}

impl ShadowMode {
    /// The keyword used in markup (`open` or `closed`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    /// Parses a markup keyword. Anything other than `closed` is open.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Self {
        if keyword.eq_ignore_ascii_case("closed") {
            Self::Closed
        } else {
            Self::Open
        }
    }
}

/// How attribute values and text are stored and serialized.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Markup {
    /// Values are stored as written and escaped when serialized.
    #[default]
    Raw,
    /// Values are escaped (`&<>"'`) when written and serialized verbatim.
    ///
    /// Reads decode the stored form, so callers always see the value they wrote.
    Escaped,
}

/// A name/value attribute pair as stored in the tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attribute {
    pub(crate) name: String,
    pub(crate) value: String,
}

/// Element payload: lowercase tag name plus attributes in insertion order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Element {
    pub(crate) name: String,
    pub(crate) attrs: SmallVec<[Attribute; 4]>,
}

impl Element {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: SmallVec::new(),
        }
    }

    /// The lowercase tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn find(&self, name: &str) -> Option<usize> {
        self.attrs
            .iter()
            .position(|attr| attr.name.eq_ignore_ascii_case(name))
    }
}

/// What a node is.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NodeKind {
    /// Top of a document.
    Document,
    /// A detached container whose children move as a group on insertion.
    Fragment,
    /// An encapsulated child tree attached to `host`.
    ShadowRoot {
        /// The element the root is attached to.
        host: NodeId,
        /// Encapsulation mode.
        mode: ShadowMode,
    },
    /// An element with a tag name and attributes.
    Element(Element),
    /// Character data, in the tree's storage form.
    Text(String),
    /// A comment, in the tree's storage form.
    Comment(String),
}

impl NodeKind {
    /// Returns `true` for nodes that may hold children.
    #[must_use]
    pub fn is_container(&self) -> bool {
        !matches!(self, Self::Text(_) | Self::Comment(_))
    }
}

/// Elements whose serialization has no end tag and no content.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text content is serialized without escaping.
pub(crate) const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];
