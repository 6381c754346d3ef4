// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The arena holding every node of one document.

use std::borrow::Cow;

use serde_json::Value;
use smallvec::SmallVec;

use crate::escape::{escape, unescape};
use crate::types::{Attribute, Element, Markup, NodeId, NodeKind, ShadowMode};
use crate::Error;

struct Slot {
    generation: u32,
    node: Option<NodeData>,
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    shadow_root: Option<NodeId>,
    expandos: SmallVec<[(String, Value); 2]>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            shadow_root: None,
            expandos: SmallVec::new(),
        }
    }
}

/// An arena of HTML nodes.
///
/// Nodes are addressed by [`NodeId`]. Created nodes start detached; they join
/// a document through [`Tree::append_child`] or [`Tree::insert_before`], and
/// leave it through [`Tree::detach`] (node survives) or [`Tree::remove`] (node
/// and subtree are freed).
///
/// Attribute values and text go through the tree's [`Markup`] policy: with
/// [`Markup::Escaped`] they are stored escaped and serialized verbatim,
/// with [`Markup::Raw`] they are stored as written and escaped on
/// serialization. Getters always return the decoded value.
///
/// ```rust
/// use wafer_dom::{Markup, Tree};
///
/// let mut tree = Tree::new(Markup::Raw);
/// let div = tree.create_element("div");
/// tree.set_attribute(div, "title", "a & b").unwrap();
/// tree.set_text_content(div, "<hi>").unwrap();
///
/// assert_eq!(tree.attribute(div, "title").as_deref(), Some("a & b"));
/// assert_eq!(tree.outer_html(div), r#"<div title="a &amp; b">&lt;hi&gt;</div>"#);
/// ```
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    markup: Markup,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tree")
            .field("slots", &self.slots.len())
            .field("free", &self.free.len())
            .field("markup", &self.markup)
            .finish_non_exhaustive()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new(Markup::default())
    }
}

impl Tree {
    /// Creates an empty tree with the given storage policy.
    #[must_use]
    pub fn new(markup: Markup) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            markup,
        }
    }

    /// The storage policy of this tree.
    #[must_use]
    pub fn markup(&self) -> Markup {
        self.markup
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let data = NodeData::new(kind);
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = Some(data);
            NodeId::new(idx, slot.generation)
        } else {
            let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 1,
                node: Some(data),
            });
            NodeId::new(idx, 1)
        }
    }

    fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.slots
            .get(id.idx())
            .filter(|slot| slot.generation == id.1)
            .and_then(|slot| slot.node.as_ref())
    }

    fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.slots
            .get_mut(id.idx())
            .filter(|slot| slot.generation == id.1)
            .and_then(|slot| slot.node.as_mut())
    }

    fn live(&self, id: NodeId) -> Result<&NodeData, Error> {
        self.data(id).ok_or(Error::StaleNode(id))
    }

    fn live_mut(&mut self, id: NodeId) -> Result<&mut NodeData, Error> {
        self.data_mut(id).ok_or(Error::StaleNode(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, Error> {
        match &mut self.live_mut(id)?.kind {
            NodeKind::Element(element) => Ok(element),
            _ => Err(Error::NotAnElement(id)),
        }
    }

    fn encode<'a>(&self, value: &'a str) -> Cow<'a, str> {
        match self.markup {
            Markup::Raw => Cow::Borrowed(value),
            Markup::Escaped => escape(value),
        }
    }

    fn decode<'a>(&self, value: &'a str) -> Cow<'a, str> {
        match self.markup {
            Markup::Raw => Cow::Borrowed(value),
            Markup::Escaped => unescape(value),
        }
    }

    /// Returns `true` if `id` refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.data(id).is_some()
    }

    /// Creates a document node.
    pub fn create_document(&mut self) -> NodeId {
        self.alloc(NodeKind::Document)
    }

    /// Creates an empty fragment.
    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeKind::Fragment)
    }

    /// Creates a detached element. The tag name is lowercased.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::Element(Element::new(name)))
    }

    /// Creates a detached element with its attributes already in place.
    pub(crate) fn create_element_with<'a>(
        &mut self,
        name: &str,
        attrs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> NodeId {
        let mut element = Element::new(name);
        for (name, value) in attrs {
            if element.find(name).is_some() {
                continue;
            }
            element.attrs.push(Attribute {
                name: name.to_ascii_lowercase(),
                value: self.encode(value).into_owned(),
            });
        }
        self.alloc(NodeKind::Element(element))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        let stored = self.encode(text).into_owned();
        self.alloc(NodeKind::Text(stored))
    }

    /// Creates a detached comment node.
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        let stored = self.encode(text).into_owned();
        self.alloc(NodeKind::Comment(stored))
    }

    /// The kind of a live node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.data(id).map(|data| &data.kind)
    }

    /// The tag name of an element.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element(element) => Some(element.name()),
            _ => None,
        }
    }

    /// Returns `true` if `id` is a live element.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element(_)))
    }

    /// The parent of a node, if attached. Shadow roots have no parent.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).and_then(|data| data.parent)
    }

    /// All children of a node, in order.
    #[must_use]
    pub fn child_nodes(&self, id: NodeId) -> &[NodeId] {
        self.data(id).map_or(&[], |data| data.children.as_slice())
    }

    /// The element children of a node, in order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.child_nodes(id)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
    }

    /// The first element child of a node.
    #[must_use]
    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).next()
    }

    /// The element sibling immediately before `id`.
    #[must_use]
    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.child_nodes(parent);
        let at = siblings.iter().position(|sibling| *sibling == id)?;
        siblings[..at]
            .iter()
            .rev()
            .copied()
            .find(|sibling| self.is_element(*sibling))
    }

    /// The element sibling immediately after `id`.
    #[must_use]
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.child_nodes(parent);
        let at = siblings.iter().position(|sibling| *sibling == id)?;
        siblings[at + 1..]
            .iter()
            .copied()
            .find(|sibling| self.is_element(*sibling))
    }

    /// Returns `true` if `ancestor` is `id` or one of its ancestors.
    ///
    /// Shadow roots count as ancestors of their contents but not of the host's
    /// light tree; the walk follows shadow roots up to their hosts.
    #[must_use]
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            if node == ancestor {
                return true;
            }
            cursor = self.parent(node).or_else(|| self.shadow_host(node));
        }
        false
    }

    /// The top-most ancestor of `id`, crossing shadow boundaries.
    #[must_use]
    pub fn composed_root(&self, id: NodeId) -> NodeId {
        let mut node = id;
        while let Some(next) = self.parent(node).or_else(|| self.shadow_host(node)) {
            node = next;
        }
        node
    }

    /// Appends `child` as the last child of `parent`.
    ///
    /// Fragments move their children instead of themselves.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), Error> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` into `parent` before `reference`, or last when `None`.
    ///
    /// `child` is first detached from its current parent. Fragments move
    /// their children instead of themselves, leaving the fragment empty.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), Error> {
        let parent_kind = &self.live(parent)?.kind;
        if !parent_kind.is_container() {
            return Err(Error::HierarchyRequest { parent, child });
        }
        let is_fragment = match &self.live(child)?.kind {
            NodeKind::Document | NodeKind::ShadowRoot { .. } => {
                return Err(Error::HierarchyRequest { parent, child });
            }
            NodeKind::Fragment => true,
            _ => false,
        };
        if is_fragment {
            let moved = core::mem::take(&mut self.live_mut(child)?.children);
            for node in &moved {
                if let Some(data) = self.data_mut(*node) {
                    data.parent = None;
                }
            }
            for node in moved {
                self.insert_before(parent, node, reference)?;
            }
            return Ok(());
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(Error::HierarchyRequest { parent, child });
        }
        if reference == Some(child) {
            return Ok(());
        }
        self.detach(child);
        let at = match reference {
            Some(reference) => self
                .live(parent)?
                .children
                .iter()
                .position(|node| *node == reference)
                .ok_or(Error::NotAChild { parent, reference })?,
            None => self.live(parent)?.children.len(),
        };
        self.live_mut(parent)?.children.insert(at, child);
        self.live_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Appends a node that was created detached while building from parsed
    /// markup. Dead ids are skipped.
    pub(crate) fn push_built(&mut self, parent: NodeId, child: NodeId) {
        if self.data(parent).is_none() {
            return;
        }
        let Some(data) = self.data_mut(child) else {
            return;
        };
        data.parent = Some(parent);
        if let Some(data) = self.data_mut(parent) {
            data.children.push(child);
        }
    }

    /// Detaches a node from its parent. The node and its subtree stay alive.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(data) = self.data_mut(parent) {
            data.children.retain(|child| *child != id);
        }
        if let Some(data) = self.data_mut(id) {
            data.parent = None;
        }
    }

    /// Detaches a node and frees it together with its subtree and shadow tree.
    ///
    /// Returns every freed id, so owners of side tables can drop their entries.
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        self.detach(id);
        let mut freed = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(node.idx())
                .filter(|slot| slot.generation == node.1)
            else {
                continue;
            };
            let Some(data) = slot.node.take() else {
                continue;
            };
            stack.extend(data.children);
            stack.extend(data.shadow_root);
            self.free.push(node.0);
            freed.push(node);
        }
        freed
    }

    /// The value of an attribute, decoded.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<Cow<'_, str>> {
        let NodeKind::Element(element) = self.kind(id)? else {
            return None;
        };
        let at = element.find(name)?;
        Some(self.decode(&element.attrs[at].value))
    }

    /// Returns `true` if the element carries the attribute.
    #[must_use]
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element(element)) if element.find(name).is_some())
    }

    /// All attributes of an element, decoded, in insertion order.
    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&str, Cow<'_, str>)> + '_ {
        let attrs: &[Attribute] = match self.kind(id) {
            Some(NodeKind::Element(element)) => &element.attrs,
            _ => &[],
        };
        attrs
            .iter()
            .map(|attr| (attr.name.as_str(), self.decode(&attr.value)))
    }

    /// Sets an attribute, returning the previous (decoded) value.
    ///
    /// Existing attributes keep their position; new ones are appended.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: &str,
    ) -> Result<Option<String>, Error> {
        let stored = self.encode(value).into_owned();
        let markup = self.markup;
        let element = self.element_mut(id)?;
        let previous = match element.find(name) {
            Some(at) => Some(core::mem::replace(&mut element.attrs[at].value, stored)),
            None => {
                element.attrs.push(Attribute {
                    name: name.to_ascii_lowercase(),
                    value: stored,
                });
                None
            }
        };
        Ok(previous.map(|old| decode_owned(markup, old)))
    }

    /// Removes an attribute, returning its previous (decoded) value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<String>, Error> {
        let markup = self.markup;
        let element = self.element_mut(id)?;
        Ok(element
            .find(name)
            .map(|at| element.attrs.remove(at).value)
            .map(|old| decode_owned(markup, old)))
    }

    /// The concatenated, decoded text of a node and its descendants.
    ///
    /// Shadow trees are not included.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => out.push_str(&self.decode(text)),
            Some(NodeKind::Comment(_)) | None => {}
            Some(_) => {
                for child in self.child_nodes(id) {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Replaces the children of a node with a single text node.
    ///
    /// An empty string leaves the node without children. On a text or comment
    /// node the data is replaced instead.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<(), Error> {
        let stored = self.encode(text).into_owned();
        let data = self.live_mut(id)?;
        match &mut data.kind {
            NodeKind::Text(data) | NodeKind::Comment(data) => {
                *data = stored;
                return Ok(());
            }
            _ => {}
        }
        let children = core::mem::take(&mut data.children);
        for child in children {
            if let Some(data) = self.data_mut(child) {
                data.parent = None;
            }
            self.remove(child);
        }
        if !stored.is_empty() {
            let node = self.alloc(NodeKind::Text(stored));
            self.live_mut(node)?.parent = Some(id);
            self.live_mut(id)?.children.push(node);
        }
        Ok(())
    }

    /// Attaches a shadow root to an element and returns it.
    ///
    /// If the element already has one it is returned unchanged.
    pub fn attach_shadow(&mut self, host: NodeId, mode: ShadowMode) -> Result<NodeId, Error> {
        if !self.is_element(host) {
            return Err(Error::NotAnElement(host));
        }
        if let Some(existing) = self.shadow_root(host) {
            return Ok(existing);
        }
        let root = self.alloc(NodeKind::ShadowRoot { host, mode });
        self.live_mut(host)?.shadow_root = Some(root);
        Ok(root)
    }

    /// The shadow root attached to an element, whatever its mode.
    #[must_use]
    pub fn shadow_root(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).and_then(|data| data.shadow_root)
    }

    /// The host of a shadow root.
    #[must_use]
    pub fn shadow_host(&self, root: NodeId) -> Option<NodeId> {
        match self.kind(root)? {
            NodeKind::ShadowRoot { host, .. } => Some(*host),
            _ => None,
        }
    }

    /// Reads an arbitrary script-side value stored on a node.
    #[must_use]
    pub fn expando(&self, id: NodeId, name: &str) -> Option<&Value> {
        self.data(id)?
            .expandos
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Stores an arbitrary script-side value on a node.
    pub fn set_expando(&mut self, id: NodeId, name: &str, value: Value) -> Result<(), Error> {
        let expandos = &mut self.live_mut(id)?.expandos;
        match expandos.iter_mut().find(|(key, _)| key == name) {
            Some((_, slot)) => *slot = value,
            None => expandos.push((name.to_owned(), value)),
        }
        Ok(())
    }

    /// Removes and returns a script-side value stored on a node.
    pub fn take_expando(&mut self, id: NodeId, name: &str) -> Option<Value> {
        let expandos = &mut self.data_mut(id)?.expandos;
        let at = expandos.iter().position(|(key, _)| key == name)?;
        Some(expandos.remove(at).1)
    }

    /// All descendants of `id` (excluding `id`) in tree order.
    ///
    /// Shadow trees are not entered.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.child_nodes(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.child_nodes(node).iter().rev().copied());
        }
        out
    }

    /// Copies a node and its light subtree. Shadow roots and expandos are
    /// not copied; the copy starts detached.
    pub fn deep_clone(&mut self, id: NodeId) -> Result<NodeId, Error> {
        let kind = match &self.live(id)?.kind {
            NodeKind::ShadowRoot { .. } => NodeKind::Fragment,
            kind => kind.clone(),
        };
        let copy = self.alloc(kind);
        let children = self.live(id)?.children.clone();
        for child in children {
            let cloned = self.deep_clone(child)?;
            self.live_mut(cloned)?.parent = Some(copy);
            self.live_mut(copy)?.children.push(cloned);
        }
        Ok(copy)
    }
}

fn decode_owned(markup: Markup, value: String) -> String {
    match markup {
        Markup::Raw => value,
        Markup::Escaped => unescape(&value).into_owned(),
    }
}
