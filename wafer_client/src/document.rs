// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The live document: definitions, upgrades and hydration.

use std::rc::Rc;

use hashbrown::HashMap;
use serde_json::Value;
use tracing::{debug, trace, warn};
use wafer_core::{Component, Context, Definition, Error, Host, HostExt, Listener, TaskQueue};
use wafer_dom::{Markup, NodeId, NodeKind, ShadowMode, TemplateCache, Tree};

use crate::dispatch::Listeners;

/// Attributes that turn a `<template>` into a declarative shadow root.
const SHADOW_TEMPLATE_ATTRIBUTES: [&str; 2] = ["shadowrootmode", "shadowroot"];

/// How a [`ClientDocument`] treats server-rendered markup.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClientOptions {
    /// Whether parsing turns `<template shadowroot="…">` children into shadow
    /// roots, as browsers with declarative shadow DOM do.
    ///
    /// Without it, a server-rendered component adopts the template's content
    /// into a new shadow root when it upgrades.
    pub declarative_shadow_dom: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            declarative_shadow_dom: true,
        }
    }
}

/// A live document driving Wafer components.
///
/// Elements whose tag has a definition become components: immediately when
/// created through [`create_element`](Self::create_element), otherwise when
/// they enter the document or when the definition arrives. A component
/// connects once, the first time it is in the document, which is when its
/// attributes are read and its declared events are bound.
///
/// Update cycles wait in the task queue until [`HostExt::flush`] or
/// [`HostExt::update_done`] runs them.
///
/// ```rust
/// use wafer_client::ClientDocument;
/// use wafer_core::{Definition, HostExt, Prop, PropType, Target};
///
/// let mut doc = ClientDocument::new();
/// doc.define(
///     "x-name",
///     Definition::builder()
///         .template("<b></b>")
///         .prop("name", Prop::new(PropType::String).target(Target::new("$b").text()))
///         .build(),
/// )
/// .unwrap();
///
/// let body = doc.document();
/// doc.set_inner_html(body, r#"<x-name name="Ada"></x-name>"#).unwrap();
/// let el = doc.tree().query_selector(body, "x-name").unwrap().unwrap();
/// doc.update_done(el).unwrap();
///
/// let shadow = doc.tree().shadow_root(el).unwrap();
/// assert_eq!(doc.inner_html(shadow), "<b>Ada</b>");
/// ```
pub struct ClientDocument {
    pub(crate) tree: Tree,
    document: NodeId,
    options: ClientOptions,
    definitions: HashMap<String, Rc<Definition<Self>>>,
    components: HashMap<NodeId, Component<Self>>,
    pub(crate) listeners: Listeners,
    tasks: TaskQueue<NodeId>,
    templates: TemplateCache,
}

impl core::fmt::Debug for ClientDocument {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClientDocument")
            .field("tree", &self.tree)
            .field("options", &self.options)
            .field("definitions", &self.definitions.len())
            .field("components", &self.components.len())
            .field("listeners", &self.listeners)
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

impl Default for ClientDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientDocument {
    /// Creates an empty document with declarative shadow DOM support.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ClientOptions::default())
    }

    /// Creates an empty document.
    #[must_use]
    pub fn with_options(options: ClientOptions) -> Self {
        let mut tree = Tree::new(Markup::Raw);
        let document = tree.create_document();
        Self {
            tree,
            document,
            options,
            definitions: HashMap::new(),
            components: HashMap::new(),
            listeners: Listeners::default(),
            tasks: TaskQueue::new(),
            templates: TemplateCache::new(),
        }
    }

    /// The document node.
    #[must_use]
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// The underlying tree.
    #[must_use]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The options the document was created with.
    #[must_use]
    pub fn options(&self) -> ClientOptions {
        self.options
    }

    /// Registers a component and upgrades every matching element already in
    /// the document, in tree order.
    ///
    /// A later definition of the same tag replaces the earlier one for
    /// elements that have not been upgraded yet.
    pub fn define(&mut self, tag: &str, definition: Definition<Self>) -> Result<(), Error> {
        let tag = tag.to_ascii_lowercase();
        debug!(tag, "defining component");
        self.definitions.insert(tag, Rc::new(definition));
        self.connect_subtree(self.document)
    }

    /// Whether `tag` has a definition.
    #[must_use]
    pub fn is_defined(&self, tag: &str) -> bool {
        self.definitions.contains_key(tag.to_ascii_lowercase().as_str())
    }

    /// Creates a detached element, upgrading it right away if its tag is
    /// defined.
    pub fn create_element(&mut self, tag: &str) -> Result<NodeId, Error> {
        let node = self.tree.create_element(tag);
        if let Some(definition) = self.definition_for(node) {
            self.upgrade(node, definition)?;
        }
        Ok(node)
    }

    /// Parses `html` into a detached fragment.
    ///
    /// With declarative shadow DOM, `<template shadowrootmode>` and
    /// `<template shadowroot>` children become shadow roots of their parent.
    /// Nothing is upgraded until the fragment is inserted into the document.
    pub fn parse(&mut self, html: &str) -> Result<NodeId, Error> {
        let fragment = self.tree.parse_fragment(html);
        if self.options.declarative_shadow_dom {
            self.attach_declarative_shadows(fragment)?;
        }
        Ok(fragment)
    }

    /// Replaces the children of `parent` with the parsed `html`.
    pub fn set_inner_html(&mut self, parent: NodeId, html: &str) -> Result<(), Error> {
        for child in self.tree.child_nodes(parent).to_vec() {
            Host::remove(self, child);
        }
        let fragment = self.parse(html)?;
        let result = self.insert_before(parent, fragment, None);
        self.tree.remove(fragment);
        result
    }

    /// Appends `child` to `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), Error> {
        self.insert_before(parent, child, None)
    }

    /// Whether `node` is part of the document, shadow trees included.
    #[must_use]
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.tree.composed_root(node) == self.document
    }

    /// Serializes a node including its own tag. Shadow trees are left out.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        self.tree.outer_html(node)
    }

    /// Serializes the children of a node.
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        self.tree.inner_html(node)
    }

    fn definition_for(&self, node: NodeId) -> Option<Rc<Definition<Self>>> {
        self.tree
            .tag_name(node)
            .and_then(|tag| self.definitions.get(tag))
            .cloned()
    }

    fn attach_declarative_shadows(&mut self, root: NodeId) -> Result<(), Error> {
        for template in self.tree.descendants(root) {
            if self.tree.tag_name(template) != Some("template") {
                continue;
            }
            let Some(mode) = SHADOW_TEMPLATE_ATTRIBUTES
                .iter()
                .find_map(|name| self.tree.attribute(template, name))
                .map(|mode| ShadowMode::from_keyword(&mode))
            else {
                continue;
            };
            let Some(host) = self.tree.parent(template).filter(|p| self.tree.is_element(*p))
            else {
                continue;
            };
            if self.tree.shadow_root(host).is_some() {
                continue;
            }
            let shadow = self.tree.attach_shadow(host, mode)?;
            self.move_children(template, shadow)?;
            self.tree.remove(template);
            trace!(?host, "attached declarative shadow root");
        }
        Ok(())
    }

    fn move_children(&mut self, from: NodeId, to: NodeId) -> Result<(), Error> {
        for child in self.tree.child_nodes(from).to_vec() {
            self.tree.append_child(to, child)?;
        }
        Ok(())
    }

    /// Makes `node` a component: sets up its shadow root and captures the
    /// initial property values.
    ///
    /// Server-rendered markup keeps its content. Without declarative shadow
    /// DOM the rendered shadow template is adopted into a new shadow root;
    /// otherwise the template is stamped.
    fn upgrade(&mut self, node: NodeId, definition: Rc<Definition<Self>>) -> Result<(), Error> {
        self.components
            .insert(node, Component::new(Rc::clone(&definition)));
        if let Some(mode) = definition.shadow()
            && self.tree.shadow_root(node).is_none()
        {
            if self.is_server_rendered(node) {
                if !self.options.declarative_shadow_dom {
                    self.adopt_shadow_template(node, mode)?;
                }
            } else {
                let shadow = self.tree.attach_shadow(node, mode)?;
                let content = self.templates.stamp(&mut self.tree, definition.template())?;
                self.tree.append_child(shadow, content)?;
                self.tree.remove(content);
            }
        }
        trace!(?node, "upgraded element");
        self.initialise_props(node)
    }

    fn adopt_shadow_template(&mut self, node: NodeId, mode: ShadowMode) -> Result<(), Error> {
        let template = self.tree.children(node).find(|child| {
            self.tree.tag_name(*child) == Some("template")
                && SHADOW_TEMPLATE_ATTRIBUTES
                    .iter()
                    .any(|name| self.tree.has_attribute(*child, name))
        });
        let Some(template) = template else {
            warn!(?node, "server-rendered component has no shadow template");
            return Ok(());
        };
        let shadow = self.tree.attach_shadow(node, mode)?;
        self.move_children(template, shadow)?;
        self.tree.remove(template);
        debug!(?node, "adopted server-rendered shadow content");
        Ok(())
    }

    /// First connect of a component: stamps light DOM content unless the
    /// markup came from the server, reads attributes, and binds events.
    fn connect(&mut self, node: NodeId) -> Result<(), Error> {
        let Some(definition) = self
            .components
            .get(&node)
            .filter(|component| !component.is_connected())
            .map(|component| Rc::clone(component.definition()))
        else {
            return Ok(());
        };
        if self.tree.shadow_root(node).is_none() && !self.is_server_rendered(node) {
            let content = self.templates.stamp(&mut self.tree, definition.template())?;
            let result = self.insert_before(node, content, None);
            self.tree.remove(content);
            result?;
        }
        self.setup_prop_values(node)?;
        for binding in definition.events() {
            binding.bind(self, node)?;
        }
        if let Some(component) = self.components.get_mut(&node) {
            component.set_connected();
        }
        debug!(?node, "connected component");
        Ok(())
    }

    /// Upgrades and connects `node` and everything under it, shadow trees
    /// first, in tree order.
    fn connect_subtree(&mut self, node: NodeId) -> Result<(), Error> {
        if !self.components.contains_key(&node)
            && let Some(definition) = self.definition_for(node)
        {
            self.upgrade(node, definition)?;
        }
        self.connect(node)?;
        if let Some(shadow) = self.tree.shadow_root(node) {
            for child in self.tree.child_nodes(shadow).to_vec() {
                self.connect_subtree(child)?;
            }
        }
        for child in self.tree.child_nodes(node).to_vec() {
            self.connect_subtree(child)?;
        }
        Ok(())
    }
}

impl Host for ClientDocument {
    type Node = NodeId;

    fn context(&self) -> Context {
        Context::Client
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.tree.attribute(node, name).map(|value| value.into_owned())
    }

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.tree.has_attribute(node, name)
    }

    fn write_attribute(
        &mut self,
        node: NodeId,
        name: &str,
        value: &str,
    ) -> Result<Option<String>, Error> {
        Ok(self.tree.set_attribute(node, name, value)?)
    }

    fn erase_attribute(&mut self, node: NodeId, name: &str) -> Result<Option<String>, Error> {
        Ok(self.tree.remove_attribute(node, name)?)
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<(), Error> {
        for child in self.tree.child_nodes(node).to_vec() {
            Host::remove(self, child);
        }
        Ok(self.tree.set_text_content(node, text)?)
    }

    fn expando(&self, node: NodeId, name: &str) -> Option<&Value> {
        self.tree.expando(node, name)
    }

    fn set_expando(&mut self, node: NodeId, name: &str, value: Value) -> Result<(), Error> {
        Ok(self.tree.set_expando(node, name, value)?)
    }

    fn take_expando(&mut self, node: NodeId, name: &str) -> Option<Value> {
        self.tree.take_expando(node, name)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.tree.next_element_sibling(node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree.children(node).collect()
    }

    fn shadow_root(&self, node: NodeId) -> Option<NodeId> {
        self.tree.shadow_root(node)
    }

    fn root(&self, node: NodeId) -> NodeId {
        self.tree.composed_root(node)
    }

    fn query_selector_all(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>, Error> {
        Ok(self.tree.query_selector_all(root, selector)?)
    }

    /// Inserts `child` and, if `parent` is in the document, upgrades and
    /// connects the inserted nodes.
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), Error> {
        let inserted = match self.tree.kind(child) {
            Some(NodeKind::Fragment) => self.tree.child_nodes(child).to_vec(),
            _ => vec![child],
        };
        self.tree.insert_before(parent, child, reference)?;
        if self.is_connected(parent) {
            for node in inserted {
                self.connect_subtree(node)?;
            }
        }
        Ok(())
    }

    fn remove(&mut self, node: NodeId) {
        for freed in self.tree.remove(node) {
            self.components.remove(&freed);
            self.listeners.forget(freed);
        }
    }

    fn stamp(&mut self, html: &str) -> Result<NodeId, Error> {
        Ok(self.templates.stamp_element(&mut self.tree, html)?)
    }

    fn add_listener(&mut self, node: NodeId, name: &str, listener: Listener<Self>) {
        self.listeners.add(node, name, listener);
    }

    fn component(&self, node: NodeId) -> Option<&Component<Self>> {
        self.components.get(&node)
    }

    fn component_mut(&mut self, node: NodeId) -> Option<&mut Component<Self>> {
        self.components.get_mut(&node)
    }

    fn tasks(&mut self) -> &mut TaskQueue<NodeId> {
        &mut self.tasks
    }
}
