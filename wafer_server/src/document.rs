// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The server-side document.

use std::rc::Rc;

use hashbrown::HashMap;
use serde_json::Value;
use tracing::{debug, trace};
use wafer_core::{Component, Context, Error, Host, HostExt, Listener, TaskQueue, WAFER_SSR};
use wafer_dom::{Markup, NodeId, TemplateCache, Tree};

use crate::registry::{Registry, RegistryEntry};

/// A document that renders components to HTML.
///
/// Values are escaped as they are written, so serialization emits the tree
/// verbatim. Shadow trees have no live counterpart here: each shadow
/// component gets a `<template shadowroot="…">` child that stands in for its
/// shadow root, and `$` selectors query inside it. Event listeners are
/// accepted and dropped.
///
/// Parsing instantiates every registered tag, children before parents, then
/// connects it and runs its first update cycle, so the returned markup
/// already reflects each component's state.
pub struct ServerDocument {
    tree: Tree,
    registry: Registry,
    components: HashMap<NodeId, Component<Self>>,
    shadow_roots: HashMap<NodeId, NodeId>,
    tasks: TaskQueue<NodeId>,
    templates: TemplateCache,
}

impl core::fmt::Debug for ServerDocument {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ServerDocument")
            .field("tree", &self.tree)
            .field("registry", &self.registry.len())
            .field("components", &self.components.len())
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

impl ServerDocument {
    /// Creates an empty document that instantiates the components of
    /// `registry`.
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            tree: Tree::new(Markup::Escaped),
            registry,
            components: HashMap::new(),
            shadow_roots: HashMap::new(),
            tasks: TaskQueue::new(),
            templates: TemplateCache::new(),
        }
    }

    /// The underlying tree.
    #[must_use]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The registry components are looked up in.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Parses `html` into a detached fragment, instantiating and connecting
    /// every registered component in it.
    pub fn parse(&mut self, html: &str) -> Result<NodeId, Error> {
        let fragment = self.tree.parse_fragment(html);
        self.upgrade_tree(fragment)?;
        Ok(fragment)
    }

    /// Parses `html`, settles every update cycle, and serializes the result.
    ///
    /// ```rust
    /// use wafer_core::{Definition, Prop, PropType, Target};
    /// use wafer_server::{Registry, ServerDocument};
    ///
    /// let registry = Registry::new().define(
    ///     "x-hello",
    ///     Definition::builder()
    ///         .template("<p></p>")
    ///         .prop("name", Prop::new(PropType::String).target(Target::new("$p").text()))
    ///         .build(),
    /// );
    /// let mut doc = ServerDocument::new(registry);
    /// let html = doc.render(r#"<x-hello name="Ada"></x-hello>"#).unwrap();
    /// assert_eq!(
    ///     html,
    ///     r#"<x-hello name="Ada" wafer-ssr><template shadowroot="open"><p>Ada</p></template></x-hello>"#
    /// );
    /// ```
    pub fn render(&mut self, html: &str) -> Result<String, Error> {
        let fragment = self.parse(html)?;
        self.flush();
        let out = self.tree.inner_html(fragment);
        Host::remove(self, fragment);
        Ok(out)
    }

    /// Creates a detached element. Registered tags are not instantiated
    /// until [`construct`](Self::construct).
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree.create_element(tag)
    }

    /// Creates and constructs a registered component, not yet connected.
    pub fn create_component(&mut self, tag: &str) -> Result<NodeId, Error> {
        let node = self.tree.create_element(tag);
        match self.construct(node) {
            Ok(()) => Ok(node),
            Err(err) => {
                Host::remove(self, node);
                Err(err)
            }
        }
    }

    /// Turns a registered element into a component: attaches its shadow
    /// stand-in, stamps the template into it, and captures initial values.
    ///
    /// Constructing an element twice does nothing.
    pub fn construct(&mut self, node: NodeId) -> Result<(), Error> {
        if self.components.contains_key(&node) {
            return Ok(());
        }
        let entry = self.entry(node)?;
        let definition = Rc::clone(entry.definition());
        self.components.insert(
            node,
            Component::new(Rc::clone(&definition)).with_server_only(entry.is_server_only()),
        );
        if let Some(mode) = definition.shadow() {
            let template = self.tree.create_element("template");
            self.tree.set_attribute(template, "shadowroot", mode.as_str())?;
            self.tree.append_child(node, template)?;
            self.shadow_roots.insert(node, template);
            self.stamp_into(template, definition.template())?;
        }
        trace!(?node, "constructed component");
        self.initialise_props(node)
    }

    /// Runs the first-connect steps of a component, then waits for its
    /// update cycle. Later connects only wait.
    ///
    /// A light DOM component stamps its template into itself. Unless the
    /// component is server-only, `wafer-ssr` marks it for hydration.
    pub fn connect(&mut self, node: NodeId) -> Result<(), Error> {
        let component = self
            .components
            .get(&node)
            .ok_or_else(|| Error::NotAComponent(format!("{node:?}")))?;
        if component.is_connected() {
            return self.update_done(node);
        }
        let definition = Rc::clone(component.definition());
        let server_only = component.is_server_only();
        if definition.shadow().is_none() {
            self.stamp_into(node, definition.template())?;
        }
        if !server_only {
            self.set_attribute(node, WAFER_SSR, "")?;
        }
        self.setup_prop_values(node)?;
        let result = self.update_done(node);
        if let Some(component) = self.components.get_mut(&node) {
            component.set_connected();
        }
        debug!(?node, server_only, "connected component");
        result
    }

    /// Serializes a node including its own tag.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        self.tree.outer_html(node)
    }

    /// Serializes the children of a node.
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        self.tree.inner_html(node)
    }

    /// Appends `child` to `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), Error> {
        self.insert_before(parent, child, None)
    }

    fn entry(&self, node: NodeId) -> Result<Rc<RegistryEntry>, Error> {
        self.tree
            .tag_name(node)
            .and_then(|tag| self.registry.get(tag))
            .cloned()
            .ok_or_else(|| Error::NotAComponent(format!("{node:?}")))
    }

    fn stamp_into(&mut self, parent: NodeId, html: &str) -> Result<(), Error> {
        let content = self.templates.stamp(&mut self.tree, html)?;
        self.upgrade_tree(content)?;
        self.tree.append_child(parent, content)?;
        self.tree.remove(content);
        Ok(())
    }

    fn upgrade_tree(&mut self, node: NodeId) -> Result<(), Error> {
        for child in self.tree.child_nodes(node).to_vec() {
            self.upgrade_tree(child)?;
        }
        let registered = self
            .tree
            .tag_name(node)
            .is_some_and(|tag| self.registry.contains(tag));
        if registered && !self.components.contains_key(&node) {
            self.construct(node)?;
            self.connect(node)?;
        }
        Ok(())
    }
}

impl Host for ServerDocument {
    type Node = NodeId;

    fn context(&self) -> Context {
        Context::Server
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
        self.shadow_roots
            .get(&node)
            .copied()
            .filter(|template| self.tree.is_alive(*template))
    }

    fn root(&self, node: NodeId) -> NodeId {
        self.tree.composed_root(node)
    }

    fn query_selector_all(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>, Error> {
        Ok(self.tree.query_selector_all(root, selector)?)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), Error> {
        Ok(self.tree.insert_before(parent, child, reference)?)
    }

    fn remove(&mut self, node: NodeId) {
        for freed in self.tree.remove(node) {
            self.components.remove(&freed);
            self.shadow_roots.remove(&freed);
        }
    }

    fn stamp(&mut self, html: &str) -> Result<NodeId, Error> {
        let element = self.templates.stamp_element(&mut self.tree, html)?;
        self.upgrade_tree(element)?;
        Ok(element)
    }

    fn add_listener(&mut self, node: NodeId, name: &str, _listener: Listener<Self>) {
        trace!(?node, event = name, "listener dropped on the server");
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

/// Renders `html` with the components of `registry`.
///
/// ```rust
/// use wafer_core::Definition;
/// use wafer_server::{Registry, render};
///
/// let registry = Registry::new().define(
///     "x-title",
///     Definition::builder().template("<h1>Title</h1>").build(),
/// );
/// assert_eq!(
///     render("<x-title></x-title>", registry).unwrap(),
///     r#"<x-title wafer-ssr><template shadowroot="open"><h1>Title</h1></template></x-title>"#
/// );
/// ```
pub fn render(html: &str, registry: Registry) -> Result<String, Error> {
    ServerDocument::new(registry).render(html)
}
