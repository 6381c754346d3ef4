// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tag name to definition lookup.

use std::rc::Rc;

use hashbrown::HashMap;
use wafer_core::Definition;

use crate::ServerDocument;

/// A registered component.
#[derive(Debug)]
pub struct RegistryEntry {
    definition: Rc<Definition<ServerDocument>>,
    server_only: bool,
}

impl RegistryEntry {
    /// The component definition.
    #[must_use]
    pub fn definition(&self) -> &Rc<Definition<ServerDocument>> {
        &self.definition
    }

    /// Whether instances stay server markup and are never hydrated.
    #[must_use]
    pub fn is_server_only(&self) -> bool {
        self.server_only
    }
}

/// The components a [`ServerDocument`] instantiates while parsing.
///
/// Tag names are matched case-insensitively.
///
/// ```rust
/// use wafer_core::Definition;
/// use wafer_server::Registry;
///
/// let registry = Registry::new()
///     .define("x-greeting", Definition::builder().template("<p>Hi</p>").build())
///     .define_server_only("x-static", Definition::builder().light().build());
///
/// assert!(registry.contains("X-Greeting"));
/// assert!(registry.get("x-static").unwrap().is_server_only());
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<String, Rc<RegistryEntry>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component that hydrates on the client.
    #[must_use]
    pub fn define(self, tag: &str, definition: Definition<ServerDocument>) -> Self {
        self.insert(tag, definition, false)
    }

    /// Registers a component whose markup is final. Only its `reflect`
    /// properties reach the output and no `wafer-ssr` marker is written.
    #[must_use]
    pub fn define_server_only(self, tag: &str, definition: Definition<ServerDocument>) -> Self {
        self.insert(tag, definition, true)
    }

    fn insert(mut self, tag: &str, definition: Definition<ServerDocument>, server_only: bool) -> Self {
        self.entries.insert(
            tag.to_ascii_lowercase(),
            Rc::new(RegistryEntry {
                definition: Rc::new(definition),
                server_only,
            }),
        );
        self
    }

    /// The entry registered for `tag`.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&Rc<RegistryEntry>> {
        self.entries.get(tag.to_ascii_lowercase().as_str())
    }

    /// Whether `tag` is registered.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    /// Number of registered tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
