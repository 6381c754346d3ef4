// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-instance component state.

use core::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;
use smallvec::SmallVec;

use crate::definition::{Definition, PropId};
use crate::{Error, Host};

/// State a host keeps for every node that is a component.
///
/// Committed values change only inside an update cycle. Writes land in the
/// pending map first and are merged when the cycle runs.
pub struct Component<H: Host> {
    definition: Rc<Definition<H>>,
    pub(crate) props: Vec<Option<Value>>,
    pub(crate) pending: IndexMap<PropId, Option<Value>>,
    pub(crate) initials: Vec<Option<Value>>,
    pub(crate) forced: SmallVec<[PropId; 4]>,
    pub(crate) connected: bool,
    pub(crate) first_update: bool,
    pub(crate) change_pending: bool,
    pub(crate) update_pending: bool,
    pub(crate) new_changes: bool,
    pub(crate) server_only: bool,
    pub(crate) error: Option<Error>,
}

impl<H: Host> fmt::Debug for Component<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("props", &self.props)
            .field("pending", &self.pending)
            .field("connected", &self.connected)
            .field("first_update", &self.first_update)
            .field("change_pending", &self.change_pending)
            .field("update_pending", &self.update_pending)
            .field("server_only", &self.server_only)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<H: Host> Component<H> {
    /// Fresh state for an instance of `definition`.
    #[must_use]
    pub fn new(definition: Rc<Definition<H>>) -> Self {
        let count = definition.props().len();
        Self {
            definition,
            props: vec![None; count],
            pending: IndexMap::new(),
            initials: vec![None; count],
            forced: SmallVec::new(),
            connected: false,
            first_update: true,
            change_pending: false,
            update_pending: false,
            new_changes: false,
            server_only: false,
            error: None,
        }
    }

    /// Marks a server-rendered instance that is never hydrated.
    ///
    /// Such an instance reflects only `reflect` properties and drops the
    /// attributes of the others once read.
    #[must_use]
    pub fn with_server_only(mut self, server_only: bool) -> Self {
        self.server_only = server_only;
        self
    }

    /// The shared definition.
    #[must_use]
    pub fn definition(&self) -> &Rc<Definition<H>> {
        &self.definition
    }

    /// Whether the instance completed its first connect.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Records the first connect.
    pub fn set_connected(&mut self) {
        self.connected = true;
    }

    /// Whether no cycle with updates has completed yet.
    #[must_use]
    pub fn is_first_update(&self) -> bool {
        self.first_update
    }

    /// Whether the instance is server-only.
    #[must_use]
    pub fn is_server_only(&self) -> bool {
        self.server_only
    }

    /// Whether no cycle is scheduled or running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !self.change_pending && !self.update_pending
    }

    /// The committed value of a property.
    #[must_use]
    pub fn committed(&self, id: PropId) -> Option<&Value> {
        self.props.get(id.index()).and_then(Option::as_ref)
    }

    /// The pending value if there is one, else the committed value.
    #[must_use]
    pub fn current(&self, id: PropId) -> Option<&Value> {
        match self.pending.get(&id) {
            Some(pending) => pending.as_ref(),
            None => self.committed(id),
        }
    }

    /// Queues a write unless it would not change anything. Returns whether
    /// the write was queued.
    pub(crate) fn write(&mut self, id: PropId, value: Value) -> bool {
        if self.current(id) == Some(&value) {
            return false;
        }
        self.pending.insert(id, Some(value));
        self.new_changes = true;
        true
    }
}
