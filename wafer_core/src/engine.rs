// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The update engine: property access, scheduling, and the two-phase update
//! cycle.
//!
//! A cycle runs in two phases:
//!
//! 1. **Convergence.** Pending writes are merged into the committed values,
//!    and `changed` runs once per pass with the old values. Writes made by
//!    `changed` start another pass of the same cycle. Writes that end up
//!    equal to the committed value are dropped.
//! 2. **Application.** Every property that differs from its value at cycle
//!    start is reflected to its attribute. Unless `changed` asked to skip it,
//!    its targets are applied, followed by the targets of any properties it
//!    triggers. Then `first_updated` (once per lifetime) and `updated` run
//!    with the values from before the cycle.
//!
//! The convergence flag is cleared before the lifecycle callbacks, so writes
//! from `updated` schedule a new cycle.

use core::mem;
use std::rc::Rc;

use hashbrown::HashSet;
use indexmap::IndexSet;
use serde_json::Value;
use smallvec::SmallVec;
use tracing::{debug, error, trace, warn};

use crate::WAFER_SSR;
use crate::component::Component;
use crate::definition::{ChangeMap, Definition, PropId};
use crate::host::Context;
use crate::target::update_targets_with;
use crate::value::{Reflection, normalize};
use crate::{Error, Host};

/// Component operations available on every [`Host`].
pub trait HostExt: Host {
    /// Reads a property: the pending value if one exists, else the committed
    /// value. Names a component does not declare read the node's expando.
    fn prop(&self, node: Self::Node, name: &str) -> Option<&Value> {
        if let Some(component) = self.component(node)
            && let Some(id) = component.definition().prop_id(name)
        {
            return component.current(id);
        }
        self.expando(node, name)
    }

    /// Writes a property.
    ///
    /// Declared properties go through the batching pipeline: a write equal to
    /// the pending value (or, with nothing pending, the committed value) is a
    /// no-op; otherwise a cycle is scheduled. Other names are stored as an
    /// expando on the node.
    fn set_prop(
        &mut self,
        node: Self::Node,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<(), Error> {
        let value = normalize(value.into());
        match self
            .component(node)
            .and_then(|component| component.definition().prop_id(name))
        {
            Some(id) => {
                write_prop(self, node, id, value);
                Ok(())
            }
            None => self.set_expando(node, name, value),
        }
    }

    /// Sets an attribute and lets the component observe the change.
    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str) -> Result<(), Error> {
        let old = self.write_attribute(node, name, value)?;
        attribute_changed(self, node, name, old.as_deref(), Some(value))
    }

    /// Removes an attribute and lets the component observe the change.
    fn remove_attribute(&mut self, node: Self::Node, name: &str) -> Result<(), Error> {
        let old = self.erase_attribute(node, name)?;
        attribute_changed(self, node, name, old.as_deref(), None)
    }

    /// Forces target re-application once any in-flight cycle has finished.
    ///
    /// `None` only waits. An empty list forces every declared property;
    /// otherwise just the named ones, whether or not their values changed.
    fn request_update(&mut self, node: Self::Node, props: Option<&[&str]>) -> Result<(), Error> {
        self.update_done(node)?;
        let Some(names) = props else {
            return Ok(());
        };
        let component = state(self, node)?;
        let definition = Rc::clone(component.definition());
        let ids: SmallVec<[PropId; 4]> = if names.is_empty() {
            definition.prop_ids().collect()
        } else {
            names
                .iter()
                .map(|name| {
                    definition
                        .prop_id(name)
                        .ok_or_else(|| Error::UnknownProperty((*name).to_owned()))
                })
                .collect::<Result<_, _>>()?
        };
        for id in ids {
            if !component.forced.contains(&id) {
                component.forced.push(id);
            }
        }
        schedule(self, node);
        Ok(())
    }

    /// Runs scheduled cycles until none is left, then reports the error of
    /// the last failed cycle of `node` that nobody has observed yet.
    ///
    /// Called from inside a running cycle, the cycles of components that are
    /// mid-cycle are deferred rather than re-entered.
    fn update_done(&mut self, node: Self::Node) -> Result<(), Error> {
        self.flush();
        match self.component_mut(node).and_then(|c| c.error.take()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Runs every scheduled cycle, including ones scheduled along the way.
    fn flush(&mut self) {
        let mut deferred: SmallVec<[Self::Node; 4]> = SmallVec::new();
        while let Some(node) = self.tasks().pop() {
            if self.tasks().is_running(node) {
                deferred.push(node);
                continue;
            }
            run_cycle(self, node);
        }
        for node in deferred {
            self.tasks().push(node);
        }
    }

    /// Applies the targets of property `name` for its committed value.
    fn update_targets(&mut self, node: Self::Node, name: &str) -> Result<(), Error> {
        let definition = Rc::clone(state(self, node)?.definition());
        let id = definition
            .prop_id(name)
            .ok_or_else(|| Error::UnknownProperty(name.to_owned()))?;
        update_targets_for(self, node, &definition, id)
    }

    /// Captures each property's starting value at construction.
    ///
    /// The value already written to the instance wins, then a value stored
    /// on the node before it became a component (consumed), then the
    /// declared initial.
    fn initialise_props(&mut self, node: Self::Node) -> Result<(), Error> {
        let definition = Rc::clone(state(self, node)?.definition());
        for id in definition.prop_ids() {
            let prop = definition.prop(id);
            let current = state(self, node)?.current(id).cloned();
            let initial = match current {
                Some(value) => Some(value),
                None => self
                    .take_expando(node, prop.name())
                    .map(normalize)
                    .or_else(|| prop.initial_value().cloned()),
            };
            state(self, node)?.initials[id.index()] = initial;
        }
        Ok(())
    }

    /// Establishes property values at first connect.
    ///
    /// A property whose attribute is present takes its value from it;
    /// otherwise a captured initial is written if the property has no value
    /// yet. Server-only components drop attributes of unreflected
    /// properties once read.
    fn setup_prop_values(&mut self, node: Self::Node) -> Result<(), Error> {
        let component = state(self, node)?;
        let definition = Rc::clone(component.definition());
        let server_only = component.is_server_only();
        for id in definition.prop_ids() {
            let prop = definition.prop(id);
            let attribute = prop.attribute();
            if self.has_attribute(node, attribute) {
                let text = self.attribute(node, attribute);
                set_from_attribute(self, node, id, text.as_deref())?;
                if server_only && !prop.is_reflected() {
                    self.erase_attribute(node, attribute)?;
                }
                continue;
            }
            let component = state(self, node)?;
            if component.current(id).is_none()
                && let Some(initial) = component.initials[id.index()].clone()
            {
                write_prop(self, node, id, initial);
            }
        }
        Ok(())
    }

    /// Whether `node` is server-rendered markup that has not been hydrated
    /// yet. Such a component neither reflects nor applies targets in its
    /// first cycle.
    fn is_server_rendered(&self, node: Self::Node) -> bool {
        self.context() == Context::Client
            && self.component(node).is_some_and(Component::is_first_update)
            && self.has_attribute(node, WAFER_SSR)
    }
}

impl<H: Host> HostExt for H {}

fn state<H: Host>(host: &mut H, node: H::Node) -> Result<&mut Component<H>, Error> {
    host.component_mut(node)
        .ok_or_else(|| Error::not_a_component(node))
}

fn schedule<H: Host>(host: &mut H, node: H::Node) {
    let Some(component) = host.component_mut(node) else {
        return;
    };
    if !component.change_pending {
        component.change_pending = true;
        host.tasks().push(node);
        trace!(?node, "update scheduled");
    }
}

fn write_prop<H: Host>(host: &mut H, node: H::Node, id: PropId, value: Value) {
    if host
        .component_mut(node)
        .is_some_and(|component| component.write(id, value))
    {
        schedule(host, node);
    }
}

fn attribute_changed<H: Host>(
    host: &mut H,
    node: H::Node,
    name: &str,
    old: Option<&str>,
    new: Option<&str>,
) -> Result<(), Error> {
    let Some(component) = host.component(node) else {
        return Ok(());
    };
    let Some(id) = component.definition().prop_for_attribute(name) else {
        return Ok(());
    };
    // Mid-cycle changes are picked up from the final value instead.
    if component.connected && !component.change_pending && old != new {
        set_from_attribute(host, node, id, new)?;
    }
    Ok(())
}

fn set_from_attribute<H: Host>(
    host: &mut H,
    node: H::Node,
    id: PropId,
    text: Option<&str>,
) -> Result<(), Error> {
    let definition = Rc::clone(state(host, node)?.definition());
    let prop = definition.prop(id);
    let value = prop.ty().from_attribute(prop.attribute(), text)?;
    write_prop(host, node, id, value);
    Ok(())
}

fn set_from_prop<H: Host>(
    host: &mut H,
    node: H::Node,
    definition: &Definition<H>,
    id: PropId,
    value: Option<&Value>,
) -> Result<(), Error> {
    if host.is_server_rendered(node) {
        return Ok(());
    }
    let prop = definition.prop(id);
    let reflect_all = host.context() == Context::Server
        && !host.component(node).is_some_and(Component::is_server_only);
    if !(prop.is_reflected() || reflect_all) {
        return Ok(());
    }
    let attribute = prop.attribute();
    trace!(?node, attribute, "reflecting property");
    match prop.ty().reflect(value) {
        Reflection::Remove => {
            if host.has_attribute(node, attribute) {
                host.remove_attribute(node, attribute)?;
            }
            Ok(())
        }
        Reflection::Set(text) => host.set_attribute(node, attribute, &text),
    }
}

fn update_targets_for<H: Host>(
    host: &mut H,
    node: H::Node,
    definition: &Definition<H>,
    id: PropId,
) -> Result<(), Error> {
    let prop = definition.prop(id);
    let value = state(host, node)?.committed(id).cloned();
    trace!(?node, prop = prop.name(), "updating targets");
    update_targets_with(host, node, value.as_ref(), prop.targets())
}

fn run_cycle<H: Host>(host: &mut H, node: H::Node) {
    host.tasks().begin(node);
    let result = cycle(host, node);
    host.tasks().finish(node);
    match result {
        Ok(()) => {
            if host
                .component(node)
                .is_some_and(|component| !component.forced.is_empty())
            {
                schedule(host, node);
            }
        }
        Err(err) => {
            debug!(?node, %err, "update cycle failed");
            let Some(component) = host.component_mut(node) else {
                error!(?node, %err, "update cycle failed on a node that is no longer a component");
                return;
            };
            component.change_pending = false;
            component.update_pending = false;
            component.new_changes = !component.pending.is_empty();
            if let Some(previous) = component.error.replace(err) {
                error!(?node, error = %previous, "unobserved update error replaced by a newer one");
            }
        }
    }
}

fn cycle<H: Host>(host: &mut H, node: H::Node) -> Result<(), Error> {
    let Some(component) = host.component_mut(node) else {
        warn!(?node, "scheduled update for a node that is not a component");
        return Ok(());
    };
    let definition = Rc::clone(component.definition());
    component.update_pending = true;

    let forced = mem::take(&mut component.forced);
    if !forced.is_empty() {
        component.new_changes = true;
        for &id in &forced {
            if !component.pending.contains_key(&id) {
                let value = component.props[id.index()].clone();
                component.pending.insert(id, value);
            }
        }
    }
    let initial_values = component.props.clone();

    // Phase 1: converge.
    let mut all_to_update: IndexSet<PropId> = IndexSet::new();
    let mut skipped: HashSet<PropId> = HashSet::new();
    let mut passes = 0_usize;
    loop {
        let component = state(host, node)?;
        if !component.new_changes {
            break;
        }
        component.new_changes = false;
        passes += 1;

        let mut changed = ChangeMap::new();
        let mut changed_ids: SmallVec<[PropId; 8]> = SmallVec::new();
        for (id, value) in mem::take(&mut component.pending) {
            let slot = &mut component.props[id.index()];
            if *slot == value && !forced.contains(&id) {
                all_to_update.shift_remove(&id);
            } else {
                all_to_update.insert(id);
                let old = mem::replace(slot, value);
                changed.insert(definition.prop(id).name().to_owned(), old);
                changed_ids.push(id);
            }
        }
        trace!(?node, pass = passes, changed = changed.len(), "reconciliation pass");
        if changed.is_empty() {
            continue;
        }

        let skip = match definition.changed() {
            Some(callback) => callback(host, node, &changed)?,
            None => Vec::new(),
        };
        for id in changed_ids {
            if skip.iter().any(|name| name == definition.prop(id).name()) {
                skipped.insert(id);
            } else {
                skipped.remove(&id);
            }
        }
    }

    let component = state(host, node)?;
    let mut updated = ChangeMap::new();
    let mut updated_ids: SmallVec<[PropId; 8]> = SmallVec::new();
    let mut to_reflect: SmallVec<[(PropId, Option<Value>); 8]> = SmallVec::new();
    for id in all_to_update {
        let value = component.current(id).cloned();
        let before = &initial_values[id.index()];
        if *before != value || forced.contains(&id) {
            to_reflect.push((id, value));
            if !skipped.contains(&id) {
                updated.insert(definition.prop(id).name().to_owned(), before.clone());
                updated_ids.push(id);
            }
        }
    }
    for (id, value) in to_reflect {
        set_from_prop(host, node, &definition, id, value.as_ref())?;
    }

    let component = state(host, node)?;
    component.change_pending = false;
    if updated.is_empty() {
        component.update_pending = false;
        debug!(?node, passes, "update cycle finished without updates");
        return Ok(());
    }

    // Phase 2: apply.
    if host.is_server_rendered(node) {
        debug!(?node, "skipping targets of server-rendered markup");
    } else {
        let mut triggers: IndexSet<&str> = IndexSet::new();
        for &id in &updated_ids {
            update_targets_for(host, node, &definition, id)?;
            triggers.extend(definition.prop(id).triggers().iter().map(String::as_str));
        }
        for name in triggers {
            let id = definition
                .prop_id(name)
                .ok_or_else(|| Error::UnknownProperty(name.to_owned()))?;
            if !updated_ids.contains(&id) {
                update_targets_for(host, node, &definition, id)?;
            }
        }
    }

    if state(host, node)?.first_update
        && let Some(callback) = definition.first_updated()
    {
        callback(host, node, &updated)?;
    }
    if let Some(callback) = definition.updated() {
        callback(host, node, &updated)?;
    }
    let component = state(host, node)?;
    component.update_pending = false;
    component.first_update = false;
    debug!(?node, passes, updated = updated.len(), "update cycle finished");
    Ok(())
}
