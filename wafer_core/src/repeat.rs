// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyed list reconciliation.

use core::fmt;

use hashbrown::{HashMap, HashSet};
use serde_json::Value;
use smallvec::SmallVec;
use tracing::trace;

use crate::engine::HostExt;
use crate::event::{EventBinding, EventHandler};
use crate::target::{Target, update_targets_with};
use crate::value::to_text;
use crate::{Error, Host, WAFER_KEY};

/// Maps an item and its index to its key.
pub type KeyFn = Box<dyn Fn(&Value, usize) -> Value>;

/// Prepares a freshly stamped item before its targets are applied.
pub type InitFn<H> =
    Box<dyn Fn(&mut H, <H as Host>::Node, &Value, usize) -> Result<(), Error>>;

/// Keeps a container's children in step with a list of items.
///
/// Each child carries its item's key in a `wafer-key` attribute. Keys are
/// compared as text, so `1` and `"1"` are the same key. A child whose key
/// survives an update is moved and updated in place, never recreated.
///
/// ```rust
/// use wafer_core::{Repeat, Target};
/// # use wafer_core::Host;
/// # fn build<H: Host>() -> Repeat<H> {
/// Repeat::new("<li></li>")
///     .key(|item, _| item["id"].clone())
///     .target(Target::new("self").text().using(|_, item, _, _| item.map(|i| i["name"].clone())))
/// # }
/// ```
pub struct Repeat<H: Host> {
    html: String,
    key: KeyFn,
    targets: Vec<Target<H>>,
    init: Option<InitFn<H>>,
    events: Vec<EventBinding<H>>,
}

impl<H: Host> fmt::Debug for Repeat<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repeat")
            .field("html", &self.html)
            .field("targets", &self.targets)
            .field("has_init", &self.init.is_some())
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl<H: Host> Repeat<H> {
    /// Stamps `html` for each new item. Items are their own keys until
    /// [`key`](Self::key) says otherwise.
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            key: Box::new(|item, _| item.clone()),
            targets: Vec::new(),
            init: None,
            events: Vec::new(),
        }
    }

    /// Sets the key function.
    #[must_use]
    pub fn key(mut self, key: impl Fn(&Value, usize) -> Value + 'static) -> Self {
        self.key = Box::new(key);
        self
    }

    /// Adds a target applied to each item element with the item as value.
    #[must_use]
    pub fn target(mut self, target: Target<H>) -> Self {
        self.targets.push(target);
        self
    }

    /// Runs `init` on each new item element before its targets.
    #[must_use]
    pub fn init(
        mut self,
        init: impl Fn(&mut H, H::Node, &Value, usize) -> Result<(), Error> + 'static,
    ) -> Self {
        self.init = Some(Box::new(init));
        self
    }

    /// Binds an event handler on every item element.
    #[must_use]
    pub fn event(
        mut self,
        selector: impl Into<String>,
        name: impl Into<String>,
        handler: EventHandler<H>,
    ) -> Self {
        self.events.push(EventBinding::new(selector, name, handler));
        self
    }

    /// Reconciles the keyed children of `container` with `items`.
    ///
    /// 1. Children whose keys are no longer wanted are removed.
    /// 2. Surviving children get their targets and events re-applied.
    /// 3. Survivors are moved into item order, furthest travellers first.
    /// 4. New items are stamped in reverse, each inserted before the element
    ///    of the item after it.
    ///
    /// Children without a key are left alone.
    pub fn run(&self, host: &mut H, container: H::Node, items: &[Value]) -> Result<(), Error> {
        let keys: Vec<String> = items
            .iter()
            .enumerate()
            .map(|(index, item)| to_text(Some(&(self.key)(item, index))))
            .collect();
        let wanted: HashSet<&str> = keys.iter().map(String::as_str).collect();

        let mut removed = 0_usize;
        let mut pool: HashMap<String, SmallVec<[H::Node; 1]>> = HashMap::new();
        for child in host.children(container) {
            let Some(key) = host.attribute(child, WAFER_KEY) else {
                continue;
            };
            if key.is_empty() {
                continue;
            }
            if wanted.contains(key.as_str()) {
                pool.entry(key).or_default().push(child);
            } else {
                host.remove(child);
                removed += 1;
            }
        }

        // Each child is claimed by the first unclaimed item with its key.
        let mut placed: Vec<Option<H::Node>> = keys
            .iter()
            .map(|key| {
                pool.get_mut(key.as_str())
                    .filter(|nodes| !nodes.is_empty())
                    .map(|nodes| nodes.remove(0))
            })
            .collect();
        for node in pool.into_values().flatten() {
            host.remove(node);
            removed += 1;
        }

        for (item, el) in items.iter().zip(&placed) {
            if let Some(el) = *el {
                update_targets_with(host, el, Some(item), &self.targets)?;
                self.bind_events(host, el)?;
            }
        }

        let moved = self.reorder(host, container, &placed)?;

        let mut added = 0_usize;
        for index in (0..items.len()).rev() {
            if placed[index].is_some() {
                continue;
            }
            let item = &items[index];
            let el = host.stamp(&self.html)?;
            if let Some(init) = &self.init {
                init(host, el, item, index)?;
            }
            update_targets_with(host, el, Some(item), &self.targets)?;
            host.set_attribute(el, WAFER_KEY, &keys[index])?;
            self.bind_events(host, el)?;
            let next = placed.get(index + 1).copied().flatten();
            host.insert_before(container, el, next)?;
            placed[index] = Some(el);
            added += 1;
        }

        trace!(?container, removed, moved, added, "reconciled list");
        Ok(())
    }

    fn bind_events(&self, host: &mut H, el: H::Node) -> Result<(), Error> {
        for binding in &self.events {
            binding.bind(host, el)?;
        }
        Ok(())
    }

    /// Moves the surviving children into item order and returns the number
    /// of moves made.
    fn reorder(
        &self,
        host: &mut H,
        container: H::Node,
        placed: &[Option<H::Node>],
    ) -> Result<usize, Error> {
        let desired: Vec<H::Node> = placed.iter().flatten().copied().collect();
        let survivors: HashSet<H::Node> = desired.iter().copied().collect();
        let mut keyed: Vec<H::Node> = host
            .children(container)
            .into_iter()
            .filter(|child| survivors.contains(child))
            .collect();

        let mut moves: Vec<(H::Node, usize, usize)> = desired
            .iter()
            .enumerate()
            .filter_map(|(target, &el)| {
                let current = keyed.iter().position(|&n| n == el)?;
                (current != target).then(|| (el, target, current.abs_diff(target)))
            })
            .collect();
        moves.sort_by(|a, b| b.2.cmp(&a.2));

        let mut count = 0_usize;
        for (el, target, _) in moves {
            let Some(current) = keyed.iter().position(|&n| n == el) else {
                continue;
            };
            if current == target {
                continue;
            }
            let anchor = keyed[target];
            let reference = if current < target {
                host.next_sibling(anchor)
            } else {
                Some(anchor)
            };
            host.insert_before(container, el, reference)?;
            keyed.remove(current);
            keyed.insert(target, el);
            count += 1;
        }

        // Distance order settles most lists; finish any stragglers in place.
        for (target, &el) in desired.iter().enumerate() {
            if keyed[target] == el {
                continue;
            }
            let Some(current) = keyed.iter().position(|&n| n == el) else {
                continue;
            };
            host.insert_before(container, el, Some(keyed[target]))?;
            keyed.remove(current);
            keyed.insert(target, el);
            count += 1;
        }
        Ok(count)
    }
}

/// The items of a list property: the array itself, or nothing for any
/// other value.
#[must_use]
pub fn items_of(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}
