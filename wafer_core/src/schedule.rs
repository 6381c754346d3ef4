// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The queue standing in for the microtask queue.

use std::collections::VecDeque;

use smallvec::SmallVec;

/// Scheduled update cycles, in the order they were requested.
///
/// A node appears at most once while queued. The queue also tracks which
/// nodes are mid-cycle so that a nested drain never re-enters a cycle.
#[derive(Clone, Debug)]
pub struct TaskQueue<N> {
    queue: VecDeque<N>,
    running: SmallVec<[N; 4]>,
}

impl<N> Default for TaskQueue<N> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            running: SmallVec::new(),
        }
    }
}

impl<N: Copy + Eq> TaskQueue<N> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a cycle for `node` unless one is already queued.
    pub fn push(&mut self, node: N) {
        if !self.queue.contains(&node) {
            self.queue.push_back(node);
        }
    }

    /// Takes the oldest queued cycle.
    pub fn pop(&mut self) -> Option<N> {
        self.queue.pop_front()
    }

    /// Whether a cycle for `node` is queued.
    #[must_use]
    pub fn contains(&self, node: N) -> bool {
        self.queue.contains(&node)
    }

    /// Number of queued cycles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Whether `node` is mid-cycle.
    #[must_use]
    pub fn is_running(&self, node: N) -> bool {
        self.running.contains(&node)
    }

    pub(crate) fn begin(&mut self, node: N) {
        self.running.push(node);
    }

    pub(crate) fn finish(&mut self, node: N) {
        if let Some(at) = self.running.iter().rposition(|n| *n == node) {
            self.running.remove(at);
        }
    }
}
