//! Idempotency guard for declarative wiring.
//!
//! # Design
//! - Membership only: the registry holds identity keys, never the nodes themselves.
//! - `reset` forgets membership but does not detach listeners; the owning family's
//!   cleanup must do that first or the old listeners become invisible.

use std::collections::HashSet;

use crate::dom::NodeKey;

/// Set of nodes already wired by one widget family.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    bound: HashSet<NodeKey>,
}

impl Registry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is already wired.
    #[must_use]
    pub fn has(&self, key: NodeKey) -> bool {
        self.bound.contains(&key)
    }

    /// Mark `key` as wired.
    pub fn add(&mut self, key: NodeKey) {
        self.bound.insert(key);
    }

    /// Forget every membership.
    pub fn reset(&mut self) {
        self.bound.clear();
    }

    /// Number of wired nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bound.len()
    }

    /// Whether nothing is wired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}
