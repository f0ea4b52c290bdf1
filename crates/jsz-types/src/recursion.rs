//! Recursion guard for cycle detection and depth limiting in recursive
//! lattice computations.
//!
//! Subtype checks, equivalence checks, and display all recurse over type
//! structure that may be cyclic (self-referential object graphs, mutually
//! recursive named types). `RecursionGuard` combines a visiting set with a
//! depth cap so those traversals terminate on any input. Cycles are treated
//! coinductively: re-entering a pair that is already being checked counts as
//! success rather than recursing forever.

use rustc_hash::FxHashSet;
use std::hash::Hash;

/// Named recursion limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Subtype checking: deep structural comparison of recursive types.
    SubtypeCheck,
    /// Equivalence checking under one of the three equivalence modes.
    Equivalence,
    /// Display/stringification of possibly-cyclic type graphs.
    Display,
    /// Custom limits for one-off or test scenarios.
    Custom { max_depth: u32 },
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::SubtypeCheck => 100,
            Self::Equivalence => 100,
            Self::Display => 20,
            Self::Custom { max_depth } => max_depth,
        }
    }
}

/// Result of attempting to enter a recursive computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    /// Proceed with the computation.
    Entered,
    /// The key is already being visited; assume success coinductively.
    CycleDetected,
    /// The depth cap was hit; the caller must degrade conservatively.
    DepthExceeded,
}

pub struct RecursionGuard<K> {
    visiting: FxHashSet<K>,
    depth: u32,
    max_depth: u32,
}

impl<K: Eq + Hash + Copy> RecursionGuard<K> {
    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self {
            visiting: FxHashSet::default(),
            depth: 0,
            max_depth: profile.max_depth(),
        }
    }

    /// Try to enter a computation keyed by `key`. On `Entered` the caller
    /// must call [`leave`](Self::leave) with the same key when done.
    pub fn enter(&mut self, key: K) -> RecursionResult {
        if self.visiting.contains(&key) {
            return RecursionResult::CycleDetected;
        }
        if self.depth >= self.max_depth {
            return RecursionResult::DepthExceeded;
        }
        self.visiting.insert(key);
        self.depth += 1;
        RecursionResult::Entered
    }

    pub fn leave(&mut self, key: K) {
        let removed = self.visiting.remove(&key);
        debug_assert!(removed, "leave() without a matching enter()");
        self.depth = self.depth.saturating_sub(1);
    }

    /// Reset counters between top-level checks so depth does not accumulate
    /// across unrelated queries made through one reused guard.
    pub fn reset(&mut self) {
        self.visiting.clear();
        self.depth = 0;
    }
}

#[cfg(test)]
#[path = "../tests/recursion_tests.rs"]
mod tests;
