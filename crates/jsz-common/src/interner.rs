//! String interning.
//!
//! Identifiers, property names, and dotted qualified paths are deduplicated
//! into `Atom`s so that equality and hashing are O(1) integer operations.
//! The interner is thread-safe so the surrounding pipeline may share one
//! instance across analysis runs; within a run access is effectively
//! single-threaded.

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::RwLock;

/// An interned string handle.
///
/// Two `Atom`s compare equal iff they were interned from equal strings in
/// the same `Interner`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// Sentinel for "no name". Never returned by `Interner::intern`.
    pub const NONE: Atom = Atom(u32::MAX);
}

/// Thread-safe string interner.
pub struct Interner {
    map: DashMap<Arc<str>, Atom>,
    strings: RwLock<Vec<Arc<str>>>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
            strings: RwLock::new(Vec::new()),
        }
    }

    /// Intern a string, returning its `Atom`.
    pub fn intern(&self, text: &str) -> Atom {
        if let Some(existing) = self.map.get(text) {
            return *existing;
        }
        let arc: Arc<str> = Arc::from(text);
        let mut strings = self.strings.write().expect("interner poisoned");
        // Re-check under the write lock so concurrent interns of the same
        // string cannot allocate two atoms.
        if let Some(existing) = self.map.get(text) {
            return *existing;
        }
        let atom = Atom(u32::try_from(strings.len()).expect("interner overflow"));
        strings.push(arc.clone());
        self.map.insert(arc, atom);
        atom
    }

    /// Resolve an `Atom` back to its string.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        let strings = self.strings.read().expect("interner poisoned");
        strings
            .get(atom.0 as usize)
            .cloned()
            .unwrap_or_else(|| Arc::from(""))
    }

    /// Number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.strings.read().expect("interner poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "../tests/interner_tests.rs"]
mod tests;
