//! Flow scopes and the syntactic-scope collaborator.
//!
//! A [`FlowScope`] is the type knowledge at one program point: a persistent
//! chain of frames mapping names (and interned dotted property paths) to
//! types. Children are created copy-on-branch, so sibling control-flow paths
//! never observe each other's narrowings, and old scopes stay valid after
//! the pass for diagnostic replay.
//!
//! The bottom scope is the unreached-code sentinel: it propagates unchanged
//! through every transfer function and no node under it is ever annotated.

use jsz_common::interner::Atom;
use jsz_types::equivalence::EquivalenceMethod;
use jsz_types::{check_equivalence, lattice, TypeId, TypeRegistry};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::rc::Rc;

// =============================================================================
// Syntactic scope
// =============================================================================

/// How a variable was introduced.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeclKind {
    Param,
    Var,
}

/// One declared variable or parameter.
#[derive(Copy, Clone, Debug)]
pub struct VarDeclaration {
    pub kind: DeclKind,
    /// The annotated type, if any.
    pub declared_ty: Option<TypeId>,
    /// True when the declared type itself came from inference rather than
    /// an annotation; such bindings may be replaced by assignments.
    pub type_inferred: bool,
    /// Declared outside the program under analysis.
    pub is_extern: bool,
}

impl VarDeclaration {
    pub const fn param(ty: TypeId) -> Self {
        Self {
            kind: DeclKind::Param,
            declared_ty: Some(ty),
            type_inferred: false,
            is_extern: false,
        }
    }

    /// A `var` local with no annotation.
    pub const fn untyped_var() -> Self {
        Self {
            kind: DeclKind::Var,
            declared_ty: None,
            type_inferred: true,
            is_extern: false,
        }
    }
}

/// Declaration-side collaborator: declared variable/parameter types for one
/// function body, the type of `this`, and the inferred types the engine
/// writes back onto variable records.
pub struct SyntacticScope {
    vars: FxHashMap<Atom, VarDeclaration>,
    this_ty: Option<TypeId>,
    in_constructor: bool,
    inferred: RefCell<FxHashMap<Atom, TypeId>>,
}

impl Default for SyntacticScope {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntacticScope {
    pub fn new() -> Self {
        Self {
            vars: FxHashMap::default(),
            this_ty: None,
            in_constructor: false,
            inferred: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn declare(&mut self, name: Atom, decl: VarDeclaration) {
        self.vars.insert(name, decl);
    }

    pub fn declaration(&self, name: Atom) -> Option<VarDeclaration> {
        self.vars.get(&name).copied()
    }

    pub fn declared_names(&self) -> impl Iterator<Item = Atom> + '_ {
        self.vars.keys().copied()
    }

    pub fn with_this_type(mut self, ty: TypeId) -> Self {
        self.this_ty = Some(ty);
        self
    }

    pub fn this_type(&self) -> Option<TypeId> {
        self.this_ty
    }

    /// Mark this scope as a constructor body; `this.x = ...` assignments
    /// then define inferred instance properties.
    pub fn mark_constructor(&mut self) {
        self.in_constructor = true;
    }

    pub fn is_constructor(&self) -> bool {
        self.in_constructor
    }

    /// Record the inferred type of a variable for later passes.
    pub fn set_inferred_type(&self, name: Atom, ty: TypeId) {
        self.inferred.borrow_mut().insert(name, ty);
    }

    pub fn inferred_type(&self, name: Atom) -> Option<TypeId> {
        self.inferred.borrow().get(&name).copied()
    }
}

// =============================================================================
// Flow scope
// =============================================================================

#[derive(Clone, Debug, Default)]
struct Frame {
    parent: Option<Rc<Frame>>,
    slots: FxHashMap<Atom, TypeId>,
}

/// The type-knowledge snapshot at one program point.
#[derive(Clone, Debug)]
pub struct FlowScope {
    /// The unreached-code sentinel has no frame.
    frame: Option<Rc<Frame>>,
}

impl FlowScope {
    /// An empty scope with no bindings.
    pub fn new() -> Self {
        Self {
            frame: Some(Rc::new(Frame::default())),
        }
    }

    /// The unreachable-code sentinel.
    pub fn bottom() -> Self {
        Self { frame: None }
    }

    pub fn is_bottom(&self) -> bool {
        self.frame.is_none()
    }

    /// A fresh child scope; bindings added to it shadow the parent chain and
    /// are invisible to any sibling derived from the same parent.
    pub fn child(&self) -> Self {
        match &self.frame {
            Some(frame) => Self {
                frame: Some(Rc::new(Frame {
                    parent: Some(frame.clone()),
                    slots: FxHashMap::default(),
                })),
            },
            None => Self::bottom(),
        }
    }

    /// Bind a slot in the top frame. No-op on the bottom sentinel.
    pub fn insert(&mut self, key: Atom, ty: TypeId) {
        if let Some(frame) = &mut self.frame {
            Rc::make_mut(frame).slots.insert(key, ty);
        }
    }

    /// Look a slot up through the frame chain.
    pub fn slot(&self, key: Atom) -> Option<TypeId> {
        let mut current = self.frame.as_deref();
        while let Some(frame) = current {
            if let Some(&ty) = frame.slots.get(&key) {
                return Some(ty);
            }
            current = frame.parent.as_deref();
        }
        None
    }

    fn keys(&self) -> FxHashSet<Atom> {
        let mut keys = FxHashSet::default();
        let mut current = self.frame.as_deref();
        while let Some(frame) = current {
            keys.extend(frame.slots.keys().copied());
            current = frame.parent.as_deref();
        }
        keys
    }

    /// Slot-wise join of two scopes at a control-flow merge point.
    ///
    /// The bottom sentinel is the identity. A slot bound on only one side
    /// keeps that binding: simple names are always seeded at function entry
    /// so both sides see them through the chain, and qualified paths are
    /// declared lazily, matching the one-sided knowledge semantics.
    pub fn join(registry: &TypeRegistry, a: &FlowScope, b: &FlowScope) -> FlowScope {
        if a.is_bottom() {
            return b.clone();
        }
        if b.is_bottom() {
            return a.clone();
        }
        let mut keys = a.keys();
        keys.extend(b.keys());

        let mut joined = FlowScope::new();
        for key in keys {
            let ty = match (a.slot(key), b.slot(key)) {
                (Some(x), Some(y)) => lattice::least_supertype(registry, x, y),
                (Some(x), None) | (None, Some(x)) => x,
                (None, None) => continue,
            };
            joined.insert(key, ty);
        }
        joined
    }

    /// Whether two scopes carry the same information, compared under the
    /// data-flow equivalence so the fixpoint driver can stop iterating.
    pub fn same_knowledge(registry: &TypeRegistry, a: &FlowScope, b: &FlowScope) -> bool {
        match (a.is_bottom(), b.is_bottom()) {
            (true, true) => return true,
            (true, false) | (false, true) => return false,
            (false, false) => {}
        }
        let keys_a = a.keys();
        let keys_b = b.keys();
        if keys_a != keys_b {
            return false;
        }
        keys_a.into_iter().all(|key| match (a.slot(key), b.slot(key)) {
            (Some(x), Some(y)) => {
                check_equivalence(registry, x, y, EquivalenceMethod::DataFlow)
            }
            _ => false,
        })
    }
}

impl Default for FlowScope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../tests/scope_tests.rs"]
mod tests;
