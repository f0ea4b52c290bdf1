//! Reverse abstract interpretation.
//!
//! Given a boolean condition and its assumed outcome, produce a scope whose
//! bindings reflect what must have been true for the condition to evaluate
//! that way: `typeof x === 'string'` narrows `x` to string on the true
//! branch, `x == null` strips everything but null/undefined, a bare `x`
//! narrows by truthiness, and a condition that cannot produce the assumed
//! outcome at all yields the bottom scope so the branch is pruned.

use crate::scope::FlowScope;
use crate::syntax::{NodeId, NodeKind, SyntaxArena};
use jsz_common::interner::Atom;
use jsz_types::{
    lattice, restrict_by_boolean_outcome, restrict_by_not_null_or_undefined, to_boolean_outcomes,
    BooleanOutcomes, FunctionKind, TypeData, TypeId, TypeRegistry,
};
use tracing::trace;

/// Collaborator contract: narrow a scope given a condition's known outcome.
pub trait ReverseInterpreter {
    fn narrow(&self, condition: NodeId, scope: &FlowScope, outcome: bool) -> FlowScope;
}

/// The default reverse interpreter, covering the core condition shapes:
/// truthiness of (qualified) names, `!`, short-circuit operators, `typeof`
/// comparisons, null/undefined equality, and `instanceof`.
pub struct SemanticReverseInterpreter<'a> {
    registry: &'a TypeRegistry,
    arena: &'a SyntaxArena,
}

impl<'a> SemanticReverseInterpreter<'a> {
    pub fn new(registry: &'a TypeRegistry, arena: &'a SyntaxArena) -> Self {
        Self { registry, arena }
    }

    /// The scope key for a simple or dotted reference, if the expression is
    /// one ("a", "a.b.c"). Interned so it can be used as a slot key.
    pub fn reference_key(arena: &SyntaxArena, registry: &TypeRegistry, node: NodeId) -> Option<Atom> {
        fn build(arena: &SyntaxArena, registry: &TypeRegistry, node: NodeId, out: &mut String) -> bool {
            let Some(data) = arena.get(node) else {
                return false;
            };
            match data.kind {
                NodeKind::Name(name) => {
                    out.push_str(&registry.strings().resolve(name));
                    true
                }
                NodeKind::PropAccess(name) => {
                    if !build(arena, registry, arena.child(node, 0), out) {
                        return false;
                    }
                    out.push('.');
                    out.push_str(&registry.strings().resolve(name));
                    true
                }
                _ => false,
            }
        }
        let mut path = String::new();
        if build(arena, registry, node, &mut path) {
            Some(registry.strings().intern(&path))
        } else {
            None
        }
    }

    fn known_type(&self, node: NodeId, scope: &FlowScope) -> Option<TypeId> {
        if let Some(key) = Self::reference_key(self.arena, self.registry, node) {
            if let Some(ty) = scope.slot(key) {
                return Some(ty);
            }
        }
        self.arena.get_type(node)
    }

    fn narrow_reference(
        &self,
        node: NodeId,
        scope: &FlowScope,
        narrow: impl FnOnce(TypeId) -> TypeId,
    ) -> FlowScope {
        let Some(key) = Self::reference_key(self.arena, self.registry, node) else {
            return scope.clone();
        };
        let Some(current) = self.known_type(node, scope) else {
            return scope.clone();
        };
        let narrowed = narrow(current);
        if narrowed == current {
            return scope.clone();
        }
        trace!(?key, "narrowed reference");
        let mut child = scope.child();
        child.insert(key, narrowed);
        child
    }

    /// The builtin type named by a `typeof` result string, if narrowable.
    fn typeof_target(&self, text: &str) -> Option<TypeId> {
        match text {
            "number" => Some(TypeId::NUMBER),
            "string" => Some(TypeId::STRING),
            "boolean" => Some(TypeId::BOOLEAN),
            "undefined" => Some(TypeId::VOID),
            "function" => Some(self.registry.natives().function),
            _ => None,
        }
    }

    /// Narrow `value` assuming `typeof value == text` is `positive`.
    fn narrow_by_typeof(&self, current: TypeId, target: TypeId, positive: bool) -> TypeId {
        if positive {
            lattice::greatest_subtype(self.registry, current, target)
        } else {
            // Drop the union alternates the typeof test ruled out.
            match self.registry.lookup(current) {
                TypeData::Union(list) => {
                    let alts = self.registry.type_list(list);
                    self.registry.union(
                        alts.iter()
                            .copied()
                            .filter(|&alt| !jsz_types::is_subtype(self.registry, alt, target)),
                    )
                }
                _ => current,
            }
        }
    }

    fn narrow_equality(
        &self,
        node: NodeId,
        scope: &FlowScope,
        op: crate::syntax::EqOp,
        outcome: bool,
    ) -> FlowScope {
        let positive = outcome != op.negated();
        let left = self.arena.child(node, 0);
        let right = self.arena.child(node, 1);

        // typeof x ==/=== "..."
        for (probe, literal) in [(left, right), (right, left)] {
            let probe_kind = self.arena.get(probe).map(|n| n.kind);
            let literal_kind = self.arena.get(literal).map(|n| n.kind);
            if let (Some(NodeKind::TypeOf), Some(NodeKind::Str(text))) = (probe_kind, literal_kind)
            {
                let operand = self.arena.child(probe, 0);
                let Some(target) = self.typeof_target(&self.registry.strings().resolve(text))
                else {
                    return scope.clone();
                };
                return self.narrow_reference(operand, scope, |current| {
                    self.narrow_by_typeof(current, target, positive)
                });
            }
        }

        // x ==/=== null | undefined
        for (probe, literal) in [(left, right), (right, left)] {
            let literal_kind = self.arena.get(literal).map(|n| n.kind);
            let nullish: Option<TypeId> = match literal_kind {
                Some(NodeKind::Null) => Some(if op.strict() {
                    TypeId::NULL
                } else {
                    self.registry.union([TypeId::NULL, TypeId::VOID])
                }),
                Some(NodeKind::Undefined) => Some(if op.strict() {
                    TypeId::VOID
                } else {
                    self.registry.union([TypeId::NULL, TypeId::VOID])
                }),
                _ => None,
            };
            if let Some(nullish) = nullish {
                return self.narrow_reference(probe, scope, |current| {
                    if positive {
                        lattice::greatest_subtype(self.registry, current, nullish)
                    } else if op.strict() {
                        strip_alternate(self.registry, current, nullish)
                    } else {
                        restrict_by_not_null_or_undefined(self.registry, current)
                    }
                });
            }
        }

        scope.clone()
    }

    fn narrow_instanceof(&self, node: NodeId, scope: &FlowScope, outcome: bool) -> FlowScope {
        if !outcome {
            // The negative branch learns nothing useful here.
            return scope.clone();
        }
        let value = self.arena.child(node, 0);
        let ctor = self.arena.child(node, 1);
        let Some(ctor_ty) = self.known_type(ctor, scope) else {
            return scope.clone();
        };
        let TypeData::Function(shape_id) = self.registry.lookup(self.registry.unwrap_proxy(ctor_ty))
        else {
            return scope.clone();
        };
        let shape = self.registry.function_shape(shape_id);
        if shape.kind != FunctionKind::Constructor {
            return scope.clone();
        }
        let Some(instance) = shape.instance else {
            return scope.clone();
        };
        self.narrow_reference(value, scope, |current| {
            lattice::greatest_subtype(self.registry, current, instance)
        })
    }
}

/// Remove one specific alternate from a union; identity when absent.
fn strip_alternate(registry: &TypeRegistry, ty: TypeId, unwanted: TypeId) -> TypeId {
    match registry.lookup(ty) {
        TypeData::Union(list) => {
            let alts = registry.type_list(list);
            if alts.contains(&unwanted) {
                registry.union(alts.iter().copied().filter(|&alt| alt != unwanted))
            } else {
                ty
            }
        }
        _ if ty == unwanted => TypeId::NO_TYPE,
        _ => ty,
    }
}

impl ReverseInterpreter for SemanticReverseInterpreter<'_> {
    fn narrow(&self, condition: NodeId, scope: &FlowScope, outcome: bool) -> FlowScope {
        if scope.is_bottom() {
            return FlowScope::bottom();
        }
        let Some(node) = self.arena.get(condition) else {
            return scope.clone();
        };
        match node.kind {
            NodeKind::Not => self.narrow(self.arena.child(condition, 0), scope, !outcome),

            // `a && b` true means both were true; false tells us nothing
            // about how far evaluation got. Dual for `||`.
            NodeKind::And if outcome => {
                let after_left = self.narrow(self.arena.child(condition, 0), scope, true);
                self.narrow(self.arena.child(condition, 1), &after_left, true)
            }
            NodeKind::Or if !outcome => {
                let after_left = self.narrow(self.arena.child(condition, 0), scope, false);
                self.narrow(self.arena.child(condition, 1), &after_left, false)
            }
            NodeKind::And | NodeKind::Or => scope.clone(),

            NodeKind::Equality(op) => self.narrow_equality(condition, scope, op, outcome),
            NodeKind::InstanceOf => self.narrow_instanceof(condition, scope, outcome),

            NodeKind::Name(_) | NodeKind::PropAccess(_) => {
                // Truthiness: prune the branch entirely when the type cannot
                // produce the assumed outcome.
                if let Some(ty) = self.known_type(condition, scope) {
                    let outcomes = to_boolean_outcomes(self.registry, ty);
                    let wanted = if outcome {
                        BooleanOutcomes::TRUE
                    } else {
                        BooleanOutcomes::FALSE
                    };
                    if !outcomes.contains(wanted) && outcomes != BooleanOutcomes::empty() {
                        return FlowScope::bottom();
                    }
                }
                self.narrow_reference(condition, scope, |current| {
                    let restricted = restrict_by_boolean_outcome(self.registry, current, outcome);
                    if outcome {
                        // A truthy value is in particular not null/undefined.
                        restrict_by_not_null_or_undefined(self.registry, restricted)
                    } else {
                        restricted
                    }
                })
            }

            // Literals with a fixed outcome prune the impossible branch.
            NodeKind::Bool(value) => {
                if value == outcome {
                    scope.clone()
                } else {
                    FlowScope::bottom()
                }
            }
            NodeKind::Null | NodeKind::Undefined => {
                if outcome {
                    FlowScope::bottom()
                } else {
                    scope.clone()
                }
            }

            _ => scope.clone(),
        }
    }
}

/// The identity interpreter: never narrows. Useful as a test double and for
/// pipelines that disable condition-based refinement.
pub struct NoopReverseInterpreter;

impl ReverseInterpreter for NoopReverseInterpreter {
    fn narrow(&self, _condition: NodeId, scope: &FlowScope, _outcome: bool) -> FlowScope {
        scope.clone()
    }
}

#[cfg(test)]
#[path = "../tests/narrow_tests.rs"]
mod tests;
