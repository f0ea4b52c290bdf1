//! Structural equivalence under three modes.
//!
//! The lattice needs more than one notion of "the same type":
//!
//! | Mode | Unknown vs Unknown | Unknown vs T | Used for |
//! |------|--------------------|--------------|----------|
//! | `Identity` | only the same interned value | false | reflexive subtype check |
//! | `Invariant` | true | true | generic-binding checks |
//! | `DataFlow` | true | false | "no new information" detection |
//!
//! Unions, functions, records, and template params recurse structurally under
//! the active mode; nominal types compare by reference name. Cycles resolve
//! coinductively through the recursion guard.

use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::registry::TypeRegistry;
use crate::types::{TypeData, TypeId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EquivalenceMethod {
    /// Strict value identity; distinct Unknowns are never equal.
    Identity,
    /// Unknown is compatible with anything.
    Invariant,
    /// Two Unknowns are equal to each other and to nothing else.
    DataFlow,
}

pub fn check_equivalence(
    registry: &TypeRegistry,
    a: TypeId,
    b: TypeId,
    method: EquivalenceMethod,
) -> bool {
    let mut checker = EquivalenceChecker::new(registry, method);
    checker.check(a, b)
}

pub struct EquivalenceChecker<'a> {
    registry: &'a TypeRegistry,
    method: EquivalenceMethod,
    guard: RecursionGuard<(TypeId, TypeId)>,
}

impl<'a> EquivalenceChecker<'a> {
    pub fn new(registry: &'a TypeRegistry, method: EquivalenceMethod) -> Self {
        Self {
            registry,
            method,
            guard: RecursionGuard::with_profile(RecursionProfile::Equivalence),
        }
    }

    pub fn check(&mut self, a: TypeId, b: TypeId) -> bool {
        // Aliases and resolved forward references are transparent.
        let a = self.registry.unwrap_proxy(a);
        let b = self.registry.unwrap_proxy(b);

        // Same interned value: literally the same type under every mode.
        if a == b {
            return true;
        }

        let da = self.registry.lookup(a);
        let db = self.registry.lookup(b);
        let a_unknown = matches!(da, TypeData::Unknown | TypeData::CheckedUnknown);
        let b_unknown = matches!(db, TypeData::Unknown | TypeData::CheckedUnknown);

        match self.method {
            EquivalenceMethod::Invariant => {
                if a_unknown || b_unknown {
                    return true;
                }
            }
            EquivalenceMethod::DataFlow => {
                if a_unknown && b_unknown {
                    return true;
                }
                if a_unknown || b_unknown {
                    return false;
                }
            }
            EquivalenceMethod::Identity => {
                // Distinct unknown instances (e.g. Unknown vs CheckedUnknown)
                // are not identical.
                if a_unknown || b_unknown {
                    return false;
                }
            }
        }

        match self.guard.enter((a, b)) {
            RecursionResult::CycleDetected => true,
            RecursionResult::DepthExceeded => false,
            RecursionResult::Entered => {
                let result = self.check_inner(da, db);
                self.guard.leave((a, b));
                result
            }
        }
    }

    fn check_inner(&mut self, da: TypeData, db: TypeData) -> bool {
        match (da, db) {
            (TypeData::Union(la), TypeData::Union(lb)) => {
                let alts_a = self.registry.type_list(la);
                let alts_b = self.registry.type_list(lb);
                alts_a
                    .iter()
                    .all(|&alt| alts_b.iter().any(|&other| self.check(alt, other)))
                    && alts_b
                        .iter()
                        .all(|&alt| alts_a.iter().any(|&other| self.check(alt, other)))
            }
            (TypeData::Function(fa), TypeData::Function(fb)) => {
                let sa = self.registry.function_shape(fa);
                let sb = self.registry.function_shape(fb);
                sa.kind == sb.kind
                    && sa.params.len() == sb.params.len()
                    && sa.template_names == sb.template_names
                    && sa.this_template == sb.this_template
                    && sa
                        .params
                        .iter()
                        .zip(sb.params.iter())
                        .all(|(pa, pb)| {
                            pa.optional == pb.optional
                                && pa.variadic == pb.variadic
                                && self.check(pa.ty, pb.ty)
                        })
                    && self.check(sa.ret, sb.ret)
                    && self.check(sa.this_ty, sb.this_ty)
            }
            (TypeData::Record(ra), TypeData::Record(rb)) => {
                let fields_a = self.registry.record_shape(ra);
                let fields_b = self.registry.record_shape(rb);
                fields_a.len() == fields_b.len()
                    && fields_a
                        .iter()
                        .zip(fields_b.iter())
                        .all(|(&(name_a, ty_a), &(name_b, ty_b))| {
                            name_a == name_b && self.check(ty_a, ty_b)
                        })
            }
            // A parameterized placeholder matches another when the bound
            // types match under the active mode; the names are incidental.
            (TypeData::TemplateParam(pa), TypeData::TemplateParam(pb)) => {
                self.check(pa.bound, pb.bound)
            }
            (TypeData::Object(oa), TypeData::Object(ob)) => {
                // Nominal types compare by reference name; anonymous object
                // types only by identity (already handled above).
                let Some(data_a) = self.registry.object_data(oa) else {
                    return false;
                };
                let Some(data_b) = self.registry.object_data(ob) else {
                    return false;
                };
                match (data_a.name, data_b.name) {
                    (Some(name_a), Some(name_b)) if name_a == name_b => {
                        let bind_a = data_a.template.bindings();
                        let bind_b = data_b.template.bindings();
                        bind_a.len() == bind_b.len()
                            && bind_a
                                .iter()
                                .zip(bind_b.iter())
                                .all(|(&ta, &tb)| self.check(ta, tb))
                    }
                    _ => false,
                }
            }
            (TypeData::Enum(ea), TypeData::Enum(eb))
            | (TypeData::EnumElement(ea), TypeData::EnumElement(eb)) => {
                match (self.registry.enum_data(ea), self.registry.enum_data(eb)) {
                    (Some(a), Some(b)) => a.name == b.name,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "../tests/equivalence_tests.rs"]
mod tests;
