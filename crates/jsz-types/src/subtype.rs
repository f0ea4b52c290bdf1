//! The subtype partial order.
//!
//! Rule priority, highest first:
//! 1. anything is a subtype of Unknown and of All;
//! 2. a type is a subtype of itself under identity-equivalence;
//! 3. a type is a subtype of a union when it is a subtype of any alternate,
//!    and a union is a subtype of a type when all its alternates are;
//! 4. structural/nominal rules per kind (prototype-chain walk for objects,
//!    field-wise covariance for records, contravariant parameters and
//!    covariant returns for functions).
//!
//! Alias/forward-reference proxies unwrap transparently. Function subtyping
//! does not form a clean lattice with the join/meet in `lattice`; that is
//! long-standing observable behavior and downstream passes depend on it.

use crate::equivalence::{check_equivalence, EquivalenceMethod};
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::registry::TypeRegistry;
use crate::types::{FunctionShape, TypeData, TypeId};

/// One-shot subtype query. Creates a fresh checker; reuse [`SubtypeChecker`]
/// when making many queries in a loop.
pub fn is_subtype(registry: &TypeRegistry, a: TypeId, b: TypeId) -> bool {
    SubtypeChecker::new(registry).is_subtype(a, b)
}

/// Whether a type sits on the object side of the lattice.
pub fn is_object_like(registry: &TypeRegistry, ty: TypeId) -> bool {
    match registry.lookup(registry.unwrap_proxy(ty)) {
        TypeData::NoObject
        | TypeData::ValueObject(_)
        | TypeData::Object(_)
        | TypeData::Function(_)
        | TypeData::Record(_)
        | TypeData::Enum(_) => true,
        TypeData::Union(list) => {
            let alts = registry.type_list(list);
            alts.iter().all(|&alt| is_object_like(registry, alt))
        }
        _ => false,
    }
}

pub struct SubtypeChecker<'a> {
    registry: &'a TypeRegistry,
    pub guard: RecursionGuard<(TypeId, TypeId)>,
}

impl<'a> SubtypeChecker<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self {
            registry,
            guard: RecursionGuard::with_profile(RecursionProfile::SubtypeCheck),
        }
    }

    pub fn is_subtype(&mut self, a: TypeId, b: TypeId) -> bool {
        let a = self.registry.unwrap_proxy(a);
        let b = self.registry.unwrap_proxy(b);

        // Unknown and All accept everything.
        if matches!(b, TypeId::UNKNOWN | TypeId::CHECKED_UNKNOWN | TypeId::ALL) {
            return true;
        }
        // Unknown could be anything, so it conservatively passes every test.
        if matches!(a, TypeId::UNKNOWN | TypeId::CHECKED_UNKNOWN) {
            return true;
        }
        if a == b {
            return true;
        }
        // The bottoms and the unresolved marker are below everything.
        if a == TypeId::NO_TYPE || a == TypeId::NO_RESOLVED {
            return true;
        }
        // An unresolved forward reference could still become anything;
        // treat it like Unknown on either side.
        if self.registry.is_unresolved_ref(a) || self.registry.is_unresolved_ref(b) {
            return true;
        }
        if check_equivalence(self.registry, a, b, EquivalenceMethod::Identity) {
            return true;
        }

        match self.guard.enter((a, b)) {
            // Coinductive: a cyclic obligation holds unless something else
            // refutes it.
            RecursionResult::CycleDetected => true,
            RecursionResult::DepthExceeded => false,
            RecursionResult::Entered => {
                let result = self.is_subtype_inner(a, b);
                self.guard.leave((a, b));
                result
            }
        }
    }

    fn is_subtype_inner(&mut self, a: TypeId, b: TypeId) -> bool {
        let da = self.registry.lookup(a);
        let db = self.registry.lookup(b);

        // A union is below b only when every alternate is.
        if let TypeData::Union(list) = da {
            let alts = self.registry.type_list(list);
            return alts.iter().all(|&alt| self.is_subtype(alt, b));
        }
        // Anything is below a union when it is below some alternate.
        if let TypeData::Union(list) = db {
            let alts = self.registry.type_list(list);
            return alts.iter().any(|&alt| self.is_subtype(a, alt));
        }

        match (da, db) {
            (TypeData::NoObject, _) => is_object_like(self.registry, b),

            // Scalar values relate only to themselves (identity handled
            // above); autoboxing is a conversion, not a subtype edge.
            (TypeData::Value(_), _) => false,

            (TypeData::EnumElement(id), _) => {
                match self.registry.enum_data(id) {
                    Some(data) => self.is_subtype(data.underlying, b),
                    None => false,
                }
            }

            (TypeData::TemplateParam(p), _) => self.is_subtype(p.bound, b),
            (_, TypeData::TemplateParam(p)) => self.is_subtype(a, p.bound),

            (TypeData::Object(oa), TypeData::Object(_)) => self.object_chain_reaches(oa, b),

            (TypeData::Object(_), TypeData::Record(rb)) => {
                // Every record field must exist on the object (anywhere on
                // the prototype chain) at a covariant type.
                let fields = self.registry.record_shape(rb);
                fields.iter().all(|&(name, field_ty)| {
                    match self.registry.find_property(a, name) {
                        Some(prop) => self.is_subtype(prop.ty, field_ty),
                        None => false,
                    }
                })
            }

            (TypeData::Record(ra), TypeData::Record(rb)) => {
                let fields_a = self.registry.record_shape(ra);
                let fields_b = self.registry.record_shape(rb);
                fields_b.iter().all(|&(name, field_ty)| {
                    fields_a
                        .iter()
                        .find(|&&(own, _)| own == name)
                        .is_some_and(|&(_, own_ty)| self.is_subtype(own_ty, field_ty))
                })
            }

            (TypeData::Record(ra), TypeData::Object(ob)) => {
                // A record is below an object type when the object's own
                // declared surface is fully covered, field-by-field.
                if b == self.registry.natives().object {
                    return true;
                }
                let Some(data) = self.registry.object_data(ob) else {
                    return false;
                };
                let fields = self.registry.record_shape(ra);
                data.own_property_names().iter().all(|&name| {
                    let Some(prop) = data.own_property(name) else {
                        return false;
                    };
                    fields
                        .iter()
                        .find(|&&(own, _)| own == name)
                        .is_some_and(|&(_, own_ty)| self.is_subtype(own_ty, prop.ty))
                })
            }

            (TypeData::Function(fa), TypeData::Function(fb)) => {
                let sa = self.registry.function_shape(fa);
                let sb = self.registry.function_shape(fb);
                self.function_subtype(&sa, &sb)
            }

            // Functions, boxed values, and enums live under Object.
            (TypeData::Function(_), TypeData::Object(_)) => {
                b == self.registry.natives().object || b == self.registry.natives().function
            }
            (TypeData::ValueObject(_), TypeData::Object(_))
            | (TypeData::Enum(_), TypeData::Object(_)) => b == self.registry.natives().object,

            _ => false,
        }
    }

    /// Walk `a`'s implicit-prototype chain looking for `b`.
    fn object_chain_reaches(&mut self, start: crate::types::ObjectId, b: TypeId) -> bool {
        let mut current = Some(start);
        let mut hops = 0u32;
        while let Some(id) = current {
            hops += 1;
            if hops > 64 {
                return false;
            }
            let Some(data) = self.registry.object_data(id) else {
                return false;
            };
            if let TypeData::Object(ob) = self.registry.lookup(b) {
                if id == ob {
                    return true;
                }
                if let (Some(name_a), Some(other)) =
                    (data.name, self.registry.object_data(ob))
                {
                    if other.name == Some(name_a)
                        && data.template.bindings().len() == other.template.bindings().len()
                        && data
                            .template
                            .bindings()
                            .iter()
                            .zip(other.template.bindings().iter())
                            .all(|(&x, &y)| {
                                check_equivalence(self.registry, x, y, EquivalenceMethod::Invariant)
                            })
                    {
                        return true;
                    }
                }
            }
            current = match data.proto {
                Some(proto) => match self.registry.lookup(self.registry.unwrap_proxy(proto)) {
                    TypeData::Object(next) => Some(next),
                    _ => None,
                },
                None => None,
            };
        }
        false
    }

    /// Function subtyping: contravariant in parameters, covariant in the
    /// return and `this` types. Unknown anywhere passes trivially, which
    /// keeps the check total on partially-typed signatures.
    fn function_subtype(&mut self, sa: &FunctionShape, sb: &FunctionShape) -> bool {
        // A signature requiring more arguments than the supertype supplies
        // cannot stand in for it.
        let required_a = sa
            .params
            .iter()
            .filter(|p| !p.optional && !p.variadic)
            .count();
        if required_a > sb.params.len() {
            return false;
        }
        for (pa, pb) in sa.params.iter().zip(sb.params.iter()) {
            // Contravariance: the supertype's parameter flows into ours.
            if !self.is_subtype(pb.ty, pa.ty) {
                return false;
            }
        }
        if !self.is_subtype(sa.ret, sb.ret) {
            return false;
        }
        self.is_subtype(sa.this_ty, sb.this_ty)
    }
}

#[cfg(test)]
#[path = "../tests/subtype_tests.rs"]
mod tests;
