//! Truthiness coercion outcomes.
//!
//! `to_boolean_outcomes` answers which of {true, false} a value of a given
//! type can coerce to in a boolean context. The inference engine uses the
//! answer to prune unreachable branches and to drop impossible alternates
//! from unions during narrowing.

use crate::registry::TypeRegistry;
use crate::types::{BooleanOutcomes, TypeData, TypeId, ValueKind};

/// The set of boolean outcomes a value of `ty` can produce.
///
/// `undefined` and `null` are always falsy; objects are always truthy;
/// the scalar value types can go either way. The bottoms have no values,
/// so their outcome set is empty.
pub fn to_boolean_outcomes(registry: &TypeRegistry, ty: TypeId) -> BooleanOutcomes {
    match registry.lookup(registry.unwrap_proxy(ty)) {
        TypeData::NoType | TypeData::NoObject => BooleanOutcomes::empty(),
        TypeData::Value(ValueKind::Null | ValueKind::Void) => BooleanOutcomes::FALSE,
        TypeData::Value(_) => BooleanOutcomes::BOTH,
        TypeData::ValueObject(_)
        | TypeData::Object(_)
        | TypeData::Function(_)
        | TypeData::Record(_)
        | TypeData::Enum(_) => BooleanOutcomes::TRUE,
        TypeData::EnumElement(id) => match registry.enum_data(id) {
            Some(data) => to_boolean_outcomes(registry, data.underlying),
            None => BooleanOutcomes::BOTH,
        },
        TypeData::Union(list) => {
            let alts = registry.type_list(list);
            alts.iter().fold(BooleanOutcomes::empty(), |acc, &alt| {
                acc | to_boolean_outcomes(registry, alt)
            })
        }
        TypeData::TemplateParam(p) => to_boolean_outcomes(registry, p.bound),
        TypeData::Unknown
        | TypeData::CheckedUnknown
        | TypeData::All
        | TypeData::NoResolved
        | TypeData::NamedRef(_) => BooleanOutcomes::BOTH,
    }
}

/// Remove the `null` and `undefined` alternates from a union; a bare
/// `null`/`undefined` restricts to the empty type; everything else is
/// returned unchanged.
pub fn restrict_by_not_null_or_undefined(registry: &TypeRegistry, ty: TypeId) -> TypeId {
    match registry.lookup(ty) {
        TypeData::Union(list) => {
            let alts = registry.type_list(list);
            if alts.iter().any(|&alt| is_null_or_void(registry, alt)) {
                registry.union(
                    alts.iter()
                        .copied()
                        .filter(|&alt| !is_null_or_void(registry, alt)),
                )
            } else {
                ty
            }
        }
        TypeData::Value(ValueKind::Null | ValueKind::Void) => TypeId::NO_TYPE,
        _ => ty,
    }
}

/// Restrict a type to the alternates that can coerce to `outcome`.
///
/// `(Object|null)` restricted to the true outcome drops `null`; restricted to
/// the false outcome drops the object. A type that cannot produce `outcome`
/// at all restricts to the empty type, which callers use to prune
/// unreachable branches. Unknown stays Unknown: no alternates to drop.
pub fn restrict_by_boolean_outcome(
    registry: &TypeRegistry,
    ty: TypeId,
    outcome: bool,
) -> TypeId {
    let wanted = if outcome {
        BooleanOutcomes::TRUE
    } else {
        BooleanOutcomes::FALSE
    };
    match registry.lookup(registry.unwrap_proxy(ty)) {
        TypeData::Union(list) => {
            let alts = registry.type_list(list);
            registry.union(
                alts.iter()
                    .copied()
                    .filter(|&alt| to_boolean_outcomes(registry, alt).contains(wanted)),
            )
        }
        TypeData::Unknown | TypeData::CheckedUnknown | TypeData::All => ty,
        _ => {
            if to_boolean_outcomes(registry, ty).contains(wanted) {
                ty
            } else {
                TypeId::NO_TYPE
            }
        }
    }
}

fn is_null_or_void(registry: &TypeRegistry, ty: TypeId) -> bool {
    matches!(
        registry.lookup(registry.unwrap_proxy(ty)),
        TypeData::Value(ValueKind::Null | ValueKind::Void)
    )
}

#[cfg(test)]
#[path = "../tests/boolean_tests.rs"]
mod tests;
