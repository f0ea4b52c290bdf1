//! Join (least supertype) and meet (greatest subtype).
//!
//! Both operators are total: any pair of type values produces a result, and
//! unrepresentable combinations degrade to Unknown or a bottom instead of
//! failing. The meet of two function types uses a structural blend that
//! deliberately tolerates unknown parameter and return types; it does not
//! satisfy the full lattice laws, which is long-standing observable behavior
//! downstream passes rely on.

use crate::equivalence::{check_equivalence, EquivalenceMethod};
use crate::registry::TypeRegistry;
use crate::subtype::{is_object_like, is_subtype};
use crate::types::{
    EnumId, FunctionKind, FunctionShape, ParamInfo, TypeData, TypeId,
};
use smallvec::SmallVec;

/// Least upper bound of two types.
///
/// Equivalent operands collapse to one of them; otherwise the result is a
/// union of the two, with unresolved placeholders collapsed to the canonical
/// marker by the union builder so the join stays symmetric.
pub fn least_supertype(registry: &TypeRegistry, a: TypeId, b: TypeId) -> TypeId {
    if check_equivalence(registry, a, b, EquivalenceMethod::Identity) {
        return a;
    }
    if a == TypeId::NO_TYPE {
        return b;
    }
    if b == TypeId::NO_TYPE {
        return a;
    }
    registry.union2(a, b)
}

/// Greatest lower bound of two types.
pub fn greatest_subtype(registry: &TypeRegistry, a: TypeId, b: TypeId) -> TypeId {
    let a = registry.unwrap_proxy(a);
    let b = registry.unwrap_proxy(b);
    let da = registry.lookup(a);
    let db = registry.lookup(b);

    // Two function types blend structurally instead of dropping to bottom.
    if let (TypeData::Function(fa), TypeData::Function(fb)) = (da, db) {
        if fa == fb {
            return a;
        }
        return function_meet(registry, a, b);
    }

    // Unknown meets anything at Unknown, unless the operands are equivalent.
    let a_unknown = matches!(da, TypeData::Unknown | TypeData::CheckedUnknown);
    let b_unknown = matches!(db, TypeData::Unknown | TypeData::CheckedUnknown);
    if a_unknown || b_unknown {
        if check_equivalence(registry, a, b, EquivalenceMethod::Identity) {
            return a;
        }
        return TypeId::UNKNOWN;
    }

    // When one side is already below the other, the meet is the more
    // specific side, minus any unresolved placeholder alternates.
    if is_subtype(registry, a, b) {
        return filter_no_resolved(registry, a);
    }
    if is_subtype(registry, b, a) {
        return filter_no_resolved(registry, b);
    }

    // Unions distribute over the meet.
    if let TypeData::Union(list) = da {
        let alts = registry.type_list(list);
        return registry.union(alts.iter().map(|&alt| greatest_subtype(registry, alt, b)));
    }
    if let TypeData::Union(list) = db {
        let alts = registry.type_list(list);
        return registry.union(alts.iter().map(|&alt| greatest_subtype(registry, a, alt)));
    }

    // Records meet field-wise.
    if let (TypeData::Record(ra), TypeData::Record(rb)) = (da, db) {
        return record_meet(registry, ra, rb);
    }

    // Enum elements delegate to the owner's meet.
    if let TypeData::EnumElement(id) = da {
        return enum_element_meet(registry, id, b);
    }
    if let TypeData::EnumElement(id) = db {
        return enum_element_meet(registry, id, a);
    }

    if is_object_like(registry, a) && is_object_like(registry, b) {
        TypeId::NO_OBJECT
    } else {
        TypeId::NO_TYPE
    }
}

/// Drop the canonical unresolved marker from a union result.
fn filter_no_resolved(registry: &TypeRegistry, ty: TypeId) -> TypeId {
    if let TypeData::Union(list) = registry.lookup(ty) {
        let alts = registry.type_list(list);
        if alts.iter().any(|&alt| alt == TypeId::NO_RESOLVED) {
            return registry.union(alts.iter().copied().filter(|&alt| alt != TypeId::NO_RESOLVED));
        }
    }
    ty
}

/// Structural infimum of two function signatures.
///
/// Parameters widen pairwise (contravariance), returns and `this` narrow;
/// an unknown on either side defers to the other side instead of rejecting
/// the pair.
fn function_meet(registry: &TypeRegistry, a: TypeId, b: TypeId) -> TypeId {
    let (TypeData::Function(fa), TypeData::Function(fb)) =
        (registry.lookup(a), registry.lookup(b))
    else {
        return TypeId::NO_TYPE;
    };
    let sa = registry.function_shape(fa);
    let sb = registry.function_shape(fb);

    let len = sa.params.len().max(sb.params.len());
    let mut params: SmallVec<[ParamInfo; 4]> = SmallVec::with_capacity(len);
    for i in 0..len {
        let pa = sa.params.get(i).copied();
        let pb = sb.params.get(i).copied();
        let merged = match (pa, pb) {
            (Some(x), Some(y)) => ParamInfo {
                ty: tolerant_join(registry, x.ty, y.ty),
                optional: x.optional || y.optional,
                variadic: x.variadic || y.variadic,
            },
            (Some(x), None) => ParamInfo {
                optional: true,
                ..x
            },
            (None, Some(y)) => ParamInfo {
                optional: true,
                ..y
            },
            (None, None) => unreachable!(),
        };
        params.push(merged);
    }

    let ret = tolerant_meet(registry, sa.ret, sb.ret);
    let this_ty = tolerant_meet(registry, sa.this_ty, sb.this_ty);
    let kind = if sa.kind == sb.kind {
        sa.kind
    } else {
        FunctionKind::Ordinary
    };

    registry.make_function(FunctionShape {
        params,
        ret,
        this_ty,
        kind,
        template_names: SmallVec::new(),
        this_template: None,
        instance: None,
    })
}

fn tolerant_join(registry: &TypeRegistry, a: TypeId, b: TypeId) -> TypeId {
    if a == TypeId::UNKNOWN {
        return b;
    }
    if b == TypeId::UNKNOWN {
        return a;
    }
    least_supertype(registry, a, b)
}

fn tolerant_meet(registry: &TypeRegistry, a: TypeId, b: TypeId) -> TypeId {
    if a == TypeId::UNKNOWN {
        return b;
    }
    if b == TypeId::UNKNOWN {
        return a;
    }
    greatest_subtype(registry, a, b)
}

/// Field-wise meet of two record types. A value in the meet must satisfy
/// both shapes, so the result carries the union of the field sets with
/// common fields met; a contradictory common field empties the meet.
fn record_meet(
    registry: &TypeRegistry,
    ra: crate::types::RecordShapeId,
    rb: crate::types::RecordShapeId,
) -> TypeId {
    let fields_a = registry.record_shape(ra);
    let fields_b = registry.record_shape(rb);
    let mut merged: Vec<(jsz_common::interner::Atom, TypeId)> = Vec::new();

    for &(name, ty_a) in fields_a.iter() {
        match fields_b.iter().find(|&&(other, _)| other == name) {
            Some(&(_, ty_b)) => {
                let met = greatest_subtype(registry, ty_a, ty_b);
                if met == TypeId::NO_TYPE {
                    return TypeId::NO_OBJECT;
                }
                merged.push((name, met));
            }
            None => merged.push((name, ty_a)),
        }
    }
    for &(name, ty_b) in fields_b.iter() {
        if !fields_a.iter().any(|&(other, _)| other == name) {
            merged.push((name, ty_b));
        }
    }
    registry.make_record(merged)
}

/// The meet of an enum element delegates to the owner: meet the underlying
/// element type, and keep the nominal element when nothing was lost.
fn enum_element_meet(registry: &TypeRegistry, id: EnumId, other: TypeId) -> TypeId {
    let Some(data) = registry.enum_data(id) else {
        return TypeId::NO_TYPE;
    };
    let met = greatest_subtype(registry, data.underlying, other);
    if met == data.underlying {
        registry.enum_element_type(id)
    } else {
        met
    }
}

#[cfg(test)]
#[path = "../tests/lattice_tests.rs"]
mod tests;
