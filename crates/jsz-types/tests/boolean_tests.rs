use super::*;
use crate::registry::TypeRegistry;
use crate::types::{BooleanOutcomes, FunctionShape, TypeId};
use jsz_common::interner::Interner;
use std::sync::Arc;

fn setup() -> TypeRegistry {
    TypeRegistry::new(Arc::new(Interner::new()))
}

#[test]
fn null_and_undefined_are_always_falsy() {
    let registry = setup();
    assert_eq!(to_boolean_outcomes(&registry, TypeId::NULL), BooleanOutcomes::FALSE);
    assert_eq!(to_boolean_outcomes(&registry, TypeId::VOID), BooleanOutcomes::FALSE);
}

#[test]
fn objects_are_always_truthy() {
    let registry = setup();
    let object = registry.make_object(registry.strings().intern("Thing"), None);
    let func = registry.make_function(FunctionShape::simple([], TypeId::VOID));
    assert_eq!(to_boolean_outcomes(&registry, object), BooleanOutcomes::TRUE);
    assert_eq!(to_boolean_outcomes(&registry, func), BooleanOutcomes::TRUE);
    assert_eq!(
        to_boolean_outcomes(&registry, TypeId::STRING_OBJECT),
        BooleanOutcomes::TRUE
    );
}

#[test]
fn scalars_can_go_either_way() {
    let registry = setup();
    for ty in [TypeId::NUMBER, TypeId::STRING, TypeId::BOOLEAN] {
        assert_eq!(to_boolean_outcomes(&registry, ty), BooleanOutcomes::BOTH);
    }
}

#[test]
fn union_outcomes_are_the_union_of_member_outcomes() {
    let registry = setup();
    let string_or_number = registry.union([TypeId::STRING, TypeId::NUMBER]);
    assert_eq!(
        to_boolean_outcomes(&registry, string_or_number),
        BooleanOutcomes::BOTH
    );

    let object = registry.make_object(registry.strings().intern("Box"), None);
    let object_or_null = registry.union([object, TypeId::NULL]);
    assert_eq!(
        to_boolean_outcomes(&registry, object_or_null),
        BooleanOutcomes::BOTH
    );
}

#[test]
fn bottoms_have_no_outcomes() {
    let registry = setup();
    assert_eq!(
        to_boolean_outcomes(&registry, TypeId::NO_TYPE),
        BooleanOutcomes::empty()
    );
}

#[test]
fn unknown_can_go_either_way() {
    let registry = setup();
    assert_eq!(to_boolean_outcomes(&registry, TypeId::UNKNOWN), BooleanOutcomes::BOTH);
    assert_eq!(to_boolean_outcomes(&registry, TypeId::ALL), BooleanOutcomes::BOTH);
}

#[test]
fn restrict_strips_null_and_undefined_alternates() {
    let registry = setup();
    let object = registry.make_object(registry.strings().intern("Box"), None);
    let nullable = registry.union([object, TypeId::NULL, TypeId::VOID]);
    assert_eq!(restrict_by_not_null_or_undefined(&registry, nullable), object);
}

#[test]
fn restrict_is_identity_for_non_nullable_types() {
    let registry = setup();
    let string_or_number = registry.union([TypeId::STRING, TypeId::NUMBER]);
    assert_eq!(
        restrict_by_not_null_or_undefined(&registry, string_or_number),
        string_or_number
    );
    assert_eq!(
        restrict_by_not_null_or_undefined(&registry, TypeId::NUMBER),
        TypeId::NUMBER
    );
}

#[test]
fn outcome_restriction_filters_union_alternates() {
    let registry = setup();
    let object = registry.make_object(registry.strings().intern("Box"), None);
    let nullable = registry.union([object, TypeId::NULL]);

    assert_eq!(restrict_by_boolean_outcome(&registry, nullable, true), object);
    assert_eq!(
        restrict_by_boolean_outcome(&registry, nullable, false),
        TypeId::NULL
    );
    // A type that cannot produce the outcome restricts to bottom.
    assert_eq!(
        restrict_by_boolean_outcome(&registry, object, false),
        TypeId::NO_TYPE
    );
    // Unknown has no alternates to drop.
    assert_eq!(
        restrict_by_boolean_outcome(&registry, TypeId::UNKNOWN, false),
        TypeId::UNKNOWN
    );
}

#[test]
fn restrict_of_bare_null_is_bottom() {
    let registry = setup();
    assert_eq!(
        restrict_by_not_null_or_undefined(&registry, TypeId::NULL),
        TypeId::NO_TYPE
    );
    assert_eq!(
        restrict_by_not_null_or_undefined(&registry, TypeId::VOID),
        TypeId::NO_TYPE
    );
}
