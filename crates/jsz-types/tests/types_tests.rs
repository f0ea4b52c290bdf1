use super::*;

#[test]
fn value_kind_boxing_round_trips() {
    assert_eq!(ValueKind::Number.boxed(), Some(TypeId::NUMBER_OBJECT));
    assert_eq!(ValueKind::String.boxed(), Some(TypeId::STRING_OBJECT));
    assert_eq!(ValueKind::Boolean.boxed(), Some(TypeId::BOOLEAN_OBJECT));
    assert_eq!(ValueKind::Null.boxed(), None);
    assert_eq!(ValueKind::Void.boxed(), None);
    assert_eq!(ValueKind::Number.unboxed(), TypeId::NUMBER);
}

#[test]
fn template_map_pads_missing_bindings_with_unknown() {
    let t = Atom(1);
    let u = Atom(2);
    let map = TemplateMap::new([t, u], [TypeId::NUMBER]);
    assert_eq!(map.bindings(), &[TypeId::NUMBER, TypeId::UNKNOWN]);
    assert_eq!(map.binding(t), Some(TypeId::NUMBER));
    assert_eq!(map.binding(u), Some(TypeId::UNKNOWN));
}

#[test]
#[should_panic(expected = "more template bindings than template names")]
fn template_map_rejects_excess_bindings() {
    let _ = TemplateMap::new([Atom(1)], [TypeId::NUMBER, TypeId::STRING]);
}

#[test]
fn property_flag_queries() {
    let declared = Property::declared(TypeId::NUMBER);
    assert!(declared.is_declared());
    assert!(!declared.is_extern());

    let inferred = Property::inferred(TypeId::STRING);
    assert!(!inferred.is_declared());
}

#[test]
fn boolean_outcome_queries() {
    assert!(BooleanOutcomes::BOTH.can_be_true());
    assert!(BooleanOutcomes::BOTH.can_be_false());
    assert!(!BooleanOutcomes::TRUE.can_be_false());
    assert!(!BooleanOutcomes::empty().can_be_true());
}
