use super::*;

#[test]
fn intrinsics_have_stable_ids() {
    let interner = TypeInterner::new();
    assert_eq!(interner.intern(TypeData::Unknown), TypeId::UNKNOWN);
    assert_eq!(interner.intern(TypeData::All), TypeId::ALL);
    assert_eq!(interner.intern(TypeData::NoType), TypeId::NO_TYPE);
    assert_eq!(
        interner.intern(TypeData::Value(ValueKind::Number)),
        TypeId::NUMBER
    );
    assert_eq!(
        interner.intern(TypeData::ValueObject(ValueKind::Boolean)),
        TypeId::BOOLEAN_OBJECT
    );
}

#[test]
fn interning_is_idempotent() {
    let interner = TypeInterner::new();
    let shape = FunctionShape::simple([TypeId::NUMBER], TypeId::STRING);
    let a = interner.intern_function_shape(shape.clone());
    let b = interner.intern_function_shape(shape);
    assert_eq!(a, b);
}

#[test]
fn type_lists_are_canonical() {
    let interner = TypeInterner::new();
    let a = interner.intern_type_list(vec![TypeId::STRING, TypeId::NUMBER]);
    let b = interner.intern_type_list(vec![TypeId::NUMBER, TypeId::STRING, TypeId::NUMBER]);
    assert_eq!(a, b);
    assert_eq!(&*interner.type_list(a), &[TypeId::NUMBER, TypeId::STRING]);
}

#[test]
fn lookup_is_total() {
    let interner = TypeInterner::new();
    // An id the interner never produced degrades to Unknown.
    assert_eq!(interner.lookup(TypeId(9999)), TypeData::Unknown);
}
