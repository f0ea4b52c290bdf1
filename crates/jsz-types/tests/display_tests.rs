use super::*;
use crate::registry::TypeRegistry;
use crate::types::{FunctionShape, TypeId};
use jsz_common::interner::Interner;
use std::sync::Arc;

fn setup() -> TypeRegistry {
    TypeRegistry::new(Arc::new(Interner::new()))
}

#[test]
fn intrinsics_render_their_names() {
    let registry = setup();
    assert_eq!(display(&registry, TypeId::UNKNOWN), "?");
    assert_eq!(display(&registry, TypeId::ALL), "*");
    assert_eq!(display(&registry, TypeId::NUMBER), "number");
    assert_eq!(display(&registry, TypeId::VOID), "undefined");
    assert_eq!(display(&registry, TypeId::NULL), "null");
    assert_eq!(display(&registry, TypeId::NUMBER_OBJECT), "Number");
}

#[test]
fn union_display_is_lexically_sorted_and_stable() {
    let registry = setup();
    let a = registry.union([TypeId::STRING, TypeId::NUMBER, TypeId::NULL]);
    let b = registry.union([TypeId::NULL, TypeId::NUMBER, TypeId::STRING]);
    assert_eq!(display(&registry, a), "(null|number|string)");
    assert_eq!(display(&registry, a), display(&registry, b));
}

#[test]
fn functions_render_signature_shapes() {
    let registry = setup();
    let func = registry.make_function(FunctionShape::simple(
        [TypeId::NUMBER, TypeId::STRING],
        TypeId::BOOLEAN,
    ));
    assert_eq!(display(&registry, func), "function(number, string): boolean");
}

#[test]
fn named_objects_render_their_name() {
    let registry = setup();
    let ty = registry.make_object(registry.strings().intern("Widget"), None);
    assert_eq!(display(&registry, ty), "Widget");
}

#[test]
fn records_render_fields() {
    let registry = setup();
    let a = registry.strings().intern("a");
    let b = registry.strings().intern("b");
    let record = registry.make_record(vec![(b, TypeId::STRING), (a, TypeId::NUMBER)]);
    assert_eq!(display(&registry, record), "{a: number, b: string}");
}

#[test]
fn unresolved_references_render_their_name() {
    let registry = setup();
    let forward = registry.register_named_type(registry.strings().intern("Pending"));
    assert_eq!(display(&registry, forward), "Pending");
}
