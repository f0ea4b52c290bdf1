use super::*;
use crate::scope::FlowScope;
use crate::syntax::{EqOp, NodeKind, SyntaxArena};
use jsz_common::interner::Interner;
use jsz_types::{TypeId, TypeRegistry};
use std::sync::Arc;

fn registry() -> TypeRegistry {
    TypeRegistry::new(Arc::new(Interner::new()))
}

#[test]
fn truthiness_narrows_nullable_references() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let x = registry.strings().intern("x");
    let name = arena.add(NodeKind::Name(x), []);

    let object = registry.make_object(registry.strings().intern("Box"), None);
    let mut scope = FlowScope::new();
    scope.insert(x, registry.union([object, TypeId::NULL]));

    let interp = SemanticReverseInterpreter::new(&registry, &arena);
    let truthy = interp.narrow(name, &scope, true);
    assert_eq!(truthy.slot(x), Some(object));
    let falsy = interp.narrow(name, &scope, false);
    assert_eq!(falsy.slot(x), Some(TypeId::NULL));
}

#[test]
fn not_inverts_the_outcome() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let x = registry.strings().intern("x");
    let name = arena.add(NodeKind::Name(x), []);
    let negated = arena.add(NodeKind::Not, [name]);

    let object = registry.make_object(registry.strings().intern("Box"), None);
    let mut scope = FlowScope::new();
    scope.insert(x, registry.union([object, TypeId::NULL]));

    let interp = SemanticReverseInterpreter::new(&registry, &arena);
    let narrowed = interp.narrow(negated, &scope, false);
    assert_eq!(narrowed.slot(x), Some(object));
}

#[test]
fn typeof_comparison_narrows_unions() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let x = registry.strings().intern("x");
    let string_atom = registry.strings().intern("string");
    let name = arena.add(NodeKind::Name(x), []);
    let probe = arena.add(NodeKind::TypeOf, [name]);
    let literal = arena.add(NodeKind::Str(string_atom), []);
    let condition = arena.add(NodeKind::Equality(EqOp::Strict), [probe, literal]);

    let mut scope = FlowScope::new();
    scope.insert(x, registry.union([TypeId::STRING, TypeId::NUMBER]));

    let interp = SemanticReverseInterpreter::new(&registry, &arena);
    assert_eq!(interp.narrow(condition, &scope, true).slot(x), Some(TypeId::STRING));
    assert_eq!(interp.narrow(condition, &scope, false).slot(x), Some(TypeId::NUMBER));
}

#[test]
fn strict_null_equality_narrows_precisely() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let x = registry.strings().intern("x");
    let name = arena.add(NodeKind::Name(x), []);
    let null_node = arena.add(NodeKind::Null, []);
    let condition = arena.add(NodeKind::Equality(EqOp::Strict), [name, null_node]);

    let mut scope = FlowScope::new();
    scope.insert(x, registry.union([TypeId::STRING, TypeId::NULL, TypeId::VOID]));

    let interp = SemanticReverseInterpreter::new(&registry, &arena);
    // x === null keeps exactly null.
    assert_eq!(interp.narrow(condition, &scope, true).slot(x), Some(TypeId::NULL));
    // x !== null drops null but keeps undefined.
    let negative = interp.narrow(condition, &scope, false);
    let expected = registry.union([TypeId::STRING, TypeId::VOID]);
    assert_eq!(negative.slot(x), Some(expected));
}

#[test]
fn loose_null_equality_covers_undefined() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let x = registry.strings().intern("x");
    let name = arena.add(NodeKind::Name(x), []);
    let null_node = arena.add(NodeKind::Null, []);
    let condition = arena.add(NodeKind::Equality(EqOp::LooseNot), [name, null_node]);

    let mut scope = FlowScope::new();
    scope.insert(x, registry.union([TypeId::STRING, TypeId::NULL, TypeId::VOID]));

    let interp = SemanticReverseInterpreter::new(&registry, &arena);
    // x != null strips both null and undefined on the true branch.
    assert_eq!(interp.narrow(condition, &scope, true).slot(x), Some(TypeId::STRING));
}

#[test]
fn instanceof_narrows_to_the_instance_type() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let x = registry.strings().intern("x");
    let foo = registry.strings().intern("Foo");
    let (ctor, instance) = registry.make_constructor(foo, vec![]);

    let value = arena.add(NodeKind::Name(x), []);
    let ctor_ref = arena.add(NodeKind::Name(foo), []);
    let condition = arena.add(NodeKind::InstanceOf, [value, ctor_ref]);

    let mut scope = FlowScope::new();
    scope.insert(x, registry.union([instance, TypeId::NULL]));
    scope.insert(foo, ctor);

    let interp = SemanticReverseInterpreter::new(&registry, &arena);
    assert_eq!(interp.narrow(condition, &scope, true).slot(x), Some(instance));
    // The negative branch learns nothing.
    assert_eq!(
        interp.narrow(condition, &scope, false).slot(x),
        Some(registry.union([instance, TypeId::NULL]))
    );
}

#[test]
fn impossible_outcomes_prune_to_bottom() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let yes = arena.add(NodeKind::Bool(true), []);
    let nil = arena.add(NodeKind::Null, []);

    let scope = FlowScope::new();
    let interp = SemanticReverseInterpreter::new(&registry, &arena);
    assert!(interp.narrow(yes, &scope, false).is_bottom());
    assert!(!interp.narrow(yes, &scope, true).is_bottom());
    assert!(interp.narrow(nil, &scope, true).is_bottom());
}

#[test]
fn object_typed_reference_cannot_be_falsy() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let x = registry.strings().intern("x");
    let name = arena.add(NodeKind::Name(x), []);

    let object = registry.make_object(registry.strings().intern("Box"), None);
    let mut scope = FlowScope::new();
    scope.insert(x, object);

    let interp = SemanticReverseInterpreter::new(&registry, &arena);
    assert!(interp.narrow(name, &scope, false).is_bottom());
}

#[test]
fn conjunction_true_narrows_both_operands() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let x = registry.strings().intern("x");
    let y = registry.strings().intern("y");
    let left = arena.add(NodeKind::Name(x), []);
    let right = arena.add(NodeKind::Name(y), []);
    let condition = arena.add(NodeKind::And, [left, right]);

    let object = registry.make_object(registry.strings().intern("Box"), None);
    let mut scope = FlowScope::new();
    scope.insert(x, registry.union([object, TypeId::NULL]));
    scope.insert(y, registry.union([object, TypeId::VOID]));

    let interp = SemanticReverseInterpreter::new(&registry, &arena);
    let narrowed = interp.narrow(condition, &scope, true);
    assert_eq!(narrowed.slot(x), Some(object));
    assert_eq!(narrowed.slot(y), Some(object));

    // A false conjunction cannot tell which operand failed.
    let unknown_extent = interp.narrow(condition, &scope, false);
    assert_eq!(unknown_extent.slot(x), Some(registry.union([object, TypeId::NULL])));
}
