use super::*;
use jsz_common::diagnostics::DiagnosticCollector;
use jsz_common::interner::Interner;
use jsz_types::ParamInfo;
use std::sync::Arc;

fn registry() -> TypeRegistry {
    TypeRegistry::new(Arc::new(Interner::new()))
}

fn untyped_var(syntactic: &mut SyntacticScope, name: Atom) {
    syntactic.declare(name, crate::scope::VarDeclaration::untyped_var());
}

fn declared_var(syntactic: &mut SyntacticScope, name: Atom, ty: TypeId) {
    syntactic.declare(
        name,
        crate::scope::VarDeclaration {
            kind: DeclKind::Var,
            declared_ty: Some(ty),
            type_inferred: false,
            is_extern: false,
        },
    );
}

macro_rules! inference {
    ($registry:expr, $arena:expr, $syntactic:expr, $interp:ident, $sink:ident, $inference:ident) => {
        let $interp = SemanticReverseInterpreter::new(&$registry, &$arena);
        let $sink = DiagnosticCollector::new();
        let $inference = TypeInference::new(&$registry, &$arena, &$syntactic, &$interp, &$sink);
    };
}

// =============================================================================
// The addition table
// =============================================================================

#[test]
fn addition_of_string_and_number_is_string() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let s = arena.add(NodeKind::Str(registry.strings().intern("a")), []);
    let n = arena.add(NodeKind::Number(1.0), []);
    let add = arena.add(NodeKind::Add, [s, n]);

    let syntactic = SyntacticScope::new();
    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();

    assert_eq!(inference.traverse(add, &mut scope), Some(TypeId::STRING));
    assert_eq!(arena.get_type(add), Some(TypeId::STRING));
}

#[test]
fn addition_table_covers_the_documented_cases() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let object = registry.make_object(registry.strings().intern("Box"), None);

    let u1 = registry.strings().intern("u1");
    let u2 = registry.strings().intern("u2");
    let o = registry.strings().intern("o");
    let mut syntactic = SyntacticScope::new();
    declared_var(&mut syntactic, o, object);

    // unknown + unknown => unknown
    let a = arena.add(NodeKind::Name(u1), []);
    let b = arena.add(NodeKind::Name(u2), []);
    let unknown_add = arena.add(NodeKind::Add, [a, b]);
    // unknown + number => unknown
    let c = arena.add(NodeKind::Name(u1), []);
    let d = arena.add(NodeKind::Number(1.0), []);
    let half_unknown = arena.add(NodeKind::Add, [c, d]);
    // boolean + null => number
    let e = arena.add(NodeKind::Bool(true), []);
    let f = arena.add(NodeKind::Null, []);
    let numeric = arena.add(NodeKind::Add, [e, f]);
    // object + number => string|number
    let g = arena.add(NodeKind::Name(o), []);
    let h = arena.add(NodeKind::Number(1.0), []);
    let mixed = arena.add(NodeKind::Add, [g, h]);
    // unknown + string => string (string-like wins over unknown)
    let i = arena.add(NodeKind::Name(u1), []);
    let j = arena.add(NodeKind::Str(registry.strings().intern("s")), []);
    let stringish = arena.add(NodeKind::Add, [i, j]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();

    assert_eq!(inference.traverse(unknown_add, &mut scope), Some(TypeId::UNKNOWN));
    assert_eq!(inference.traverse(half_unknown, &mut scope), Some(TypeId::UNKNOWN));
    assert_eq!(inference.traverse(numeric, &mut scope), Some(TypeId::NUMBER));
    assert_eq!(
        inference.traverse(mixed, &mut scope),
        Some(registry.union([TypeId::STRING, TypeId::NUMBER]))
    );
    assert_eq!(inference.traverse(stringish, &mut scope), Some(TypeId::STRING));
}

// =============================================================================
// The literal/operator table
// =============================================================================

#[test]
fn literal_and_operator_defaults() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let number = arena.add(NodeKind::Number(3.0), []);
    let string = arena.add(NodeKind::Str(registry.strings().intern("s")), []);
    let regex = arena.add(NodeKind::Regex, []);
    let array = arena.add(NodeKind::ArrayLit, [number]);
    let null_lit = arena.add(NodeKind::Null, []);
    let undef = arena.add(NodeKind::Undefined, []);
    let type_of = arena.add(NodeKind::TypeOf, [string]);
    let lhs = arena.add(NodeKind::Number(1.0), []);
    let rhs = arena.add(NodeKind::Number(2.0), []);
    let compare = arena.add(NodeKind::Compare, [lhs, rhs]);
    let not = arena.add(NodeKind::Not, [null_lit]);
    let void_op = arena.add(NodeKind::VoidOp, [number]);
    let left = arena.add(NodeKind::Number(1.0), []);
    let right = arena.add(NodeKind::Str(registry.strings().intern("t")), []);
    let comma = arena.add(NodeKind::Comma, [left, right]);

    let syntactic = SyntacticScope::new();
    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();

    assert_eq!(inference.traverse(number, &mut scope), Some(TypeId::NUMBER));
    assert_eq!(inference.traverse(string, &mut scope), Some(TypeId::STRING));
    assert_eq!(inference.traverse(regex, &mut scope), Some(registry.natives().regexp));
    assert_eq!(inference.traverse(array, &mut scope), Some(registry.natives().array));
    assert_eq!(inference.traverse(type_of, &mut scope), Some(TypeId::STRING));
    assert_eq!(inference.traverse(compare, &mut scope), Some(TypeId::BOOLEAN));
    assert_eq!(inference.traverse(not, &mut scope), Some(TypeId::BOOLEAN));
    assert_eq!(inference.traverse(void_op, &mut scope), Some(TypeId::VOID));
    assert_eq!(inference.traverse(comma, &mut scope), Some(TypeId::STRING));
    assert_eq!(inference.traverse(undef, &mut scope), Some(TypeId::VOID));
}

#[test]
fn object_literals_make_fresh_anonymous_types() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let a = registry.strings().intern("a");
    let value = arena.add(NodeKind::Number(1.0), []);
    let entry = arena.add(NodeKind::LitProp(a), [value]);
    let literal = arena.add(NodeKind::ObjectLit, [entry]);

    let syntactic = SyntacticScope::new();
    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();

    let ty = inference.traverse(literal, &mut scope).expect("typed");
    let found = registry.find_property(ty, a).expect("property inferred");
    assert_eq!(found.ty, TypeId::NUMBER);
    assert!(!found.is_declared());
}

// =============================================================================
// Unreachable code
// =============================================================================

#[test]
fn bottom_scope_propagates_unchanged_and_annotates_nothing() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let n = arena.add(NodeKind::Number(1.0), []);
    let stmt = arena.add(NodeKind::ExprStmt, [n]);

    let syntactic = SyntacticScope::new();
    inference!(registry, arena, syntactic, interp, sink, inference);

    let out = inference
        .flow_through(stmt, &FlowScope::bottom())
        .expect("no invariant violated");
    assert!(out.is_bottom());
    assert_eq!(arena.get_type(n), None);
}

// =============================================================================
// Reads and narrowing
// =============================================================================

#[test]
fn property_read_narrows_the_base_binding() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let a = registry.strings().intern("a");
    let x = registry.strings().intern("x");

    let record = registry.make_object(registry.strings().intern("Rec"), None);
    let TypeData::Object(record_id) = registry.lookup(record) else {
        panic!("expected an object");
    };
    registry.define_declared_property(record_id, a, TypeId::NUMBER, false);

    let mut syntactic = SyntacticScope::new();
    declared_var(&mut syntactic, x, registry.union([TypeId::NULL, record]));

    let base = arena.add(NodeKind::Name(x), []);
    let read = arena.add(NodeKind::PropAccess(a), [base]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();

    assert_eq!(inference.traverse(read, &mut scope), Some(TypeId::NUMBER));
    // The read proves x was not null, whatever narrowing happened before.
    assert_eq!(scope.slot(x), Some(record));
}

#[test]
fn recorded_unknown_binding_reads_as_checked_unknown() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let x = registry.strings().intern("x");
    let p = registry.strings().intern("p");
    let u = registry.strings().intern("u");

    let object = registry.make_object(registry.strings().intern("Holder"), None);
    let mut syntactic = SyntacticScope::new();
    declared_var(&mut syntactic, x, object);
    untyped_var(&mut syntactic, u);

    // x.p = u; (records the x.p slot as Unknown)
    let base1 = arena.add(NodeKind::Name(x), []);
    let target = arena.add(NodeKind::PropAccess(p), [base1]);
    let value = arena.add(NodeKind::Name(u), []);
    let assign = arena.add(NodeKind::Assign, [target, value]);
    // then read x.p
    let base2 = arena.add(NodeKind::Name(x), []);
    let read = arena.add(NodeKind::PropAccess(p), [base2]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();
    scope.insert(u, TypeId::UNKNOWN);

    inference.traverse(assign, &mut scope);
    assert_eq!(inference.traverse(read, &mut scope), Some(TypeId::CHECKED_UNKNOWN));
}

#[test]
fn qualified_reads_fall_back_to_the_global_registry() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let ns = registry.strings().intern("ns");
    let widget = registry.strings().intern("Widget");
    let (ctor, _) = registry.make_constructor(registry.strings().intern("ns.Widget"), vec![]);

    let base = arena.add(NodeKind::Name(ns), []);
    let read = arena.add(NodeKind::PropAccess(widget), [base]);

    let syntactic = SyntacticScope::new();
    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();

    // "ns.Widget" resolves through the name -> constructor index.
    assert_eq!(inference.traverse(read, &mut scope), Some(ctor));
}

// =============================================================================
// Assignment
// =============================================================================

#[test]
fn assignment_rebinds_inferred_declarations_only() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let x = registry.strings().intern("x");
    let y = registry.strings().intern("y");

    let mut syntactic = SyntacticScope::new();
    untyped_var(&mut syntactic, x);
    declared_var(&mut syntactic, y, TypeId::NUMBER);

    let value1 = arena.add(NodeKind::Str(registry.strings().intern("v")), []);
    let target1 = arena.add(NodeKind::Name(x), []);
    let assign1 = arena.add(NodeKind::Assign, [target1, value1]);
    let value2 = arena.add(NodeKind::Str(registry.strings().intern("w")), []);
    let target2 = arena.add(NodeKind::Name(y), []);
    let assign2 = arena.add(NodeKind::Assign, [target2, value2]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();

    // x was seeded void (untyped var), the assignment replaces the binding.
    assert_eq!(scope.slot(x), Some(TypeId::VOID));
    assert_eq!(inference.traverse(assign1, &mut scope), Some(TypeId::STRING));
    assert_eq!(scope.slot(x), Some(TypeId::STRING));
    assert_eq!(syntactic.inferred_type(x), Some(TypeId::STRING));

    // y is declared; its binding does not move.
    inference.traverse(assign2, &mut scope);
    assert_eq!(scope.slot(y), Some(TypeId::NUMBER));
    assert_eq!(syntactic.inferred_type(y), None);
}

#[test]
fn qualified_assignment_records_the_dotted_path() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let x = registry.strings().intern("x");
    let p = registry.strings().intern("p");
    let path = registry.strings().intern("x.p");

    let object = registry.make_object(registry.strings().intern("Holder"), None);
    let mut syntactic = SyntacticScope::new();
    declared_var(&mut syntactic, x, object);

    let base = arena.add(NodeKind::Name(x), []);
    let target = arena.add(NodeKind::PropAccess(p), [base]);
    let value = arena.add(NodeKind::Number(1.0), []);
    let assign = arena.add(NodeKind::Assign, [target, value]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();
    inference.traverse(assign, &mut scope);

    assert_eq!(scope.slot(path), Some(TypeId::NUMBER));
}

#[test]
fn property_inference_policy() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let strings = registry.strings();
    let o = strings.intern("o");
    let x = strings.intern("x");
    let p = strings.intern("p");
    let q = strings.intern("q");
    let r = strings.intern("r");
    let proto = strings.intern("prototype");

    let widget = registry.make_object(strings.intern("Widget"), None);

    let mut syntactic = SyntacticScope::new();
    untyped_var(&mut syntactic, o);
    declared_var(&mut syntactic, x, widget);
    syntactic.mark_constructor();
    let syntactic = syntactic.with_this_type(widget);

    // o = {}; o.p = 1  -- anonymous owner always infers.
    let literal = arena.add(NodeKind::ObjectLit, []);
    let o_name = arena.add(NodeKind::Name(o), []);
    let o_decl = arena.add(NodeKind::Assign, [o_name, literal]);
    let o_base = arena.add(NodeKind::Name(o), []);
    let o_target = arena.add(NodeKind::PropAccess(p), [o_base]);
    let o_value = arena.add(NodeKind::Number(1.0), []);
    let o_assign = arena.add(NodeKind::Assign, [o_target, o_value]);

    // x.q = 1  -- nominal instance outside `this`: name registered only.
    let x_base = arena.add(NodeKind::Name(x), []);
    let x_target = arena.add(NodeKind::PropAccess(q), [x_base]);
    let x_value = arena.add(NodeKind::Number(1.0), []);
    let x_assign = arena.add(NodeKind::Assign, [x_target, x_value]);

    // this.r = 1  -- inside a constructor: inferred instance property.
    let this_node = arena.add(NodeKind::This, []);
    let this_target = arena.add(NodeKind::PropAccess(r), [this_node]);
    let this_value = arena.add(NodeKind::Bool(true), []);
    let this_assign = arena.add(NodeKind::Assign, [this_target, this_value]);

    // x.prototype = 1  -- "prototype" is always declared.
    let proto_base = arena.add(NodeKind::Name(x), []);
    let proto_target = arena.add(NodeKind::PropAccess(proto), [proto_base]);
    let proto_value = arena.add(NodeKind::Number(1.0), []);
    let proto_assign = arena.add(NodeKind::Assign, [proto_target, proto_value]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();

    inference.traverse(o_decl, &mut scope);
    inference.traverse(o_assign, &mut scope);
    let anon_ty = arena.get_type(literal).expect("object literal typed");
    let found = registry.find_property(anon_ty, p).expect("inferred");
    assert!(!found.is_declared());

    inference.traverse(x_assign, &mut scope);
    assert!(registry.find_property(widget, q).is_none());
    assert!(registry.has_property_name(q));

    inference.traverse(this_assign, &mut scope);
    let found = registry.find_property(widget, r).expect("inferred via this");
    assert_eq!(found.ty, TypeId::BOOLEAN);

    inference.traverse(proto_assign, &mut scope);
    let found = registry.find_property(widget, proto).expect("declared");
    assert!(found.is_declared());
}

#[test]
fn cast_narrows_like_an_assignment() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let x = registry.strings().intern("x");

    let mut syntactic = SyntacticScope::new();
    untyped_var(&mut syntactic, x);

    let name = arena.add(NodeKind::Name(x), []);
    let cast = arena.add(NodeKind::Cast(TypeId::STRING), [name]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();

    assert_eq!(inference.traverse(cast, &mut scope), Some(TypeId::STRING));
    assert_eq!(scope.slot(x), Some(TypeId::STRING));
}

// =============================================================================
// Short-circuit operators
// =============================================================================

#[test]
fn and_with_never_falsy_left_takes_the_right_type() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let a = registry.strings().intern("a");
    let b = registry.strings().intern("b");

    let object = registry.make_object(registry.strings().intern("Box"), None);
    let mut syntactic = SyntacticScope::new();
    declared_var(&mut syntactic, a, object);
    declared_var(&mut syntactic, b, TypeId::NUMBER);

    let left = arena.add(NodeKind::Name(a), []);
    let right = arena.add(NodeKind::Name(b), []);
    let and = arena.add(NodeKind::And, [left, right]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();

    // The left side can never short-circuit to false.
    assert_eq!(inference.traverse(and, &mut scope), Some(TypeId::NUMBER));
}

#[test]
fn and_joins_the_short_circuit_contribution() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let a = registry.strings().intern("a");
    let b = registry.strings().intern("b");

    let object = registry.make_object(registry.strings().intern("Box"), None);
    let mut syntactic = SyntacticScope::new();
    declared_var(&mut syntactic, a, registry.union([object, TypeId::NULL]));
    declared_var(&mut syntactic, b, TypeId::NUMBER);

    let left = arena.add(NodeKind::Name(a), []);
    let right = arena.add(NodeKind::Name(b), []);
    let and = arena.add(NodeKind::And, [left, right]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();

    // Short-circuit keeps the falsy part of the left side.
    assert_eq!(
        inference.traverse(and, &mut scope),
        Some(registry.union([TypeId::NULL, TypeId::NUMBER]))
    );
}

#[test]
fn or_with_never_truthy_left_takes_the_right_type() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let a = registry.strings().intern("a");
    let b = registry.strings().intern("b");

    let mut syntactic = SyntacticScope::new();
    declared_var(&mut syntactic, a, TypeId::NULL);
    declared_var(&mut syntactic, b, TypeId::STRING);

    let left = arena.add(NodeKind::Name(a), []);
    let right = arena.add(NodeKind::Name(b), []);
    let or = arena.add(NodeKind::Or, [left, right]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();

    assert_eq!(inference.traverse(or, &mut scope), Some(TypeId::STRING));
}

// =============================================================================
// Ternaries
// =============================================================================

#[test]
fn ternary_joins_branch_types_under_narrowed_scopes() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let c = registry.strings().intern("c");

    let mut syntactic = SyntacticScope::new();
    declared_var(&mut syntactic, c, TypeId::BOOLEAN);

    let cond = arena.add(NodeKind::Name(c), []);
    let when_true = arena.add(NodeKind::Number(1.0), []);
    let when_false = arena.add(NodeKind::Str(registry.strings().intern("s")), []);
    let ternary = arena.add(NodeKind::Ternary, [cond, when_true, when_false]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();

    assert_eq!(
        inference.traverse(ternary, &mut scope),
        Some(registry.union([TypeId::NUMBER, TypeId::STRING]))
    );
}

#[test]
fn ternary_with_an_untypable_branch_is_left_unset() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let c = registry.strings().intern("c");
    let f = registry.strings().intern("f");

    let mut syntactic = SyntacticScope::new();
    declared_var(&mut syntactic, c, TypeId::BOOLEAN);

    let cond = arena.add(NodeKind::Name(c), []);
    let when_true = arena.add(NodeKind::Number(1.0), []);
    // `new f()` with a non-constructor callee produces no type.
    let callee = arena.add(NodeKind::Name(f), []);
    let when_false = arena.add(NodeKind::New, [callee]);
    let ternary = arena.add(NodeKind::Ternary, [cond, when_true, when_false]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();

    assert_eq!(inference.traverse(ternary, &mut scope), None);
    assert_eq!(arena.get_type(ternary), None);
}

// =============================================================================
// Calls and construction
// =============================================================================

#[test]
fn call_takes_the_callee_return_type() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let f = registry.strings().intern("f");

    let func = registry.make_function(FunctionShape::simple([TypeId::NUMBER], TypeId::STRING));
    let mut syntactic = SyntacticScope::new();
    declared_var(&mut syntactic, f, func);

    let callee = arena.add(NodeKind::Name(f), []);
    let arg = arena.add(NodeKind::Number(1.0), []);
    let call = arena.add(NodeKind::Call, [callee, arg]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();

    assert_eq!(inference.traverse(call, &mut scope), Some(TypeId::STRING));
}

#[test]
fn function_literal_arguments_take_the_declared_parameter_type() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let f = registry.strings().intern("f");

    let callback = registry.make_function(FunctionShape::simple([TypeId::NUMBER], TypeId::VOID));
    let callee_ty = registry.make_function(FunctionShape::simple([callback], TypeId::VOID));
    let mut syntactic = SyntacticScope::new();
    declared_var(&mut syntactic, f, callee_ty);

    let callee = arena.add(NodeKind::Name(f), []);
    let literal = arena.add(NodeKind::FunctionLit(None), []);
    let call = arena.add(NodeKind::Call, [callee, literal]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();
    inference.traverse(call, &mut scope);

    assert_eq!(arena.get_type(literal), Some(callback));
}

#[test]
fn generic_this_propagates_onto_the_function_literal() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let strings = registry.strings();
    let f = strings.intern("f");
    let obj = strings.intern("obj");
    let t = strings.intern("T");

    let template = registry.make_template_param(t, TypeId::UNKNOWN);
    let inner = registry.make_function(FunctionShape {
        this_ty: template,
        ..FunctionShape::simple([], TypeId::VOID)
    });
    let callee_ty = registry.make_function(FunctionShape {
        params: [ParamInfo::required(template), ParamInfo::required(inner)]
            .into_iter()
            .collect(),
        this_template: Some(t),
        template_names: [t].into_iter().collect(),
        ..FunctionShape::simple([], TypeId::VOID)
    });

    let receiver = registry.make_object(strings.intern("Receiver"), None);
    let mut syntactic = SyntacticScope::new();
    declared_var(&mut syntactic, f, callee_ty);
    declared_var(&mut syntactic, obj, receiver);

    let callee = arena.add(NodeKind::Name(f), []);
    let first = arena.add(NodeKind::Name(obj), []);
    let literal = arena.add(NodeKind::FunctionLit(None), []);
    let call = arena.add(NodeKind::Call, [callee, first, literal]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();
    inference.traverse(call, &mut scope);

    let retyped = arena.get_type(literal).expect("literal retyped");
    let TypeData::Function(shape_id) = registry.lookup(retyped) else {
        panic!("expected a function type");
    };
    assert_eq!(registry.function_shape(shape_id).this_ty, receiver);
    assert!(sink.is_empty());
}

#[test]
fn missing_generic_this_parameter_is_reported() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let strings = registry.strings();
    let f = strings.intern("f");
    let t = strings.intern("T");

    let template = registry.make_template_param(t, TypeId::UNKNOWN);
    let inner = registry.make_function(FunctionShape {
        this_ty: template,
        ..FunctionShape::simple([], TypeId::VOID)
    });
    // No sibling parameter is typed T: structurally invalid wiring.
    let callee_ty = registry.make_function(FunctionShape {
        params: [ParamInfo::required(inner)].into_iter().collect(),
        this_template: Some(t),
        template_names: [t].into_iter().collect(),
        ..FunctionShape::simple([], TypeId::VOID)
    });

    let mut syntactic = SyntacticScope::new();
    declared_var(&mut syntactic, f, callee_ty);

    let callee = arena.add(NodeKind::Name(f), []);
    let literal = arena.add(NodeKind::FunctionLit(None), []);
    let call = arena.add(NodeKind::Call, [callee, literal]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();
    // The diagnostic is non-fatal: the call still types.
    assert_eq!(inference.traverse(call, &mut scope), Some(TypeId::VOID));

    let reported = sink.diagnostics();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].code, 9001);
}

#[test]
fn new_takes_the_constructor_instance_type() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let strings = registry.strings();
    let widget = strings.intern("Widget");
    let g = strings.intern("g");
    let (ctor, instance) = registry.make_constructor(widget, vec![]);

    let mut syntactic = SyntacticScope::new();
    declared_var(&mut syntactic, widget, registry.union([ctor, TypeId::NULL]));
    declared_var(&mut syntactic, g, registry.make_function(FunctionShape::simple([], TypeId::VOID)));

    // `new Widget()` resolves after stripping null/undefined.
    let callee = arena.add(NodeKind::Name(widget), []);
    let construction = arena.add(NodeKind::New, [callee]);
    // `new g()` with an ordinary function stays unset.
    let bad_callee = arena.add(NodeKind::Name(g), []);
    let bad = arena.add(NodeKind::New, [bad_callee]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();

    assert_eq!(inference.traverse(construction, &mut scope), Some(instance));
    assert_eq!(inference.traverse(bad, &mut scope), None);
    assert_eq!(arena.get_type(bad), None);
}

// =============================================================================
// Statements and branches
// =============================================================================

#[test]
fn catch_parameter_is_unknown() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let e = registry.strings().intern("e");
    let catch = arena.add(NodeKind::Catch(e), []);

    let syntactic = SyntacticScope::new();
    inference!(registry, arena, syntactic, interp, sink, inference);

    let out = inference
        .flow_through(catch, &FlowScope::new())
        .expect("well-formed catch");
    assert_eq!(out.slot(e), Some(TypeId::UNKNOWN));
}

#[test]
fn malformed_catch_aborts_the_analysis() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let catch = arena.add(NodeKind::Catch(Atom::NONE), []);

    let syntactic = SyntacticScope::new();
    inference!(registry, arena, syntactic, interp, sink, inference);

    let error = inference
        .flow_through(catch, &FlowScope::new())
        .expect_err("invariant violated");
    assert_eq!(error, GraphInvariantError::MalformedCatch(catch));
}

#[test]
fn case_without_switch_aborts_the_analysis() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let matcher = arena.add(NodeKind::Number(1.0), []);
    let case = arena.add(NodeKind::Case, [matcher]);

    let syntactic = SyntacticScope::new();
    inference!(registry, arena, syntactic, interp, sink, inference);

    let error = inference
        .flow_through(case, &FlowScope::new())
        .expect_err("invariant violated");
    assert_eq!(error, GraphInvariantError::CaseWithoutSwitch(case));
}

#[test]
fn for_in_forces_the_loop_variable_to_string() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let k = registry.strings().intern("k");
    let o = registry.strings().intern("o");

    let object = registry.make_object(registry.strings().intern("Bag"), None);
    let mut syntactic = SyntacticScope::new();
    untyped_var(&mut syntactic, k);
    declared_var(&mut syntactic, o, object);

    let subject = arena.add(NodeKind::Name(o), []);
    let for_in = arena.add(NodeKind::ForIn(k), [subject]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let scope = inference.entry_scope();

    let outs = inference
        .branched_flow_through(for_in, &scope, &[Branch::OnTrue, Branch::OnFalse])
        .expect("well-formed loop");
    assert_eq!(outs[0].slot(k), Some(TypeId::STRING));
    // The exit edge keeps the seeded binding.
    assert_eq!(outs[1].slot(k), Some(TypeId::VOID));
}

#[test]
fn case_match_edge_meets_subject_and_case_types() {
    let registry = registry();
    let mut arena = SyntaxArena::new();
    let s = registry.strings().intern("s");

    let mut syntactic = SyntacticScope::new();
    declared_var(&mut syntactic, s, registry.union([TypeId::STRING, TypeId::NUMBER]));

    let subject = arena.add(NodeKind::Name(s), []);
    let matcher = arena.add(NodeKind::Str(registry.strings().intern("lit")), []);
    let case = arena.add(NodeKind::Case, [matcher]);
    let _switch = arena.add(NodeKind::Switch, [subject, case]);

    inference!(registry, arena, syntactic, interp, sink, inference);
    let mut scope = inference.entry_scope();
    // The switch subject types first, then the case edge narrows.
    inference.traverse(subject, &mut scope);
    let outs = inference
        .branched_flow_through(case, &scope, &[Branch::CaseMatch, Branch::Unconditional])
        .expect("case under switch");
    assert_eq!(outs[0].slot(s), Some(TypeId::STRING));
    assert_eq!(
        outs[1].slot(s),
        Some(registry.union([TypeId::STRING, TypeId::NUMBER]))
    );
}
