//! Flow-sensitive type inference: the transfer functions.
//!
//! `TypeInference` implements the forward dataflow transfer over one
//! function or script body: `flow_through` types a node's expression tree
//! top-down and produces the outgoing scope, `branched_flow_through`
//! produces one outgoing scope per labeled CFG edge by handing the branch
//! condition to the reverse abstract interpreter.
//!
//! Missing type information anywhere in this pass degrades to Unknown and
//! is never surfaced. The only reported diagnostic is the structural
//! generic-`this` violation on calls; invariant violations in the host
//! graph (a case outside a switch, a malformed catch) abort the analysis
//! of the current function with [`GraphInvariantError`].

use crate::cfg::Branch;
use crate::narrow::{ReverseInterpreter, SemanticReverseInterpreter};
use crate::scope::{DeclKind, FlowScope, SyntacticScope};
use crate::syntax::{NodeId, NodeKind, SyntaxArena};
use jsz_common::diagnostics::{diagnostic_messages, Diagnostic, DiagnosticSink};
use jsz_common::interner::Atom;
use jsz_types::{
    lattice, restrict_by_boolean_outcome, restrict_by_not_null_or_undefined, to_boolean_outcomes,
    BooleanOutcomes, FunctionKind, FunctionShape, TypeData, TypeId, TypeRegistry, ValueKind,
};
use smallvec::SmallVec;
use std::fmt;
use tracing::trace;

// =============================================================================
// Host-graph invariant violations
// =============================================================================

/// A bug in the upstream control-flow builder, not in user input: the
/// analysis of the offending function aborts instead of degrading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphInvariantError {
    /// A case node appeared with no enclosing switch.
    CaseWithoutSwitch(NodeId),
    /// A catch clause without a binding for the thrown value.
    MalformedCatch(NodeId),
}

impl fmt::Display for GraphInvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphInvariantError::CaseWithoutSwitch(node) => {
                write!(f, "case node {} has no enclosing switch", node.0)
            }
            GraphInvariantError::MalformedCatch(node) => {
                write!(f, "catch clause {} has no binding", node.0)
            }
        }
    }
}

impl std::error::Error for GraphInvariantError {}

// =============================================================================
// Short-circuit bookkeeping
// =============================================================================

/// The two outcome sets tracked through a short-circuiting expression: the
/// ToBoolean outcomes of the whole expression, and the subset produced by
/// operands that are themselves boolean-typed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BooleanOutcomePair {
    pub to_boolean_outcomes: BooleanOutcomes,
    pub boolean_values: BooleanOutcomes,
}

/// The outcomes contributed by the boolean-typed part of a type: a boolean
/// operand can produce either value, anything else contributes nothing.
fn boolean_values_of(registry: &TypeRegistry, ty: TypeId) -> BooleanOutcomes {
    match registry.lookup(registry.unwrap_proxy(ty)) {
        TypeData::Value(ValueKind::Boolean) | TypeData::ValueObject(ValueKind::Boolean) => {
            BooleanOutcomes::BOTH
        }
        TypeData::Union(list) => {
            let alts = registry.type_list(list);
            alts.iter().fold(BooleanOutcomes::empty(), |acc, &alt| {
                acc | boolean_values_of(registry, alt)
            })
        }
        TypeData::Unknown | TypeData::CheckedUnknown | TypeData::All => BooleanOutcomes::BOTH,
        _ => BooleanOutcomes::empty(),
    }
}

// =============================================================================
// TypeInference
// =============================================================================

pub struct TypeInference<'a> {
    registry: &'a TypeRegistry,
    arena: &'a SyntaxArena,
    syntactic: &'a SyntacticScope,
    reverse: &'a dyn ReverseInterpreter,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> TypeInference<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        arena: &'a SyntaxArena,
        syntactic: &'a SyntacticScope,
        reverse: &'a dyn ReverseInterpreter,
        sink: &'a dyn DiagnosticSink,
    ) -> Self {
        Self {
            registry,
            arena,
            syntactic,
            reverse,
            sink,
        }
    }

    /// The initial state: declared parameter/variable types, with untyped
    /// `var` locals pre-seeded to the void type.
    pub fn entry_scope(&self) -> FlowScope {
        let mut scope = FlowScope::new();
        for name in self.syntactic.declared_names() {
            let decl = self.syntactic.declaration(name).expect("declared name");
            let ty = decl.declared_ty.unwrap_or(match decl.kind {
                DeclKind::Param => TypeId::UNKNOWN,
                DeclKind::Var => TypeId::VOID,
            });
            scope.insert(name, ty);
        }
        scope
    }

    /// Transfer function for a node with a single unconditional successor.
    pub fn flow_through(
        &self,
        node: NodeId,
        input: &FlowScope,
    ) -> Result<FlowScope, GraphInvariantError> {
        // Unreached code stays unreached; nothing under it gets a type.
        if input.is_bottom() {
            return Ok(FlowScope::bottom());
        }
        let mut scope = input.child();
        let Some(data) = self.arena.get(node) else {
            return Ok(scope);
        };
        match data.kind {
            NodeKind::ExprStmt | NodeKind::Return | NodeKind::Throw => {
                let child = self.arena.child(node, 0);
                if !child.is_none() {
                    self.traverse(child, &mut scope);
                }
            }
            NodeKind::VarDecl(name) => {
                let init = self.arena.child(node, 0);
                if !init.is_none() {
                    if let Some(ty) = self.traverse(init, &mut scope) {
                        self.assign_to_name(name, ty, &mut scope);
                    }
                }
            }
            NodeKind::If | NodeKind::While | NodeKind::Switch => {
                self.traverse(self.arena.child(node, 0), &mut scope);
            }
            NodeKind::ForIn(_) => {
                self.traverse(self.arena.child(node, 0), &mut scope);
            }
            NodeKind::Case => {
                let switch = self.arena.parent(node);
                let under_switch = self
                    .arena
                    .get(switch)
                    .is_some_and(|parent| matches!(parent.kind, NodeKind::Switch));
                if !under_switch {
                    return Err(GraphInvariantError::CaseWithoutSwitch(node));
                }
                self.traverse(self.arena.child(node, 0), &mut scope);
            }
            NodeKind::Catch(name) => {
                if name == Atom::NONE {
                    return Err(GraphInvariantError::MalformedCatch(node));
                }
                // Any value may be thrown.
                scope.insert(name, TypeId::UNKNOWN);
            }
            NodeKind::Block | NodeKind::Empty | NodeKind::FunctionLit(_) => {}
            _ => {
                // A bare expression used directly as a CFG node.
                self.traverse(node, &mut scope);
            }
        }
        Ok(scope)
    }

    /// Transfer function for a node with labeled outgoing edges: one scope
    /// per edge, narrowed by the reverse interpreter where the label calls
    /// for it.
    pub fn branched_flow_through(
        &self,
        node: NodeId,
        input: &FlowScope,
        branches: &[Branch],
    ) -> Result<Vec<FlowScope>, GraphInvariantError> {
        if input.is_bottom() {
            return Ok(branches.iter().map(|_| FlowScope::bottom()).collect());
        }
        let out = self.flow_through(node, input)?;
        let kind = self.arena.get(node).map(|data| data.kind);

        let condition = match kind {
            Some(NodeKind::If | NodeKind::While) => self.arena.child(node, 0),
            Some(
                NodeKind::ForIn(_) | NodeKind::Switch | NodeKind::Case | NodeKind::Catch(_),
            ) => NodeId::NONE,
            Some(_) => node,
            None => NodeId::NONE,
        };

        let mut scopes = Vec::with_capacity(branches.len());
        for &branch in branches {
            let scope = match branch {
                // Exception edges approximate: the post-state flows on as if
                // the node completed.
                Branch::Unconditional | Branch::OnException => out.clone(),
                Branch::OnTrue => match kind {
                    Some(NodeKind::ForIn(loop_var)) => {
                        let mut body = out.child();
                        body.insert(loop_var, TypeId::STRING);
                        body
                    }
                    Some(NodeKind::Case) => self.case_match_scope(node, &out),
                    _ if !condition.is_none() => self.reverse.narrow(condition, &out, true),
                    _ => out.clone(),
                },
                Branch::OnFalse => {
                    if condition.is_none() {
                        out.clone()
                    } else {
                        self.reverse.narrow(condition, &out, false)
                    }
                }
                Branch::CaseMatch => match kind {
                    Some(NodeKind::Case) => self.case_match_scope(node, &out),
                    _ => out.clone(),
                },
            };
            scopes.push(scope);
        }
        Ok(scopes)
    }

    /// On a matching case edge, the switch subject is known to equal the
    /// case expression; meet their types.
    fn case_match_scope(&self, case: NodeId, scope: &FlowScope) -> FlowScope {
        let switch = self.arena.parent(case);
        let subject = self.arena.child(switch, 0);
        let Some(key) = SemanticReverseInterpreter::reference_key(self.arena, self.registry, subject)
        else {
            return scope.clone();
        };
        let Some(subject_ty) = scope.slot(key).or_else(|| self.arena.get_type(subject)) else {
            return scope.clone();
        };
        let Some(case_ty) = self.arena.get_type(self.arena.child(case, 0)) else {
            return scope.clone();
        };
        let met = lattice::greatest_subtype(self.registry, subject_ty, case_ty);
        let mut narrowed = scope.child();
        narrowed.insert(key, met);
        narrowed
    }

    // =========================================================================
    // Expression typing
    // =========================================================================

    /// Type one expression tree top-down, annotating every node that yields
    /// a type and updating `scope` with assignments and read-narrowings.
    pub fn traverse(&self, node: NodeId, scope: &mut FlowScope) -> Option<TypeId> {
        let data = self.arena.get(node)?;
        let ty: Option<TypeId> = match data.kind {
            // ----- the literal/operator table -----
            NodeKind::Number(_) => Some(TypeId::NUMBER),
            NodeKind::Str(_) => Some(TypeId::STRING),
            NodeKind::Regex => Some(self.registry.natives().regexp),
            NodeKind::Bool(_) => Some(TypeId::BOOLEAN),
            NodeKind::Null => Some(TypeId::NULL),
            NodeKind::Undefined => Some(TypeId::VOID),
            NodeKind::This => Some(self.syntactic.this_type().unwrap_or(TypeId::UNKNOWN)),
            NodeKind::ArrayLit => {
                for &child in &data.children {
                    self.traverse(child, scope);
                }
                Some(self.registry.natives().array)
            }
            NodeKind::ObjectLit => Some(self.traverse_object_literal(node, scope)),
            NodeKind::LitProp(_) => self.traverse(self.arena.child(node, 0), scope),

            NodeKind::Name(name) => Some(self.traverse_name(name, scope)),
            NodeKind::PropAccess(prop) => Some(self.traverse_prop_access(node, prop, scope)),
            NodeKind::ElemAccess => {
                let object = self.arena.child(node, 0);
                self.traverse(object, scope);
                self.traverse(self.arena.child(node, 1), scope);
                self.narrow_base_after_read(object, scope);
                Some(TypeId::UNKNOWN)
            }

            NodeKind::Assign => {
                let target = self.arena.child(node, 0);
                let value = self.arena.child(node, 1);
                let value_ty = self.traverse(value, scope).unwrap_or(TypeId::UNKNOWN);
                self.assign_to(target, value_ty, scope);
                Some(value_ty)
            }
            NodeKind::AssignAdd => {
                let target = self.arena.child(node, 0);
                let value = self.arena.child(node, 1);
                let left_ty = self.traverse(target, scope).unwrap_or(TypeId::UNKNOWN);
                let right_ty = self.traverse(value, scope).unwrap_or(TypeId::UNKNOWN);
                let result = self.add_type(left_ty, right_ty);
                self.assign_to(target, result, scope);
                Some(result)
            }
            NodeKind::Add => {
                let left = self.traverse(self.arena.child(node, 0), scope);
                let right = self.traverse(self.arena.child(node, 1), scope);
                Some(self.add_type(
                    left.unwrap_or(TypeId::UNKNOWN),
                    right.unwrap_or(TypeId::UNKNOWN),
                ))
            }
            NodeKind::Arithmetic | NodeKind::Bitwise => {
                for &child in &data.children {
                    self.traverse(child, scope);
                }
                Some(TypeId::NUMBER)
            }
            NodeKind::Compare
            | NodeKind::Equality(_)
            | NodeKind::In
            | NodeKind::InstanceOf
            | NodeKind::Not
            | NodeKind::Delete => {
                for &child in &data.children {
                    self.traverse(child, scope);
                }
                Some(TypeId::BOOLEAN)
            }
            NodeKind::TypeOf => {
                self.traverse(self.arena.child(node, 0), scope);
                Some(TypeId::STRING)
            }
            NodeKind::VoidOp => {
                self.traverse(self.arena.child(node, 0), scope);
                Some(TypeId::VOID)
            }
            NodeKind::Comma => {
                self.traverse(self.arena.child(node, 0), scope);
                self.traverse(self.arena.child(node, 1), scope)
            }
            NodeKind::Ternary => self.traverse_ternary(node, scope),
            NodeKind::And => Some(self.traverse_short_circuit(node, scope, true)),
            NodeKind::Or => Some(self.traverse_short_circuit(node, scope, false)),
            NodeKind::Call => Some(self.traverse_call(node, scope)),
            NodeKind::New => self.traverse_new(node, scope),
            NodeKind::FunctionLit(declared) => {
                Some(declared.unwrap_or(self.registry.natives().function))
            }
            NodeKind::Cast(target_ty) => {
                let child = self.arena.child(node, 0);
                self.traverse(child, scope);
                // A cast on a (qualified) name narrows exactly like an
                // assignment to it.
                if let Some(key) =
                    SemanticReverseInterpreter::reference_key(self.arena, self.registry, child)
                {
                    scope.insert(key, target_ty);
                }
                Some(target_ty)
            }

            // Statement kinds never produce a value.
            _ => None,
        };
        if let Some(ty) = ty {
            self.arena.set_type(node, ty);
        }
        ty
    }

    fn traverse_object_literal(&self, node: NodeId, scope: &mut FlowScope) -> TypeId {
        let obj_ty = self.registry.make_anonymous_object();
        let TypeData::Object(obj_id) = self.registry.lookup(obj_ty) else {
            return obj_ty;
        };
        let children: SmallVec<[NodeId; 8]> = self
            .arena
            .get(node)
            .map(|data| data.children.iter().copied().collect())
            .unwrap_or_default();
        for child in children {
            let Some(NodeKind::LitProp(name)) = self.arena.get(child).map(|n| n.kind) else {
                continue;
            };
            let value_ty = self.traverse(child, scope).unwrap_or(TypeId::UNKNOWN);
            self.registry.define_inferred_property(obj_id, name, value_ty);
        }
        obj_ty
    }

    fn traverse_name(&self, name: Atom, scope: &FlowScope) -> TypeId {
        if let Some(ty) = scope.slot(name) {
            return ty;
        }
        if let Some(decl) = self.syntactic.declaration(name) {
            if let Some(ty) = decl.declared_ty {
                return ty;
            }
        }
        // A bare reference to a registered type name yields its constructor.
        if let Some(ty) = self.registry.global_name(name) {
            return ty;
        }
        TypeId::UNKNOWN
    }

    fn traverse_prop_access(&self, node: NodeId, prop: Atom, scope: &mut FlowScope) -> TypeId {
        let object = self.arena.child(node, 0);
        let object_ty = self.traverse(object, scope).unwrap_or(TypeId::UNKNOWN);
        let path = SemanticReverseInterpreter::reference_key(self.arena, self.registry, node);

        let ty = if let Some(bound) = path.and_then(|key| scope.slot(key)) {
            if bound == TypeId::UNKNOWN {
                // The binding was recorded explicitly, so this Unknown has
                // been vouched for at this point of the flow.
                TypeId::CHECKED_UNKNOWN
            } else {
                bound
            }
        } else if let Some(found) = self.property_type(object_ty, prop) {
            found
        } else if let Some(global) = path.and_then(|key| self.registry.global_name(key)) {
            global
        } else {
            TypeId::UNKNOWN
        };

        // Dereferencing proves the base was not null/undefined.
        self.narrow_base_after_read(object, scope);
        ty
    }

    /// Property lookup used for reads: unions join the alternates that know
    /// the property; the nullable part of the base is ignored.
    fn property_type(&self, object_ty: TypeId, prop: Atom) -> Option<TypeId> {
        let base = restrict_by_not_null_or_undefined(self.registry, object_ty);
        match self.registry.lookup(self.registry.unwrap_proxy(base)) {
            TypeData::Union(list) => {
                let alts = self.registry.type_list(list);
                let mut found: Option<TypeId> = None;
                for &alt in alts.iter() {
                    if let Some(ty) = self.property_type(alt, prop) {
                        found = Some(match found {
                            Some(acc) => lattice::least_supertype(self.registry, acc, ty),
                            None => ty,
                        });
                    }
                }
                found
            }
            _ => self.registry.find_property(base, prop).map(|p| p.ty),
        }
    }

    /// After any property or element read, the base reference cannot have
    /// been null/undefined; record that in the scope.
    fn narrow_base_after_read(&self, object: NodeId, scope: &mut FlowScope) {
        let Some(key) = SemanticReverseInterpreter::reference_key(self.arena, self.registry, object)
        else {
            return;
        };
        let Some(current) = scope
            .slot(key)
            .or_else(|| self.arena.get_type(object))
        else {
            return;
        };
        let restricted = restrict_by_not_null_or_undefined(self.registry, current);
        if restricted != current && restricted != TypeId::NO_TYPE {
            trace!(?key, "base narrowed by dereference");
            scope.insert(key, restricted);
        }
    }

    // =========================================================================
    // Assignment
    // =========================================================================

    fn assign_to(&self, target: NodeId, value_ty: TypeId, scope: &mut FlowScope) {
        let Some(data) = self.arena.get(target) else {
            return;
        };
        match data.kind {
            NodeKind::Name(name) => {
                self.assign_to_name(name, value_ty, scope);
                self.arena.set_type(target, value_ty);
            }
            NodeKind::PropAccess(prop) => {
                let object = self.arena.child(target, 0);
                let object_ty = self
                    .arena
                    .get_type(object)
                    .or_else(|| self.traverse(object, scope))
                    .unwrap_or(TypeId::UNKNOWN);
                // The scope remembers the exact dotted path.
                if let Some(path) =
                    SemanticReverseInterpreter::reference_key(self.arena, self.registry, target)
                {
                    scope.insert(path, value_ty);
                }
                self.record_property_assignment(object, object_ty, prop, value_ty);
                self.arena.set_type(target, value_ty);
            }
            NodeKind::ElemAccess => {
                self.traverse(self.arena.child(target, 0), scope);
                self.traverse(self.arena.child(target, 1), scope);
            }
            _ => {
                self.traverse(target, scope);
            }
        }
    }

    fn assign_to_name(&self, name: Atom, value_ty: TypeId, scope: &mut FlowScope) {
        let rebind = match self.syntactic.declaration(name) {
            // Undeclared names are tracked purely by inference.
            None => true,
            Some(decl) => decl.declared_ty.is_none() || decl.type_inferred,
        };
        if rebind {
            scope.insert(name, value_ty);
            self.syntactic.set_inferred_type(name, value_ty);
        }
    }

    /// The property-inference policy for `owner.prop = value`:
    /// a property literally named "prototype" is declared; otherwise infer
    /// when the property already exists or the owner is anonymous; on a
    /// nominal instance, infer only for `this.prop` inside a constructor,
    /// and otherwise just register the name with the registry.
    fn record_property_assignment(
        &self,
        object: NodeId,
        object_ty: TypeId,
        prop: Atom,
        value_ty: TypeId,
    ) {
        let base = restrict_by_not_null_or_undefined(self.registry, object_ty);
        let TypeData::Object(obj_id) = self.registry.lookup(self.registry.unwrap_proxy(base))
        else {
            self.registry.register_property_name(prop);
            return;
        };
        let Some(data) = self.registry.object_data(obj_id) else {
            return;
        };

        if prop == self.registry.strings().intern("prototype") {
            self.registry
                .define_declared_property(obj_id, prop, value_ty, false);
            return;
        }

        let is_nominal_instance = data.name.is_some();
        if data.has_own_property(prop) || !is_nominal_instance {
            self.registry.define_inferred_property(obj_id, prop, value_ty);
            return;
        }

        let through_this = self
            .arena
            .get(object)
            .is_some_and(|n| matches!(n.kind, NodeKind::This));
        if through_this && self.syntactic.is_constructor() {
            self.registry.define_inferred_property(obj_id, prop, value_ty);
        } else {
            self.registry.register_property_name(prop);
        }
    }

    // =========================================================================
    // Operators with structure
    // =========================================================================

    /// The addition table. `+` is the one operator whose result type depends
    /// on both operand types.
    fn add_type(&self, left: TypeId, right: TypeId) -> TypeId {
        let left_unknown = matches!(left, TypeId::UNKNOWN | TypeId::CHECKED_UNKNOWN);
        let right_unknown = matches!(right, TypeId::UNKNOWN | TypeId::CHECKED_UNKNOWN);
        if left_unknown && right_unknown {
            return TypeId::UNKNOWN;
        }
        if self.is_string_like(left) || self.is_string_like(right) {
            return TypeId::STRING;
        }
        if left_unknown || right_unknown {
            return TypeId::UNKNOWN;
        }
        if self.is_numeric_like(left) && self.is_numeric_like(right) {
            return TypeId::NUMBER;
        }
        self.registry.union2(TypeId::STRING, TypeId::NUMBER)
    }

    fn is_string_like(&self, ty: TypeId) -> bool {
        matches!(
            self.registry.lookup(self.registry.unwrap_proxy(ty)),
            TypeData::Value(ValueKind::String) | TypeData::ValueObject(ValueKind::String)
        )
    }

    /// Types that reduce to a number under arithmetic coercion: void, null,
    /// number, boolean, and their object forms.
    fn is_numeric_like(&self, ty: TypeId) -> bool {
        match self.registry.lookup(self.registry.unwrap_proxy(ty)) {
            TypeData::Value(
                ValueKind::Number | ValueKind::Boolean | ValueKind::Null | ValueKind::Void,
            )
            | TypeData::ValueObject(ValueKind::Number | ValueKind::Boolean) => true,
            TypeData::Union(list) => {
                let alts = self.registry.type_list(list);
                alts.iter().all(|&alt| self.is_numeric_like(alt))
            }
            _ => false,
        }
    }

    fn traverse_ternary(&self, node: NodeId, scope: &mut FlowScope) -> Option<TypeId> {
        let condition = self.arena.child(node, 0);
        let when_true = self.arena.child(node, 1);
        let when_false = self.arena.child(node, 2);

        self.traverse(condition, scope);
        let true_in = self.reverse.narrow(condition, scope, true);
        let false_in = self.reverse.narrow(condition, scope, false);

        let mut true_scope = true_in.child();
        let mut false_scope = false_in.child();
        let true_ty = if true_in.is_bottom() {
            None
        } else {
            self.traverse(when_true, &mut true_scope)
        };
        let false_ty = if false_in.is_bottom() {
            None
        } else {
            self.traverse(when_false, &mut false_scope)
        };

        *scope = FlowScope::join(self.registry, &true_scope, &false_scope);

        // If either branch failed to produce a type, the whole expression is
        // left unset rather than guessed.
        match (true_ty, false_ty) {
            (Some(a), Some(b)) => Some(lattice::least_supertype(self.registry, a, b)),
            _ => None,
        }
    }

    /// Short-circuiting `&&` (`is_and`) and `||`.
    ///
    /// Three candidate outgoing scopes exist: evaluation stopped after the
    /// left operand, both operands evaluated, and the join of the two when
    /// nothing is known about how far evaluation got. The joined scope flows
    /// out; branch edges recover the precise variants through the reverse
    /// interpreter. Alongside the result type this tracks the outcome pair
    /// so nested short-circuits compose.
    fn traverse_short_circuit(&self, node: NodeId, scope: &mut FlowScope, is_and: bool) -> TypeId {
        let left = self.arena.child(node, 0);
        let right = self.arena.child(node, 1);

        let left_ty = self.traverse(left, scope).unwrap_or(TypeId::UNKNOWN);
        let left_outcomes = to_boolean_outcomes(self.registry, left_ty);

        // The outcome that stops evaluation after the left operand.
        let stop_outcome = !is_and;
        let left_only_scope = self.reverse.narrow(left, scope, stop_outcome);
        let continue_in = self.reverse.narrow(left, scope, is_and);

        let mut both_scope = continue_in.child();
        let right_ty = if continue_in.is_bottom() {
            None
        } else {
            self.traverse(right, &mut both_scope)
        };
        let right_ty_or_unknown = right_ty.unwrap_or(TypeId::UNKNOWN);

        // The short-circuit contribution is the left type narrowed to the
        // outcome that stopped evaluation; if that outcome is impossible,
        // the whole expression takes the right type.
        let stopped_left = restrict_by_boolean_outcome(self.registry, left_ty, stop_outcome);
        let ty = lattice::least_supertype(self.registry, stopped_left, right_ty_or_unknown);

        let right_outcomes = if continue_in.is_bottom() {
            BooleanOutcomes::empty()
        } else {
            to_boolean_outcomes(self.registry, right_ty_or_unknown)
        };
        let stop_set = if is_and {
            BooleanOutcomes::FALSE
        } else {
            BooleanOutcomes::TRUE
        };
        let pair = BooleanOutcomePair {
            to_boolean_outcomes: (left_outcomes & stop_set) | right_outcomes,
            boolean_values: (boolean_values_of(self.registry, left_ty) & stop_set)
                | boolean_values_of(self.registry, right_ty_or_unknown),
        };
        trace!(?pair, "short-circuit outcome pair");

        *scope = FlowScope::join(self.registry, &left_only_scope, &both_scope);
        ty
    }

    // =========================================================================
    // Calls and construction
    // =========================================================================

    fn traverse_call(&self, node: NodeId, scope: &mut FlowScope) -> TypeId {
        let data = self.arena.get(node);
        let children: SmallVec<[NodeId; 4]> = data
            .map(|d| d.children.iter().copied().collect())
            .unwrap_or_default();
        let Some((&callee, args)) = children.split_first() else {
            return TypeId::UNKNOWN;
        };

        let callee_ty = self.traverse(callee, scope).unwrap_or(TypeId::UNKNOWN);
        let mut arg_tys: SmallVec<[TypeId; 4]> = SmallVec::new();
        for &arg in args {
            arg_tys.push(self.traverse(arg, scope).unwrap_or(TypeId::UNKNOWN));
        }

        let stripped = restrict_by_not_null_or_undefined(self.registry, callee_ty);
        let TypeData::Function(shape_id) = self.registry.lookup(self.registry.unwrap_proxy(stripped))
        else {
            return TypeId::UNKNOWN;
        };
        let shape = self.registry.function_shape(shape_id);

        self.backtype_function_arguments(node, callee, &shape, args, &arg_tys);
        shape.ret
    }

    /// Push declared parameter types onto anonymous function-literal
    /// arguments, including the generic `this` wiring.
    fn backtype_function_arguments(
        &self,
        call: NodeId,
        callee: NodeId,
        shape: &FunctionShape,
        args: &[NodeId],
        arg_tys: &[TypeId],
    ) {
        // A function-typed parameter retypes an unannotated function literal
        // in the matching argument position.
        for (param, &arg) in shape.params.iter().zip(args.iter()) {
            let param_is_function = matches!(
                self.registry.lookup(self.registry.unwrap_proxy(param.ty)),
                TypeData::Function(_)
            );
            if param_is_function && self.is_unannotated_function_literal(arg) {
                self.arena.set_type(arg, param.ty);
            }
        }

        // Generic `this` propagation: a parameter typed `function(this: T)`
        // needs a sibling parameter typed `T` to learn the concrete type.
        let Some(this_template) = shape.this_template else {
            return;
        };
        let mut literal_param: Option<usize> = None;
        for (index, param) in shape.params.iter().enumerate() {
            if let TypeData::Function(inner_id) =
                self.registry.lookup(self.registry.unwrap_proxy(param.ty))
            {
                let inner = self.registry.function_shape(inner_id);
                if matches!(
                    self.registry.lookup(inner.this_ty),
                    TypeData::TemplateParam(p) if p.name == this_template
                ) {
                    literal_param = Some(index);
                    break;
                }
            }
        }
        let Some(literal_index) = literal_param else {
            return;
        };

        let concrete_index = shape.params.iter().position(|param| {
            matches!(
                self.registry.lookup(param.ty),
                TypeData::TemplateParam(p) if p.name == this_template
            )
        });
        let Some(concrete_index) = concrete_index else {
            let span = self
                .arena
                .get(call)
                .map(|data| data.span)
                .unwrap_or_default();
            let callee_name = self
                .arena
                .get_type(callee)
                .map(|ty| jsz_types::display(self.registry, ty))
                .unwrap_or_else(|| "(unknown)".to_string());
            self.sink.report(Diagnostic::from_template(
                diagnostic_messages::EXPECTED_THIS_TYPE,
                span,
                &[&callee_name],
            ));
            return;
        };

        let Some(&concrete_ty) = arg_tys.get(concrete_index) else {
            return;
        };
        let Some(&literal_arg) = args.get(literal_index) else {
            return;
        };
        if !self.is_unannotated_function_literal(literal_arg) {
            return;
        }
        if let TypeData::Function(inner_id) = self
            .registry
            .lookup(self.registry.unwrap_proxy(shape.params[literal_index].ty))
        {
            let inner = self.registry.function_shape(inner_id);
            let mut instantiated = (*inner).clone();
            instantiated.this_ty = concrete_ty;
            let retyped = self.registry.make_function(instantiated);
            self.arena.set_type(literal_arg, retyped);
        }
    }

    fn is_unannotated_function_literal(&self, node: NodeId) -> bool {
        matches!(
            self.arena.get(node).map(|data| data.kind),
            Some(NodeKind::FunctionLit(None))
        )
    }

    fn traverse_new(&self, node: NodeId, scope: &mut FlowScope) -> Option<TypeId> {
        let data = self.arena.get(node);
        let children: SmallVec<[NodeId; 4]> = data
            .map(|d| d.children.iter().copied().collect())
            .unwrap_or_default();
        let (&ctor, args) = children.split_first()?;

        let ctor_ty = self.traverse(ctor, scope).unwrap_or(TypeId::UNKNOWN);
        for &arg in args {
            self.traverse(arg, scope);
        }

        let stripped = restrict_by_not_null_or_undefined(self.registry, ctor_ty);
        match self.registry.lookup(self.registry.unwrap_proxy(stripped)) {
            TypeData::Function(shape_id) => {
                let shape = self.registry.function_shape(shape_id);
                if shape.kind == FunctionKind::Constructor {
                    shape.instance
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../tests/infer_tests.rs"]
mod tests;
