//! Syntax arena: the boundary representation of one function or script body.
//!
//! The surrounding pipeline owns the real AST; what the inference engine
//! needs is an arena of expression/statement nodes it can walk top-down, a
//! parent link for the few structural checks it performs, and a side table
//! to write one type annotation per visited expression. Node kinds carry
//! their payload directly, so dispatch over an expression is one exhaustive
//! match.

use jsz_common::interner::Atom;
use jsz_common::span::Span;
use jsz_types::TypeId;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::cell::RefCell;

/// Index of a node in its arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }
}

/// Equality operator detail, needed for narrowing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EqOp {
    /// `==`
    Loose,
    /// `!=`
    LooseNot,
    /// `===`
    Strict,
    /// `!==`
    StrictNot,
}

impl EqOp {
    pub const fn negated(self) -> bool {
        matches!(self, EqOp::LooseNot | EqOp::StrictNot)
    }

    pub const fn strict(self) -> bool {
        matches!(self, EqOp::Strict | EqOp::StrictNot)
    }
}

/// Expression and statement kinds the engine types.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum NodeKind {
    // ----- literals -----
    Number(f64),
    Str(Atom),
    Regex,
    Bool(bool),
    Null,
    Undefined,
    This,
    /// Children: element expressions.
    ArrayLit,
    /// Children: `LitProp` entries.
    ObjectLit,
    /// One object-literal entry; child: the value expression.
    LitProp(Atom),

    // ----- references -----
    Name(Atom),
    /// Property access; child: the base object expression.
    PropAccess(Atom),
    /// Element access; children: `[object, index]`.
    ElemAccess,

    // ----- operators -----
    /// Children: `[target, value]`.
    Assign,
    /// Compound `+=`; children: `[target, value]`.
    AssignAdd,
    /// Children: `[left, right]`.
    Add,
    /// `-`, `*`, `/`, `%`, unary minus/plus; children: operands.
    Arithmetic,
    /// `&`, `|`, `^`, `<<`, `>>`, `>>>`, `~`; children: operands.
    Bitwise,
    /// `<`, `<=`, `>`, `>=`; children: `[left, right]`.
    Compare,
    /// Children: `[left, right]`.
    Equality(EqOp),
    /// `key in object`; children: `[key, object]`.
    In,
    /// Children: `[value, constructor]`.
    InstanceOf,
    /// Short-circuiting `&&`; children: `[left, right]`.
    And,
    /// Short-circuiting `||`; children: `[left, right]`.
    Or,
    /// `!`; child: operand.
    Not,
    /// `typeof`; child: operand.
    TypeOf,
    /// `void`; child: operand.
    VoidOp,
    /// `delete`; child: operand.
    Delete,
    /// Children: `[left, right]`; the value is the right operand's.
    Comma,
    /// Children: `[condition, when_true, when_false]`.
    Ternary,
    /// Children: `[callee, args...]`.
    Call,
    /// Children: `[constructor, args...]`.
    New,
    /// A function literal, with its declared function type when annotated.
    FunctionLit(Option<TypeId>),
    /// Inline type cast applied to an expression; child: the expression.
    Cast(TypeId),

    // ----- statements -----
    /// Child: the expression.
    ExprStmt,
    /// `var name [= init]`; child: the optional initializer.
    VarDecl(Atom),
    /// Child: the optional returned expression.
    Return,
    /// Child: the thrown expression.
    Throw,
    /// Child: the condition; branching is carried by the CFG edges.
    If,
    /// Child: the condition.
    While,
    /// `for (name in obj)`; child: the object expression.
    ForIn(Atom),
    /// Child: the switch subject expression.
    Switch,
    /// Child: the case match expression. Must appear under a `Switch`.
    Case,
    /// Catch clause binding the thrown value to a name.
    Catch(Atom),
    Block,
    Empty,
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub children: SmallVec<[NodeId; 2]>,
    pub span: Span,
}

/// Arena of nodes plus the type-annotation side table the engine fills in.
pub struct SyntaxArena {
    nodes: Vec<Node>,
    parents: Vec<NodeId>,
    types: RefCell<FxHashMap<NodeId, TypeId>>,
}

impl Default for SyntaxArena {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxArena {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            parents: Vec::new(),
            types: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn add(&mut self, kind: NodeKind, children: impl IntoIterator<Item = NodeId>) -> NodeId {
        self.add_spanned(kind, children, Span::DUMMY)
    }

    pub fn add_spanned(
        &mut self,
        kind: NodeKind,
        children: impl IntoIterator<Item = NodeId>,
        span: Span,
    ) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).expect("arena overflow"));
        let children: SmallVec<[NodeId; 2]> = children.into_iter().collect();
        for &child in &children {
            if let Some(slot) = self.parents.get_mut(child.0 as usize) {
                *slot = id;
            }
        }
        self.nodes.push(Node {
            kind,
            children,
            span,
        });
        self.parents.push(NodeId::NONE);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    pub fn parent(&self, id: NodeId) -> NodeId {
        self.parents.get(id.0 as usize).copied().unwrap_or(NodeId::NONE)
    }

    pub fn child(&self, id: NodeId, index: usize) -> NodeId {
        self.get(id)
            .and_then(|node| node.children.get(index).copied())
            .unwrap_or(NodeId::NONE)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Attach the inferred type annotation to an expression node.
    pub fn set_type(&self, id: NodeId, ty: TypeId) {
        self.types.borrow_mut().insert(id, ty);
    }

    /// The annotation written by the inference pass, if any.
    pub fn get_type(&self, id: NodeId) -> Option<TypeId> {
        self.types.borrow().get(&id).copied()
    }
}

#[cfg(test)]
#[path = "../tests/syntax_tests.rs"]
mod tests;
