//! Flow-sensitive type inference for the jsz JavaScript compiler.
//!
//! This crate consumes a pre-built control-flow graph over a syntax arena
//! plus the declared types from a syntactic scope, and annotates every
//! reachable expression node with the most precise type derivable from
//! declarations, assignments, and control flow. The type lattice it queries
//! lives in `jsz-types`; condition-based narrowing is delegated to a
//! [`ReverseInterpreter`] collaborator.
//!
//! One analysis run is single-threaded and synchronous; its durable outputs
//! are the node annotations, the inferred variable types written back to the
//! syntactic scope, and the property maps grown on object types.

pub mod cfg;
pub mod flow;
pub mod infer;
pub mod narrow;
pub mod scope;
pub mod syntax;

pub use cfg::{Branch, CfgNodeIndex, ControlFlowGraph};
pub use flow::{DataFlowAnalysis, FlowAnalysisResult, MAX_FLOW_ITERATIONS};
pub use infer::{BooleanOutcomePair, GraphInvariantError, TypeInference};
pub use narrow::{NoopReverseInterpreter, ReverseInterpreter, SemanticReverseInterpreter};
pub use scope::{DeclKind, FlowScope, SyntacticScope, VarDeclaration};
pub use syntax::{EqOp, Node, NodeId, NodeKind, SyntaxArena};
