//! Type lattice for the jsz JavaScript compiler.
//!
//! This crate is the leaf component of the type layer: a bounded lattice of
//! interned type values with join/meet, a subtype partial order, three
//! equivalence relations, truthiness outcome sets, and lazy resolution of
//! named forward references with cycle avoidance.
//!
//! Key properties:
//! - O(1) type equality via interning (`TypeId` comparison)
//! - Every lattice operation is total: malformed or cyclic type graphs
//!   degrade to Unknown or a bottom, never an error
//! - Type values are immutable; only object property maps grow, and they
//!   grow monotonically

pub mod boolean;
pub mod display;
pub mod equivalence;
mod intern;
pub mod lattice;
pub mod recursion;
pub mod registry;
mod subtype;
pub mod types;

pub use boolean::{
    restrict_by_boolean_outcome, restrict_by_not_null_or_undefined, to_boolean_outcomes,
};
pub use display::{display, TypeFormatter};
pub use equivalence::{check_equivalence, EquivalenceChecker, EquivalenceMethod};
pub use intern::TypeInterner;
pub use lattice::{greatest_subtype, least_supertype};
pub use recursion::{RecursionGuard, RecursionProfile, RecursionResult};
pub use registry::{EnumData, NativeTypes, ObjectData, TypeRegistry};
pub use subtype::{is_object_like, is_subtype, SubtypeChecker};
pub use types::{
    BooleanOutcomes, EnumId, FunctionKind, FunctionShape, FunctionShapeId, NamedTypeId, ObjectId,
    ParamInfo, Property, PropertyFlags, RecordShapeId, TemplateMap, TemplateParamData, TypeData,
    TypeId, TypeListId, ValueKind,
};
