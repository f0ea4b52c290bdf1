//! Core type representation.
//!
//! Every type value is interned: a [`TypeId`] is the identity of a type, and
//! `TypeId` equality is the fastest (and strictest) equality check in the
//! lattice. The payload behind an id is a [`TypeData`] — a closed sum over
//! every type kind the lattice knows about, so each lattice operation is an
//! exhaustive match and adding a kind is a compile-time-checked exercise.
//!
//! Mutable state (object property maps, named-type resolution memos) lives in
//! the registry's stores, never in `TypeData` itself.

use bitflags::bitflags;
use jsz_common::interner::Atom;
use smallvec::SmallVec;

/// Interned type identity.
///
/// Ids below [`TypeId::FIRST_DYNAMIC`] are pre-seeded intrinsics with stable
/// values, so the common types are usable as constants without a registry in
/// scope.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Top of practical reasoning: used whenever no information is available.
    pub const UNKNOWN: TypeId = TypeId(0);
    /// An Unknown that a flow-scope binding has vouched for.
    pub const CHECKED_UNKNOWN: TypeId = TypeId(1);
    /// Syntactic top of the lattice.
    pub const ALL: TypeId = TypeId(2);
    /// Absolute bottom: no value at all.
    pub const NO_TYPE: TypeId = TypeId(3);
    /// Object bottom: no object value.
    pub const NO_OBJECT: TypeId = TypeId(4);
    /// Canonical marker for a named type that has not resolved yet.
    pub const NO_RESOLVED: TypeId = TypeId(5);
    pub const NUMBER: TypeId = TypeId(6);
    pub const STRING: TypeId = TypeId(7);
    pub const BOOLEAN: TypeId = TypeId(8);
    pub const NULL: TypeId = TypeId(9);
    pub const VOID: TypeId = TypeId(10);
    /// Boxed counterpart of `number`.
    pub const NUMBER_OBJECT: TypeId = TypeId(11);
    /// Boxed counterpart of `string`.
    pub const STRING_OBJECT: TypeId = TypeId(12);
    /// Boxed counterpart of `boolean`.
    pub const BOOLEAN_OBJECT: TypeId = TypeId(13);

    /// First id handed out by the interner for non-intrinsic types.
    pub const FIRST_DYNAMIC: u32 = 14;
}

/// The scalar value kinds and their boxed object counterparts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Number,
    String,
    Boolean,
    Null,
    Void,
}

impl ValueKind {
    /// The boxed object counterpart, if the language defines one.
    /// `null` and `void` have no object form.
    pub const fn boxed(self) -> Option<TypeId> {
        match self {
            ValueKind::Number => Some(TypeId::NUMBER_OBJECT),
            ValueKind::String => Some(TypeId::STRING_OBJECT),
            ValueKind::Boolean => Some(TypeId::BOOLEAN_OBJECT),
            ValueKind::Null | ValueKind::Void => None,
        }
    }

    /// The unboxed value counterpart of a boxed kind.
    pub const fn unboxed(self) -> TypeId {
        match self {
            ValueKind::Number => TypeId::NUMBER,
            ValueKind::String => TypeId::STRING,
            ValueKind::Boolean => TypeId::BOOLEAN,
            ValueKind::Null => TypeId::NULL,
            ValueKind::Void => TypeId::VOID,
        }
    }
}

/// Reference into the registry's object store.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u32);

/// Reference into the registry's function-shape store.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionShapeId(pub u32);

/// Reference into the registry's enum store.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumId(pub u32);

/// Reference into the registry's named-type (forward reference) store.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NamedTypeId(pub u32);

/// Interned, sorted, deduplicated list of union alternates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeListId(pub u32);

/// Interned, name-sorted field list of a record type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordShapeId(pub u32);

/// The closed sum of type kinds. Kept `Copy`: all payloads are ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Unknown,
    CheckedUnknown,
    All,
    NoType,
    NoObject,
    /// Canonical not-yet-resolved placeholder; unresolved named references
    /// collapse to this in joins so joins stay symmetric.
    NoResolved,
    Value(ValueKind),
    /// Boxed object form of `number`/`string`/`boolean`.
    ValueObject(ValueKind),
    Object(ObjectId),
    Function(FunctionShapeId),
    Union(TypeListId),
    Enum(EnumId),
    EnumElement(EnumId),
    Record(RecordShapeId),
    /// Generic placeholder bound during instantiation. Equivalence compares
    /// the bound types under the active mode.
    TemplateParam(TemplateParamData),
    /// Forward reference to a named type, resolved lazily by the registry.
    NamedRef(NamedTypeId),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TemplateParamData {
    pub name: Atom,
    /// Defaults to `TypeId::UNKNOWN` until instantiation binds it.
    pub bound: TypeId,
}

// =============================================================================
// Function shapes
// =============================================================================

/// Classification of a function type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Ordinary,
    Constructor,
    Interface,
}

/// One ordered parameter of a function type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParamInfo {
    pub ty: TypeId,
    pub optional: bool,
    pub variadic: bool,
}

impl ParamInfo {
    pub const fn required(ty: TypeId) -> Self {
        Self {
            ty,
            optional: false,
            variadic: false,
        }
    }
}

/// Structural payload of a function type. Interned by value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionShape {
    pub params: SmallVec<[ParamInfo; 4]>,
    pub ret: TypeId,
    /// Type of `this` inside the function body. `TypeId::UNKNOWN` when the
    /// declaration says nothing.
    pub this_ty: TypeId,
    pub kind: FunctionKind,
    /// Template parameter names declared on the function.
    pub template_names: SmallVec<[Atom; 2]>,
    /// For generics: the template name whose binding is usable as the type
    /// of `this` for one `function(this: T, ...)`-typed parameter.
    pub this_template: Option<Atom>,
    /// For constructors/interfaces: the instance type produced by `new`.
    pub instance: Option<TypeId>,
}

impl FunctionShape {
    /// An ordinary function with required parameters and a return type.
    pub fn simple(params: impl IntoIterator<Item = TypeId>, ret: TypeId) -> Self {
        Self {
            params: params.into_iter().map(ParamInfo::required).collect(),
            ret,
            this_ty: TypeId::UNKNOWN,
            kind: FunctionKind::Ordinary,
            template_names: SmallVec::new(),
            this_template: None,
            instance: None,
        }
    }
}

// =============================================================================
// Template maps
// =============================================================================

/// Template parameter names of a nominal type and the types bound to them.
///
/// Bindings are padded with `TypeId::UNKNOWN` when fewer are supplied than
/// there are names; supplying more bindings than names is a programming error
/// in the caller.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct TemplateMap {
    names: SmallVec<[Atom; 2]>,
    bindings: SmallVec<[TypeId; 2]>,
}

impl TemplateMap {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(names: impl IntoIterator<Item = Atom>, bindings: impl IntoIterator<Item = TypeId>) -> Self {
        let names: SmallVec<[Atom; 2]> = names.into_iter().collect();
        let mut bindings: SmallVec<[TypeId; 2]> = bindings.into_iter().collect();
        assert!(
            bindings.len() <= names.len(),
            "more template bindings than template names"
        );
        bindings.resize(names.len(), TypeId::UNKNOWN);
        Self { names, bindings }
    }

    pub fn names(&self) -> &[Atom] {
        &self.names
    }

    pub fn bindings(&self) -> &[TypeId] {
        &self.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The binding for a template name, if declared.
    pub fn binding(&self, name: Atom) -> Option<TypeId> {
        self.names
            .iter()
            .position(|&n| n == name)
            .map(|i| self.bindings[i])
    }
}

// =============================================================================
// Properties
// =============================================================================

bitflags! {
    /// Attribute flags on an object property.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u8 {
        /// Type came from an explicit annotation (vs observed assignments).
        const DECLARED = 1 << 0;
        /// Declared outside the program under analysis.
        const EXTERN = 1 << 1;
    }
}

/// One property of an object type.
///
/// Inferred properties keep a running join of observed assignment types;
/// declared properties never retype.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Property {
    pub ty: TypeId,
    pub flags: PropertyFlags,
}

impl Property {
    pub const fn declared(ty: TypeId) -> Self {
        Self {
            ty,
            flags: PropertyFlags::DECLARED,
        }
    }

    pub const fn inferred(ty: TypeId) -> Self {
        Self {
            ty,
            flags: PropertyFlags::empty(),
        }
    }

    pub const fn is_declared(self) -> bool {
        self.flags.contains(PropertyFlags::DECLARED)
    }

    pub const fn is_extern(self) -> bool {
        self.flags.contains(PropertyFlags::EXTERN)
    }
}

// =============================================================================
// ToBoolean outcomes
// =============================================================================

bitflags! {
    /// Which of {true, false} a value's truthiness coercion can produce.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct BooleanOutcomes: u8 {
        const TRUE = 1 << 0;
        const FALSE = 1 << 1;
    }
}

impl BooleanOutcomes {
    pub const BOTH: BooleanOutcomes = BooleanOutcomes::TRUE.union(BooleanOutcomes::FALSE);

    pub const fn can_be_true(self) -> bool {
        self.contains(BooleanOutcomes::TRUE)
    }

    pub const fn can_be_false(self) -> bool {
        self.contains(BooleanOutcomes::FALSE)
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
