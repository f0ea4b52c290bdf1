//! The type registry: stores behind the interned type table.
//!
//! The registry owns everything a `TypeId` can point at — object data with
//! mutable property maps, enum definitions, named forward references and
//! their resolution memos — plus the two global indexes the inference engine
//! falls back to: the name → constructor index and the property-existence
//! index.
//!
//! All stores are append-only. Property maps only grow, and an existing
//! declared property is never retyped; the surrounding pipeline enforces a
//! single-writer discipline during a run.

use crate::lattice;
use crate::types::{
    EnumId, FunctionKind, FunctionShape, FunctionShapeId, NamedTypeId, ObjectId, ParamInfo,
    Property, PropertyFlags, RecordShapeId, TemplateMap, TypeData, TypeId, TypeListId,
};
use crate::TypeInterner;
use dashmap::{DashMap, DashSet};
use indexmap::IndexMap;
use jsz_common::diagnostics::{diagnostic_messages, Diagnostic, DiagnosticSink};
use jsz_common::interner::{Atom, Interner};
use jsz_common::span::Span;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::trace;

// =============================================================================
// Object store
// =============================================================================

/// Backing data of one object type.
///
/// The property map has interior mutability because property discovery is
/// monotonic: inference appends properties and widens inferred ones, but an
/// existing declared property never changes type.
pub struct ObjectData {
    /// Nominal name, or `None` for anonymous (object-literal) types.
    pub name: Option<Atom>,
    /// Implicit prototype used for property lookup and subtyping.
    pub proto: Option<TypeId>,
    /// Template parameter names and bindings for generic nominal types.
    pub template: TemplateMap,
    props: RwLock<IndexMap<Atom, Property>>,
}

impl ObjectData {
    pub fn own_property(&self, name: Atom) -> Option<Property> {
        self.props.read().expect("object store poisoned").get(&name).copied()
    }

    pub fn has_own_property(&self, name: Atom) -> bool {
        self.props.read().expect("object store poisoned").contains_key(&name)
    }

    pub fn own_property_names(&self) -> Vec<Atom> {
        self.props.read().expect("object store poisoned").keys().copied().collect()
    }
}

struct ObjectStore {
    objects: RwLock<Vec<Arc<ObjectData>>>,
}

impl ObjectStore {
    fn new() -> Self {
        Self {
            objects: RwLock::new(Vec::new()),
        }
    }

    fn register(&self, data: ObjectData) -> ObjectId {
        let mut objects = self.objects.write().expect("object store poisoned");
        let id = ObjectId(u32::try_from(objects.len()).expect("object table overflow"));
        objects.push(Arc::new(data));
        id
    }

    fn get(&self, id: ObjectId) -> Option<Arc<ObjectData>> {
        self.objects
            .read()
            .expect("object store poisoned")
            .get(id.0 as usize)
            .cloned()
    }
}

// =============================================================================
// Enum store
// =============================================================================

/// One enum definition: a named type whose elements are a fixed nominal
/// subtype paired with the owner.
pub struct EnumData {
    pub name: Atom,
    /// The declared type of the enum's elements.
    pub underlying: TypeId,
}

struct EnumStore {
    enums: RwLock<Vec<Arc<EnumData>>>,
}

impl EnumStore {
    fn new() -> Self {
        Self {
            enums: RwLock::new(Vec::new()),
        }
    }

    fn register(&self, data: EnumData) -> EnumId {
        let mut enums = self.enums.write().expect("enum store poisoned");
        let id = EnumId(u32::try_from(enums.len()).expect("enum table overflow"));
        enums.push(Arc::new(data));
        id
    }

    fn get(&self, id: EnumId) -> Option<Arc<EnumData>> {
        self.enums
            .read()
            .expect("enum store poisoned")
            .get(id.0 as usize)
            .cloned()
    }
}

// =============================================================================
// Named-type store (forward references)
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ResolveState {
    NotStarted,
    InProgress,
    Done(TypeId),
}

/// A named forward reference and its write-once resolution memo.
pub struct NamedTypeData {
    pub name: Atom,
    referent: RwLock<Option<TypeId>>,
    state: RwLock<ResolveState>,
    reported: AtomicBool,
}

struct NamedTypeStore {
    named: RwLock<Vec<Arc<NamedTypeData>>>,
    by_name: DashMap<Atom, NamedTypeId>,
}

impl NamedTypeStore {
    fn new() -> Self {
        Self {
            named: RwLock::new(Vec::new()),
            by_name: DashMap::new(),
        }
    }

    fn register(&self, name: Atom) -> NamedTypeId {
        if let Some(existing) = self.by_name.get(&name) {
            return *existing;
        }
        let mut named = self.named.write().expect("named store poisoned");
        if let Some(existing) = self.by_name.get(&name) {
            return *existing;
        }
        let id = NamedTypeId(u32::try_from(named.len()).expect("named table overflow"));
        named.push(Arc::new(NamedTypeData {
            name,
            referent: RwLock::new(None),
            state: RwLock::new(ResolveState::NotStarted),
            reported: AtomicBool::new(false),
        }));
        self.by_name.insert(name, id);
        id
    }

    fn get(&self, id: NamedTypeId) -> Option<Arc<NamedTypeData>> {
        self.named
            .read()
            .expect("named store poisoned")
            .get(id.0 as usize)
            .cloned()
    }
}

// =============================================================================
// Native types
// =============================================================================

/// The built-in object types every program can reference.
#[derive(Copy, Clone, Debug)]
pub struct NativeTypes {
    /// The root `Object` instance type; implicit prototype of the others.
    pub object: TypeId,
    pub function: TypeId,
    pub array: TypeId,
    pub regexp: TypeId,
}

// =============================================================================
// TypeRegistry
// =============================================================================

pub struct TypeRegistry {
    strings: Arc<Interner>,
    interner: TypeInterner,
    objects: ObjectStore,
    enums: EnumStore,
    named: NamedTypeStore,
    /// Bare type-name → constructor type, the inference engine's last-resort
    /// lookup for qualified name reads.
    globals: DashMap<Atom, TypeId>,
    /// Every property name ever declared or observed on any object type.
    property_names: DashSet<Atom>,
    natives: NativeTypes,
}

impl TypeRegistry {
    pub fn new(strings: Arc<Interner>) -> Self {
        let interner = TypeInterner::new();
        let objects = ObjectStore::new();

        let make_native = |name: &str, proto: Option<TypeId>| {
            let id = objects.register(ObjectData {
                name: Some(strings.intern(name)),
                proto,
                template: TemplateMap::empty(),
                props: RwLock::new(IndexMap::new()),
            });
            interner.intern(TypeData::Object(id))
        };

        let object = make_native("Object", None);
        let function = make_native("Function", Some(object));
        let array = make_native("Array", Some(object));
        let regexp = make_native("RegExp", Some(object));

        Self {
            strings,
            interner,
            objects,
            enums: EnumStore::new(),
            named: NamedTypeStore::new(),
            globals: DashMap::new(),
            property_names: DashSet::new(),
            natives: NativeTypes {
                object,
                function,
                array,
                regexp,
            },
        }
    }

    pub fn strings(&self) -> &Interner {
        &self.strings
    }

    pub const fn natives(&self) -> &NativeTypes {
        &self.natives
    }

    // -------------------------------------------------------------------------
    // Interner passthrough
    // -------------------------------------------------------------------------

    pub fn lookup(&self, id: TypeId) -> TypeData {
        self.interner.lookup(id)
    }

    pub fn type_list(&self, id: TypeListId) -> Arc<[TypeId]> {
        self.interner.type_list(id)
    }

    pub fn record_shape(&self, id: RecordShapeId) -> Arc<[(Atom, TypeId)]> {
        self.interner.record_shape(id)
    }

    pub fn function_shape(&self, id: FunctionShapeId) -> Arc<FunctionShape> {
        self.interner.function_shape(id)
    }

    // -------------------------------------------------------------------------
    // Type construction
    // -------------------------------------------------------------------------

    /// Create a named nominal object type.
    pub fn make_object(&self, name: Atom, proto: Option<TypeId>) -> TypeId {
        self.make_templated_object(name, proto, TemplateMap::empty())
    }

    pub fn make_templated_object(
        &self,
        name: Atom,
        proto: Option<TypeId>,
        template: TemplateMap,
    ) -> TypeId {
        let proto = proto.or(Some(self.natives.object));
        let id = self.objects.register(ObjectData {
            name: Some(name),
            proto,
            template,
            props: RwLock::new(IndexMap::new()),
        });
        self.interner.intern(TypeData::Object(id))
    }

    /// Create an anonymous object type, e.g. for an object literal.
    pub fn make_anonymous_object(&self) -> TypeId {
        let id = self.objects.register(ObjectData {
            name: None,
            proto: Some(self.natives.object),
            template: TemplateMap::empty(),
            props: RwLock::new(IndexMap::new()),
        });
        self.interner.intern(TypeData::Object(id))
    }

    pub fn make_function(&self, shape: FunctionShape) -> TypeId {
        let id = self.interner.intern_function_shape(shape);
        self.interner.intern(TypeData::Function(id))
    }

    /// Create a constructor function type together with its instance type.
    /// Returns `(constructor, instance)`.
    pub fn make_constructor(&self, name: Atom, params: Vec<TypeId>) -> (TypeId, TypeId) {
        let instance = self.make_object(name, None);
        let shape = FunctionShape {
            params: params.into_iter().map(ParamInfo::required).collect(),
            ret: instance,
            this_ty: instance,
            kind: FunctionKind::Constructor,
            template_names: smallvec::SmallVec::new(),
            this_template: None,
            instance: Some(instance),
        };
        let ctor = self.make_function(shape);
        self.globals.insert(name, ctor);
        (ctor, instance)
    }

    pub fn make_record(&self, fields: Vec<(Atom, TypeId)>) -> TypeId {
        let id = self.interner.intern_record_shape(fields);
        for &(name, _) in self.interner.record_shape(id).iter() {
            self.property_names.insert(name);
        }
        self.interner.intern(TypeData::Record(id))
    }

    pub fn make_enum(&self, name: Atom, underlying: TypeId) -> (TypeId, TypeId) {
        let id = self.enums.register(EnumData { name, underlying });
        let enum_ty = self.interner.intern(TypeData::Enum(id));
        let element_ty = self.interner.intern(TypeData::EnumElement(id));
        (enum_ty, element_ty)
    }

    pub fn make_template_param(&self, name: Atom, bound: TypeId) -> TypeId {
        self.interner.intern(TypeData::TemplateParam(
            crate::types::TemplateParamData { name, bound },
        ))
    }

    pub fn enum_data(&self, id: EnumId) -> Option<Arc<EnumData>> {
        self.enums.get(id)
    }

    /// The interned enum type for an id (same value `make_enum` returned).
    pub fn enum_type(&self, id: EnumId) -> TypeId {
        self.interner.intern(TypeData::Enum(id))
    }

    /// The interned element type for an enum id.
    pub fn enum_element_type(&self, id: EnumId) -> TypeId {
        self.interner.intern(TypeData::EnumElement(id))
    }

    pub fn object_data(&self, id: ObjectId) -> Option<Arc<ObjectData>> {
        self.objects.get(id)
    }

    // -------------------------------------------------------------------------
    // Unions
    // -------------------------------------------------------------------------

    /// Build a union from alternates.
    ///
    /// Normalization: nested unions flatten, duplicates drop, the absolute
    /// bottom drops, resolved named references are replaced by their
    /// resolution, unresolved ones collapse to the canonical not-yet-resolved
    /// marker (so joins stay symmetric), and Unknown/All absorb everything.
    pub fn union(&self, members: impl IntoIterator<Item = TypeId>) -> TypeId {
        let mut flat: Vec<TypeId> = Vec::new();
        let mut worklist: Vec<TypeId> = members.into_iter().collect();
        while let Some(member) = worklist.pop() {
            match self.lookup(member) {
                TypeData::Union(list) => worklist.extend(self.type_list(list).iter().copied()),
                TypeData::Unknown | TypeData::CheckedUnknown => return TypeId::UNKNOWN,
                TypeData::All => return TypeId::ALL,
                TypeData::NoType => {}
                TypeData::NamedRef(id) => match self.resolved_referent(id) {
                    Some(resolved) => worklist.push(resolved),
                    None => flat.push(TypeId::NO_RESOLVED),
                },
                _ => flat.push(member),
            }
        }
        flat.sort_unstable();
        flat.dedup();
        match flat.len() {
            0 => TypeId::NO_TYPE,
            1 => flat[0],
            _ => {
                let list = self.interner.intern_type_list(flat);
                self.interner.intern(TypeData::Union(list))
            }
        }
    }

    pub fn union2(&self, a: TypeId, b: TypeId) -> TypeId {
        self.union([a, b])
    }

    // -------------------------------------------------------------------------
    // Autoboxing
    // -------------------------------------------------------------------------

    /// The boxed object counterpart of a value type; identity elsewhere.
    pub fn autobox(&self, ty: TypeId) -> TypeId {
        match self.lookup(ty) {
            TypeData::Value(kind) => kind.boxed().unwrap_or(ty),
            _ => ty,
        }
    }

    /// The unboxed value counterpart of a boxed type; identity elsewhere.
    pub fn unbox(&self, ty: TypeId) -> TypeId {
        match self.lookup(ty) {
            TypeData::ValueObject(kind) => kind.unboxed(),
            _ => ty,
        }
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    /// Declare a property with a fixed type. Existing properties are never
    /// retyped; redeclaration is a no-op.
    pub fn define_declared_property(&self, obj: ObjectId, name: Atom, ty: TypeId, is_extern: bool) {
        self.property_names.insert(name);
        let Some(data) = self.objects.get(obj) else { return };
        let mut props = data.props.write().expect("object store poisoned");
        if props.contains_key(&name) {
            return;
        }
        let mut flags = PropertyFlags::DECLARED;
        if is_extern {
            flags |= PropertyFlags::EXTERN;
        }
        props.insert(name, Property { ty, flags });
    }

    /// Record an observed assignment to a property. Inferred properties keep
    /// a running join of everything assigned to them; declared properties are
    /// left alone.
    pub fn define_inferred_property(&self, obj: ObjectId, name: Atom, ty: TypeId) {
        self.property_names.insert(name);
        let Some(data) = self.objects.get(obj) else { return };
        let joined = {
            let props = data.props.read().expect("object store poisoned");
            match props.get(&name) {
                Some(existing) if existing.is_declared() => return,
                Some(existing) => lattice::least_supertype(self, existing.ty, ty),
                None => ty,
            }
        };
        let mut props = data.props.write().expect("object store poisoned");
        match props.get_mut(&name) {
            Some(existing) if existing.is_declared() => {}
            Some(existing) => existing.ty = joined,
            None => {
                props.insert(name, Property::inferred(joined));
            }
        }
        trace!(?name, "define_inferred_property");
    }

    /// Look up a property along the implicit-prototype chain.
    pub fn find_property(&self, ty: TypeId, name: Atom) -> Option<Property> {
        let mut current = ty;
        // The prototype chain is finite in well-formed graphs; cap the walk so
        // a malformed cyclic chain degrades instead of hanging.
        for _ in 0..64 {
            match self.lookup(current) {
                TypeData::Object(id) => {
                    let data = self.objects.get(id)?;
                    if let Some(prop) = data.own_property(name) {
                        return Some(prop);
                    }
                    match data.proto {
                        Some(proto) => current = proto,
                        None => return None,
                    }
                }
                TypeData::Record(id) => {
                    return self
                        .record_shape(id)
                        .iter()
                        .find(|&&(field, _)| field == name)
                        .map(|&(_, field_ty)| Property::declared(field_ty));
                }
                TypeData::Function(_) => {
                    current = self.natives.function;
                    if let TypeData::Object(id) = self.lookup(current) {
                        let data = self.objects.get(id)?;
                        if let Some(prop) = data.own_property(name) {
                            return Some(prop);
                        }
                    }
                    return None;
                }
                TypeData::EnumElement(id) => {
                    current = self.enums.get(id)?.underlying;
                }
                TypeData::ValueObject(_) => {
                    current = self.natives.object;
                }
                _ => return None,
            }
        }
        None
    }

    // -------------------------------------------------------------------------
    // Global indexes
    // -------------------------------------------------------------------------

    pub fn register_global_name(&self, name: Atom, ty: TypeId) {
        self.globals.insert(name, ty);
    }

    pub fn global_name(&self, name: Atom) -> Option<TypeId> {
        self.globals.get(&name).map(|entry| *entry)
    }

    /// Record that a property name exists somewhere in the program, without
    /// attributing a type to it.
    pub fn register_property_name(&self, name: Atom) {
        self.property_names.insert(name);
    }

    pub fn has_property_name(&self, name: Atom) -> bool {
        self.property_names.contains(&name)
    }

    // -------------------------------------------------------------------------
    // Named types and resolution
    // -------------------------------------------------------------------------

    /// Register (or fetch) the forward-reference type for a name.
    pub fn register_named_type(&self, name: Atom) -> TypeId {
        let id = self.named.register(name);
        self.interner.intern(TypeData::NamedRef(id))
    }

    /// Supply the referent a named type resolves to.
    pub fn set_named_referent(&self, name: Atom, referent: TypeId) {
        let id = self.named.register(name);
        if let Some(data) = self.named.get(id) {
            *data.referent.write().expect("named store poisoned") = Some(referent);
        }
    }

    pub fn named_type_name(&self, id: NamedTypeId) -> Option<Atom> {
        self.named.get(id).map(|data| data.name)
    }

    fn resolved_referent(&self, id: NamedTypeId) -> Option<TypeId> {
        let data = self.named.get(id)?;
        match *data.state.read().expect("named store poisoned") {
            ResolveState::Done(ty) => Some(ty),
            _ => None,
        }
    }

    /// Whether a type is (or contains nothing but) an unresolved placeholder.
    pub fn is_unresolved_ref(&self, ty: TypeId) -> bool {
        match self.lookup(ty) {
            TypeData::NoResolved => true,
            TypeData::NamedRef(id) => self.resolved_referent(id).is_none(),
            _ => false,
        }
    }

    /// Force a lazy named reference.
    ///
    /// Resolution is memoized on first success, so repeated calls are free.
    /// A re-entrant cycle (a name resolving through itself) yields Unknown
    /// instead of recursing; an unregistered name yields Unknown and reports
    /// a diagnostic once.
    pub fn resolve(&self, ty: TypeId, sink: &dyn DiagnosticSink) -> TypeId {
        let TypeData::NamedRef(id) = self.lookup(ty) else {
            return ty;
        };
        let Some(data) = self.named.get(id) else {
            return TypeId::UNKNOWN;
        };

        match *data.state.read().expect("named store poisoned") {
            ResolveState::Done(resolved) => return resolved,
            ResolveState::InProgress => {
                trace!(name = ?data.name, "cycle during named-type resolution");
                return TypeId::UNKNOWN;
            }
            ResolveState::NotStarted => {}
        }

        let referent = *data.referent.read().expect("named store poisoned");
        let Some(referent) = referent else {
            // Leave the state untouched so a later registration can still
            // succeed, but only complain once per name.
            if !data.reported.swap(true, Ordering::Relaxed) {
                sink.report(Diagnostic::from_template(
                    diagnostic_messages::UNRESOLVED_TYPE,
                    Span::DUMMY,
                    &[&self.strings.resolve(data.name)],
                ));
            }
            return TypeId::UNKNOWN;
        };

        *data.state.write().expect("named store poisoned") = ResolveState::InProgress;
        let resolved = self.resolve(referent, sink);
        *data.state.write().expect("named store poisoned") = ResolveState::Done(resolved);
        resolved
    }

    /// Unwrap a resolved proxy; identity for everything else. Used by the
    /// lattice operations so subtype/equivalence tests see through aliases.
    pub fn unwrap_proxy(&self, ty: TypeId) -> TypeId {
        match self.lookup(ty) {
            TypeData::NamedRef(id) => self.resolved_referent(id).unwrap_or(ty),
            _ => ty,
        }
    }
}

#[cfg(test)]
#[path = "../tests/registry_tests.rs"]
mod tests;
