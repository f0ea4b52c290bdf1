//! Hash-consing of type values.
//!
//! `TypeInterner` owns the `TypeData` table plus the side tables for interned
//! union lists, record shapes, and function shapes. Interning gives O(1) type
//! equality (`TypeId` comparison) and makes the identity-equivalence relation
//! decidable by integer compare.
//!
//! The interner is append-only. Intrinsic types are seeded at construction in
//! a fixed order so their ids match the `TypeId` constants.

use crate::types::{
    FunctionShape, FunctionShapeId, RecordShapeId, TypeData, TypeId, TypeListId, ValueKind,
};
use dashmap::DashMap;
use jsz_common::interner::Atom;
use std::sync::{Arc, RwLock};

pub struct TypeInterner {
    map: DashMap<TypeData, TypeId>,
    types: RwLock<Vec<TypeData>>,

    list_map: DashMap<Arc<[TypeId]>, TypeListId>,
    lists: RwLock<Vec<Arc<[TypeId]>>>,

    record_map: DashMap<Arc<[(Atom, TypeId)]>, RecordShapeId>,
    records: RwLock<Vec<Arc<[(Atom, TypeId)]>>>,

    function_map: DashMap<Arc<FunctionShape>, FunctionShapeId>,
    functions: RwLock<Vec<Arc<FunctionShape>>>,
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInterner {
    pub fn new() -> Self {
        let interner = Self {
            map: DashMap::new(),
            types: RwLock::new(Vec::new()),
            list_map: DashMap::new(),
            lists: RwLock::new(Vec::new()),
            record_map: DashMap::new(),
            records: RwLock::new(Vec::new()),
            function_map: DashMap::new(),
            functions: RwLock::new(Vec::new()),
        };

        // Seed order must match the TypeId constants.
        let intrinsics = [
            (TypeData::Unknown, TypeId::UNKNOWN),
            (TypeData::CheckedUnknown, TypeId::CHECKED_UNKNOWN),
            (TypeData::All, TypeId::ALL),
            (TypeData::NoType, TypeId::NO_TYPE),
            (TypeData::NoObject, TypeId::NO_OBJECT),
            (TypeData::NoResolved, TypeId::NO_RESOLVED),
            (TypeData::Value(ValueKind::Number), TypeId::NUMBER),
            (TypeData::Value(ValueKind::String), TypeId::STRING),
            (TypeData::Value(ValueKind::Boolean), TypeId::BOOLEAN),
            (TypeData::Value(ValueKind::Null), TypeId::NULL),
            (TypeData::Value(ValueKind::Void), TypeId::VOID),
            (TypeData::ValueObject(ValueKind::Number), TypeId::NUMBER_OBJECT),
            (TypeData::ValueObject(ValueKind::String), TypeId::STRING_OBJECT),
            (TypeData::ValueObject(ValueKind::Boolean), TypeId::BOOLEAN_OBJECT),
        ];
        for (data, expected) in intrinsics {
            let id = interner.intern(data);
            debug_assert_eq!(id, expected, "intrinsic seed order drifted");
        }
        debug_assert_eq!(
            interner.types.read().expect("interner poisoned").len(),
            TypeId::FIRST_DYNAMIC as usize
        );
        interner
    }

    /// Intern a type value, returning the existing id when the value was seen
    /// before.
    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(existing) = self.map.get(&data) {
            return *existing;
        }
        let mut types = self.types.write().expect("interner poisoned");
        if let Some(existing) = self.map.get(&data) {
            return *existing;
        }
        let id = TypeId(u32::try_from(types.len()).expect("type table overflow"));
        types.push(data);
        self.map.insert(data, id);
        id
    }

    /// The payload behind an id. Total over ids this interner produced.
    pub fn lookup(&self, id: TypeId) -> TypeData {
        let types = self.types.read().expect("interner poisoned");
        types.get(id.0 as usize).copied().unwrap_or(TypeData::Unknown)
    }

    /// Intern a sorted, deduplicated alternate list.
    pub fn intern_type_list(&self, mut members: Vec<TypeId>) -> TypeListId {
        members.sort_unstable();
        members.dedup();
        let key: Arc<[TypeId]> = members.into();
        if let Some(existing) = self.list_map.get(&key) {
            return *existing;
        }
        let mut lists = self.lists.write().expect("interner poisoned");
        if let Some(existing) = self.list_map.get(&key) {
            return *existing;
        }
        let id = TypeListId(u32::try_from(lists.len()).expect("list table overflow"));
        lists.push(key.clone());
        self.list_map.insert(key, id);
        id
    }

    pub fn type_list(&self, id: TypeListId) -> Arc<[TypeId]> {
        let lists = self.lists.read().expect("interner poisoned");
        lists
            .get(id.0 as usize)
            .cloned()
            .unwrap_or_else(|| Arc::from([] as [TypeId; 0]))
    }

    /// Intern a record shape; fields are sorted by name atom for a canonical
    /// representation.
    pub fn intern_record_shape(&self, mut fields: Vec<(Atom, TypeId)>) -> RecordShapeId {
        fields.sort_unstable_by_key(|&(name, _)| name);
        fields.dedup_by_key(|&mut (name, _)| name);
        let key: Arc<[(Atom, TypeId)]> = fields.into();
        if let Some(existing) = self.record_map.get(&key) {
            return *existing;
        }
        let mut records = self.records.write().expect("interner poisoned");
        if let Some(existing) = self.record_map.get(&key) {
            return *existing;
        }
        let id = RecordShapeId(u32::try_from(records.len()).expect("record table overflow"));
        records.push(key.clone());
        self.record_map.insert(key, id);
        id
    }

    pub fn record_shape(&self, id: RecordShapeId) -> Arc<[(Atom, TypeId)]> {
        let records = self.records.read().expect("interner poisoned");
        records
            .get(id.0 as usize)
            .cloned()
            .unwrap_or_else(|| Arc::from([] as [(Atom, TypeId); 0]))
    }

    pub fn intern_function_shape(&self, shape: FunctionShape) -> FunctionShapeId {
        let key: Arc<FunctionShape> = Arc::new(shape);
        if let Some(existing) = self.function_map.get(&key) {
            return *existing;
        }
        let mut functions = self.functions.write().expect("interner poisoned");
        if let Some(existing) = self.function_map.get(&key) {
            return *existing;
        }
        let id = FunctionShapeId(u32::try_from(functions.len()).expect("function table overflow"));
        functions.push(key.clone());
        self.function_map.insert(key, id);
        id
    }

    pub fn function_shape(&self, id: FunctionShapeId) -> Arc<FunctionShape> {
        let functions = self.functions.read().expect("interner poisoned");
        functions
            .get(id.0 as usize)
            .cloned()
            .unwrap_or_else(|| Arc::new(FunctionShape::simple([], TypeId::UNKNOWN)))
    }

    /// Number of distinct type values interned.
    pub fn len(&self) -> usize {
        self.types.read().expect("interner poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod tests;
