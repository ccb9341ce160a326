use crate::api::{PointApi, PointId};
use crate::arena::{StatefulAlloc, StatefulArena};
use crate::array::Array;
use crate::basic::Basic;
use crate::database::PointDatabase;
use crate::descriptor::{IdKey, PointDescriptor, TypeCfg};
use foxtail_error::{Error, PointError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Arguments handed to a concrete point constructor.
pub struct PointCreateContext<'a> {
    pub id: PointId,
    pub name: String,
    pub type_cfg: Option<TypeCfg>,
    pub alloc: StatefulAlloc<'a>,
    pub setter: Option<Arc<dyn PointApi>>,
}

/// One registered point type.
pub struct PointFactoryEntry {
    pub guid: &'static str,
    pub type_name: &'static str,
    /// Stateful bytes a point of this type occupies, given its type config.
    pub stateful_size: fn(Option<&TypeCfg>) -> Result<usize, Error>,
    pub create: fn(&PointCreateContext) -> Result<Arc<dyn PointApi>, Error>,
}

/// Registry mapping point-type GUIDs to constructors.
pub struct PointFactoryDatabase {
    entries: HashMap<&'static str, PointFactoryEntry>,
}

impl PointFactoryDatabase {
    pub fn new() -> Self {
        PointFactoryDatabase {
            entries: HashMap::new(),
        }
    }

    /// Registry pre-populated with every core point type.
    pub fn with_core_types() -> Self {
        let mut db = Self::new();
        db.register(Basic::<bool>::factory_entry());
        db.register(Basic::<i8>::factory_entry());
        db.register(Basic::<i16>::factory_entry());
        db.register(Basic::<i32>::factory_entry());
        db.register(Basic::<i64>::factory_entry());
        db.register(Basic::<u8>::factory_entry());
        db.register(Basic::<u16>::factory_entry());
        db.register(Basic::<u32>::factory_entry());
        db.register(Basic::<u64>::factory_entry());
        db.register(Basic::<f32>::factory_entry());
        db.register(Basic::<f64>::factory_entry());
        db.register(Array::<u8>::factory_entry());
        db.register(Array::<i32>::factory_entry());
        db.register(Array::<u32>::factory_entry());
        db.register(Array::<u64>::factory_entry());
        db
    }

    /// Returns false when the GUID is already taken.
    pub fn register(&mut self, entry: PointFactoryEntry) -> bool {
        if self.entries.contains_key(entry.guid) {
            return false;
        }
        self.entries.insert(entry.guid, entry);
        true
    }

    pub fn lookup(&self, guid: &str) -> Option<&PointFactoryEntry> {
        self.entries.get(guid)
    }

    pub fn stateful_size_of(&self, guid: &str, cfg: Option<&TypeCfg>) -> Result<usize, Error> {
        let entry = self.lookup(guid).ok_or(PointError::UnknownTypeGuid)?;
        (entry.stateful_size)(cfg)
    }

    /// Build a point (and, when the descriptor carries an `initial` block,
    /// its setter companion) and register both in the point database.
    ///
    /// `alloc` backs the point itself; setters always get their own slab
    /// from `setter_arena`.
    pub fn create_point_from_descriptor(
        &self,
        descriptor: &PointDescriptor,
        id_key: IdKey,
        create_setter: bool,
        alloc: StatefulAlloc,
        setter_arena: &StatefulArena,
        db: &PointDatabase,
    ) -> Result<Arc<dyn PointApi>, Error> {
        let entry = self
            .lookup(&descriptor.type_guid)
            .ok_or(PointError::UnknownTypeGuid)?;
        let id = descriptor.id_for(id_key).ok_or(PointError::MissingId)?;
        let name = descriptor.name.clone().unwrap_or_default();

        let setter = match (&descriptor.initial, create_setter) {
            (Some(initial), true) => {
                let setter_id = initial.id.ok_or(PointError::MissingId)?;
                let setter = (entry.create)(&PointCreateContext {
                    id: setter_id,
                    name: name.clone(),
                    type_cfg: descriptor.type_cfg.clone(),
                    alloc: StatefulAlloc::Arena(setter_arena),
                    setter: None,
                })?;
                db.add(setter.clone())?;

                let mut seed = json!({});
                if let Some(val) = &initial.val {
                    seed["val"] = val.clone();
                }
                if let Some(valid) = initial.valid {
                    seed["valid"] = Value::Bool(valid);
                }
                setter
                    .from_json(&seed, Default::default())
                    .map_err(|_| PointError::MalformedInitialValue)?;
                Some(setter)
            }
            _ => None,
        };

        let point = (entry.create)(&PointCreateContext {
            id,
            name,
            type_cfg: descriptor.type_cfg.clone(),
            alloc,
            setter,
        })?;
        db.add(point.clone())?;
        Ok(point)
    }
}

impl Default for PointFactoryDatabase {
    fn default() -> Self {
        Self::with_core_types()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::read_value;

    fn descriptor(raw: Value) -> PointDescriptor {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn creates_a_point_with_a_seeded_setter() {
        let factory = PointFactoryDatabase::with_core_types();
        let arena = StatefulArena::new(256);
        let db = PointDatabase::new(16);

        let desc = descriptor(json!({
            "id": 1,
            "type": "a9f6c3d2-7e15-48b4-9c0a-d2b8e4f615c7",
            "name": "din",
            "initial": { "val": 128, "id": 2 }
        }));
        let pt = factory
            .create_point_from_descriptor(
                &desc,
                IdKey::Id,
                true,
                StatefulAlloc::Arena(&arena),
                &arena,
                &db,
            )
            .unwrap();

        assert!(pt.has_setter());
        assert!(pt.is_not_valid());
        pt.update_from_setter(Default::default());
        assert_eq!(read_value::<u8>(pt.as_ref()).unwrap(), Some(128));

        // The setter is a registered point in its own right.
        let setter = db.lookup_by_id(2).unwrap();
        assert_eq!(read_value::<u8>(setter.as_ref()).unwrap(), Some(128));
    }

    #[test]
    fn unknown_guid_is_rejected() {
        let factory = PointFactoryDatabase::with_core_types();
        let arena = StatefulArena::new(64);
        let db = PointDatabase::new(4);

        let desc = descriptor(json!({ "id": 0, "type": "00000000-0000-0000-0000-000000000000" }));
        let err = factory
            .create_point_from_descriptor(
                &desc,
                IdKey::Id,
                true,
                StatefulAlloc::Arena(&arena),
                &arena,
                &db,
            )
            .unwrap_err();
        assert_eq!(err.code_name(), "UNKNOWN_TYPE_GUID");
    }

    #[test]
    fn array_points_require_type_cfg() {
        let factory = PointFactoryDatabase::with_core_types();
        let arena = StatefulArena::new(64);
        let db = PointDatabase::new(4);

        let desc = descriptor(json!({
            "id": 0,
            "type": "0d9e8c7b-6a54-43f2-b1e0-9c8d7a6b5f43"
        }));
        let err = factory
            .create_point_from_descriptor(
                &desc,
                IdKey::Id,
                true,
                StatefulAlloc::Arena(&arena),
                &arena,
                &db,
            )
            .unwrap_err();
        assert_eq!(err.code_name(), "MISSING_TYPE_CFG");

        let desc = descriptor(json!({
            "id": 0,
            "type": "0d9e8c7b-6a54-43f2-b1e0-9c8d7a6b5f43",
            "typeCfg": { "numElems": 4 }
        }));
        let pt = factory
            .create_point_from_descriptor(
                &desc,
                IdKey::Id,
                true,
                StatefulAlloc::Arena(&arena),
                &arena,
                &db,
            )
            .unwrap();
        assert_eq!(pt.stateful_size(), 2 + 4 * 4);
    }
}
