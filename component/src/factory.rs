use crate::api::{ComponentApi, ComponentConfig};
use foxtail_error::{ComponentError, Error};
use foxtail_point::{PointDatabase, PointFactoryDatabase, StatefulArena};
use std::collections::HashMap;

/// Everything a component constructor needs besides its own descriptor.
/// The HA arena backs internal stateful points; the point plumbing is there
/// for components that create points of their own.
pub struct ComponentCreateContext<'a> {
    pub point_factory: &'a PointFactoryDatabase,
    pub point_db: &'a PointDatabase,
    pub ha_arena: &'a StatefulArena,
}

/// One registered component type.
pub struct ComponentFactoryEntry {
    pub guid: &'static str,
    pub type_name: &'static str,
    pub create: fn(&ComponentConfig, &ComponentCreateContext) -> Result<Box<dyn ComponentApi>, Error>,
}

/// Registry mapping component-type GUIDs to constructors.
pub struct ComponentFactoryDatabase {
    entries: HashMap<&'static str, ComponentFactoryEntry>,
}

impl ComponentFactoryDatabase {
    pub fn new() -> Self {
        ComponentFactoryDatabase {
            entries: HashMap::new(),
        }
    }

    /// Registry pre-populated with every core component.
    pub fn with_core_components() -> Self {
        let mut db = Self::new();
        db.register(crate::digital::And::factory_entry());
        db.register(crate::digital::Not::factory_entry());
        db.register(crate::digital::Demux::factory_entry());
        db.register(crate::digital::Mux::factory_entry());
        db.register(crate::math::Scaler::factory_entry());
        db.register(crate::controller::OnOff::factory_entry());
        db
    }

    /// Returns false when the GUID is already taken.
    pub fn register(&mut self, entry: ComponentFactoryEntry) -> bool {
        if self.entries.contains_key(entry.guid) {
            return false;
        }
        self.entries.insert(entry.guid, entry);
        true
    }

    pub fn lookup(&self, guid: &str) -> Option<&ComponentFactoryEntry> {
        self.entries.get(guid)
    }

    pub fn create_component_from_config(
        &self,
        config: &ComponentConfig,
        ctx: &ComponentCreateContext,
    ) -> Result<Box<dyn ComponentApi>, Error> {
        let entry = self
            .lookup(&config.type_guid)
            .ok_or(ComponentError::UnknownTypeGuid)?;
        (entry.create)(config, ctx)
    }
}

impl Default for ComponentFactoryDatabase {
    fn default() -> Self {
        Self::with_core_components()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_components_are_registered() {
        let db = ComponentFactoryDatabase::with_core_components();
        for guid in [
            crate::digital::And::GUID,
            crate::digital::Not::GUID,
            crate::digital::Demux::GUID,
            crate::digital::Mux::GUID,
            crate::math::Scaler::GUID,
            crate::controller::OnOff::GUID,
        ] {
            assert!(db.lookup(guid).is_some());
        }
    }

    #[test]
    fn unknown_component_guid_is_rejected() {
        let fixture = test_support::Fixture::new();
        let db = ComponentFactoryDatabase::with_core_components();
        let config: ComponentConfig = serde_json::from_value(serde_json::json!({
            "type": "ffffffff-0000-0000-0000-000000000000",
        }))
        .unwrap();

        let err = db
            .create_component_from_config(&config, &fixture.ctx())
            .unwrap_err();
        assert_eq!(err.code_name(), "UNKNOWN_TYPE_GUID");
    }
}
