use crate::api::CardApi;
use crate::config::CardConfig;
use foxtail_error::{CardError, Error};
use foxtail_point::{PointDatabase, PointFactoryDatabase, StatefulArena};
use std::collections::HashMap;
use std::sync::Arc;

/// Everything a card constructor needs besides its own descriptor.
pub struct CardCreateContext<'a> {
    pub point_factory: &'a PointFactoryDatabase,
    pub point_db: &'a PointDatabase,
    pub card_arena: &'a StatefulArena,
    pub ha_arena: &'a StatefulArena,
}

/// One registered card type.
pub struct CardFactoryEntry {
    pub guid: &'static str,
    pub type_name: &'static str,
    pub create: fn(&CardConfig, &CardCreateContext) -> Result<Arc<dyn CardApi>, Error>,
}

/// Registry mapping card-type GUIDs to constructors.
pub struct CardFactoryDatabase {
    entries: HashMap<&'static str, CardFactoryEntry>,
}

impl CardFactoryDatabase {
    pub fn new() -> Self {
        CardFactoryDatabase {
            entries: HashMap::new(),
        }
    }

    /// Registry pre-populated with the mock cards.
    pub fn with_mock_cards() -> Self {
        let mut db = Self::new();
        db.register(crate::mock::Digital::factory_entry());
        db.register(crate::mock::Digital8::factory_entry());
        db
    }

    /// Returns false when the GUID is already taken.
    pub fn register(&mut self, entry: CardFactoryEntry) -> bool {
        if self.entries.contains_key(entry.guid) {
            return false;
        }
        self.entries.insert(entry.guid, entry);
        true
    }

    pub fn lookup(&self, guid: &str) -> Option<&CardFactoryEntry> {
        self.entries.get(guid)
    }

    pub fn create_card_from_config(
        &self,
        config: &CardConfig,
        ctx: &CardCreateContext,
    ) -> Result<Arc<dyn CardApi>, Error> {
        let entry = self
            .lookup(&config.type_guid)
            .ok_or(CardError::UnknownTypeGuid)?;
        (entry.create)(config, ctx)
    }
}

impl Default for CardFactoryDatabase {
    fn default() -> Self {
        Self::with_mock_cards()
    }
}
