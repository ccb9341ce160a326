use crate::api::PointId;
use serde::Deserialize;
use serde_json::Value;

/// JSON point descriptor, shared by shared/connector/auto points and card
/// channel points (which add `ioRegId`/`internalId`/`channel`).
#[derive(Debug, Clone, Deserialize)]
pub struct PointDescriptor {
    pub id: Option<PointId>,
    #[serde(rename = "ioRegId")]
    pub io_reg_id: Option<PointId>,
    #[serde(rename = "internalId")]
    pub internal_id: Option<PointId>,
    #[serde(rename = "type")]
    pub type_guid: String,
    pub name: Option<String>,
    #[serde(rename = "typeCfg")]
    pub type_cfg: Option<TypeCfg>,
    pub initial: Option<InitialValue>,
    pub channel: Option<u16>,
}

/// Type configuration for complex point types.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeCfg {
    #[serde(rename = "numElems")]
    pub num_elems: usize,
}

/// The optional `initial` block: seeds a companion *setter* point that in
/// turn seeds the owner at start (or on demand).
#[derive(Debug, Clone, Deserialize)]
pub struct InitialValue {
    /// Id of the setter point that stores the initial value in binary form.
    pub id: Option<PointId>,
    pub val: Option<Value>,
    pub valid: Option<bool>,
}

/// Which descriptor key names the point being created. Card descriptors
/// carry up to three ids (virtual, IO register, internal register).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKey {
    Id,
    IoRegId,
    InternalId,
}

impl PointDescriptor {
    pub fn id_for(&self, key: IdKey) -> Option<PointId> {
        match key {
            IdKey::Id => self.id,
            IdKey::IoRegId => self.io_reg_id,
            IdKey::InternalId => self.internal_id,
        }
    }
}
