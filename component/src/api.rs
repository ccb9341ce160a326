use foxtail_error::Error;
use foxtail_point::{PointDatabase, PointId};
use serde::Deserialize;

/// Object-safe component surface.
///
/// Lifecycle: constructed → references resolved → started → executing.
/// Construction and reference errors latch on the component; `start`
/// refuses while an error is latched, and runtime errors latch and abort
/// the owning logic chain.
pub trait ComponentApi: Send + Sync + std::fmt::Debug {
    /// Swap raw point-id references for resolved handles. Must be called
    /// before `start`; fails on a lookup miss or a type-GUID mismatch.
    fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<(), Error>;

    fn start(&self, now_usec: u64) -> Result<(), Error>;

    fn stop(&self);

    fn execute(&self, now_usec: u64) -> Result<(), Error>;

    /// HA hook: force the component back to its designated initial state
    /// without a stop/start cycle (e.g. after a high-availability
    /// handover). Stateless components have nothing to do.
    fn reset(&self, _now_usec: u64) {}

    fn type_guid(&self) -> &'static str;

    fn type_name(&self) -> &'static str;

    fn name(&self) -> &str;

    fn error_code(&self) -> Option<Error>;
}

/// JSON component descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentConfig {
    pub id: Option<u32>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_guid: String,
    #[serde(default)]
    pub inputs: Vec<RefConfig>,
    #[serde(default)]
    pub outputs: Vec<RefConfig>,
}

/// One input/output point reference, with the type-specific attributes the
/// concrete components consume (`bit`/`negate` for bit mappers, `m`/`b` for
/// scalers, `var` for role-keyed controllers).
#[derive(Debug, Clone, Deserialize)]
pub struct RefConfig {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_guid: Option<String>,
    #[serde(rename = "idRef")]
    pub id_ref: Option<PointId>,
    pub bit: Option<u8>,
    pub negate: Option<bool>,
    pub m: Option<f64>,
    pub b: Option<f64>,
    pub var: Option<String>,
}
