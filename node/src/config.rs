use foxtail_chassis::ChassisConfig;
use serde::Deserialize;

/// JSON node descriptor: `{ "node": { "type": …, "chassis": [ … ] } }`.
/// The top-level `node` wrapper is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    #[serde(rename = "type")]
    pub type_guid: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub chassis: Vec<ChassisConfig>,
}
