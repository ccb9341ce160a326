use foxtail_point::PointDescriptor;
use serde::Deserialize;

/// JSON card descriptor.
///
/// Each entry in `points.inputs`/`points.outputs` names up to three point
/// ids: `id` (the virtual point logic reads/writes), `ioRegId` (the IO
/// register the driver touches), and optionally `internalId` (a
/// driver-private double buffer). An `initial` block on a descriptor seeds
/// the IO register at start.
#[derive(Debug, Clone, Deserialize)]
pub struct CardConfig {
    pub id: Option<u16>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_guid: String,
    pub slot: Option<u16>,
    #[serde(default)]
    pub points: CardPointsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardPointsConfig {
    #[serde(default)]
    pub inputs: Vec<PointDescriptor>,
    #[serde(default)]
    pub outputs: Vec<PointDescriptor>,
}
