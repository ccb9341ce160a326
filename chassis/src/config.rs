use foxtail_card::CardConfig;
use foxtail_logic_chain::LogicChainConfig;
use foxtail_point::PointDescriptor;
use serde::Deserialize;

/// JSON chassis descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct ChassisConfig {
    pub id: Option<u16>,
    pub name: Option<String>,
    /// Fundamental execution rate in microseconds.
    pub fer: Option<u64>,
    #[serde(rename = "sharedPts", default)]
    pub shared_pts: Vec<PointDescriptor>,
    #[serde(default)]
    pub scanners: Vec<ScannerConfig>,
    #[serde(rename = "executionSets", default)]
    pub execution_sets: Vec<ExecutionSetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    pub id: Option<u16>,
    pub name: Option<String>,
    #[serde(rename = "scanRateMultiplier")]
    pub scan_rate_multiplier: Option<u64>,
    #[serde(default)]
    pub cards: Vec<CardConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionSetConfig {
    pub id: Option<u16>,
    pub name: Option<String>,
    #[serde(rename = "exeRateMultiplier")]
    pub exe_rate_multiplier: Option<u64>,
    #[serde(rename = "logicChains", default)]
    pub logic_chains: Vec<LogicChainConfig>,
}
