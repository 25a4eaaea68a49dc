//! Built-in sensor model identifiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Built-in sensor model preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LidarModel {
    #[serde(rename = "range_meter")]
    RangeMeter,
    #[serde(rename = "velodyne_vlp16")]
    VelodyneVlp16,
    #[serde(rename = "velodyne_vlp32c")]
    VelodyneVlp32c,
    #[serde(rename = "ouster_os1_64")]
    OusterOs1_64,
    #[serde(rename = "hesai_pandar40p")]
    HesaiPandar40p,
    #[serde(rename = "hesai_at128_e2x")]
    HesaiAt128E2x,
    #[serde(rename = "hesai_qt128_c2x")]
    HesaiQt128C2x,
}

impl LidarModel {
    /// Every built-in model, catalog order
    pub const ALL: [LidarModel; 7] = [
        LidarModel::RangeMeter,
        LidarModel::VelodyneVlp16,
        LidarModel::VelodyneVlp32c,
        LidarModel::OusterOs1_64,
        LidarModel::HesaiPandar40p,
        LidarModel::HesaiAt128E2x,
        LidarModel::HesaiQt128C2x,
    ];

    /// Configuration-file name
    pub fn as_str(&self) -> &'static str {
        match self {
            LidarModel::RangeMeter => "range_meter",
            LidarModel::VelodyneVlp16 => "velodyne_vlp16",
            LidarModel::VelodyneVlp32c => "velodyne_vlp32c",
            LidarModel::OusterOs1_64 => "ouster_os1_64",
            LidarModel::HesaiPandar40p => "hesai_pandar40p",
            LidarModel::HesaiAt128E2x => "hesai_at128_e2x",
            LidarModel::HesaiQt128C2x => "hesai_qt128_c2x",
        }
    }
}

impl fmt::Display for LidarModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LidarModel {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        LidarModel::ALL
            .into_iter()
            .find(|model| model.as_str() == normalized)
            .ok_or_else(|| ContractError::UnknownModel { name: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for model in LidarModel::ALL {
            let parsed: LidarModel = model.as_str().parse().unwrap();
            assert_eq!(parsed, model);

            let json = serde_json::to_string(&model).unwrap();
            assert_eq!(json, format!("\"{}\"", model.as_str()));
        }
    }

    #[test]
    fn test_parse_is_lenient_on_case_and_dashes() {
        assert_eq!(
            "Hesai-AT128_E2X".parse::<LidarModel>().unwrap(),
            LidarModel::HesaiAt128E2x
        );
    }

    #[test]
    fn test_unknown_model() {
        let err = "velodyne_hdl64".parse::<LidarModel>().unwrap_err();
        assert!(err.to_string().contains("velodyne_hdl64"), "got: {err}");
    }
}
