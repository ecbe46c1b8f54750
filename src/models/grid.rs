use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyStatus {
    Safe,
    Danger,
    Emergency,
}

impl SafetyStatus {
    /// Label the status table shows for this status.
    pub fn label(self) -> &'static str {
        match self {
            SafetyStatus::Safe => "安全",
            SafetyStatus::Danger => "危险",
            SafetyStatus::Emergency => "紧急",
        }
    }
}

/// Derived state of one room: status of the newest report plus every report,
/// newest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellState {
    pub status: SafetyStatus,
    pub records: Vec<Record>,
}

pub type FloorData = BTreeMap<String, CellState>;
pub type BuildingData = BTreeMap<String, FloorData>;
/// building → floor → room → cell.
pub type Grid = BTreeMap<String, BuildingData>;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataStats {
    pub total_records: u64,
    pub last_update_time: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoardData {
    pub buildings: Vec<String>,
    pub building_data: Grid,
    pub stats: DataStats,
}

/// Body of `GET /api/data`. `data` is always present, empty on failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataResponse {
    pub success: bool,
    pub data: BoardData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DataResponse {
    pub fn ok(data: BoardData) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    /// Empty board with zeroed stats.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: BoardData::default(),
            message: Some(message.into()),
        }
    }
}
