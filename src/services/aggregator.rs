//! Reshapes flat bitable records into the building → floor → room grid.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::models::grid::{CellState, Grid, SafetyStatus};
use crate::models::record::{GroupKey, Record};

pub const SAFE_KEYWORD: &str = "安全";
pub const DANGER_KEYWORD: &str = "危险";
pub const EMERGENCY_KEYWORD: &str = "生命危险";

/// Order in which status keywords are matched against a record's status text.
///
/// `Legacy` checks safe, then danger, then emergency. Because the emergency
/// keyword contains the danger keyword, `Legacy` never yields `Emergency`.
/// `Severity` checks the most severe keyword first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusPrecedence {
    #[default]
    Legacy,
    Severity,
}

impl StatusPrecedence {
    pub fn derive(self, status_text: &str) -> SafetyStatus {
        let order: [(&str, SafetyStatus); 3] = match self {
            StatusPrecedence::Legacy => [
                (SAFE_KEYWORD, SafetyStatus::Safe),
                (DANGER_KEYWORD, SafetyStatus::Danger),
                (EMERGENCY_KEYWORD, SafetyStatus::Emergency),
            ],
            StatusPrecedence::Severity => [
                (EMERGENCY_KEYWORD, SafetyStatus::Emergency),
                (DANGER_KEYWORD, SafetyStatus::Danger),
                (SAFE_KEYWORD, SafetyStatus::Safe),
            ],
        };

        order
            .iter()
            .find(|(keyword, _)| status_text.contains(*keyword))
            .map(|(_, status)| *status)
            .unwrap_or(SafetyStatus::Safe)
    }
}

impl FromStr for StatusPrecedence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(StatusPrecedence::Legacy),
            "severity" => Ok(StatusPrecedence::Severity),
            other => Err(format!("expected `legacy` or `severity`, got `{}`", other)),
        }
    }
}

impl fmt::Display for StatusPrecedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusPrecedence::Legacy => write!(f, "legacy"),
            StatusPrecedence::Severity => write!(f, "severity"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    precedence: StatusPrecedence,
}

impl Aggregator {
    pub fn new(precedence: StatusPrecedence) -> Self {
        Self { precedence }
    }

    /// Groups records by (building, floor, room), orders each group newest
    /// first and derives the group's status from its newest record. Records
    /// with equal timestamps keep their arrival order.
    pub fn aggregate(&self, records: &[Record]) -> Grid {
        let mut groups: HashMap<GroupKey, Vec<Record>> = HashMap::new();
        for record in records {
            groups
                .entry(record.group_key())
                .or_default()
                .push(record.clone());
        }

        let mut grid = Grid::new();
        for (key, mut group) in groups {
            // sort_by is stable
            group.sort_by(|a, b| {
                b.fields
                    .submitted_at_millis
                    .cmp(&a.fields.submitted_at_millis)
            });

            let status = self.precedence.derive(&group[0].fields.status_text);
            grid.entry(key.building)
                .or_default()
                .entry(key.floor)
                .or_default()
                .insert(
                    key.room,
                    CellState {
                        status,
                        records: group,
                    },
                );
        }
        grid
    }
}

/// Number of records held across every cell of `grid`.
pub fn count_records(grid: &Grid) -> u64 {
    grid.values()
        .flat_map(|floors| floors.values())
        .flat_map(|rooms| rooms.values())
        .map(|cell| cell.records.len() as u64)
        .sum()
}
