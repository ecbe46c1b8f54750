use chrono::{DateTime, Local};
use colored::Colorize;
use prettytable::{format, Cell, Row, Table};

use crate::models::grid::{BuildingData, DataResponse, DataStats, SafetyStatus};

pub const NO_DATA_LABEL: &str = "无数据";

pub struct DisplayFormatter;

impl DisplayFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format_header(&self, text: &str) -> String {
        format!("\n=== {} ===", text.bright_white().bold())
    }

    pub fn format_timestamp(&self, millis: u64) -> String {
        DateTime::from_timestamp_millis(millis as i64)
            .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn format_stats(&self, stats: &DataStats) -> String {
        format!(
            "Total records: {}\nLast update: {}",
            stats.total_records,
            self.format_timestamp(stats.last_update_time)
        )
    }

    pub fn format_status(&self, status: Option<SafetyStatus>) -> String {
        match status {
            Some(SafetyStatus::Safe) => status_label(status).green().to_string(),
            Some(SafetyStatus::Danger) => status_label(status).red().to_string(),
            Some(SafetyStatus::Emergency) => status_label(status).bright_red().bold().to_string(),
            None => status_label(status).dimmed().to_string(),
        }
    }

    /// Floors as rows, rooms as columns. Only floors and rooms that appear in
    /// the data are shown.
    pub fn format_building_table(&self, building: &BuildingData) -> String {
        let mut floors: Vec<&String> = building.keys().collect();
        floors.sort_by(|a, b| natural_key(a).cmp(&natural_key(b)));

        let mut rooms: Vec<&String> = building.values().flat_map(|f| f.keys()).collect();
        rooms.sort_by(|a, b| natural_key(a).cmp(&natural_key(b)));
        rooms.dedup();

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);

        let mut header = vec![Cell::new("").style_spec("b")];
        header.extend(rooms.iter().map(|room| Cell::new(room).style_spec("b")));
        table.add_row(Row::new(header));

        for floor in floors {
            let mut cells = vec![Cell::new(floor).style_spec("b")];
            for room in &rooms {
                let status = building
                    .get(floor.as_str())
                    .and_then(|f| f.get(room.as_str()))
                    .map(|cell| cell.status);
                cells.push(Cell::new(&self.format_status(status)));
            }
            table.add_row(Row::new(cells));
        }

        table.to_string()
    }

    pub fn format_board(&self, response: &DataResponse) -> String {
        let mut output = Vec::new();
        output.push(self.format_header("Safety Board"));
        if let Some(message) = &response.message {
            output.push(format!("{} {}", "Error:".red().bold(), message));
        }
        output.push(self.format_stats(&response.data.stats));

        for name in &response.data.buildings {
            if let Some(building) = response.data.building_data.get(name) {
                output.push(self.format_header(name));
                output.push(self.format_building_table(building));
            }
        }

        output.join("\n")
    }
}

impl Default for DisplayFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn status_label(status: Option<SafetyStatus>) -> &'static str {
    status.map(SafetyStatus::label).unwrap_or(NO_DATA_LABEL)
}

/// Orders "2楼" before "10楼": leading digits compare numerically.
fn natural_key(label: &str) -> (u64, &str) {
    let digits: String = label.chars().take_while(|c| c.is_ascii_digit()).collect();
    (digits.parse().unwrap_or(u64::MAX), label)
}
