//! Upstream bitable payloads.
//!
//! Record columns keep the table's own (Chinese) column names on the wire in
//! both directions, so the browser client reads records exactly as the
//! bitable returns them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Common envelope of every open-apis response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Submitter {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub en_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Remark {
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordFields {
    #[serde(rename = "编号", default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(rename = "提交人", default)]
    pub submitters: Vec<Submitter>,
    #[serde(rename = "提交时间", default)]
    pub submitted_at_millis: i64,
    #[serde(rename = "楼栋号", default, deserialize_with = "lenient_string")]
    pub building_id: String,
    #[serde(rename = "楼层", default, deserialize_with = "lenient_string")]
    pub floor: String,
    #[serde(rename = "房号", default, deserialize_with = "lenient_string")]
    pub room: String,
    #[serde(rename = "安全状态", default)]
    pub status_text: String,
    #[serde(rename = "受伤情况", default, skip_serializing_if = "Option::is_none")]
    pub injury_note: Option<String>,
    #[serde(rename = "特殊情况", default, skip_serializing_if = "Option::is_none")]
    pub special_conditions: Option<Vec<String>>,
    #[serde(rename = "补充说明", default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<Vec<Remark>>,
    /// Columns this service does not interpret, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Grouping columns are used as map keys, so a number, a bool, or a rich-text
/// segment list is accepted and flattened to its string form.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(segments) => segments
            .iter()
            .filter_map(|segment| match segment {
                Value::String(s) => Some(s.as_str()),
                other => other.get("text").and_then(Value::as_str),
            })
            .collect(),
        other @ Value::Object(_) => other
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    })
}

impl RecordFields {
    pub fn submitter_name(&self) -> Option<&str> {
        self.submitters.first().map(|s| s.name.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    #[serde(rename = "record_id")]
    pub id: String,
    pub fields: RecordFields,
}

impl Record {
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            building: self.fields.building_id.clone(),
            floor: self.fields.floor.clone(),
            room: self.fields.room.clone(),
        }
    }
}

/// One physical reporting unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub building: String,
    pub floor: String,
    pub room: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordsPage {
    #[serde(default)]
    pub items: Vec<Record>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableField {
    pub field_id: String,
    pub field_name: String,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub property: Option<Value>,
    #[serde(rename = "type")]
    pub kind: i64,
    #[serde(default)]
    pub ui_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldsPage {
    #[serde(default)]
    pub items: Vec<TableField>,
    #[serde(default)]
    pub has_more: bool,
}
