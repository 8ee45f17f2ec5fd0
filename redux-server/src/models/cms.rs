use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use utoipa::{IntoParams, ToSchema};

pub const MAX_SLOT_ID_LEN: usize = 128;

// ── Database rows ────────────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SlotType {
    #[default]
    Single,
    Gallery,
}

#[derive(Debug, sqlx::FromRow)]
pub struct SlotRow {
    pub slot_id: String,
    pub data: Json<Value>,
    pub slot_type: SlotType,
    pub last_modified: DateTime<Utc>,
    pub version: i64,
}

// ── API types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CmsSlot {
    pub slot_id: String,
    #[schema(value_type = Object)]
    pub data: Value,
    #[serde(rename = "type")]
    pub slot_type: SlotType,
    pub last_modified: DateTime<Utc>,
    /// Starts at 1 and increases by one on every save.
    pub version: i64,
}

impl From<SlotRow> for CmsSlot {
    fn from(row: SlotRow) -> Self {
        Self {
            slot_id: row.slot_id,
            data: row.data.0,
            slot_type: row.slot_type,
            last_modified: row.last_modified,
            version: row.version,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveSlotRequest {
    pub slot_id: String,
    /// Any JSON value except null
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Value,
    /// Defaults to "single" for a new slot; an existing slot keeps its type.
    #[serde(rename = "type", default)]
    pub slot_type: Option<SlotType>,
    /// Version the client last saw. 0 means "create only"; omit for last-write-wins.
    pub expected_version: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SlotQuery {
    pub slot_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SlotListQuery {
    /// Only return slots of this type
    #[serde(rename = "type")]
    pub slot_type: Option<SlotType>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotResponse {
    pub success: bool,
    pub slot: CmsSlot,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotListResponse {
    pub success: bool,
    pub slots: Vec<CmsSlot>,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSlotResponse {
    pub success: bool,
    pub slot_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CmsHealthResponse {
    pub status: String,
    pub storage: String,
    pub slot_count: Option<i64>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Trims and checks a slot id, returning the trimmed form.
pub fn validate_slot_id(raw: &str) -> Result<&str, &'static str> {
    let slot_id = raw.trim();
    if slot_id.is_empty() {
        return Err("slotId is required");
    }
    if slot_id.chars().count() > MAX_SLOT_ID_LEN {
        return Err("slotId must be at most 128 characters");
    }
    if slot_id
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err("slotId must not contain whitespace");
    }
    Ok(slot_id)
}
