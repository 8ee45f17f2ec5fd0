use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use utoipa::{IntoParams, ToSchema};

pub const MAX_TABLE_NAME_LEN: usize = 64;
pub const MAX_FILTER_FIELD_LEN: usize = 128;

#[derive(Debug, sqlx::FromRow)]
pub struct RecordRow {
    pub id: String,
    pub table_name: String,
    pub data: Json<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub table: String,
    #[schema(value_type = Object)]
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RecordRow> for Record {
    fn from(row: RecordRow) -> Self {
        Self {
            id: row.id,
            table: row.table_name,
            data: row.data.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordBody {
    /// JSON object. On update it is applied as a merge patch.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Value,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecordQuery {
    /// Top-level field of `data` to filter on
    pub field: Option<String>,
    /// Value the field must equal
    pub value: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecordListResponse {
    pub records: Vec<Record>,
    pub count: usize,
}

pub fn validate_table_name(table: &str) -> Result<&str, &'static str> {
    if table.is_empty() || table.len() > MAX_TABLE_NAME_LEN {
        return Err("Table name must be 1-64 characters");
    }
    if !table
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
    {
        return Err("Table name may only contain a-z, 0-9 and _");
    }
    Ok(table)
}

/// Filter keys are top-level `data` keys; quotes and backslashes would break the JSON path.
pub fn validate_filter_field(field: &str) -> Result<&str, &'static str> {
    if field.is_empty() || field.len() > MAX_FILTER_FIELD_LEN {
        return Err("field must be 1-128 characters");
    }
    if field.contains(['"', '\\']) || field.chars().any(char::is_control) {
        return Err("field contains unsupported characters");
    }
    Ok(field)
}
