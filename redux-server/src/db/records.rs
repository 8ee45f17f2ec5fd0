use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::record::RecordRow;

const RECORD_COLUMNS: &str = "id, table_name, data, created_at, updated_at";

pub async fn create(pool: &SqlitePool, table: &str, data: &Value) -> Result<RecordRow, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, RecordRow>(&format!(
        "INSERT INTO records (id, table_name, data, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         RETURNING {RECORD_COLUMNS}"
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(table)
    .bind(data.to_string())
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn get(pool: &SqlitePool, table: &str, id: &str) -> Result<Option<RecordRow>, sqlx::Error> {
    sqlx::query_as::<_, RecordRow>(&format!(
        "SELECT {RECORD_COLUMNS} FROM records WHERE table_name = ?1 AND id = ?2"
    ))
    .bind(table)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Newest first. `filter` is `(field, value)` on a top-level key of `data`:
/// strings compare by value, anything else by its JSON text.
pub async fn list(
    pool: &SqlitePool,
    table: &str,
    filter: Option<(&str, &str)>,
) -> Result<Vec<RecordRow>, sqlx::Error> {
    let (path, value) = match filter {
        Some((field, value)) => (Some(json_path(field)), Some(value)),
        None => (None, None),
    };

    sqlx::query_as::<_, RecordRow>(&format!(
        "SELECT {RECORD_COLUMNS} FROM records
         WHERE table_name = ?1
           AND (?2 IS NULL OR CASE json_type(data, ?2)
                   WHEN 'text' THEN json_extract(data, ?2) = ?3
                   WHEN 'true' THEN ?3 = 'true'
                   WHEN 'false' THEN ?3 = 'false'
                   WHEN 'null' THEN ?3 = 'null'
                   ELSE CAST(json_extract(data, ?2) AS TEXT) = ?3
               END)
         ORDER BY created_at DESC, rowid DESC"
    ))
    .bind(table)
    .bind(path)
    .bind(value)
    .fetch_all(pool)
    .await
}

/// `$."field"`, so dots in the key are not treated as path separators.
fn json_path(field: &str) -> String {
    format!("$.\"{field}\"")
}

/// Applies `patch` to the stored data as an RFC 7396 merge patch.
pub async fn update(
    pool: &SqlitePool,
    table: &str,
    id: &str,
    patch: &Value,
) -> Result<Option<RecordRow>, sqlx::Error> {
    sqlx::query_as::<_, RecordRow>(&format!(
        "UPDATE records
         SET data = json_patch(data, ?3), updated_at = ?4
         WHERE table_name = ?1 AND id = ?2
         RETURNING {RECORD_COLUMNS}"
    ))
    .bind(table)
    .bind(id)
    .bind(patch.to_string())
    .bind(Utc::now())
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &SqlitePool, table: &str, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM records WHERE table_name = ?1 AND id = ?2")
        .bind(table)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
