use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::models::cms::{SlotRow, SlotType};

const SLOT_COLUMNS: &str = "slot_id, data, slot_type, last_modified, version";

#[derive(Debug)]
pub enum SaveOutcome {
    Saved(SlotRow),
    /// The expected version did not match; nothing was written.
    Conflict { current_version: i64 },
}

/// Writes a slot.
///
/// * `expected_version = None`: last write wins.
/// * `Some(0)`: only creates; an existing slot is a conflict.
/// * `Some(n)`: only updates a slot currently at version `n`.
///
/// A `slot_type` of `None` keeps the stored type, or `single` for a new slot.
///
/// The version check and the write happen in one statement, so two writers
/// holding the same version cannot both succeed.
pub async fn save(
    pool: &SqlitePool,
    slot_id: &str,
    data: &Value,
    slot_type: Option<SlotType>,
    expected_version: Option<i64>,
) -> Result<SaveOutcome, sqlx::Error> {
    let now = Utc::now();
    let data = data.to_string();

    let saved = match expected_version {
        None => {
            sqlx::query_as::<_, SlotRow>(&format!(
                "INSERT INTO cms_slots (slot_id, data, slot_type, last_modified, version)
                 VALUES (?1, ?2, COALESCE(?3, 'single'), ?4, 1)
                 ON CONFLICT (slot_id) DO UPDATE SET
                     data = excluded.data,
                     slot_type = COALESCE(?3, cms_slots.slot_type),
                     last_modified = excluded.last_modified,
                     version = cms_slots.version + 1
                 RETURNING {SLOT_COLUMNS}"
            ))
            .bind(slot_id)
            .bind(&data)
            .bind(slot_type)
            .bind(now)
            .fetch_optional(pool)
            .await?
        }
        Some(0) => {
            sqlx::query_as::<_, SlotRow>(&format!(
                "INSERT INTO cms_slots (slot_id, data, slot_type, last_modified, version)
                 VALUES (?1, ?2, COALESCE(?3, 'single'), ?4, 1)
                 ON CONFLICT (slot_id) DO NOTHING
                 RETURNING {SLOT_COLUMNS}"
            ))
            .bind(slot_id)
            .bind(&data)
            .bind(slot_type)
            .bind(now)
            .fetch_optional(pool)
            .await?
        }
        Some(expected) => {
            sqlx::query_as::<_, SlotRow>(&format!(
                "UPDATE cms_slots
                 SET data = ?2, slot_type = COALESCE(?3, slot_type), last_modified = ?4, version = version + 1
                 WHERE slot_id = ?1 AND version = ?5
                 RETURNING {SLOT_COLUMNS}"
            ))
            .bind(slot_id)
            .bind(&data)
            .bind(slot_type)
            .bind(now)
            .bind(expected)
            .fetch_optional(pool)
            .await?
        }
    };

    match saved {
        Some(row) => Ok(SaveOutcome::Saved(row)),
        None => Ok(SaveOutcome::Conflict {
            current_version: current_version(pool, slot_id).await?.unwrap_or(0),
        }),
    }
}

pub async fn get(pool: &SqlitePool, slot_id: &str) -> Result<Option<SlotRow>, sqlx::Error> {
    sqlx::query_as::<_, SlotRow>(&format!(
        "SELECT {SLOT_COLUMNS} FROM cms_slots WHERE slot_id = ?1"
    ))
    .bind(slot_id)
    .fetch_optional(pool)
    .await
}

pub async fn list(
    pool: &SqlitePool,
    slot_type: Option<SlotType>,
) -> Result<Vec<SlotRow>, sqlx::Error> {
    sqlx::query_as::<_, SlotRow>(&format!(
        "SELECT {SLOT_COLUMNS} FROM cms_slots
         WHERE ?1 IS NULL OR slot_type = ?1
         ORDER BY slot_id"
    ))
    .bind(slot_type)
    .fetch_all(pool)
    .await
}

/// Returns true if a slot was removed.
pub async fn delete(pool: &SqlitePool, slot_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cms_slots WHERE slot_id = ?1")
        .bind(slot_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM cms_slots")
        .fetch_one(pool)
        .await
}

async fn current_version(pool: &SqlitePool, slot_id: &str) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT version FROM cms_slots WHERE slot_id = ?1")
        .bind(slot_id)
        .fetch_optional(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use serde_json::json;

    fn saved(outcome: SaveOutcome) -> SlotRow {
        match outcome {
            SaveOutcome::Saved(row) => row,
            SaveOutcome::Conflict { current_version } => {
                panic!("unexpected conflict at version {current_version}")
            }
        }
    }

    #[tokio::test]
    async fn test_last_write_wins_increments_version() {
        let pool = test_pool().await;

        let first = saved(save(&pool, "hero", &json!({"url": "a.jpg"}), Some(SlotType::Single), None).await.unwrap());
        assert_eq!(first.version, 1);

        let second = saved(save(&pool, "hero", &json!({"url": "b.jpg"}), Some(SlotType::Single), None).await.unwrap());
        assert_eq!(second.version, 2);
        assert_eq!(second.data.0, json!({"url": "b.jpg"}));
        assert!(second.last_modified >= first.last_modified);

        let loaded = get(&pool, "hero").await.unwrap().unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.data.0, json!({"url": "b.jpg"}));
    }

    #[tokio::test]
    async fn test_create_only_conflicts_when_slot_exists() {
        let pool = test_pool().await;

        let created = saved(save(&pool, "about", &json!("text"), Some(SlotType::Single), Some(0)).await.unwrap());
        assert_eq!(created.version, 1);

        match save(&pool, "about", &json!("other"), Some(SlotType::Single), Some(0)).await.unwrap() {
            SaveOutcome::Conflict { current_version } => assert_eq!(current_version, 1),
            SaveOutcome::Saved(_) => panic!("create-only save overwrote an existing slot"),
        }
        assert_eq!(get(&pool, "about").await.unwrap().unwrap().data.0, json!("text"));
    }

    #[tokio::test]
    async fn test_expected_version_must_match() {
        let pool = test_pool().await;
        save(&pool, "gallery", &json!([1]), Some(SlotType::Gallery), None).await.unwrap();
        save(&pool, "gallery", &json!([1, 2]), Some(SlotType::Gallery), None).await.unwrap();

        match save(&pool, "gallery", &json!([]), Some(SlotType::Gallery), Some(1)).await.unwrap() {
            SaveOutcome::Conflict { current_version } => assert_eq!(current_version, 2),
            SaveOutcome::Saved(_) => panic!("stale write accepted"),
        }

        let updated = saved(save(&pool, "gallery", &json!([1, 2, 3]), Some(SlotType::Gallery), Some(2)).await.unwrap());
        assert_eq!(updated.version, 3);
        assert_eq!(updated.slot_type, SlotType::Gallery);
    }

    #[tokio::test]
    async fn test_expected_version_on_missing_slot_reports_zero() {
        let pool = test_pool().await;
        match save(&pool, "ghost", &json!(1), Some(SlotType::Single), Some(4)).await.unwrap() {
            SaveOutcome::Conflict { current_version } => assert_eq!(current_version, 0),
            SaveOutcome::Saved(_) => panic!("update of a missing slot succeeded"),
        }
        assert!(get(&pool, "ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_same_expected_version_succeeds_once() {
        let pool = test_pool().await;
        save(&pool, "press", &json!({"n": 0}), Some(SlotType::Single), None).await.unwrap();

        let mut handles = Vec::new();
        for n in 1..=5 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                save(&pool, "press", &json!({"n": n}), Some(SlotType::Single), Some(1)).await.unwrap()
            }));
        }

        let mut wins = 0;
        for handle in handles {
            if let SaveOutcome::Saved(row) = handle.await.unwrap() {
                assert_eq!(row.version, 2);
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(get(&pool, "press").await.unwrap().unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_save_without_type_keeps_stored_type() {
        let pool = test_pool().await;
        save(&pool, "lookbook", &json!([]), Some(SlotType::Gallery), None).await.unwrap();

        let row = saved(save(&pool, "lookbook", &json!(["a.jpg"]), None, None).await.unwrap());
        assert_eq!(row.slot_type, SlotType::Gallery);
        assert_eq!(row.version, 2);

        let row = saved(save(&pool, "lookbook", &json!(["b.jpg"]), None, Some(2)).await.unwrap());
        assert_eq!(row.slot_type, SlotType::Gallery);

        let row = saved(save(&pool, "fresh", &json!({}), None, Some(0)).await.unwrap());
        assert_eq!(row.slot_type, SlotType::Single);
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_by_slot_id() {
        let pool = test_pool().await;
        save(&pool, "b-gallery", &json!([]), Some(SlotType::Gallery), None).await.unwrap();
        save(&pool, "a-hero", &json!({}), Some(SlotType::Single), None).await.unwrap();
        save(&pool, "c-gallery", &json!([]), Some(SlotType::Gallery), None).await.unwrap();

        let all: Vec<String> = list(&pool, None).await.unwrap().into_iter().map(|r| r.slot_id).collect();
        assert_eq!(all, vec!["a-hero", "b-gallery", "c-gallery"]);

        let galleries = list(&pool, Some(SlotType::Gallery)).await.unwrap();
        assert_eq!(galleries.len(), 2);
        assert!(galleries.iter().all(|r| r.slot_type == SlotType::Gallery));
        assert_eq!(count(&pool).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_delete() {
        let pool = test_pool().await;
        save(&pool, "hero", &json!({}), Some(SlotType::Single), None).await.unwrap();
        assert!(delete(&pool, "hero").await.unwrap());
        assert!(!delete(&pool, "hero").await.unwrap());
        assert_eq!(count(&pool).await.unwrap(), 0);
    }
}
