use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};

use crate::db::slots::{self, SaveOutcome};
use crate::error::{ApiError, ErrorBody};
use crate::extract::{ApiJson, ApiQuery};
use crate::models::cms::{
    validate_slot_id, CmsHealthResponse, DeleteSlotResponse, SaveSlotRequest, SlotListQuery,
    SlotListResponse, SlotQuery, SlotResponse,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/save", post(save_slot))
        .route("/load", get(load_slot))
        .route("/load-all", get(load_all_slots))
        .route("/delete", delete(delete_slot))
        .route("/health", get(cms_health))
}

fn required_slot_id(query: &SlotQuery) -> Result<&str, ApiError> {
    validate_slot_id(query.slot_id.as_deref().unwrap_or_default()).map_err(ApiError::bad_request)
}

#[utoipa::path(
    post,
    path = "/api/cms/save",
    request_body = SaveSlotRequest,
    responses(
        (status = 200, description = "Slot saved", body = SlotResponse),
        (status = 400, description = "Invalid slotId or missing data", body = ErrorBody),
        (status = 409, description = "expectedVersion does not match the stored version", body = ErrorBody),
    ),
    tag = "CMS"
)]
pub(crate) async fn save_slot(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SaveSlotRequest>,
) -> Result<Json<SlotResponse>, ApiError> {
    let slot_id = validate_slot_id(&req.slot_id).map_err(ApiError::bad_request)?;
    if req.data.is_null() {
        return Err(ApiError::bad_request("data is required"));
    }
    if req.expected_version.is_some_and(|v| v < 0) {
        return Err(ApiError::bad_request("expectedVersion must not be negative"));
    }

    match slots::save(&state.db, slot_id, &req.data, req.slot_type, req.expected_version).await? {
        SaveOutcome::Saved(row) => {
            tracing::info!(slot_id, version = row.version, "CMS slot saved");
            Ok(Json(SlotResponse {
                success: true,
                slot: row.into(),
            }))
        }
        SaveOutcome::Conflict { current_version } => {
            tracing::warn!(
                slot_id,
                expected = ?req.expected_version,
                current_version,
                "CMS save rejected: version conflict"
            );
            Err(ApiError::VersionConflict { current_version })
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/cms/load",
    params(SlotQuery),
    responses(
        (status = 200, description = "Slot contents", body = SlotResponse),
        (status = 400, description = "Missing slotId", body = ErrorBody),
        (status = 404, description = "Slot not found", body = ErrorBody),
    ),
    tag = "CMS"
)]
pub(crate) async fn load_slot(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SlotQuery>,
) -> Result<Json<SlotResponse>, ApiError> {
    let slot_id = required_slot_id(&query)?;
    let row = slots::get(&state.db, slot_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Slot not found"))?;

    Ok(Json(SlotResponse {
        success: true,
        slot: row.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/cms/load-all",
    params(SlotListQuery),
    responses(
        (status = 200, description = "All slots ordered by slotId", body = SlotListResponse),
    ),
    tag = "CMS"
)]
pub(crate) async fn load_all_slots(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SlotListQuery>,
) -> Result<Json<SlotListResponse>, ApiError> {
    let slots: Vec<_> = slots::list(&state.db, query.slot_type)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(SlotListResponse {
        success: true,
        count: slots.len(),
        slots,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/cms/delete",
    params(SlotQuery),
    responses(
        (status = 200, description = "Slot deleted", body = DeleteSlotResponse),
        (status = 404, description = "Slot not found", body = ErrorBody),
    ),
    tag = "CMS"
)]
pub(crate) async fn delete_slot(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SlotQuery>,
) -> Result<Json<DeleteSlotResponse>, ApiError> {
    let slot_id = required_slot_id(&query)?;
    if !slots::delete(&state.db, slot_id).await? {
        return Err(ApiError::not_found("Slot not found"));
    }

    tracing::info!(slot_id, "CMS slot deleted");
    Ok(Json(DeleteSlotResponse {
        success: true,
        slot_id: slot_id.to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/cms/health",
    responses(
        (status = 200, description = "CMS storage is readable", body = CmsHealthResponse),
        (status = 503, description = "CMS storage is unavailable", body = CmsHealthResponse),
    ),
    tag = "CMS"
)]
pub(crate) async fn cms_health(
    State(state): State<AppState>,
) -> (StatusCode, Json<CmsHealthResponse>) {
    let (status, slot_count, error) = match slots::count(&state.db).await {
        Ok(count) => (StatusCode::OK, Some(count), None),
        Err(err) => {
            tracing::error!(?err, "CMS health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                None,
                Some("Storage unavailable".to_string()),
            )
        }
    };

    (
        status,
        Json(CmsHealthResponse {
            status: if status == StatusCode::OK { "healthy" } else { "unhealthy" }.to_string(),
            storage: "sqlite".to_string(),
            slot_count,
            timestamp: chrono::Utc::now(),
            error,
        }),
    )
}
