use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::db::records;
use crate::error::{ApiError, ErrorBody};
use crate::extract::{ApiJson, ApiQuery};
use crate::models::record::{
    validate_filter_field, validate_table_name, Record, RecordBody, RecordListResponse,
    RecordQuery,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{table}", get(list_records).post(create_record))
        .route(
            "/{table}/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
}

fn table_name(table: &str) -> Result<&str, ApiError> {
    validate_table_name(table).map_err(ApiError::bad_request)
}

fn object_data(body: &RecordBody) -> Result<&serde_json::Value, ApiError> {
    if body.data.is_object() {
        Ok(&body.data)
    } else {
        Err(ApiError::bad_request("data must be a JSON object"))
    }
}

#[utoipa::path(
    post,
    path = "/api/records/{table}",
    params(("table" = String, Path, description = "Table name ([a-z0-9_], max 64)")),
    request_body = RecordBody,
    responses(
        (status = 201, description = "Record created", body = Record),
        (status = 400, description = "Invalid table name or data", body = ErrorBody),
    ),
    tag = "Records"
)]
pub(crate) async fn create_record(
    State(state): State<AppState>,
    Path(table): Path<String>,
    ApiJson(body): ApiJson<RecordBody>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let table = table_name(&table)?;
    let data = object_data(&body)?;

    let row = records::create(&state.db, table, data).await?;
    tracing::debug!(table, id = %row.id, "record created");
    Ok((StatusCode::CREATED, Json(row.into())))
}

#[utoipa::path(
    get,
    path = "/api/records/{table}",
    params(
        ("table" = String, Path, description = "Table name"),
        RecordQuery,
    ),
    responses(
        (status = 200, description = "Records, newest first", body = RecordListResponse),
        (status = 400, description = "Invalid table name or filter", body = ErrorBody),
    ),
    tag = "Records"
)]
pub(crate) async fn list_records(
    State(state): State<AppState>,
    Path(table): Path<String>,
    ApiQuery(query): ApiQuery<RecordQuery>,
) -> Result<Json<RecordListResponse>, ApiError> {
    let table = table_name(&table)?;
    let filter = match (query.field.as_deref(), query.value.as_deref()) {
        (Some(field), Some(value)) => {
            Some((validate_filter_field(field).map_err(ApiError::bad_request)?, value))
        }
        (None, None) => None,
        _ => return Err(ApiError::bad_request("field and value must be given together")),
    };

    let records: Vec<Record> = records::list(&state.db, table, filter)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(RecordListResponse {
        count: records.len(),
        records,
    }))
}

#[utoipa::path(
    get,
    path = "/api/records/{table}/{id}",
    params(
        ("table" = String, Path, description = "Table name"),
        ("id" = String, Path, description = "Record id"),
    ),
    responses(
        (status = 200, description = "Record", body = Record),
        (status = 404, description = "Record not found", body = ErrorBody),
    ),
    tag = "Records"
)]
pub(crate) async fn get_record(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
) -> Result<Json<Record>, ApiError> {
    let table = table_name(&table)?;
    let row = records::get(&state.db, table, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Record not found"))?;
    Ok(Json(row.into()))
}

#[utoipa::path(
    put,
    path = "/api/records/{table}/{id}",
    params(
        ("table" = String, Path, description = "Table name"),
        ("id" = String, Path, description = "Record id"),
    ),
    request_body = RecordBody,
    responses(
        (status = 200, description = "Record updated (merge patch)", body = Record),
        (status = 400, description = "data is not an object", body = ErrorBody),
        (status = 404, description = "Record not found", body = ErrorBody),
    ),
    tag = "Records"
)]
pub(crate) async fn update_record(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
    ApiJson(body): ApiJson<RecordBody>,
) -> Result<Json<Record>, ApiError> {
    let table = table_name(&table)?;
    let patch = object_data(&body)?;

    let row = records::update(&state.db, table, &id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Record not found"))?;
    Ok(Json(row.into()))
}

#[utoipa::path(
    delete,
    path = "/api/records/{table}/{id}",
    params(
        ("table" = String, Path, description = "Table name"),
        ("id" = String, Path, description = "Record id"),
    ),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 404, description = "Record not found", body = ErrorBody),
    ),
    tag = "Records"
)]
pub(crate) async fn delete_record(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let table = table_name(&table)?;
    if !records::delete(&state.db, table, &id).await? {
        return Err(ApiError::not_found("Record not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
