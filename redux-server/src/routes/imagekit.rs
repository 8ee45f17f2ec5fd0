use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};

use crate::error::{ApiError, ErrorBody};
use crate::extract::ApiQuery;
use crate::models::media::{
    parse_tags, validate_file_id, AuthResponse, DeleteFileQuery, DeleteFileResponse, UploadFile,
    UploadForm, UploadResponse,
};
use crate::services::MediaService;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/imagekit/auth", get(auth_parameters))
        .route(
            "/api/imagekit/upload",
            post(upload_file).delete(delete_file_by_query),
        )
        .route("/api/upload", post(upload_file))
        .route("/api/imagekit/files/{file_id}", delete(delete_file))
}

fn media(state: &AppState) -> Result<Arc<dyn MediaService>, ApiError> {
    state
        .media
        .clone()
        .ok_or(ApiError::NotConfigured("ImageKit"))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::bad_request(format!("Invalid upload: {}", err.body_text()))
    }
}

#[utoipa::path(
    get,
    path = "/api/imagekit/auth",
    responses(
        (status = 200, description = "Signed parameters for a browser upload", body = AuthResponse),
        (status = 503, description = "ImageKit is not configured", body = ErrorBody),
    ),
    tag = "Media"
)]
pub(crate) async fn auth_parameters(
    State(state): State<AppState>,
) -> Result<Json<AuthResponse>, ApiError> {
    let media = media(&state)?;
    let params = media.authentication_parameters();

    Ok(Json(AuthResponse {
        token: params.token,
        expire: params.expire,
        signature: params.signature,
        public_key: media.public_key().to_string(),
        url_endpoint: media.url_endpoint().to_string(),
    }))
}

/// Reads the upload form. The file part is required; everything else has a default.
async fn read_upload(mut multipart: Multipart) -> Result<UploadFile, ApiError> {
    let mut file: Option<(Vec<u8>, Option<String>, Option<String>)> = None;
    let mut file_name = None;
    let mut folder = None;
    let mut tags = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let original_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((bytes.to_vec(), original_name, content_type));
            }
            "fileName" => file_name = Some(field.text().await.map_err(multipart_error)?),
            "folder" => folder = Some(field.text().await.map_err(multipart_error)?),
            "tags" => tags = parse_tags(&field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let Some((bytes, original_name, content_type)) = file else {
        return Err(ApiError::bad_request("No file provided"));
    };
    if bytes.is_empty() {
        return Err(ApiError::bad_request("No file provided"));
    }

    let content_type = content_type.unwrap_or_default();
    if !(content_type.starts_with("image/") || content_type.starts_with("video/")) {
        return Err(ApiError::bad_request(
            "Only image and video uploads are supported",
        ));
    }

    let file_name = [file_name, original_name]
        .into_iter()
        .flatten()
        .map(|n| n.trim().to_string())
        .find(|n| !n.is_empty())
        .unwrap_or_else(|| "upload".to_string());

    let folder = match folder.as_deref().map(str::trim) {
        None | Some("") => "/".to_string(),
        Some(f) if f.starts_with('/') => f.to_string(),
        Some(f) => format!("/{f}"),
    };

    Ok(UploadFile {
        bytes,
        file_name,
        content_type,
        folder,
        tags,
    })
}

#[utoipa::path(
    post,
    path = "/api/imagekit/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored on ImageKit", body = UploadResponse),
        (status = 400, description = "Missing or unsupported file", body = ErrorBody),
        (status = 413, description = "File too large", body = ErrorBody),
        (status = 502, description = "ImageKit rejected the upload", body = ErrorBody),
        (status = 503, description = "ImageKit is not configured", body = ErrorBody),
    ),
    tag = "Media"
)]
pub(crate) async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let media = media(&state)?;
    let upload = read_upload(multipart?).await?;

    tracing::info!(
        file_name = %upload.file_name,
        folder = %upload.folder,
        size = upload.bytes.len(),
        "forwarding upload"
    );
    let file = media.upload(upload).await?;

    Ok(Json(UploadResponse {
        success: true,
        file,
    }))
}

async fn remove(state: &AppState, raw_file_id: &str) -> Result<Json<DeleteFileResponse>, ApiError> {
    let media = media(state)?;
    let file_id = validate_file_id(raw_file_id).map_err(ApiError::bad_request)?;
    media.delete(file_id).await?;

    Ok(Json(DeleteFileResponse {
        success: true,
        file_id: file_id.to_string(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/imagekit/upload",
    params(DeleteFileQuery),
    responses(
        (status = 200, description = "File deleted", body = DeleteFileResponse),
        (status = 400, description = "Missing or invalid fileId", body = ErrorBody),
        (status = 404, description = "File not found", body = ErrorBody),
    ),
    tag = "Media"
)]
pub(crate) async fn delete_file_by_query(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DeleteFileQuery>,
) -> Result<Json<DeleteFileResponse>, ApiError> {
    remove(&state, query.file_id.as_deref().unwrap_or_default()).await
}

#[utoipa::path(
    delete,
    path = "/api/imagekit/files/{file_id}",
    params(("file_id" = String, Path, description = "ImageKit file id")),
    responses(
        (status = 200, description = "File deleted", body = DeleteFileResponse),
        (status = 400, description = "Invalid fileId", body = ErrorBody),
        (status = 404, description = "File not found", body = ErrorBody),
    ),
    tag = "Media"
)]
pub(crate) async fn delete_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<DeleteFileResponse>, ApiError> {
    remove(&state, &file_id).await
}
