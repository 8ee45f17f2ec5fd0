use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::ServiceError;

/// Error body returned by every route: `{ "error": "..." }`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: String,
    /// Present on version conflicts.
    #[serde(rename = "currentVersion", skip_serializing_if = "Option::is_none")]
    pub current_version: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Version conflict")]
    VersionConflict { current_version: i64 },
    #[error("File is too large")]
    PayloadTooLarge,
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error(transparent)]
    Upstream(#[from] ServiceError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::VersionConflict { .. } => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Upstream(ServiceError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Upstream(ServiceError::InvalidContentType(_)) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge;
        }
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, current_version) = match &self {
            ApiError::Database(err) => {
                tracing::error!(?err, "database error");
                ("Database error".to_string(), None)
            }
            ApiError::Upstream(ServiceError::NotFound) => ("File not found".to_string(), None),
            ApiError::Upstream(ServiceError::InvalidContentType(content_type)) => {
                (format!("Invalid content type: {content_type}"), None)
            }
            ApiError::Upstream(err) => {
                tracing::error!(%err, "upstream service error");
                ("Upstream service error".to_string(), None)
            }
            ApiError::VersionConflict { current_version } => {
                (self.to_string(), Some(*current_version))
            }
            _ => (self.to_string(), None),
        };

        (
            status,
            Json(ErrorBody {
                error,
                current_version,
            }),
        )
            .into_response()
    }
}
