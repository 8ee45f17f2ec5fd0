pub mod imagekit;
pub mod mailer;

use async_trait::async_trait;

use crate::models::media::{AuthParameters, UploadFile, UploadedFile};

pub use imagekit::ImageKitClient;
pub use mailer::{OutgoingEmail, ResendClient};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("not found")]
    NotFound,
    /// The outgoing request could not be built from the caller's input.
    #[error("invalid content type: {0}")]
    InvalidContentType(String),
}

/// Media CDN used for site imagery.
#[async_trait]
pub trait MediaService: Send + Sync {
    fn public_key(&self) -> &str;
    fn url_endpoint(&self) -> &str;
    /// Fresh signed parameters for a browser-side upload.
    fn authentication_parameters(&self) -> AuthParameters;
    async fn upload(&self, file: UploadFile) -> Result<UploadedFile, ServiceError>;
    async fn delete(&self, file_id: &str) -> Result<(), ServiceError>;
}

/// Transactional email delivery. Returns the provider's message id.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<String, ServiceError>;
}

/// Turns a non-2xx response into [`ServiceError::Rejected`].
pub(crate) async fn ensure_success(
    resp: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ServiceError::Rejected {
        status: status.as_u16(),
        message: extract_error(&body),
    })
}

fn extract_error(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))?
                .as_str()
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| body.to_string())
}
