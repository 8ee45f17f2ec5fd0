use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Parameters the browser SDK needs to upload directly to ImageKit.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AuthParameters {
    pub token: String,
    /// Unix seconds
    pub expire: i64,
    /// Lowercase hex HMAC-SHA1 of `token + expire`
    pub signature: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub expire: i64,
    pub signature: String,
    pub public_key: String,
    pub url_endpoint: String,
}

/// A file received from the browser, ready to forward.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
    pub folder: String,
    pub tags: Vec<String>,
}

/// File details as ImageKit reports them.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub file_id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub file_type: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub file: UploadedFile,
}

/// Multipart body accepted by the upload routes (documentation only).
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Defaults to the uploaded file's name
    pub file_name: Option<String>,
    /// Defaults to "/"
    pub folder: Option<String>,
    /// Comma-separated
    pub tags: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DeleteFileQuery {
    pub file_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileResponse {
    pub success: bool,
    pub file_id: String,
}

/// ImageKit file ids are short alphanumeric strings.
pub fn validate_file_id(raw: &str) -> Result<&str, &'static str> {
    let file_id = raw.trim();
    if file_id.is_empty() {
        return Err("fileId is required");
    }
    if file_id.len() > 64
        || !file_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err("Invalid fileId");
    }
    Ok(file_id)
}

pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
