use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use sha1::Sha1;
use uuid::Uuid;

use super::{ensure_success, MediaService, ServiceError};
use crate::config::ImageKitConfig;
use crate::models::media::{AuthParameters, UploadFile, UploadedFile};

/// Lifetime of a client upload signature.
pub const AUTH_TOKEN_TTL_SECS: i64 = 30 * 60;

/// `hex(HMAC-SHA1(private_key, token + expire))`
pub fn sign(private_key: &str, token: &str, expire: i64) -> String {
    let mut mac = Hmac::<Sha1>::new_from_slice(private_key.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(token.as_bytes());
    mac.update(expire.to_string().as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub fn authentication_parameters(private_key: &str, token: String, expire: i64) -> AuthParameters {
    let signature = sign(private_key, &token, expire);
    AuthParameters {
        token,
        expire,
        signature,
    }
}

#[derive(Clone)]
pub struct ImageKitClient {
    client: Client,
    config: ImageKitConfig,
}

impl ImageKitClient {
    pub fn new(mut config: ImageKitConfig) -> Self {
        config.upload_url = config.upload_url.trim_end_matches('/').to_string();
        config.api_url = config.api_url.trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl MediaService for ImageKitClient {
    fn public_key(&self) -> &str {
        &self.config.public_key
    }

    fn url_endpoint(&self) -> &str {
        &self.config.url_endpoint
    }

    fn authentication_parameters(&self) -> AuthParameters {
        let expire = chrono::Utc::now().timestamp() + AUTH_TOKEN_TTL_SECS;
        authentication_parameters(&self.config.private_key, Uuid::new_v4().to_string(), expire)
    }

    async fn upload(&self, file: UploadFile) -> Result<UploadedFile, ServiceError> {
        let size = file.bytes.len();
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|_| ServiceError::InvalidContentType(file.content_type.clone()))?;

        let mut form = Form::new()
            .part("file", part)
            .text("fileName", file.file_name.clone())
            .text("folder", file.folder.clone())
            .text("useUniqueFileName", "true");
        if !file.tags.is_empty() {
            form = form.text("tags", file.tags.join(","));
        }

        tracing::debug!(file_name = %file.file_name, folder = %file.folder, size, "uploading to ImageKit");

        let resp = self
            .client
            .post(format!("{}/files/upload", self.config.upload_url))
            .basic_auth(&self.config.private_key, Some(""))
            .multipart(form)
            .send()
            .await?;

        let uploaded = ensure_success(resp).await?.json::<UploadedFile>().await?;
        tracing::info!(file_id = %uploaded.file_id, url = %uploaded.url, "ImageKit upload complete");
        Ok(uploaded)
    }

    async fn delete(&self, file_id: &str) -> Result<(), ServiceError> {
        let resp = self
            .client
            .delete(format!("{}/files/{}", self.config.api_url, file_id))
            .basic_auth(&self.config.private_key, Some(""))
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound);
        }
        ensure_success(resp).await?;
        tracing::info!(file_id, "ImageKit file deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        extract::{Multipart, Path},
        http::{header::AUTHORIZATION, HeaderMap, StatusCode},
        routing::{delete, post},
        Json, Router,
    };
    use serde_json::{json, Value};

    use super::*;
    use crate::test_support::spawn_fake_vendor;

    const PRIVATE_KEY: &str = "private_test_key";
    // base64("private_test_key:")
    const BASIC_AUTH: &str = "Basic cHJpdmF0ZV90ZXN0X2tleTo=";

    #[test]
    fn test_sign_matches_known_vector() {
        assert_eq!(
            sign(PRIVATE_KEY, "f8a3c1d2-0000-4000-8000-000000000001", 1700001800),
            "b047171d8a8d75afe36e233631ce65da82ec1983"
        );
    }

    #[test]
    fn test_authentication_parameters() {
        let params = authentication_parameters(
            PRIVATE_KEY,
            "f8a3c1d2-0000-4000-8000-000000000001".to_string(),
            1700001800,
        );
        assert_eq!(params.expire, 1700001800);
        assert_eq!(params.signature, "b047171d8a8d75afe36e233631ce65da82ec1983");
    }

    fn client(base: &str) -> ImageKitClient {
        ImageKitClient::new(ImageKitConfig {
            public_key: "public_test_key".into(),
            private_key: PRIVATE_KEY.into(),
            url_endpoint: "https://ik.imagekit.io/redux".into(),
            upload_url: format!("{base}/"),
            api_url: base.to_string(),
        })
    }

    #[test]
    fn test_client_signatures_expire_in_thirty_minutes() {
        let client = client("http://127.0.0.1:1");
        let now = chrono::Utc::now().timestamp();
        let params = client.authentication_parameters();
        assert!(params.expire >= now + AUTH_TOKEN_TTL_SECS);
        assert!(params.expire <= now + AUTH_TOKEN_TTL_SECS + 5);
        assert!(Uuid::parse_str(&params.token).is_ok());
        assert_eq!(params.signature, sign(PRIVATE_KEY, &params.token, params.expire));
        assert_ne!(client.authentication_parameters().token, params.token);
    }

    async fn fake_upload(headers: HeaderMap, mut multipart: Multipart) -> (StatusCode, Json<Value>) {
        if headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some(BASIC_AUTH) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Your request does not contain private API key."})),
            );
        }

        let mut fields = HashMap::new();
        while let Ok(Some(field)) = multipart.next_field().await {
            let name = field.name().unwrap_or_default().to_string();
            let value = if name == "file" {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let len = field.bytes().await.map(|b| b.len()).unwrap_or(0);
                format!("{content_type};{len}")
            } else {
                field.text().await.unwrap_or_default()
            };
            fields.insert(name, value);
        }

        let expected = [
            ("file", "image/jpeg;4"),
            ("fileName", "look_1.jpg"),
            ("folder", "/lookbook"),
            ("useUniqueFileName", "true"),
            ("tags", "ss25,runway"),
        ];
        for (key, want) in expected {
            if fields.get(key).map(String::as_str) != Some(want) {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"message": format!("unexpected {key}: {:?}", fields.get(key))})),
                );
            }
        }

        (
            StatusCode::OK,
            Json(json!({
                "fileId": "file_123",
                "name": "look_1_a1B2c3.jpg",
                "url": "https://ik.imagekit.io/redux/lookbook/look_1_a1B2c3.jpg",
                "thumbnailUrl": "https://ik.imagekit.io/redux/tr:n-ik_ml_thumbnail/lookbook/look_1_a1B2c3.jpg",
                "filePath": "/lookbook/look_1_a1B2c3.jpg",
                "width": 800,
                "height": 1200,
                "size": 4,
                "fileType": "image"
            })),
        )
    }

    async fn fake_delete(headers: HeaderMap, Path(file_id): Path<String>) -> StatusCode {
        if headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some(BASIC_AUTH) {
            return StatusCode::UNAUTHORIZED;
        }
        if file_id == "file_123" {
            StatusCode::NO_CONTENT
        } else {
            StatusCode::NOT_FOUND
        }
    }

    fn upload_file() -> UploadFile {
        UploadFile {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
            file_name: "look_1.jpg".into(),
            content_type: "image/jpeg".into(),
            folder: "/lookbook".into(),
            tags: vec!["ss25".into(), "runway".into()],
        }
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_with_basic_auth() {
        let base = spawn_fake_vendor(Router::new().route("/files/upload", post(fake_upload))).await;

        let uploaded = client(&base).upload(upload_file()).await.unwrap();
        assert_eq!(uploaded.file_id, "file_123");
        assert_eq!(uploaded.file_path.as_deref(), Some("/lookbook/look_1_a1B2c3.jpg"));
        assert_eq!(uploaded.height, Some(1200));
    }

    #[tokio::test]
    async fn test_upload_surfaces_vendor_rejection() {
        let base = spawn_fake_vendor(Router::new().route("/files/upload", post(fake_upload))).await;

        let mut file = upload_file();
        file.folder = "/elsewhere".into();
        match client(&base).upload(file).await {
            Err(ServiceError::Rejected { status, message }) => {
                assert_eq!(status, 400);
                assert!(message.starts_with("unexpected folder"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upload_rejects_unparseable_content_type_before_sending() {
        let mut file = upload_file();
        file.content_type = "image/jp(eg".into();
        match client("http://127.0.0.1:1").upload(file).await {
            Err(ServiceError::InvalidContentType(content_type)) => assert_eq!(content_type, "image/jp(eg"),
            other => panic!("expected invalid content type, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_maps_missing_file() {
        let base =
            spawn_fake_vendor(Router::new().route("/files/{file_id}", delete(fake_delete))).await;
        let client = client(&base);

        client.delete("file_123").await.unwrap();
        assert!(matches!(
            client.delete("file_999").await,
            Err(ServiceError::NotFound)
        ));
    }
}
