use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::config::Config;
use crate::models::media::{AuthParameters, UploadFile, UploadedFile};
use crate::services::{imagekit, Mailer, MediaService, OutgoingEmail, ServiceError};
use crate::AppState;

pub const TEST_PRIVATE_KEY: &str = "private_test_key";
pub const TEST_TOKEN: &str = "f8a3c1d2-0000-4000-8000-000000000001";
pub const TEST_EXPIRE: i64 = 1700001800;

/// Router over a fresh in-memory database with no vendors configured.
pub async fn test_app() -> (Router, AppState) {
    let state = AppState {
        db: crate::db::test_pool().await,
        config: Arc::new(Config::from_lookup(|_| None)),
        media: None,
        mailer: None,
    };
    (crate::routes::api_router(state.clone()), state)
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("router is infallible");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_fake_vendor(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

#[derive(Default)]
pub struct FakeMedia {
    pub uploads: Mutex<Vec<UploadFile>>,
    pub deleted: Mutex<Vec<String>>,
    pub unavailable: bool,
}

#[async_trait]
impl MediaService for FakeMedia {
    fn public_key(&self) -> &str {
        "public_test_key"
    }

    fn url_endpoint(&self) -> &str {
        "https://ik.imagekit.io/redux"
    }

    fn authentication_parameters(&self) -> AuthParameters {
        imagekit::authentication_parameters(TEST_PRIVATE_KEY, TEST_TOKEN.to_string(), TEST_EXPIRE)
    }

    async fn upload(&self, file: UploadFile) -> Result<UploadedFile, ServiceError> {
        if self.unavailable {
            return Err(ServiceError::Rejected {
                status: 500,
                message: "Internal server error".into(),
            });
        }
        let uploaded = UploadedFile {
            file_id: "file_123".into(),
            name: file.file_name.clone(),
            url: format!("https://ik.imagekit.io/redux{}/{}", file.folder, file.file_name),
            thumbnail_url: None,
            file_path: Some(format!("{}/{}", file.folder, file.file_name)),
            width: None,
            height: None,
            size: file.bytes.len() as u64,
            file_type: Some("image".into()),
        };
        self.uploads.lock().unwrap().push(file);
        Ok(uploaded)
    }

    async fn delete(&self, file_id: &str) -> Result<(), ServiceError> {
        if file_id == "missing" {
            return Err(ServiceError::NotFound);
        }
        self.deleted.lock().unwrap().push(file_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub failing: bool,
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<String, ServiceError> {
        if self.failing {
            return Err(ServiceError::Rejected {
                status: 422,
                message: "Invalid `from` field.".into(),
            });
        }
        self.sent.lock().unwrap().push(email);
        Ok("email_123".into())
    }
}
