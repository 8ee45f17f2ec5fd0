pub mod cms;
pub mod contact;
pub mod health;
pub mod imagekit;
pub mod records;

use axum::{extract::DefaultBodyLimit, Router};

use crate::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/cms", cms::router())
        .nest("/api/records", records::router())
        .merge(imagekit::router().layer(DefaultBodyLimit::max(state.config.max_upload_bytes)))
        .merge(contact::router())
        .merge(health::router())
        .with_state(state)
}
