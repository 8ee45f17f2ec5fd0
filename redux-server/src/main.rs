mod config;
mod db;
mod error;
mod extract;
mod models;
mod routes;
mod services;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::Config;
use services::{ImageKitClient, Mailer, MediaService, ResendClient};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    /// `None` when ImageKit credentials are not set; media routes answer 503.
    pub media: Option<Arc<dyn MediaService>>,
    /// `None` when Resend is not set up; the contact route answers 503.
    pub mailer: Option<Arc<dyn Mailer>>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Self {
        let media = config
            .imagekit
            .clone()
            .map(|c| Arc::new(ImageKitClient::new(c)) as Arc<dyn MediaService>);
        let mailer = config
            .resend
            .clone()
            .map(|c| Arc::new(ResendClient::new(c)) as Arc<dyn Mailer>);

        Self {
            db,
            config: Arc::new(config),
            media,
            mailer,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::cms::save_slot,
        routes::cms::load_slot,
        routes::cms::load_all_slots,
        routes::cms::delete_slot,
        routes::cms::cms_health,
        routes::records::create_record,
        routes::records::list_records,
        routes::records::get_record,
        routes::records::update_record,
        routes::records::delete_record,
        routes::imagekit::auth_parameters,
        routes::imagekit::upload_file,
        routes::imagekit::delete_file_by_query,
        routes::imagekit::delete_file,
        routes::contact::submit_contact,
        routes::health::health_check,
    ),
    components(schemas(
        error::ErrorBody,
        models::cms::SlotType,
        models::cms::CmsSlot,
        models::cms::SaveSlotRequest,
        models::cms::SlotResponse,
        models::cms::SlotListResponse,
        models::cms::DeleteSlotResponse,
        models::cms::CmsHealthResponse,
        models::record::Record,
        models::record::RecordBody,
        models::record::RecordListResponse,
        models::media::AuthResponse,
        models::media::UploadForm,
        models::media::UploadedFile,
        models::media::UploadResponse,
        models::media::DeleteFileResponse,
        models::contact::ContactRequest,
        models::contact::ContactResponse,
        models::health::HealthResponse,
        models::health::DatabaseHealth,
        models::health::EnvironmentHealth,
    )),
    tags(
        (name = "CMS", description = "Editable content slots with versioned saves"),
        (name = "Records", description = "Schemaless JSON records grouped by table"),
        (name = "Media", description = "ImageKit upload signing, uploads and deletes"),
        (name = "Contact", description = "Contact form delivery"),
        (name = "Health", description = "Service health")
    )
)]
struct ApiDoc;

fn cors_layer(origins: &str) -> CorsLayer {
    if origins.trim() == "*" {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
}

fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    routes::api_router(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("redux_server=debug,tower_http=debug")),
        )
        .init();

    let config = Config::from_env();
    if !config.missing_env.is_empty() {
        tracing::warn!(missing = ?config.missing_env, "starting with incomplete environment");
    }

    let pool = db::connect(&config.database_url)
        .await
        .expect("Failed to open database");

    let listen_addr = config.listen_addr.clone();
    let state = AppState::new(pool, config);
    tracing::info!(
        imagekit = state.media.is_some(),
        email = state.mailer.is_some(),
        "vendor integrations"
    );

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .expect("Failed to bind listen address");
    tracing::info!("Listening on {}", listen_addr);
    tracing::info!("Swagger UI at http://{}/docs/", listen_addr);
    axum::serve(listener, app(state))
        .await
        .expect("Server error");
}
