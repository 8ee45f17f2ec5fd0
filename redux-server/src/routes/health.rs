use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::db;
use crate::models::health::{DatabaseHealth, EnvironmentHealth, HealthResponse};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health_check))
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Database reachable and environment complete", body = HealthResponse),
        (status = 503, description = "Database unreachable or required variables missing", body = HealthResponse),
    ),
    tag = "Health"
)]
pub(crate) async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let database = match db::ping(&state.db).await {
        Ok(latency) => DatabaseHealth {
            ok: true,
            latency_ms: Some(latency.as_millis() as u64),
            error: None,
        },
        Err(err) => {
            tracing::error!(?err, "health check: database unreachable");
            DatabaseHealth {
                ok: false,
                latency_ms: None,
                error: Some("Database unreachable".to_string()),
            }
        }
    };

    let missing: Vec<String> = state
        .config
        .missing_env
        .iter()
        .map(|key| key.to_string())
        .collect();
    let environment = EnvironmentHealth {
        ok: missing.is_empty(),
        missing,
    };

    let healthy = database.ok && environment.ok;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "degraded" }.to_string(),
            timestamp: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database,
            environment,
        }),
    )
}
