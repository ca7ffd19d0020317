use crate::model::HealthResponse;
use axum::Json;

/// Liveness probe. The store is in-process, so being able to answer is enough.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
