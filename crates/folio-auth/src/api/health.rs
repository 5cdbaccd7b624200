//! `GET /health`: process is up and the credential store answers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::error;

use super::types::HealthResponse;
use crate::service::SessionController;

pub async fn health(
    State(ctl): State<Arc<SessionController>>,
) -> (StatusCode, Json<HealthResponse>) {
    let (status, label) = match ctl.ping_store().await {
        Ok(()) => (StatusCode::OK, "serving"),
        Err(e) => {
            error!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        status,
        Json(HealthResponse {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            status: label.to_string(),
        }),
    )
}
