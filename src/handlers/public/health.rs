use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health - API and document store status
///
/// 200 when the store answers a ping, 503 otherwise.
pub async fn get(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": {
                    "status": "connected",
                    "backend": state.store.backend(),
                    "working": true,
                    "error": null
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed on {} store: {}", state.store.backend(), e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "database": {
                        "status": "error",
                        "backend": state.store.backend(),
                        "working": false,
                        "error": "Database unreachable"
                    }
                })),
            )
        }
    }
}
