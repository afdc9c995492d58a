use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

/// Liveness probe. Says nothing about any game or the store; a healthy
/// relay with an unreachable store still answers here.
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
