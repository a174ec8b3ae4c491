use axum::extract::State;
use serde_json::{json, Value};

use crate::config::AppState;
use crate::interceptors::{ApiSuccess, AppError};

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<ApiSuccess<Value>, AppError> {
    let data = json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "queues": state.registry.len(),
        "connections": state.hub().connection_count().await,
        "topics": state.hub().topic_count().await,
    });

    Ok(ApiSuccess::new("Service is healthy", data))
}
