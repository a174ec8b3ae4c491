use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use super::response::ApiError;
use crate::queue::RunnerError;

/// Every failure a request, a socket frame or startup can end in.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("invalid request: {0}")]
    ValidationError(String),

    #[error("{0}")]
    Conflict(String),

    #[error("could not start job: {0}")]
    RunnerStartError(String),

    #[error("internal error: {0}")]
    InternalError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("mqtt: {0}")]
    MqttError(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::RunnerStartError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "RUNNER_START_ERROR"),
            AppError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            AppError::ConfigError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            AppError::MqttError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "MQTT_ERROR"),
            AppError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }

    /// Machine readable code, shared by HTTP bodies and socket `error` frames.
    pub fn code(&self) -> &'static str {
        self.parts().1
    }

    pub fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    pub fn to_api_error(&self) -> ApiError {
        let (status, code) = self.parts();
        let body = ApiError::new(status, code, self.to_string());

        match self {
            AppError::ValidationError(fields) => body.with_details(json!({ "validation_errors": fields })),
            _ => body,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status_code().is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        self.to_api_error().into_response()
    }
}

impl From<RunnerError> for AppError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::NoSuchJob(id) => AppError::NotFound(format!("Job '{}' does not exist", id)),
            RunnerError::InvalidInput(msg) => AppError::BadRequest(msg),
            RunnerError::Start(msg) | RunnerError::Closed(msg) => AppError::RunnerStartError(msg),
            RunnerError::Fetch(msg) => AppError::InternalError(msg),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = AppError::NotFound("Queue 'x' does not exist".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(err.to_string(), "Queue 'x' does not exist");
    }

    #[test]
    fn runner_errors_keep_their_taxonomy() {
        let missing: AppError = RunnerError::NoSuchJob("job-x".to_string()).into();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let start: AppError = RunnerError::Start("spawn failed".to_string()).into();
        assert_eq!(start.code(), "RUNNER_START_ERROR");

        let closed: AppError = RunnerError::Closed("runner closed".to_string()).into();
        assert_eq!(closed.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_failures_carry_details() {
        let response = AppError::ValidationError("dataset: dataset is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
