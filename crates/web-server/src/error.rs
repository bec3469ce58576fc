use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use engine::EngineError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Engine(EngineError::InvalidInput(message)) => {
                (StatusCode::BAD_REQUEST, message)
            }
            AppError::Engine(e) if e.is_not_found() => (StatusCode::NOT_FOUND, e.to_string()),
            AppError::Engine(EngineError::Analytics(e)) => (StatusCode::NOT_FOUND, e.to_string()),
            AppError::Engine(e) => {
                tracing::error!(error = ?e, "Request failed.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
