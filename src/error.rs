use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The analyze API could not be reached.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The analyze API answered with a body we could not understand.
    #[error("Format error: {0}")]
    Format(String),

    /// The analyze API answered with a non-2xx status.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// User input rejected before any request is issued.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::Transport(msg) => {
                tracing::error!("Analyze API unreachable: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    format!("Analyze API unreachable: {msg}"),
                )
            }
            Self::Format(msg) => {
                tracing::error!("Analyze API format error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    format!("Unexpected response from analyze API: {msg}"),
                )
            }
            Self::Server { status, message } => {
                tracing::warn!(upstream_status = status, "Analyze API error: {message}");
                (
                    StatusCode::BAD_GATEWAY,
                    format!("Analyze API error ({status}): {message}"),
                )
            }
            Self::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            Self::Config(e) => {
                tracing::error!("Config error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".to_string(),
                )
            }
            Self::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
