use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Validation(String),

    /// Identity provider refused or failed; message is the provider's own
    #[error("{0}")]
    Identity(String),

    /// Profile write failed during registration (identity already rolled back)
    #[error("{0}")]
    Profile(String),

    #[error("{message}")]
    PaymentRejected {
        message: String,
        details: Option<String>,
    },

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid {field}"),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::Gateway(ref msg) => {
                tracing::error!("Payment gateway error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Payment gateway error".to_string(),
                    Some(msg.clone()),
                )
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(msg.clone()),
                )
            }
            AppError::Validation(msg) | AppError::Identity(msg) | AppError::Profile(msg) => {
                (StatusCode::BAD_REQUEST, msg, None)
            }
            AppError::PaymentRejected { message, details } => {
                (StatusCode::BAD_REQUEST, message, details)
            }
            AppError::InvalidSignature => (
                StatusCode::UNAUTHORIZED,
                "Invalid signature".to_string(),
                None,
            ),
        };

        let body = match details {
            Some(details) => json!({ "error": error_message, "details": details }),
            None => json!({ "error": error_message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
