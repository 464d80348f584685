//! Payment gateway seam.

pub mod paystack;

use async_trait::async_trait;
use thiserror::Error;

use crate::constants::ERR_PAYMENT_VERIFICATION_FAILED;
use crate::error::AppError;
use crate::models::VerifiedTransaction;

pub use paystack::Paystack;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Gateway answered but the transaction is not a completed payment
    #[error("{message}")]
    Declined {
        message: String,
        details: Option<String>,
    },

    #[error("Gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected gateway response: {0}")]
    Malformed(String),
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Declined { message, details } => AppError::PaymentRejected {
                message: ERR_PAYMENT_VERIFICATION_FAILED.to_string(),
                details: details.or(Some(message)),
            },
            GatewayError::Transport(e) => AppError::Gateway(e.to_string()),
            GatewayError::Malformed(msg) => AppError::Gateway(msg),
        }
    }
}

/// Verifies that a payment reference was actually paid
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError>;
}
