use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{GatewayError, PaymentGateway};
use crate::clients::bearer_client;
use crate::error::AppError;
use crate::models::{PaymentMetadata, VerifiedTransaction};

/// Paystack-compatible gateway client
#[derive(Clone)]
pub struct Paystack {
    client: Client,
    base_url: String,
}

/// Outer envelope of every gateway response
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// Transaction as reported by verification and by webhooks
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayTransaction {
    pub status: String,
    pub reference: String,
    pub amount: i64,
    #[serde(default, alias = "paidAt")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub gateway_response: Option<String>,
}

impl GatewayTransaction {
    /// Accept only completed charges
    pub fn into_verified(self) -> Result<VerifiedTransaction, GatewayError> {
        if self.status != "success" {
            return Err(GatewayError::Declined {
                message: format!("Transaction status is {}", self.status),
                details: Some(self.gateway_response.unwrap_or(self.status)),
            });
        }
        if self.amount <= 0 {
            return Err(GatewayError::Malformed(format!(
                "non-positive amount {} for {}",
                self.amount, self.reference
            )));
        }

        Ok(VerifiedTransaction {
            metadata: PaymentMetadata::from_value(self.metadata.as_ref()),
            reference: self.reference,
            amount_kobo: self.amount,
            paid_at: self.paid_at.unwrap_or_else(Utc::now),
        })
    }
}

/// Interpret a verification response
pub fn interpret(envelope: Envelope<GatewayTransaction>) -> Result<VerifiedTransaction, GatewayError> {
    if !envelope.status {
        return Err(GatewayError::Declined {
            message: envelope.message,
            details: None,
        });
    }

    envelope
        .data
        .ok_or_else(|| GatewayError::Malformed("verification response has no data".into()))?
        .into_verified()
}

/// Webhook notification body
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: Value,
}

impl Paystack {
    pub fn new(base_url: &str, secret_key: &str, timeout_secs: u64) -> Result<Self, AppError> {
        Ok(Self {
            client: bearer_client(secret_key, timeout_secs)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn verify_url(&self, reference: &str) -> String {
        format!(
            "{}/transaction/verify/{}",
            self.base_url,
            urlencoding::encode(reference)
        )
    }
}

#[async_trait]
impl PaymentGateway for Paystack {
    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError> {
        let response = self.client.get(self.verify_url(reference)).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // Declines come back as 4xx with a normal envelope
        let envelope: Envelope<GatewayTransaction> = serde_json::from_str(&body).map_err(|e| {
            GatewayError::Malformed(format!("status {status}: {e}"))
        })?;

        tracing::debug!(reference = %reference, gateway_status = envelope.status, "Gateway verification answered");
        interpret(envelope)
    }
}
