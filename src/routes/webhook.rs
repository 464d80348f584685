use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};

use crate::constants::PAYSTACK_SIGNATURE_HEADER;
use crate::error::{AppError, Result};
use crate::payments::paystack::{GatewayTransaction, WebhookEvent};
use crate::security::verify_webhook_signature;
use crate::services::settle;
use crate::AppState;

const CHARGE_SUCCESS: &str = "charge.success";

fn acknowledged() -> Json<Value> {
    Json(json!({ "received": true }))
}

/// Gateway webhook
///
/// Settles `charge.success` events for the seller named in the charge
/// metadata. Other events are acknowledged and ignored. Settlement is keyed
/// on the reference, so a webhook racing a client-side verification applies
/// once.
pub async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let signature = headers
        .get(PAYSTACK_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidSignature)?;

    if !verify_webhook_signature(&body, signature, &state.config.paystack_secret_key) {
        tracing::warn!("Rejected webhook with invalid signature");
        return Err(AppError::InvalidSignature);
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid webhook payload: {e}")))?;

    if event.event != CHARGE_SUCCESS {
        tracing::debug!(event = %event.event, "Ignoring webhook event");
        return Ok(acknowledged());
    }

    let charge: GatewayTransaction = serde_json::from_value(event.data)
        .map_err(|e| AppError::Validation(format!("Invalid charge payload: {e}")))?;

    let transaction = match charge.into_verified() {
        Ok(tx) => tx,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unsettleable charge");
            return Ok(acknowledged());
        }
    };

    let Some(seller_id) = transaction.metadata.seller_id.clone() else {
        tracing::warn!(reference = %transaction.reference, "Charge has no seller_id in metadata");
        return Ok(acknowledged());
    };

    let flags = state.store.load_feature_flags().await?;
    let settled = settle(
        state.store.as_ref(),
        &flags,
        state.config.sms_unit_price_kobo,
        &transaction,
        &seller_id,
    )
    .await;

    // Rejected charges stay rejected on retry; only store failures are redelivered
    match settled {
        Ok(_) => Ok(acknowledged()),
        Err(e @ (AppError::PaymentRejected { .. } | AppError::Validation(_))) => {
            tracing::warn!(
                reference = %transaction.reference,
                error = %e,
                "Ignoring charge that cannot be settled"
            );
            Ok(acknowledged())
        }
        Err(e) => Err(e),
    }
}
