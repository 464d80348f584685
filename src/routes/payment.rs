use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::constants::ERR_PAYMENT_FIELDS_REQUIRED;
use crate::error::{AppError, Result};
use crate::routes::extract::AppJson;
use crate::routes::validation::required;
use crate::services::{verify_payment, PaymentReceipt};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub reference: Option<String>,
    pub seller_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    #[serde(flatten)]
    pub receipt: PaymentReceipt,
}

/// Verify a gateway payment and settle it for a seller
///
/// `metadata.type == "sms_topup"` buys SMS credits; anything else renews the
/// seller's subscription. A reference that was already settled is reported
/// with `alreadyProcessed: true` and applied no second time.
pub async fn verify_payment_handler(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>> {
    let (Some(reference), Some(seller_id)) =
        (required(&payload.reference), required(&payload.seller_id))
    else {
        return Err(AppError::Validation(ERR_PAYMENT_FIELDS_REQUIRED.to_string()));
    };

    let receipt = verify_payment(
        state.store.as_ref(),
        state.payments.as_ref(),
        state.config.sms_unit_price_kobo,
        reference,
        seller_id,
    )
    .await?;

    Ok(Json(VerifyPaymentResponse {
        success: true,
        receipt,
    }))
}
