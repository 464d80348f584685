//! Payment settlement.
//!
//! A verified transaction becomes exactly one settlement record plus one
//! seller-profile update. Settlements are keyed on the gateway reference, so
//! replays (retried verifications, duplicate webhooks) apply nothing.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::constants::{ERR_INVALID_SUBSCRIPTION_LENGTH, MAX_SUBSCRIPTION_MONTHS};
use crate::db::RecordStore;
use crate::error::{AppError, Result};
use crate::models::{
    kobo_to_naira, FeatureFlags, PaymentKind, SmsTopup, SubscriptionPayment, VerifiedTransaction,
};
use crate::payments::PaymentGateway;

const MSG_ALREADY_PROCESSED: &str = "Payment already processed";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum PaymentReceipt {
    #[serde(rename = "sms_topup", rename_all = "camelCase")]
    SmsTopup {
        message: String,
        units: i64,
        amount: f64,
        sms_credits: i64,
        already_processed: bool,
    },
    #[serde(rename = "subscription", rename_all = "camelCase")]
    Subscription {
        message: String,
        amount: f64,
        months: u32,
        subscription_expires_at: Option<DateTime<Utc>>,
        already_processed: bool,
    },
}

/// Verify `reference` with the gateway and settle it for `seller_id`
pub async fn verify_payment(
    store: &dyn RecordStore,
    gateway: &dyn PaymentGateway,
    sms_unit_price_kobo: i64,
    reference: &str,
    seller_id: &str,
) -> Result<PaymentReceipt> {
    let transaction = gateway.verify(reference).await.map_err(|e| {
        tracing::warn!(reference = %reference, error = %e, "Payment verification failed");
        AppError::from(e)
    })?;

    let flags = store.load_feature_flags().await?;
    settle(store, &flags, sms_unit_price_kobo, &transaction, seller_id).await
}

/// Apply a verified transaction according to its metadata tag
pub async fn settle(
    store: &dyn RecordStore,
    flags: &FeatureFlags,
    sms_unit_price_kobo: i64,
    transaction: &VerifiedTransaction,
    seller_id: &str,
) -> Result<PaymentReceipt> {
    let amount = kobo_to_naira(transaction.amount_kobo);

    match transaction.metadata.kind {
        PaymentKind::SmsTopup => {
            let units = transaction.sms_units(sms_unit_price_kobo);
            if units <= 0 {
                return Err(AppError::PaymentRejected {
                    message: "Could not determine SMS units for payment".to_string(),
                    details: Some(format!("amount {} kobo", transaction.amount_kobo)),
                });
            }

            let settled = store
                .settle_sms_topup(&SmsTopup {
                    reference: transaction.reference.clone(),
                    seller_id: seller_id.to_string(),
                    amount_kobo: transaction.amount_kobo,
                    units,
                    paid_at: transaction.paid_at,
                })
                .await?;

            let message = if settled.replayed {
                MSG_ALREADY_PROCESSED.to_string()
            } else if flags.sms_enabled {
                format!("{units} SMS credits added")
            } else {
                format!("{units} SMS credits added; SMS sending is currently disabled")
            };

            tracing::info!(
                reference = %transaction.reference,
                seller_id = %seller_id,
                units,
                replayed = settled.replayed,
                "SMS top-up settled"
            );

            Ok(PaymentReceipt::SmsTopup {
                message,
                units,
                amount,
                sms_credits: settled.value,
                already_processed: settled.replayed,
            })
        }
        PaymentKind::Subscription => {
            let months = transaction.subscription_months();
            if months > MAX_SUBSCRIPTION_MONTHS {
                return Err(AppError::PaymentRejected {
                    message: ERR_INVALID_SUBSCRIPTION_LENGTH.to_string(),
                    details: Some(format!(
                        "{months} months exceeds the maximum of {MAX_SUBSCRIPTION_MONTHS}"
                    )),
                });
            }

            let settled = store
                .settle_subscription(&SubscriptionPayment {
                    reference: transaction.reference.clone(),
                    seller_id: seller_id.to_string(),
                    amount_kobo: transaction.amount_kobo,
                    months,
                    paid_at: transaction.paid_at,
                })
                .await?;

            let message = match (settled.replayed, settled.value) {
                (true, _) => MSG_ALREADY_PROCESSED.to_string(),
                (false, Some(expiry)) => {
                    format!("Subscription active until {}", expiry.format("%Y-%m-%d"))
                }
                (false, None) => "Subscription renewed".to_string(),
            };

            tracing::info!(
                reference = %transaction.reference,
                seller_id = %seller_id,
                months,
                replayed = settled.replayed,
                "Subscription payment settled"
            );

            Ok(PaymentReceipt::Subscription {
                message,
                amount,
                months,
                subscription_expires_at: settled.value,
                already_processed: settled.replayed,
            })
        }
    }
}
