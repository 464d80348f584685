use chrono::{DateTime, Months, Utc};
use serde_json::Value;

use crate::constants::{DEFAULT_SUBSCRIPTION_MONTHS, PAYMENT_TYPE_SMS_TOPUP};

/// What a payment buys, as tagged in the gateway metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentKind {
    SmsTopup,
    Subscription,
}

/// Fields the frontend attaches to a transaction's metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentMetadata {
    pub kind: PaymentKind,
    pub units: Option<i64>,
    pub months: Option<u32>,
    pub seller_id: Option<String>,
}

impl PaymentMetadata {
    /// Parse gateway metadata, which may be an object, a JSON-encoded string, or empty
    pub fn from_value(value: Option<&Value>) -> Self {
        let parsed;
        let object = match value {
            Some(Value::Object(map)) => Some(map),
            Some(Value::String(raw)) => {
                parsed = serde_json::from_str::<Value>(raw).ok();
                parsed.as_ref().and_then(Value::as_object)
            }
            _ => None,
        };

        let field = |name: &str| object.and_then(|map| map.get(name));

        let kind = match field("type").and_then(Value::as_str) {
            Some(PAYMENT_TYPE_SMS_TOPUP) => PaymentKind::SmsTopup,
            _ => PaymentKind::Subscription,
        };

        Self {
            kind,
            units: field("units").and_then(as_integer),
            months: field("months")
                .and_then(as_integer)
                .and_then(|m| u32::try_from(m).ok()),
            seller_id: field("seller_id")
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string),
        }
    }
}

/// Numbers arrive as JSON numbers or as numeric strings
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A transaction the gateway confirmed as successful
#[derive(Debug, Clone)]
pub struct VerifiedTransaction {
    pub reference: String,
    pub amount_kobo: i64,
    pub paid_at: DateTime<Utc>,
    pub metadata: PaymentMetadata,
}

impl VerifiedTransaction {
    /// Credits bought: explicit metadata units, else amount over unit price
    pub fn sms_units(&self, unit_price_kobo: i64) -> i64 {
        match self.metadata.units {
            Some(units) if units > 0 => units,
            _ if unit_price_kobo > 0 => self.amount_kobo / unit_price_kobo,
            _ => 0,
        }
    }

    pub fn subscription_months(&self) -> u32 {
        self.metadata
            .months
            .filter(|m| *m > 0)
            .unwrap_or(DEFAULT_SUBSCRIPTION_MONTHS)
    }
}

/// Settlement row for purchased SMS credits
#[derive(Debug, Clone)]
pub struct SmsTopup {
    pub reference: String,
    pub seller_id: String,
    pub amount_kobo: i64,
    pub units: i64,
    pub paid_at: DateTime<Utc>,
}

/// Settlement row for a subscription renewal
#[derive(Debug, Clone)]
pub struct SubscriptionPayment {
    pub reference: String,
    pub seller_id: String,
    pub amount_kobo: i64,
    pub months: u32,
    pub paid_at: DateTime<Utc>,
}

/// Result of applying a settlement keyed on its external reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled<T> {
    /// The reference was already settled; nothing was applied
    pub replayed: bool,
    pub value: T,
}

/// Feature switches read once per operation from app settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    pub sms_enabled: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self { sms_enabled: true }
    }
}

impl FeatureFlags {
    /// Apply a raw `app_settings` entry; unknown keys are ignored
    pub fn apply(&mut self, key: &str, value: &str) {
        let enabled = matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "on");
        if key == "sms_enabled" {
            self.sms_enabled = enabled;
        }
    }
}

/// New subscription expiry: renewals stack on an unexpired window
///
/// Returns `None` when the result falls outside the representable date range.
pub fn extend_subscription(
    current: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    months: u32,
) -> Option<DateTime<Utc>> {
    let start = current.filter(|expiry| *expiry > now).unwrap_or(now);
    start.checked_add_months(Months::new(months))
}

/// Convert minor currency units to major units for responses
pub fn kobo_to_naira(kobo: i64) -> f64 {
    kobo as f64 / 100.0
}
