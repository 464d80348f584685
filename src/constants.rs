/// Default payment gateway API base URL
pub const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";

/// Price of one SMS credit in kobo (₦4), used when a top-up carries no unit count
pub const DEFAULT_SMS_UNIT_PRICE_KOBO: i64 = 400;

/// Gateway metadata tag for SMS credit purchases
pub const PAYMENT_TYPE_SMS_TOPUP: &str = "sms_topup";

/// Subscription length when the payment metadata does not say
pub const DEFAULT_SUBSCRIPTION_MONTHS: u32 = 1;

/// Longest subscription a single payment may buy
pub const MAX_SUBSCRIPTION_MONTHS: u32 = 120;

/// Header carrying the gateway's webhook signature (hex HMAC-SHA512 of the body)
pub const PAYSTACK_SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Headers browsers may send to the functions
pub const CORS_ALLOWED_HEADERS: [&str; 4] = ["authorization", "x-client-info", "apikey", "content-type"];

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_USER_ID_REQUIRED: &str = "User ID is required";

pub const ERR_USER_NOT_FOUND: &str = "User not found";

pub const ERR_REGISTRATION_FIELDS_REQUIRED: &str = "Email, password, and full name are required";

pub const ERR_PAYMENT_FIELDS_REQUIRED: &str = "Payment reference and seller ID are required";

pub const ERR_PAYMENT_VERIFICATION_FAILED: &str = "Payment verification failed";

pub const ERR_PROFILE_CREATION_FAILED: &str = "Failed to create user profile";

pub const ERR_INVALID_SUBSCRIPTION_LENGTH: &str = "Invalid subscription length";

pub const ERR_INVALID_SELLER_ID: &str = "Invalid seller ID";
