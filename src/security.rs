use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Verify a gateway webhook signature
///
/// The gateway signs the raw request body with HMAC-SHA512 under the account's
/// secret key and sends the hex digest in `x-paystack-signature`. The body must
/// be checked byte-for-byte before it is parsed.
pub fn verify_webhook_signature(body: &[u8], signature: &str, secret: &str) -> bool {
    let mut mac = match HmacSha512::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return false;
        }
    };

    mac.update(body);

    let sig_bytes = match hex::decode(signature.trim()) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid hex signature format");
            return false;
        }
    };

    // Constant-time comparison
    mac.verify_slice(&sig_bytes).is_ok()
}

/// Hex HMAC-SHA512 of `body`, as the gateway computes it
pub fn sign_webhook_body(body: &[u8], secret: &str) -> Option<String> {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}
