//! Outbound HTTP clients carrying server-side credentials.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use std::time::Duration;

use crate::error::AppError;

fn bearer(secret: &str) -> Result<HeaderValue, AppError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {secret}"))
        .map_err(|_| AppError::Internal("credential is not a valid header value".into()))?;
    value.set_sensitive(true);
    Ok(value)
}

fn build(headers: HeaderMap, timeout_secs: u64) -> Result<Client, AppError> {
    Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .build()
        .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {e}")))
}

/// Client authorised with the service-role key for the backend's admin APIs
///
/// Requests made with this client bypass row-level policies. Never hand it
/// to code that runs on behalf of an end user.
pub fn service_role_client(service_role_key: &str, timeout_secs: u64) -> Result<Client, AppError> {
    let mut headers = HeaderMap::new();
    let mut apikey = HeaderValue::from_str(service_role_key)
        .map_err(|_| AppError::Internal("service role key is not a valid header value".into()))?;
    apikey.set_sensitive(true);
    headers.insert("apikey", apikey);
    headers.insert(AUTHORIZATION, bearer(service_role_key)?);
    build(headers, timeout_secs)
}

/// Client authorised with a bearer secret (payment gateway)
pub fn bearer_client(secret: &str, timeout_secs: u64) -> Result<Client, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, bearer(secret)?);
    build(headers, timeout_secs)
}
