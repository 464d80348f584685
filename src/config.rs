use std::env;

use crate::constants::{DEFAULT_PAYSTACK_BASE_URL, DEFAULT_SMS_UNIT_PRICE_KOBO};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub allowed_origins: Vec<String>,
    pub database_url: String,
    pub database_max_connections: u32,
    pub run_migrations: bool,
    /// Base URL of the hosted backend (identity admin API lives under `/auth/v1`)
    pub baas_url: String,
    /// Service-role key; bypasses row-level policies, server-side only
    pub service_role_key: String,
    pub paystack_secret_key: String,
    pub paystack_base_url: String,
    pub sms_unit_price_kobo: i64,
    pub http_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| format!("{key} must be set"))
        };

        let server_host = var_or("SERVER_HOST", "0.0.0.0");
        let server_port = var_or("SERVER_PORT", "8080")
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let environment = var_or("ENVIRONMENT", "development");

        let allowed_origins = var_or("ALLOWED_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = required("DATABASE_URL")?;
        let database_max_connections = var_or("DATABASE_MAX_CONNECTIONS", "10")
            .parse()
            .map_err(|_| "Invalid DATABASE_MAX_CONNECTIONS")?;
        let run_migrations = var_or("RUN_MIGRATIONS", "false")
            .parse()
            .map_err(|_| "Invalid RUN_MIGRATIONS")?;

        let baas_url = required("BAAS_URL")?.trim_end_matches('/').to_string();
        let service_role_key = required("SERVICE_ROLE_KEY")?;

        let paystack_secret_key = required("PAYSTACK_SECRET_KEY")?;
        let paystack_base_url = var_or("PAYSTACK_BASE_URL", DEFAULT_PAYSTACK_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        let sms_unit_price_kobo: i64 = var_or(
            "SMS_UNIT_PRICE_KOBO",
            &DEFAULT_SMS_UNIT_PRICE_KOBO.to_string(),
        )
        .parse()
        .map_err(|_| "Invalid SMS_UNIT_PRICE_KOBO")?;
        if sms_unit_price_kobo <= 0 {
            return Err("SMS_UNIT_PRICE_KOBO must be positive".to_string());
        }

        let http_timeout_secs = var_or("HTTP_TIMEOUT_SECS", "15")
            .parse()
            .map_err(|_| "Invalid HTTP_TIMEOUT_SECS")?;

        Ok(Config {
            server_host,
            server_port,
            environment,
            allowed_origins,
            database_url,
            database_max_connections,
            run_migrations,
            baas_url,
            service_role_key,
            paystack_secret_key,
            paystack_base_url,
            sms_unit_price_kobo,
            http_timeout_secs,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// True when CORS should accept any origin
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}
