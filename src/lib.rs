//! Campus Functions Library
//!
//! Server-side account lifecycle and payment settlement for the campus
//! marketplace. This module exports the application state and router for the
//! binary and for tests.

pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod identity;
pub mod models;
pub mod payments;
pub mod routes;
pub mod security;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

use axum::{
    http::{HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use constants::CORS_ALLOWED_HEADERS;
use db::RecordStore;
use identity::IdentityProvider;
use payments::PaymentGateway;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub payments: Arc<dyn PaymentGateway>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        identity: Arc<dyn IdentityProvider>,
        payments: Arc<dyn PaymentGateway>,
        config: Config,
    ) -> Self {
        Self {
            store,
            identity,
            payments,
            config,
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = if config.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(CORS_ALLOWED_HEADERS.map(HeaderName::from_static))
}

/// Build the HTTP application
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(routes::health_check))
        .route("/functions/v1/create-user", post(routes::create_user))
        .route("/functions/v1/delete-user", post(routes::delete_user))
        .route(
            "/functions/v1/verify-payment",
            post(routes::verify_payment_handler),
        )
        .route(
            "/functions/v1/paystack-webhook",
            post(routes::paystack_webhook),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
