use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_functions::db::{create_pool, PgStore};
use campus_functions::identity::GoTrueAdmin;
use campus_functions::payments::Paystack;
use campus_functions::{app, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_functions=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Campus Functions...");

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Environment: {}, Server: {}",
        config.environment,
        config.server_address()
    );

    // Create database connection pool
    let pool = create_pool(&config.database_url, config.database_max_connections).await?;

    if config.run_migrations {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Migrations complete");
    }

    let identity = GoTrueAdmin::new(
        &config.baas_url,
        &config.service_role_key,
        config.http_timeout_secs,
    )?;
    let payments = Paystack::new(
        &config.paystack_base_url,
        &config.paystack_secret_key,
        config.http_timeout_secs,
    )?;

    let state = AppState::new(
        Arc::new(PgStore::new(pool)),
        Arc::new(identity),
        Arc::new(payments),
        config.clone(),
    );

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
