use std::sync::Arc;

use anyhow::{Context, Result};
use api::{
    booking::AppointmentService, config::ServerConfig, repositories::PgAppointmentStore,
    routes, state::AppState,
};
use auth::{
    AuthService,
    repositories::{PgCredentialStore, PgTokenStore},
};
use common::database::{DatabaseConfig, health_check, init_pool};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::load().context("failed to load server configuration")?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("Starting API service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if !health_check(&pool).await {
        anyhow::bail!("Failed to connect to database");
    }
    info!("Database connection successful");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;
    info!("Migrations applied");

    let auth = AuthService::new(
        Arc::new(PgCredentialStore::new(pool.clone())),
        Arc::new(PgTokenStore::new(pool.clone())),
        config.auth_config(),
    )?;
    let appointments = AppointmentService::new(Arc::new(PgAppointmentStore::new(pool.clone())));

    let app = routes::create_router(AppState {
        db_pool: Some(pool),
        auth,
        appointments,
    });

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("API service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
