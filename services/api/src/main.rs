use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;

use api::{AppState, config::Config, create_router, middleware::JwtVerifier};
use common::{
    database::{health_check, init_pool, run_migrations},
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load(None)?;

    init_tracing(&config.logging)?;

    info!("Starting API service");

    config.validate().map_err(anyhow::Error::msg)?;

    // Initialize database connection pool
    let pool = init_pool(&config.database).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    let jwt = JwtVerifier::from_settings(&config.jwt)?;
    let app_state = AppState::new(pool, jwt, config.shopping_list.clone());

    // Start the web server
    let app = create_router(app_state);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("API service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
