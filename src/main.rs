use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use polycampus::{
    auth::jwt::JwtService, config::AppConfig, db, routes, state::AppState, tenancy::registry,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "server",
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        public_schema = %config.public_schema_name,
        "loaded configuration"
    );

    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;

    // Bring the shared tables (and the public tenant tables) up to date
    // before accepting requests.
    {
        let mut conn = pool.get().context("failed to get database connection")?;
        registry::run_migrations(&mut conn, &config.public_schema_name, false)
            .context("failed to run startup migrations")?;
    }

    let jwt = JwtService::from_config(&config)?;
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let state = AppState::new(pool, config, jwt);
    let router = routes::create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(component = "server", %addr, "listening");

    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
