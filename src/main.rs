use std::sync::Arc;

use anyhow::Context;

use natours_api::services::LogMailer;
use natours_api::store::{MemoryStore, PgStore, Store};
use natours_api::{build_router, init_tracing, models, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!("Starting Natours API in {:?} mode", config.environment);
    if config.uses_development_secret() {
        tracing::warn!("JWT_SECRET not set, using the development secret");
    }

    let store: Arc<dyn Store> = match config.database.url.as_deref() {
        Some(url) => {
            let store = PgStore::connect(url, &config.database).await?;
            store
                .migrate(&models::all().map(|schema| &schema.collection))
                .await?;
            tracing::info!("Using Postgres store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let mailer = Arc::new(LogMailer::new(config.security.password_reset_ttl));
    let app = build_router(AppState::new(config, store, mailer));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Natours API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
