use anyhow::Context;
use tracing_subscriber::EnvFilter;

use registrar_api::app::{self, AppState, AuthSettings};
use registrar_api::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("registrar_api=info,tower_http=info")),
        )
        .init();

    let config = config::config();
    config.validate()?;
    tracing::info!("Starting registrar API in {:?} mode", config.environment);

    let storage = app::open_storage(config).await.context("opening storage")?;
    let state = AppState::new(
        storage.directory,
        storage.ledger,
        AuthSettings::from_config(&config.security),
    );
    let router = app::app(state, config);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("registrar API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server")?;

    if let Some(database) = storage.database {
        database.close().await;
    }
    tracing::info!("registrar API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
