use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use acoustica_api::auth::TokenService;
use acoustica_api::config::{AppConfig, DatabaseBackend};
use acoustica_api::database::{DocumentStore, MemoryStore, MongoStore};
use acoustica_api::middleware::cors_layer;
use acoustica_api::{router, AppState};

#[derive(Debug, Parser)]
#[command(name = "acoustica-api", about = "Acoustica course-enrollment API server")]
struct Args {
    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Interface to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so ACCESS_TOKEN_SECRET, DB_USER, DB_PASS, etc. are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    tracing::info!("Starting Acoustica API in {:?} mode", config.environment);

    let tokens = TokenService::new(&config.security.jwt_secret, config.security.jwt_expiry_hours)
        .context("ACCESS_TOKEN_SECRET must be set")?;

    let store = open_store(&config).await?;

    if !config.security.enforce_auth {
        tracing::warn!("SECURITY_ENFORCE_AUTH=false: protected routes are open");
    }

    let state = AppState::new(store, tokens, config.security.enforce_auth);
    let app = router(state)
        .layer(cors_layer(&config.security.cors_origins))
        .layer(TraceLayer::new_for_http());

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Acoustica API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // The store client is dropped with the process; it is never closed explicitly.
    Ok(())
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.database.backend {
        DatabaseBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        DatabaseBackend::Mongo => {
            let store = MongoStore::connect(&config.database.uri, &config.database.name)
                .await
                .context("failed to create MongoDB client")?;
            store.ping().await.context("failed to ping MongoDB deployment")?;
            tracing::info!("Pinged MongoDB deployment; connection established");
            Ok(Arc::new(store))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
