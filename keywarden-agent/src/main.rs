//! Keywarden Agent - local request shell for the passkey credential cache.
//!
//! Maps registration and authentication requests onto the core flow and
//! store, answering every request with a `{success, data|error}` envelope.

use std::sync::Arc;

use anyhow::{Context, Result};
use keywarden_agent::{create_router, AppState, Config};
use keywarden_core::{CredentialFlow, CredentialStore, SoftwareAuthenticator};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let store = if config.uses_memory_store() {
        CredentialStore::in_memory()
    } else {
        CredentialStore::sqlite(&config.db_path)
    };
    store
        .init()
        .await
        .context("failed to open the credential store")?;
    let store = Arc::new(store);

    // The in-process software authenticator stands in for a platform
    // authenticator; real integrations implement the Authenticator trait.
    let flow = CredentialFlow::new(Arc::new(SoftwareAuthenticator::new()));

    let addr = config.socket_addr();
    let state = AppState::new(store.clone(), flow, config);
    let app = create_router(state);

    tracing::info!(%addr, "keywarden agent listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind listen address")?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    store.close().await;
    tracing::info!("keywarden agent stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
