//! Router configuration module
//!
//! Configures routes and middleware layers for the agent.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{authenticate, delete_credential, health, list_credentials, register};
use crate::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    // Local agent: any origin on loopback may talk to it
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/register", post(register))
        .route("/authenticate", post(authenticate))
        .route("/credentials", get(list_credentials))
        .route("/credentials/{id}", delete(delete_credential))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
