//! Agent configuration module
//!
//! Handles loading configuration from environment variables with sensible
//! defaults.

use std::net::SocketAddr;

/// Sentinel database path selecting the in-memory store backend.
pub const MEMORY_DB_PATH: &str = ":memory:";

/// Agent configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen port (default: 3210); the agent always binds loopback
    pub port: u16,
    /// Credential database path (default: "keywarden.db"); ":memory:"
    /// keeps records in memory only
    pub db_path: String,
    /// Relying-party domain identifier (default: "localhost")
    pub rp_id: String,
    /// Relying-party display name (default: "Keywarden")
    pub rp_name: String,
    /// Account name presented to the authenticator
    pub user_name: String,
    /// Account display name presented to the authenticator
    pub user_display: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3210,
            db_path: MEMORY_DB_PATH.to_string(), // Tests default to memory; from_env() defaults to a file
            rp_id: "localhost".to_string(),
            rp_name: "Keywarden".to_string(),
            user_name: "demo@example.com".to_string(),
            user_display: "Demo User".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = std::env::var("KEYWARDEN_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3210);

        let db_path =
            std::env::var("KEYWARDEN_DB_PATH").unwrap_or_else(|_| "keywarden.db".to_string());

        let rp_id = std::env::var("KEYWARDEN_RP_ID").unwrap_or_else(|_| "localhost".to_string());

        let rp_name =
            std::env::var("KEYWARDEN_RP_NAME").unwrap_or_else(|_| "Keywarden".to_string());

        let user_name = std::env::var("KEYWARDEN_USER_NAME")
            .unwrap_or_else(|_| "demo@example.com".to_string());

        let user_display =
            std::env::var("KEYWARDEN_USER_DISPLAY").unwrap_or_else(|_| "Demo User".to_string());

        Self {
            port,
            db_path,
            rp_id,
            rp_name,
            user_name,
            user_display,
        }
    }

    /// Whether the configured database path selects the in-memory backend.
    pub fn uses_memory_store(&self) -> bool {
        self.db_path == MEMORY_DB_PATH
    }

    /// Loopback socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], self.port))
    }
}
