//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use keywarden_core::{CredentialFlow, CredentialStore, RpContext};
use uuid::Uuid;

use crate::config::Config;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Credential-metadata store handle
    pub store: Arc<CredentialStore>,
    /// Authenticator flow controller
    pub flow: Arc<CredentialFlow>,
    /// Agent configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<CredentialStore>, flow: CredentialFlow, config: Config) -> Self {
        Self {
            store,
            flow: Arc::new(flow),
            config: Arc::new(config),
        }
    }

    /// Relying-party context for one registration, with a fresh user
    /// handle and optional per-request overrides for the account names.
    pub fn rp_context(
        &self,
        user_name: Option<String>,
        user_display: Option<String>,
    ) -> RpContext {
        RpContext {
            rp_id: self.config.rp_id.clone(),
            rp_name: self.config.rp_name.clone(),
            user_handle: Uuid::new_v4().into_bytes().to_vec(),
            user_name: user_name.unwrap_or_else(|| self.config.user_name.clone()),
            user_display_name: user_display.unwrap_or_else(|| self.config.user_display.clone()),
        }
    }
}
