//! Keywarden Core - local passkey credential-metadata cache
//!
//! This crate drives a platform authenticator's public-key credential flow
//! (registration and assertion) and persists structured metadata about
//! credentials created locally, keyed by credential identifier, so a
//! client can later decide whether an assertion corresponds to a
//! credential it already knows about.
//!
//! # Components
//!
//! - [`codec`] - binary buffer ↔ storable/text encodings
//! - [`store`] - durable keyed storage with an explicit lifecycle
//! - [`flow`] - authenticator orchestration and assertion matching
//! - [`authenticator`] - the capability boundary to the authenticator
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use keywarden_core::{
//!     CredentialFlow, CredentialStore, MatchOutcome, RpContext, SoftwareAuthenticator,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = CredentialStore::sqlite("keywarden.db");
//! store.init().await?;
//!
//! let flow = CredentialFlow::new(Arc::new(SoftwareAuthenticator::new()));
//! let rp = RpContext {
//!     rp_id: "localhost".to_string(),
//!     rp_name: "Keywarden".to_string(),
//!     user_handle: vec![1],
//!     user_name: "demo@example.com".to_string(),
//!     user_display_name: "Demo User".to_string(),
//! };
//!
//! let record = flow.register_new_credential(&rp).await?;
//! store.put(&record).await?;
//!
//! match flow.authenticate(&store, "localhost").await? {
//!     MatchOutcome::Matched(record) => println!("known credential {}", record.id),
//!     MatchOutcome::NoMatch => println!("credential is not in the cache"),
//!     MatchOutcome::NoneEnrolled => println!("nothing enrolled yet"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod authenticator;
pub mod codec;
pub mod flow;
pub mod record;
pub mod store;

// Re-export main types for convenience
pub use authenticator::{
    AssertionHandle, AssertionRequestOptions, Authenticator, AuthenticatorAttachment,
    AuthenticatorError, CredentialCreationOptions, CredentialHandle, SoftwareAuthenticator,
};
pub use codec::DecodeError;
pub use flow::{
    CredentialFlow, FlowError, MatchOutcome, RpContext, CHALLENGE_LEN, DEFAULT_TIMEOUT_MS,
};
pub use record::{AttestationPayloads, CredentialRecord};
pub use store::{CredentialStore, SqliteCredentialStore, StoreError};
