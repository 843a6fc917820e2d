//! Credential registration and authentication orchestration.
//!
//! [`CredentialFlow`] drives the two authenticator operations, builds their
//! request parameters, and reconciles assertions against the store. It
//! never persists anything itself: `register_new_credential` returns a
//! storable record and leaves the `put` to the caller.

use std::sync::Arc;

use rand::RngCore;
use thiserror::Error;

use crate::authenticator::{
    AssertionRequestOptions, AttestationPreference, Authenticator, AuthenticatorAttachment,
    AuthenticatorError, AuthenticatorSelection, CredentialCreationOptions, CredentialParameters,
    RelyingParty, UserEntity, UserVerification, ALG_ES256, ALG_RS256,
};
use crate::codec;
use crate::record::{AttestationPayloads, CredentialRecord};
use crate::store::{CredentialStore, StoreError};

/// Challenge length in bytes.
pub const CHALLENGE_LEN: usize = 32;

/// How long the authenticator may wait for the user, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u32 = 60_000;

/// Flow failures. Authenticator refusals keep their operation context;
/// store failures pass through unchanged.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("registration failed: {0}")]
    Registration(#[source] AuthenticatorError),

    #[error("authentication failed: {0}")]
    Authentication(#[source] AuthenticatorError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Relying-party and user context for a registration.
#[derive(Debug, Clone)]
pub struct RpContext {
    /// Relying-party domain identifier.
    pub rp_id: String,
    /// Relying-party display name.
    pub rp_name: String,
    /// Opaque user handle.
    pub user_handle: Vec<u8>,
    /// Account name.
    pub user_name: String,
    /// Account display name.
    pub user_display_name: String,
}

/// Result of reconciling an assertion against the store.
///
/// `NoMatch` and `NoneEnrolled` are normal outcomes, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// The assertion's id matched a stored record.
    Matched(CredentialRecord),
    /// The assertion completed but referenced no stored record.
    NoMatch,
    /// The store holds no credentials; the authenticator was not invoked.
    NoneEnrolled,
}

/// Orchestrates authenticator operations against a credential store.
pub struct CredentialFlow {
    authenticator: Arc<dyn Authenticator>,
}

impl CredentialFlow {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }

    /// Drive credential creation and return the storable record.
    ///
    /// Persistence is the caller's explicit next step; this never writes
    /// the store, and no partial record is returned on failure.
    pub async fn register_new_credential(
        &self,
        rp: &RpContext,
    ) -> Result<CredentialRecord, FlowError> {
        let options = CredentialCreationOptions {
            challenge: generate_challenge(),
            rp: RelyingParty {
                name: rp.rp_name.clone(),
                id: rp.rp_id.clone(),
            },
            user: UserEntity {
                id: rp.user_handle.clone(),
                name: rp.user_name.clone(),
                display_name: rp.user_display_name.clone(),
            },
            pub_key_cred_params: vec![
                CredentialParameters::public_key(ALG_ES256),
                CredentialParameters::public_key(ALG_RS256),
            ],
            timeout: DEFAULT_TIMEOUT_MS,
            attestation: AttestationPreference::Direct,
            authenticator_selection: AuthenticatorSelection {
                authenticator_attachment: AuthenticatorAttachment::Platform,
                require_resident_key: true,
                user_verification: UserVerification::Required,
            },
        };

        let handle = self
            .authenticator
            .create(options)
            .await
            .map_err(FlowError::Registration)?;

        tracing::info!(credential_id = %handle.id, rp_id = %rp.rp_id, "credential created");

        Ok(CredentialRecord {
            id: handle.id,
            kind: handle.kind,
            raw_id: codec::to_storable_sequence(&handle.raw_id),
            response: AttestationPayloads {
                attestation_object: codec::to_storable_sequence(&handle.attestation_object),
                client_data_json: codec::to_storable_sequence(&handle.client_data_json),
            },
            authenticator_attachment: handle
                .authenticator_attachment
                .map(|attachment| attachment.as_str().to_string()),
            timestamp: CredentialRecord::now_millis(),
        })
    }

    /// Request an assertion for `rp_id` and match it against the store.
    ///
    /// An empty store short-circuits to [`MatchOutcome::NoneEnrolled`]
    /// without prompting the user.
    pub async fn authenticate(
        &self,
        store: &CredentialStore,
        rp_id: &str,
    ) -> Result<MatchOutcome, FlowError> {
        let records = store.get_all().await?;
        if records.is_empty() {
            tracing::info!(rp_id = %rp_id, "no credentials enrolled; skipping authenticator call");
            return Ok(MatchOutcome::NoneEnrolled);
        }

        let options = AssertionRequestOptions {
            challenge: generate_challenge(),
            rp_id: rp_id.to_string(),
            timeout: DEFAULT_TIMEOUT_MS,
            user_verification: UserVerification::Required,
        };

        let assertion = self
            .authenticator
            .get(options)
            .await
            .map_err(FlowError::Authentication)?;

        match records.into_iter().find(|record| record.id == assertion.id) {
            Some(record) => {
                tracing::info!(credential_id = %record.id, "assertion matched stored credential");
                Ok(MatchOutcome::Matched(record))
            }
            None => {
                tracing::warn!(credential_id = %assertion.id, "assertion matched no stored credential");
                Ok(MatchOutcome::NoMatch)
            }
        }
    }
}

/// Fresh random challenge; new bytes on every call.
fn generate_challenge() -> Vec<u8> {
    let mut challenge = vec![0u8; CHALLENGE_LEN];
    rand::thread_rng().fill_bytes(&mut challenge);
    challenge
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::authenticator::{AssertionHandle, CredentialHandle, SoftwareAuthenticator};

    /// Records every challenge it sees and answers with fixed handles.
    #[derive(Default)]
    struct RecordingAuthenticator {
        challenges: Mutex<Vec<Vec<u8>>>,
        assertion_id: String,
    }

    impl RecordingAuthenticator {
        fn with_assertion_id(id: &str) -> Self {
            Self {
                challenges: Mutex::new(Vec::new()),
                assertion_id: id.to_string(),
            }
        }
    }

    #[async_trait::async_trait]
    impl Authenticator for RecordingAuthenticator {
        async fn create(
            &self,
            options: CredentialCreationOptions,
        ) -> Result<CredentialHandle, AuthenticatorError> {
            self.challenges.lock().unwrap().push(options.challenge);
            Ok(CredentialHandle {
                id: "cred-1".to_string(),
                kind: "public-key".to_string(),
                raw_id: vec![1, 2, 3],
                attestation_object: vec![4, 5],
                client_data_json: vec![6, 7],
                authenticator_attachment: Some(AuthenticatorAttachment::Platform),
            })
        }

        async fn get(
            &self,
            options: AssertionRequestOptions,
        ) -> Result<AssertionHandle, AuthenticatorError> {
            self.challenges.lock().unwrap().push(options.challenge);
            Ok(AssertionHandle {
                id: self.assertion_id.clone(),
                raw_id: vec![1, 2, 3],
                authenticator_data: vec![0],
                client_data_json: vec![0],
                signature: vec![0],
                user_handle: None,
            })
        }
    }

    /// Counts invocations and refuses every operation.
    #[derive(Default)]
    struct CountingAuthenticator {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Authenticator for CountingAuthenticator {
        async fn create(
            &self,
            _options: CredentialCreationOptions,
        ) -> Result<CredentialHandle, AuthenticatorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AuthenticatorError::Cancelled)
        }

        async fn get(
            &self,
            _options: AssertionRequestOptions,
        ) -> Result<AssertionHandle, AuthenticatorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AuthenticatorError::Cancelled)
        }
    }

    fn rp_context() -> RpContext {
        RpContext {
            rp_id: "localhost".to_string(),
            rp_name: "Example".to_string(),
            user_handle: vec![1],
            user_name: "demo@example.com".to_string(),
            user_display_name: "Demo User".to_string(),
        }
    }

    fn record(id: &str) -> CredentialRecord {
        CredentialRecord {
            id: id.to_string(),
            kind: "public-key".to_string(),
            raw_id: vec![1],
            response: AttestationPayloads {
                attestation_object: vec![2],
                client_data_json: vec![3],
            },
            authenticator_attachment: Some("platform".to_string()),
            timestamp: 0,
        }
    }

    #[tokio::test]
    async fn test_challenges_are_never_reused() {
        let authenticator = Arc::new(RecordingAuthenticator::with_assertion_id("cred-1"));
        let flow = CredentialFlow::new(authenticator.clone());
        let rp = rp_context();

        flow.register_new_credential(&rp).await.unwrap();
        flow.register_new_credential(&rp).await.unwrap();

        let store = CredentialStore::in_memory();
        store.init().await.unwrap();
        store.put(&record("cred-1")).await.unwrap();
        flow.authenticate(&store, "localhost").await.unwrap();

        let challenges = authenticator.challenges.lock().unwrap();
        assert_eq!(challenges.len(), 3);
        for challenge in challenges.iter() {
            assert_eq!(challenge.len(), CHALLENGE_LEN);
        }
        assert_ne!(challenges[0], challenges[1]);
        assert_ne!(challenges[1], challenges[2]);
        assert_ne!(challenges[0], challenges[2]);
    }

    #[tokio::test]
    async fn test_registration_encodes_handle_into_record() {
        let flow = CredentialFlow::new(Arc::new(RecordingAuthenticator::with_assertion_id("x")));
        let registered = flow.register_new_credential(&rp_context()).await.unwrap();

        assert_eq!(registered.id, "cred-1");
        assert_eq!(registered.kind, "public-key");
        assert_eq!(registered.raw_id, vec![1, 2, 3]);
        assert_eq!(registered.response.attestation_object, vec![4, 5]);
        assert_eq!(registered.response.client_data_json, vec![6, 7]);
        assert_eq!(
            registered.authenticator_attachment.as_deref(),
            Some("platform")
        );
        assert!(registered.timestamp > 0);
    }

    #[tokio::test]
    async fn test_registration_failure_carries_reason() {
        let flow = CredentialFlow::new(Arc::new(CountingAuthenticator::default()));
        let err = flow.register_new_credential(&rp_context()).await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::Registration(AuthenticatorError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_empty_store_short_circuits_authenticator() {
        let authenticator = Arc::new(CountingAuthenticator::default());
        let flow = CredentialFlow::new(authenticator.clone());

        let store = CredentialStore::in_memory();
        store.init().await.unwrap();

        let outcome = flow.authenticate(&store, "localhost").await.unwrap();
        assert_eq!(outcome, MatchOutcome::NoneEnrolled);
        assert_eq!(authenticator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_assertion_id_is_no_match_not_error() {
        let flow = CredentialFlow::new(Arc::new(RecordingAuthenticator::with_assertion_id(
            "cred-C",
        )));

        let store = CredentialStore::in_memory();
        store.init().await.unwrap();
        store.put(&record("cred-A")).await.unwrap();
        store.put(&record("cred-B")).await.unwrap();

        let outcome = flow.authenticate(&store, "localhost").await.unwrap();
        assert_eq!(outcome, MatchOutcome::NoMatch);
    }

    #[tokio::test]
    async fn test_authentication_failure_is_distinct_from_no_match() {
        let flow = CredentialFlow::new(Arc::new(CountingAuthenticator::default()));

        let store = CredentialStore::in_memory();
        store.init().await.unwrap();
        store.put(&record("cred-A")).await.unwrap();

        let err = flow.authenticate(&store, "localhost").await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::Authentication(AuthenticatorError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_end_to_end_register_store_authenticate() {
        let flow = CredentialFlow::new(Arc::new(SoftwareAuthenticator::new()));
        let store = CredentialStore::in_memory();
        store.init().await.unwrap();

        let registered = flow.register_new_credential(&rp_context()).await.unwrap();
        store.put(&registered).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, registered.id);

        match flow.authenticate(&store, "localhost").await.unwrap() {
            MatchOutcome::Matched(matched) => assert_eq!(matched.id, registered.id),
            other => panic!("expected a match, got {other:?}"),
        }
    }
}
