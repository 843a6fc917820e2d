//! In-process software authenticator for development and testing.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use dashmap::DashMap;
use rand::RngCore;
use serde::Serialize;

use super::{
    AssertionHandle, AssertionRequestOptions, Authenticator, AuthenticatorAttachment,
    AuthenticatorError, CredentialCreationOptions, CredentialHandle, ALG_ES256, ALG_RS256,
};

/// Discoverable-credential authenticator living entirely in process.
///
/// Behaves like a platform authenticator: it mints credentials on
/// `create`, remembers them per relying party, and answers `get` with the
/// most recently created one.
///
/// WARNING: Do not use in production - attestation objects and signatures
/// are placeholders with no cryptographic meaning!
#[derive(Default)]
pub struct SoftwareAuthenticator {
    /// Resident credentials by rp id, newest last.
    resident: DashMap<String, Vec<ResidentCredential>>,
}

#[derive(Clone)]
struct ResidentCredential {
    id: String,
    raw_id: Vec<u8>,
    user_handle: Vec<u8>,
}

/// CBOR attestation-object layout (`fmt` / `attStmt` / `authData`).
#[derive(Serialize)]
struct AttestationObject<'a> {
    fmt: &'a str,
    #[serde(rename = "attStmt")]
    att_stmt: std::collections::BTreeMap<String, String>,
    #[serde(rename = "authData")]
    auth_data: &'a [u8],
}

/// Client data in the browser's shape.
#[derive(Serialize)]
struct ClientData<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    /// base64url, as user agents encode it.
    challenge: String,
    origin: String,
}

impl SoftwareAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resident credentials currently held for `rp_id`.
    pub fn resident_count(&self, rp_id: &str) -> usize {
        self.resident.get(rp_id).map(|v| v.len()).unwrap_or(0)
    }

    fn client_data(kind: &str, challenge: &[u8], rp_id: &str) -> Vec<u8> {
        let data = ClientData {
            kind,
            challenge: URL_SAFE_NO_PAD.encode(challenge),
            origin: format!("https://{rp_id}"),
        };
        serde_json::to_vec(&data).expect("client data serialization cannot fail")
    }

    /// Flags byte, zero counter, then the credential id. Placeholder
    /// layout; nothing downstream parses it.
    fn authenticator_data(raw_id: &[u8]) -> Vec<u8> {
        let mut auth_data = Vec::with_capacity(5 + raw_id.len());
        auth_data.push(0x45);
        auth_data.extend_from_slice(&0u32.to_be_bytes());
        auth_data.extend_from_slice(raw_id);
        auth_data
    }
}

#[async_trait::async_trait]
impl Authenticator for SoftwareAuthenticator {
    async fn create(
        &self,
        options: CredentialCreationOptions,
    ) -> Result<CredentialHandle, AuthenticatorError> {
        if options.authenticator_selection.authenticator_attachment
            != AuthenticatorAttachment::Platform
        {
            return Err(AuthenticatorError::SelectionMismatch(
                "software authenticator is platform-attached".to_string(),
            ));
        }

        let supported = options
            .pub_key_cred_params
            .iter()
            .any(|p| p.kind == "public-key" && (p.alg == ALG_ES256 || p.alg == ALG_RS256));
        if !supported {
            return Err(AuthenticatorError::SelectionMismatch(
                "no acceptable public-key algorithm offered".to_string(),
            ));
        }

        let mut raw_id = vec![0u8; 16];
        rand::thread_rng().fill_bytes(&mut raw_id);
        let id = URL_SAFE_NO_PAD.encode(&raw_id);

        let auth_data = Self::authenticator_data(&raw_id);
        // Platform authenticators commonly answer a `direct` preference
        // with format "none"; keep that shape here.
        let mut attestation_object = Vec::new();
        ciborium::into_writer(
            &AttestationObject {
                fmt: "none",
                att_stmt: std::collections::BTreeMap::new(),
                auth_data: &auth_data,
            },
            &mut attestation_object,
        )
        .map_err(|e| AuthenticatorError::Internal(e.to_string()))?;

        let client_data_json =
            Self::client_data("webauthn.create", &options.challenge, &options.rp.id);

        self.resident
            .entry(options.rp.id.clone())
            .or_default()
            .push(ResidentCredential {
                id: id.clone(),
                raw_id: raw_id.clone(),
                user_handle: options.user.id.clone(),
            });

        tracing::debug!(rp_id = %options.rp.id, credential_id = %id, "software credential created");

        Ok(CredentialHandle {
            id,
            kind: "public-key".to_string(),
            raw_id,
            attestation_object,
            client_data_json,
            authenticator_attachment: Some(AuthenticatorAttachment::Platform),
        })
    }

    async fn get(
        &self,
        options: AssertionRequestOptions,
    ) -> Result<AssertionHandle, AuthenticatorError> {
        let credential = self
            .resident
            .get(&options.rp_id)
            .and_then(|list| list.last().cloned())
            .ok_or(AuthenticatorError::NoCredentials)?;

        let client_data_json =
            Self::client_data("webauthn.get", &options.challenge, &options.rp_id);

        tracing::debug!(rp_id = %options.rp_id, credential_id = %credential.id, "software assertion produced");

        Ok(AssertionHandle {
            id: credential.id,
            raw_id: credential.raw_id.clone(),
            authenticator_data: Self::authenticator_data(&credential.raw_id),
            client_data_json,
            // Placeholder signature; nothing verifies it.
            signature: vec![0u8; 64],
            user_handle: Some(credential.user_handle),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authenticator::{
        AttestationPreference, AuthenticatorSelection, CredentialParameters, RelyingParty,
        UserEntity, UserVerification,
    };

    fn creation_options() -> CredentialCreationOptions {
        CredentialCreationOptions {
            challenge: vec![7; 32],
            rp: RelyingParty {
                name: "Example".to_string(),
                id: "example.com".to_string(),
            },
            user: UserEntity {
                id: vec![1],
                name: "demo@example.com".to_string(),
                display_name: "Demo User".to_string(),
            },
            pub_key_cred_params: vec![
                CredentialParameters::public_key(ALG_ES256),
                CredentialParameters::public_key(ALG_RS256),
            ],
            timeout: 60_000,
            attestation: AttestationPreference::Direct,
            authenticator_selection: AuthenticatorSelection {
                authenticator_attachment: AuthenticatorAttachment::Platform,
                require_resident_key: true,
                user_verification: UserVerification::Required,
            },
        }
    }

    fn assertion_options(rp_id: &str) -> AssertionRequestOptions {
        AssertionRequestOptions {
            challenge: vec![9; 32],
            rp_id: rp_id.to_string(),
            timeout: 60_000,
            user_verification: UserVerification::Required,
        }
    }

    #[tokio::test]
    async fn test_create_then_assert_returns_same_id() {
        let authenticator = SoftwareAuthenticator::new();
        let handle = authenticator.create(creation_options()).await.unwrap();
        assert_eq!(handle.kind, "public-key");
        assert_eq!(handle.id, URL_SAFE_NO_PAD.encode(&handle.raw_id));

        let assertion = authenticator
            .get(assertion_options("example.com"))
            .await
            .unwrap();
        assert_eq!(assertion.id, handle.id);
        assert_eq!(assertion.user_handle.as_deref(), Some(&[1u8][..]));
    }

    #[tokio::test]
    async fn test_cross_platform_selection_is_refused() {
        let authenticator = SoftwareAuthenticator::new();
        let mut options = creation_options();
        options.authenticator_selection.authenticator_attachment =
            AuthenticatorAttachment::CrossPlatform;

        let err = authenticator.create(options).await.unwrap_err();
        assert!(matches!(err, AuthenticatorError::SelectionMismatch(_)));
    }

    #[tokio::test]
    async fn test_unsupported_algorithms_are_refused() {
        let authenticator = SoftwareAuthenticator::new();
        let mut options = creation_options();
        options.pub_key_cred_params = vec![CredentialParameters::public_key(-8)];

        let err = authenticator.create(options).await.unwrap_err();
        assert!(matches!(err, AuthenticatorError::SelectionMismatch(_)));
    }

    #[tokio::test]
    async fn test_assertion_without_credentials_fails() {
        let authenticator = SoftwareAuthenticator::new();
        let err = authenticator
            .get(assertion_options("example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthenticatorError::NoCredentials));
    }

    #[tokio::test]
    async fn test_credentials_are_scoped_per_rp() {
        let authenticator = SoftwareAuthenticator::new();
        authenticator.create(creation_options()).await.unwrap();
        assert_eq!(authenticator.resident_count("example.com"), 1);

        let err = authenticator
            .get(assertion_options("other.example"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthenticatorError::NoCredentials));
    }
}
