//! The platform-authenticator capability boundary.
//!
//! [`Authenticator`] is the seam to whatever actually creates public-key
//! credentials and produces assertions: a platform biometric authenticator,
//! a roaming key, or the in-process [`SoftwareAuthenticator`]. The option
//! and handle types mirror the WebAuthn request/response shapes.

mod software;

pub use software::SoftwareAuthenticator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// COSE algorithm identifier for ECDSA-P256/SHA-256.
pub const ALG_ES256: i32 = -7;
/// COSE algorithm identifier for RSASSA-PKCS1-v1_5/SHA-256.
pub const ALG_RS256: i32 = -257;

/// Failure reported by an authenticator.
#[derive(Debug, Error)]
pub enum AuthenticatorError {
    /// The user dismissed the operation.
    #[error("operation cancelled by the user")]
    Cancelled,

    /// The operation did not complete within the request timeout.
    #[error("operation timed out")]
    Timeout,

    /// No available authenticator satisfied the selection criteria.
    #[error("no authenticator matched the selection criteria: {0}")]
    SelectionMismatch(String),

    /// No discoverable credential was available for the relying party.
    #[error("no discoverable credentials are available")]
    NoCredentials,

    /// Any other authenticator-side failure.
    #[error("authenticator failure: {0}")]
    Internal(String),
}

/// Attachment modality of an authenticator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthenticatorAttachment {
    /// Built into the client device (biometric sensor, secure element).
    Platform,
    /// Roaming authenticator reachable over a transport.
    CrossPlatform,
}

impl AuthenticatorAttachment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Platform => "platform",
            Self::CrossPlatform => "cross-platform",
        }
    }
}

/// How strongly user verification is demanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserVerification {
    Required,
    Preferred,
    Discouraged,
}

/// Attestation conveyance preference for registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationPreference {
    None,
    Indirect,
    Direct,
}

/// Relying-party identity included in a registration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelyingParty {
    /// Human-readable name.
    pub name: String,
    /// Domain identifier.
    pub id: String,
}

/// User entity presented to the authenticator at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntity {
    /// Opaque user handle.
    pub id: Vec<u8>,
    /// Account name.
    pub name: String,
    /// Display name.
    #[serde(rename = "displayName")]
    pub display_name: String,
}

/// One acceptable public-key algorithm, in preference order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialParameters {
    #[serde(rename = "type")]
    pub kind: String,
    pub alg: i32,
}

impl CredentialParameters {
    /// A `"public-key"` entry for the given COSE algorithm.
    pub fn public_key(alg: i32) -> Self {
        Self {
            kind: "public-key".to_string(),
            alg,
        }
    }
}

/// Authenticator-selection criteria for registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelection {
    pub authenticator_attachment: AuthenticatorAttachment,
    pub require_resident_key: bool,
    pub user_verification: UserVerification,
}

/// Parameters for [`Authenticator::create`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialCreationOptions {
    /// Per-operation random nonce; never reused.
    pub challenge: Vec<u8>,
    pub rp: RelyingParty,
    pub user: UserEntity,
    /// Acceptable algorithms, most preferred first.
    pub pub_key_cred_params: Vec<CredentialParameters>,
    /// Milliseconds the authenticator may wait for the user.
    pub timeout: u32,
    pub attestation: AttestationPreference,
    pub authenticator_selection: AuthenticatorSelection,
}

/// Parameters for [`Authenticator::get`].
///
/// Carries no allow-list: selection relies on the authenticator's
/// discoverable credentials for `rp_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionRequestOptions {
    /// Per-operation random nonce; never reused.
    pub challenge: Vec<u8>,
    pub rp_id: String,
    /// Milliseconds the authenticator may wait for the user.
    pub timeout: u32,
    pub user_verification: UserVerification,
}

/// Opaque credential handle returned by a successful `create`.
#[derive(Debug, Clone)]
pub struct CredentialHandle {
    /// Authenticator-assigned identifier.
    pub id: String,
    /// Credential type tag, `"public-key"`.
    pub kind: String,
    /// Raw identifier bytes.
    pub raw_id: Vec<u8>,
    /// Registration attestation payload.
    pub attestation_object: Vec<u8>,
    /// Serialized client data.
    pub client_data_json: Vec<u8>,
    /// Attachment modality used, when reported.
    pub authenticator_attachment: Option<AuthenticatorAttachment>,
}

/// Opaque assertion handle returned by a successful `get`.
#[derive(Debug, Clone)]
pub struct AssertionHandle {
    /// Identifier of the credential the assertion references.
    pub id: String,
    /// Raw identifier bytes.
    pub raw_id: Vec<u8>,
    /// Authenticator data covered by the signature.
    pub authenticator_data: Vec<u8>,
    /// Serialized client data.
    pub client_data_json: Vec<u8>,
    /// Proof-of-possession signature.
    pub signature: Vec<u8>,
    /// User handle the credential was created for, when reported.
    pub user_handle: Option<Vec<u8>>,
}

/// Public-key credential creation and assertion capability.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Create a new credential per `options`.
    async fn create(
        &self,
        options: CredentialCreationOptions,
    ) -> Result<CredentialHandle, AuthenticatorError>;

    /// Produce an authentication assertion per `options`.
    async fn get(
        &self,
        options: AssertionRequestOptions,
    ) -> Result<AssertionHandle, AuthenticatorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_serialization() {
        let json = serde_json::to_string(&AuthenticatorAttachment::CrossPlatform).unwrap();
        assert_eq!(json, "\"cross-platform\"");
        assert_eq!(AuthenticatorAttachment::Platform.as_str(), "platform");
    }

    #[test]
    fn test_creation_options_wire_shape() {
        let options = CredentialCreationOptions {
            challenge: vec![1, 2, 3],
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
        };

        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value["pubKeyCredParams"][0]["type"], "public-key");
        assert_eq!(value["pubKeyCredParams"][0]["alg"], -7);
        assert_eq!(value["pubKeyCredParams"][1]["alg"], -257);
        assert_eq!(value["attestation"], "direct");
        assert_eq!(
            value["authenticatorSelection"]["authenticatorAttachment"],
            "platform"
        );
        assert_eq!(value["authenticatorSelection"]["requireResidentKey"], true);
        assert_eq!(
            value["authenticatorSelection"]["userVerification"],
            "required"
        );
        assert_eq!(value["user"]["displayName"], "Demo User");
    }
}
