//! The persisted credential-metadata unit.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Binary response payloads captured when a credential is created.
///
/// Both fields are byte-value sequences; no native binary type crosses the
/// persistence boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationPayloads {
    /// Registration attestation payload.
    #[serde(rename = "attestationObject")]
    pub attestation_object: Vec<u8>,

    /// Client data payload.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Vec<u8>,
}

/// Metadata persisted for one locally created credential.
///
/// `id` is the authenticator-assigned identifier and the store's primary
/// key. A record is immutable once written except via full overwrite:
/// writing the same `id` again replaces the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Authenticator-assigned credential identifier; unique.
    pub id: String,

    /// Credential type tag, `"public-key"`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Raw identifier bytes.
    #[serde(rename = "rawId")]
    pub raw_id: Vec<u8>,

    /// Registration response payloads.
    pub response: AttestationPayloads,

    /// Attachment modality reported at creation time, when known.
    #[serde(
        rename = "authenticatorAttachment",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub authenticator_attachment: Option<String>,

    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl CredentialRecord {
    /// Current time in the `timestamp` encoding (epoch milliseconds).
    pub fn now_millis() -> i64 {
        Utc::now().timestamp_millis()
    }
}
