//! Binary buffer encodings for the persistence and transport boundaries.
//!
//! Every binary field that crosses the persistence boundary is converted to
//! an owned byte sequence with [`to_storable_sequence`]; the text form used
//! for transport is standard-alphabet base64.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;

/// Error returned when [`from_text`] is handed malformed input.
#[derive(Debug, Error)]
#[error("invalid base64 text: {0}")]
pub struct DecodeError(#[from] base64::DecodeError);

/// Copy a binary buffer into the owned byte-sequence form used for storage.
///
/// Order and length are preserved exactly; no compression, no loss.
pub fn to_storable_sequence(buffer: &[u8]) -> Vec<u8> {
    buffer.to_vec()
}

/// Encode a binary buffer as standard-alphabet base64 text.
pub fn to_text(buffer: &[u8]) -> String {
    BASE64.encode(buffer)
}

/// Exact inverse of [`to_text`].
///
/// Fails with [`DecodeError`] on characters outside the standard alphabet
/// or invalid padding.
pub fn from_text(text: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(BASE64.decode(text)?)
}
