//! Oblivious-storage error type.

use thiserror::Error;

/// Errors surfaced by [`super::Client`] operations.
///
/// Retrieving or deleting an unknown ID is *not* an error — it returns
/// `Ok(None)`, a distinct outcome from a genuine operation failure.
#[derive(Debug, Error)]
pub enum OramError {
    /// `store_data` was called with an ID already present in the position map.
    #[error("ID already exists")]
    AlreadyExists,

    /// The plaintext recovered from the server had the wrong length.
    #[error("invalid data was returned by the server")]
    InvalidData,

    /// The HMAC recomputed over the recovered plaintext did not match the
    /// tag recorded in the position map at store time.
    #[error("the given id data was corrupted")]
    Corrupted,

    /// The AEAD or HMAC primitive itself failed (e.g. a ciphertext that
    /// does not decrypt under the client's key — should never happen for
    /// slots this client itself wrote).
    #[error("crypto failure: {0}")]
    Crypto(String),
}
