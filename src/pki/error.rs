//! PKI error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised while building or signing PKI objects.
#[derive(Debug, Error)]
pub enum PkiError {
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("canonical serialization failed: {0}")]
    Serialization(String),

    #[error("certificate has not been signed yet")]
    Unsigned,
}

/// Errors raised while verifying a certificate chain.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("signature does not match the issuer's public key")]
    InvalidSignature,

    #[error("certificate is not yet valid (not valid before {0})")]
    NotYetValid(DateTime<Utc>),

    #[error("certificate has expired (not valid after {0})")]
    Expired(DateTime<Utc>),

    #[error("certificate has been revoked")]
    Revoked,

    #[error("'{0}' is not a trusted root certificate")]
    UntrustedRoot(String),

    #[error("certificate chain exceeds the maximum allowed depth")]
    ChainTooDeep,

    #[error(transparent)]
    Pki(#[from] PkiError),
}
