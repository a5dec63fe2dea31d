//! An arbitrary payload signed by an [`super::Entity`], independent of any
//! [`super::Certificate`] — the thing a [`super::RelayingParty`] ultimately
//! verifies once it has decided to trust the signer's leaf certificate.

use serde::Serialize;

use super::certificate::canonical_json;
use super::error::PkiError;

/// A JSON payload plus a hex-encoded signature over its canonical bytes.
#[derive(Debug, Clone)]
pub struct SignedObject {
    pub payload: serde_json::Value,
    pub signature: String,
}

impl SignedObject {
    /// The exact bytes the signature was computed over.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, PkiError> {
        canonical_json(&self.payload)
    }
}

/// Convenience constructor for tests and callers building a payload from a
/// typed value rather than a raw [`serde_json::Value`].
pub fn to_payload<T: Serialize>(value: &T) -> Result<serde_json::Value, PkiError> {
    serde_json::to_value(value).map_err(|e| PkiError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_bytes_is_stable_regardless_of_key_order() {
        let payload = serde_json::json!({"z": 1, "a": 2});
        let object = SignedObject {
            payload,
            signature: "unused".to_string(),
        };
        let bytes = object.canonical_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.find('a').unwrap() < text.find('z').unwrap());
    }
}
