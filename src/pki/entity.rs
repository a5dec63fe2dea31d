//! RSA-keyed entity: anything that can sign or be the subject of a
//! [`super::Certificate`] — an end entity, an intermediate CA, or a root.

use rand::rngs::OsRng;
use rsa::pkcs1v15::Pkcs1v15Sign;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use super::certificate::canonical_json;
use super::error::PkiError;
use super::signed_object::SignedObject;

/// A named keypair holder. Deliberately uses a small RSA modulus by
/// default (see `AppConfig::pki_rsa_bits`) — this crate demonstrates the
/// chain-validation logic, not production key sizing.
pub struct Entity {
    pub name: String,
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl Entity {
    /// Generate a fresh RSA keypair of the requested modulus size.
    pub fn generate(name: impl Into<String>, bits: usize) -> Result<Self, PkiError> {
        let private_key =
            RsaPrivateKey::new(&mut OsRng, bits).map_err(|e| PkiError::KeyGeneration(e.to_string()))?;
        let public_key = RsaPublicKey::from(&private_key);
        Ok(Self {
            name: name.into(),
            private_key,
            public_key,
        })
    }

    /// This entity's public key as a PEM-encoded SubjectPublicKeyInfo.
    pub fn public_key_pem(&self) -> Result<String, PkiError> {
        self.public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| PkiError::KeyGeneration(e.to_string()))
    }

    /// Sign `message` with RSASSA-PKCS1-v1_5 over SHA-256, returning the
    /// signature hex-encoded.
    pub fn sign(&self, message: &[u8]) -> Result<String, PkiError> {
        let digest = Sha256::digest(message);
        let signature = self
            .private_key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(|e| PkiError::Signing(e.to_string()))?;
        Ok(hex::encode(signature))
    }

    /// Sign an arbitrary JSON payload, producing a [`SignedObject`] a
    /// [`super::RelayingParty`] can later verify against a leaf certificate
    /// owned by this entity.
    pub fn sign_object(&self, payload: serde_json::Value) -> Result<SignedObject, PkiError> {
        let canonical = canonical_json(&payload)?;
        let signature = self.sign(&canonical)?;
        Ok(SignedObject { payload, signature })
    }
}

/// Verify a hex-encoded RSASSA-PKCS1-v1_5/SHA-256 signature over `message`
/// against a PEM-encoded public key. Returns `Ok(false)` (not an error)
/// for a well-formed signature that simply does not match.
pub fn verify_signature(
    public_key_pem: &str,
    message: &[u8],
    signature_hex: &str,
) -> Result<bool, PkiError> {
    let public_key = RsaPublicKey::from_public_key_pem(public_key_pem)
        .map_err(|e| PkiError::KeyGeneration(e.to_string()))?;
    let signature = hex::decode(signature_hex).map_err(|e| PkiError::Serialization(e.to_string()))?;
    let digest = Sha256::digest(message);
    Ok(public_key
        .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &signature)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_round_trip() {
        let entity = Entity::generate("alice", 512).unwrap();
        let pem = entity.public_key_pem().unwrap();
        let signature = entity.sign(b"hello").unwrap();
        assert!(verify_signature(&pem, b"hello", &signature).unwrap());
    }

    #[test]
    fn tampered_message_fails_verification() {
        let entity = Entity::generate("alice", 512).unwrap();
        let pem = entity.public_key_pem().unwrap();
        let signature = entity.sign(b"hello").unwrap();
        assert!(!verify_signature(&pem, b"goodbye", &signature).unwrap());
    }

    #[test]
    fn wrong_key_fails_verification() {
        let alice = Entity::generate("alice", 512).unwrap();
        let bob = Entity::generate("bob", 512).unwrap();
        let signature = alice.sign(b"hello").unwrap();
        let bob_pem = bob.public_key_pem().unwrap();
        assert!(!verify_signature(&bob_pem, b"hello", &signature).unwrap());
    }
}
