//! Symmetric crypto primitives used by the [`super::Client`].
//!
//! The source reused a single Fernet key for both authenticated
//! encryption and HMAC tagging. This implementation derives two
//! independent subkeys from one client master secret via HKDF-SHA256, and
//! wraps AES-256-GCM so that re-encrypting identical plaintext under a
//! fresh random nonce yields unlinkable ciphertext, the same property
//! Fernet provides.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::OramError;

const NONCE_LEN: usize = 12;
const ENC_INFO: &[u8] = b"oblivion-oram-enc-v1";
const MAC_INFO: &[u8] = b"oblivion-oram-mac-v1";

type HmacSha256 = Hmac<Sha256>;

/// An AES-256-GCM key used to encrypt bucket-slot plaintext.
///
/// [`Zeroize`] on drop — this key never leaves the owning [`super::Client`].
#[derive(ZeroizeOnDrop)]
pub struct SymmetricKey(Box<[u8; 32]>);

impl SymmetricKey {
    /// Encrypt `plaintext` under a freshly generated random nonce.
    /// The nonce is prepended to the returned ciphertext blob.
    ///
    /// Calling this twice on the same plaintext yields two ciphertexts
    /// with no shared bytes beyond coincidence.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, OramError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.0.as_ref()));
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| OramError::Crypto(format!("encrypt failed: {e}")))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Decrypt a blob previously produced by [`SymmetricKey::encrypt`].
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>, OramError> {
        if blob.len() < NONCE_LEN {
            return Err(OramError::Crypto("ciphertext too short".to_string()));
        }
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.0.as_ref()));
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| OramError::Crypto(format!("decrypt failed: {e}")))
    }
}

/// An HMAC-SHA256 key used to tag stored (id, data) pairs for integrity.
#[derive(ZeroizeOnDrop)]
pub struct MacKey(Box<[u8; 32]>);

impl MacKey {
    /// Compute `HMAC(K_mac, id ++ data)`.
    pub fn tag(&self, id: u64, data: &[u8]) -> Vec<u8> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.0.as_ref())
            .expect("HMAC accepts any key length");
        mac.update(id.to_string().as_bytes());
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }

    /// Constant-time comparison of a recomputed tag against the stored one.
    pub fn verify(&self, id: u64, data: &[u8], expected_tag: &[u8]) -> bool {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.0.as_ref())
            .expect("HMAC accepts any key length");
        mac.update(id.to_string().as_bytes());
        mac.update(data);
        mac.verify_slice(expected_tag).is_ok()
    }
}

/// The client's symmetric key material: one master secret, two derived
/// subkeys. Only [`KeyMaterial::generate`] sees the master secret; it is
/// zeroized immediately after both subkeys are derived.
pub struct KeyMaterial {
    pub enc: SymmetricKey,
    pub mac: MacKey,
}

impl KeyMaterial {
    /// Generate a fresh random master secret and derive `enc`/`mac` subkeys.
    pub fn generate() -> Self {
        let mut master = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut master);

        let hk = Hkdf::<Sha256>::new(None, &master);

        let mut enc_bytes = [0u8; 32];
        hk.expand(ENC_INFO, &mut enc_bytes)
            .expect("32 bytes is a valid HKDF-SHA256 output length");

        let mut mac_bytes = [0u8; 32];
        hk.expand(MAC_INFO, &mut mac_bytes)
            .expect("32 bytes is a valid HKDF-SHA256 output length");

        master.zeroize();

        Self {
            enc: SymmetricKey(Box::new(enc_bytes)),
            mac: MacKey(Box::new(mac_bytes)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_encryption_is_unlinkable() {
        let keys = KeyMaterial::generate();
        let a = keys.enc.encrypt(b"00000").unwrap();
        let b = keys.enc.encrypt(b"00000").unwrap();
        assert_ne!(a, b);
        assert_eq!(keys.enc.decrypt(&a).unwrap(), b"00000");
        assert_eq!(keys.enc.decrypt(&b).unwrap(), b"00000");
    }

    #[test]
    fn hmac_round_trips() {
        let keys = KeyMaterial::generate();
        let tag = keys.mac.tag(7, b"aaaa");
        assert!(keys.mac.verify(7, b"aaaa", &tag));
        assert!(!keys.mac.verify(7, b"bbbb", &tag));
        assert!(!keys.mac.verify(8, b"aaaa", &tag));
    }

    #[test]
    fn enc_and_mac_subkeys_differ() {
        let keys = KeyMaterial::generate();
        assert_ne!(keys.enc.0.as_ref(), keys.mac.0.as_ref());
    }
}
