//! The verifier: walks a certificate's issuer chain back to a trusted root,
//! then checks the signature on the object the caller actually cares about.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::Utc;

use super::certificate::Certificate;
use super::entity::verify_signature;
use super::error::VerificationError;
use super::signed_object::SignedObject;

/// Maximum number of links a chain may contain before verification gives
/// up — bounds the cost of a malicious, arbitrarily long `issuer_cert`
/// chain (and guards against a cycle that would otherwise loop forever).
const MAX_CHAIN_DEPTH: usize = 8;

/// A party that trusts a fixed set of root certificates and verifies
/// objects signed by certificates that chain back to those roots.
#[derive(Default)]
pub struct RelayingParty {
    trusted_roots: HashMap<String, Certificate>,
    revocation_lists: HashMap<String, Rc<RefCell<Vec<Certificate>>>>,
}

impl RelayingParty {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust `root_certificate` and wire up its revocation list so
    /// revocations issued by that CA are visible here without re-fetching.
    pub fn trust_root(
        &mut self,
        root_certificate: Certificate,
        revocation_list: Rc<RefCell<Vec<Certificate>>>,
    ) {
        self.revocation_lists
            .insert(root_certificate.name.clone(), revocation_list);
        self.trusted_roots
            .insert(root_certificate.name.clone(), root_certificate);
    }

    /// Register the revocation list of an intermediate CA, so certificates
    /// it issued can be checked for revocation even though it is not a
    /// trusted root itself.
    pub fn register_revocation_list(
        &mut self,
        issuer_name: impl Into<String>,
        revocation_list: Rc<RefCell<Vec<Certificate>>>,
    ) {
        self.revocation_lists
            .insert(issuer_name.into(), revocation_list);
    }

    /// Verify `object`'s signature under `leaf_cert`'s public key, then
    /// verify `leaf_cert` itself by walking `issuer_cert` links until a
    /// certificate with no issuer link is reached, requiring that final
    /// certificate to be one of `self`'s trusted roots.
    pub fn verify(
        &self,
        object: &SignedObject,
        leaf_cert: &Certificate,
    ) -> Result<(), VerificationError> {
        self.verify_chain(leaf_cert)?;

        let canonical = object.canonical_bytes()?;
        if !verify_signature(&leaf_cert.public_key, &canonical, &object.signature)? {
            return Err(VerificationError::InvalidSignature);
        }
        Ok(())
    }

    fn verify_chain(&self, leaf_cert: &Certificate) -> Result<(), VerificationError> {
        let now = Utc::now();
        let mut current = leaf_cert;

        for depth in 0..MAX_CHAIN_DEPTH {
            let issuer_public_key = match &current.issuer_cert {
                Some(issuer_cert) => &issuer_cert.public_key,
                None => &current.public_key,
            };
            let signature = current
                .signature
                .as_ref()
                .ok_or(VerificationError::InvalidSignature)?;
            let canonical = current.canonical_bytes()?;
            if !verify_signature(issuer_public_key, &canonical, signature)? {
                return Err(VerificationError::InvalidSignature);
            }

            if self.is_revoked(current) {
                return Err(VerificationError::Revoked);
            }

            if now < current.not_before {
                return Err(VerificationError::NotYetValid(current.not_before));
            }
            if now > current.not_after {
                return Err(VerificationError::Expired(current.not_after));
            }

            match &current.issuer_cert {
                Some(issuer_cert) => current = issuer_cert,
                None => {
                    return if self.trusted_roots.contains_key(&current.name) {
                        Ok(())
                    } else {
                        Err(VerificationError::UntrustedRoot(current.name.clone()))
                    };
                }
            }

            if depth == MAX_CHAIN_DEPTH - 1 {
                return Err(VerificationError::ChainTooDeep);
            }
        }

        Err(VerificationError::ChainTooDeep)
    }

    /// A certificate is revoked if its issuer's list names it, or — for a
    /// certificate entitled to issue certificates of its own — if it
    /// appears in its own revocation list. A root has no issuer to check.
    fn is_revoked(&self, certificate: &Certificate) -> bool {
        let named_by_issuer = if certificate.is_root() {
            false
        } else {
            certificate
                .issuer
                .as_deref()
                .and_then(|issuer| self.revocation_lists.get(issuer))
                .map(|list| list.borrow().iter().any(|c| c.name == certificate.name))
                .unwrap_or(false)
        };

        let self_revoked = certificate.is_ca
            && self
                .revocation_lists
                .get(&certificate.name)
                .map(|list| list.borrow().iter().any(|c| c.name == certificate.name))
                .unwrap_or(false);

        named_by_issuer || self_revoked
    }
}

#[cfg(test)]
mod tests {
    use super::super::ca::Ca;
    use super::super::entity::Entity;
    use super::*;
    use serde_json::json;

    fn trusted_party(root: &Ca) -> RelayingParty {
        let mut party = RelayingParty::new();
        party.trust_root(root.certificate.clone(), root.revocation_list());
        party
    }

    fn signed(entity: &Entity) -> SignedObject {
        entity.sign_object(json!({"hello": "world"})).unwrap()
    }

    #[test]
    fn verifies_a_simple_two_party_chain() {
        let root = Ca::new_root("root-ca", 512, 10).unwrap();
        let alice = Entity::generate("alice", 512).unwrap();
        let leaf = root.issue("alice", alice.public_key_pem().unwrap(), 1).unwrap();
        let party = trusted_party(&root);
        assert!(party.verify(&signed(&alice), &leaf).is_ok());
    }

    #[test]
    fn verifies_a_multi_hop_chain() {
        let root = Ca::new_root("root-ca", 512, 10).unwrap();
        let intermediate = Ca::new_intermediate("intermediate-ca", 512, 5, &root).unwrap();
        let alice = Entity::generate("alice", 512).unwrap();
        let leaf = intermediate
            .issue("alice", alice.public_key_pem().unwrap(), 1)
            .unwrap();

        let mut party = trusted_party(&root);
        party.register_revocation_list("intermediate-ca", intermediate.revocation_list());

        assert!(party.verify(&signed(&alice), &leaf).is_ok());
    }

    #[test]
    fn rejects_a_revoked_leaf() {
        let root = Ca::new_root("root-ca", 512, 10).unwrap();
        let alice = Entity::generate("alice", 512).unwrap();
        let leaf = root.issue("alice", alice.public_key_pem().unwrap(), 1).unwrap();
        let party = trusted_party(&root);
        root.revoke_cert(leaf.clone());
        assert!(matches!(
            party.verify(&signed(&alice), &leaf),
            Err(VerificationError::Revoked)
        ));
    }

    #[test]
    fn rejects_an_expired_certificate() {
        use chrono::Duration;
        let root = Ca::new_root("root-ca", 512, 10).unwrap();
        let alice = Entity::generate("alice", 512).unwrap();
        let mut leaf = root.issue("alice", alice.public_key_pem().unwrap(), 1).unwrap();
        leaf.not_after = Utc::now() - Duration::days(1);
        let party = trusted_party(&root);
        assert!(matches!(
            party.verify(&signed(&alice), &leaf),
            Err(VerificationError::Expired(_))
        ));
    }

    #[test]
    fn rejects_a_forged_signature() {
        let root = Ca::new_root("root-ca", 512, 10).unwrap();
        let alice = Entity::generate("alice", 512).unwrap();
        let mut leaf = root.issue("alice", alice.public_key_pem().unwrap(), 1).unwrap();
        leaf.public_key = "not-the-signed-key".to_string();
        let party = trusted_party(&root);
        assert!(matches!(
            party.verify(&signed(&alice), &leaf),
            Err(VerificationError::InvalidSignature)
        ));
    }

    #[test]
    fn rejects_an_untrusted_self_signed_root() {
        let stranger = Ca::new_root("stranger", 512, 10).unwrap();
        let party = RelayingParty::new();
        assert!(matches!(
            party.verify(&signed(&stranger.entity), &stranger.certificate),
            Err(VerificationError::UntrustedRoot(_))
        ));
    }

    #[test]
    fn rejects_a_revoked_intermediate_ca_even_for_its_own_issued_leaf() {
        let root = Ca::new_root("root-ca", 512, 10).unwrap();
        let intermediate = Ca::new_intermediate("intermediate-ca", 512, 5, &root).unwrap();
        let alice = Entity::generate("alice", 512).unwrap();
        let leaf = intermediate
            .issue("alice", alice.public_key_pem().unwrap(), 1)
            .unwrap();

        root.revoke_cert(intermediate.certificate.clone());

        let mut party = trusted_party(&root);
        party.register_revocation_list("intermediate-ca", intermediate.revocation_list());

        assert!(matches!(
            party.verify(&signed(&alice), &leaf),
            Err(VerificationError::Revoked)
        ));
    }
}
