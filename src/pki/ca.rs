//! Certificate authority: issues and revokes certificates.
//!
//! A CA's revocation list is shared (`Rc<RefCell<_>>`) with every
//! [`super::RelayingParty`] that registers it, so a revocation takes
//! effect for every party holding a reference to it immediately — the
//! same "one shared list, aliased everywhere" behavior the original
//! Python implementation got for free from mutable list references.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};

use super::certificate::Certificate;
use super::entity::Entity;
use super::error::PkiError;

/// A certificate authority: an [`Entity`] plus the certificate that
/// vouches for its own key, plus the certificates it has revoked.
///
/// The revocation list holds full certificate records, not just names,
/// so it can prune itself: a revoked certificate stops mattering once it
/// would have expired anyway, and keeping the full record is what makes
/// that check possible without consulting the issuer again.
pub struct Ca {
    pub entity: Entity,
    pub certificate: Certificate,
    revoked: Rc<RefCell<Vec<Certificate>>>,
}

impl Ca {
    /// Create a self-signed root CA: both `certificate.issuer` and
    /// `certificate.issuer_cert` are `None`.
    pub fn new_root(
        name: impl Into<String>,
        bits: usize,
        validity_years: i64,
    ) -> Result<Self, PkiError> {
        let entity = Entity::generate(name, bits)?;
        let now = Utc::now();
        let mut certificate = Certificate::new(
            entity.name.clone(),
            entity.public_key_pem()?,
            None,
            None,
            now,
            now + Duration::days(365 * validity_years),
            true,
        );
        let signature = entity.sign(&certificate.canonical_bytes()?)?;
        certificate.attach_signature(signature);

        Ok(Self {
            entity,
            certificate,
            revoked: Rc::new(RefCell::new(Vec::new())),
        })
    }

    /// Create an intermediate CA whose own certificate is issued (signed)
    /// by `parent`.
    pub fn new_intermediate(
        name: impl Into<String>,
        bits: usize,
        validity_years: i64,
        parent: &Ca,
    ) -> Result<Self, PkiError> {
        let entity = Entity::generate(name, bits)?;
        let certificate = parent.issue_cert(
            entity.name.clone(),
            entity.public_key_pem()?,
            Utc::now(),
            Utc::now() + Duration::days(365 * validity_years),
            true,
        )?;

        Ok(Self {
            entity,
            certificate,
            revoked: Rc::new(RefCell::new(Vec::new())),
        })
    }

    /// Issue a certificate binding `subject_name` to `subject_public_key_pem`
    /// over `[valid_from, valid_to]`, signed by this CA. `is_ca` marks
    /// whether the new certificate may itself issue certificates.
    pub fn issue_cert(
        &self,
        subject_name: impl Into<String>,
        subject_public_key_pem: impl Into<String>,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
        is_ca: bool,
    ) -> Result<Certificate, PkiError> {
        let mut certificate = Certificate::new(
            subject_name,
            subject_public_key_pem,
            Some(self.entity.name.clone()),
            Some(Box::new(self.certificate.clone())),
            valid_from,
            valid_to,
            is_ca,
        );
        let signature = self.entity.sign(&certificate.canonical_bytes()?)?;
        certificate.attach_signature(signature);
        Ok(certificate)
    }

    /// Issue a leaf (non-CA) certificate valid for `validity_years` from now.
    /// Convenience wrapper over [`Ca::issue_cert`] for the common case.
    pub fn issue(
        &self,
        subject_name: impl Into<String>,
        subject_public_key_pem: impl Into<String>,
        validity_years: i64,
    ) -> Result<Certificate, PkiError> {
        let now = Utc::now();
        self.issue_cert(
            subject_name,
            subject_public_key_pem,
            now,
            now + Duration::days(365 * validity_years),
            false,
        )
    }

    /// Revoke `certificate`, then drop every entry in the revocation list
    /// whose `not_after` has already passed.
    pub fn revoke_cert(&self, certificate: Certificate) {
        self.revoked.borrow_mut().push(certificate);
        self.prune_expired();
    }

    fn prune_expired(&self) {
        let now = Utc::now();
        self.revoked.borrow_mut().retain(|c| c.not_after > now);
    }

    pub fn is_revoked(&self, certificate_name: &str) -> bool {
        self.revoked
            .borrow()
            .iter()
            .any(|c| c.name == certificate_name)
    }

    /// A handle to this CA's revocation list, shared with any
    /// [`super::RelayingParty`] that registers it.
    pub fn revocation_list(&self) -> Rc<RefCell<Vec<Certificate>>> {
        Rc::clone(&self.revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_certificate_is_self_signed() {
        let root = Ca::new_root("root", 512, 10).unwrap();
        assert!(root.certificate.is_root());
        assert!(root.certificate.is_signed());
    }

    #[test]
    fn revocation_is_visible_through_shared_handle() {
        let root = Ca::new_root("root", 512, 10).unwrap();
        let leaf = root.issue("leaf", "PEM-of-leaf", 1).unwrap();
        let list_handle = root.revocation_list();
        root.revoke_cert(leaf);
        assert!(list_handle.borrow().iter().any(|c| c.name == "leaf"));
        assert!(root.is_revoked("leaf"));
    }

    #[test]
    fn intermediate_certificate_is_issued_by_parent() {
        let root = Ca::new_root("root", 512, 10).unwrap();
        let intermediate = Ca::new_intermediate("intermediate", 512, 5, &root).unwrap();
        assert_eq!(intermediate.certificate.issuer.as_deref(), Some("root"));
        assert!(intermediate.certificate.is_ca);
        assert_eq!(
            intermediate.certificate.issuer_cert.as_deref(),
            Some(&root.certificate)
        );
    }

    #[test]
    fn revoked_list_prunes_entries_past_their_expiry() {
        let root = Ca::new_root("root", 512, 10).unwrap();
        let mut expired_leaf = root.issue("leaf", "PEM-of-leaf", 1).unwrap();
        expired_leaf.not_after = Utc::now() - Duration::days(1);
        root.revoke_cert(expired_leaf);
        assert!(root.revocation_list().borrow().is_empty());
    }
}
