//! Certificate type and its canonical signing representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::PkiError;

/// Render `value` as sorted-key, 4-space-indented JSON.
/// `serde_json::Value::Object` is `BTreeMap`-backed by default, so
/// converting through [`serde_json::to_value`] sorts the keys regardless
/// of a struct's field declaration order.
pub(super) fn canonical_json(value: &serde_json::Value) -> Result<Vec<u8>, PkiError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    serde::Serialize::serialize(value, &mut serializer)
        .map_err(|e| PkiError::Serialization(e.to_string()))?;
    Ok(buf)
}

/// A signed binding of a name to a public key, issued by another entity.
///
/// `issuer_cert` links to the certificate that issued this one, forming a
/// chain that [`super::RelayingParty::verify`] walks root-ward; a root is
/// self-signed, so both `issuer` and `issuer_cert` are `None` for it.
/// `is_ca` marks a certificate as entitled to issue further certificates,
/// distinct from ordinary end-entity leaves.
///
/// Serializes with `PascalCase` field names. The `Signature` field is
/// excluded from [`Certificate::canonical_bytes`] — it is what gets
/// signed, so it cannot be part of its own input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Certificate {
    pub name: String,
    pub public_key: String,
    pub issuer: Option<String>,
    pub issuer_cert: Option<Box<Certificate>>,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub is_ca: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Certificate {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        public_key_pem: impl Into<String>,
        issuer: Option<String>,
        issuer_cert: Option<Box<Certificate>>,
        not_before: DateTime<Utc>,
        not_after: DateTime<Utc>,
        is_ca: bool,
    ) -> Self {
        Self {
            name: name.into(),
            public_key: public_key_pem.into(),
            issuer,
            issuer_cert,
            not_before,
            not_after,
            is_ca,
            signature: None,
        }
    }

    /// The bytes an issuer signs and a verifier re-derives: this
    /// certificate (including its embedded issuer chain) as canonical
    /// JSON with no top-level `Signature` field.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, PkiError> {
        let mut value =
            serde_json::to_value(self).map_err(|e| PkiError::Serialization(e.to_string()))?;
        if let Some(object) = value.as_object_mut() {
            object.remove("Signature");
        }
        canonical_json(&value)
    }

    pub fn attach_signature(&mut self, signature_hex: String) {
        self.signature = Some(signature_hex);
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.not_before && at <= self.not_after
    }

    /// Whether this certificate is a self-signed root (no issuer link).
    pub fn is_root(&self) -> bool {
        self.issuer_cert.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn cert(name: &str, issuer: Option<&str>, issuer_cert: Option<Box<Certificate>>) -> Certificate {
        let now = Utc::now();
        Certificate::new(
            name,
            "PEM",
            issuer.map(str::to_string),
            issuer_cert,
            now,
            now + Duration::days(1),
            false,
        )
    }

    #[test]
    fn canonical_bytes_excludes_signature_and_sorts_keys() {
        let mut leaf = cert("leaf", Some("ca"), None);
        leaf.attach_signature("deadbeef".to_string());

        let bytes = leaf.canonical_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("Signature"));
        assert!(!text.contains("deadbeef"));

        let issuer_pos = text.find("Issuer").unwrap();
        let name_pos = text.find("Name").unwrap();
        assert!(issuer_pos < name_pos);
    }

    #[test]
    fn canonical_bytes_embeds_the_issuer_chain() {
        let root = cert("root", None, None);
        let leaf = cert("leaf", Some("root"), Some(Box::new(root)));
        let bytes = leaf.canonical_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("IssuerCert"));
    }

    #[test]
    fn validity_window_is_inclusive() {
        let c = cert("leaf", Some("ca"), None);
        assert!(c.is_valid_at(c.not_before));
        assert!(c.is_valid_at(c.not_after));
        assert!(!c.is_valid_at(c.not_before - Duration::seconds(1)));
        assert!(!c.is_valid_at(c.not_after + Duration::seconds(1)));
    }

    #[test]
    fn root_has_no_issuer_cert() {
        let root = cert("root", None, None);
        assert!(root.is_root());
        let leaf = cert("leaf", Some("root"), Some(Box::new(root)));
        assert!(!leaf.is_root());
    }
}
