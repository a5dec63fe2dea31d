//! Oblivion — Oblivious Storage and PKI Verification Core
//!
//! Two independent trust primitives, implemented as one crate because they
//! are reviewed and shipped together, not because either depends on the
//! other:
//!
//! - [`oram`] — a Path-ORAM-style oblivious storage engine: a client stores
//!   small data blocks on an untrusted [`oram::Server`] such that the
//!   server cannot tell which logical ID an operation touches.
//! - [`pki`] — a certificate-chain issuance and verification core: CAs
//!   issue and revoke certificates, a [`pki::RelayingParty`] walks a chain
//!   to a trusted root.
//!
//! Both subsystems are synchronous and single-threaded by design, and
//! operate purely in memory; there is no network transport, no
//! persistence, and no demonstration binary in this crate.

pub mod common;
pub mod oram;
pub mod pki;

pub use common::config::{AppConfig, ConfigError};
pub use common::logging::{init_logging, LogLevel};
pub use oram::{Client as OramClient, OramError, Server as OramServer};
pub use pki::{Ca, Certificate, PkiError, RelayingParty, SignedObject, VerificationError};
