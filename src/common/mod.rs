//! Common Infrastructure Module
//!
//! Ambient concerns shared by both trust primitives: configuration and
//! structured logging. Neither subsystem's domain error type lives here —
//! `oram` and `pki` never call each other, so they keep independent error
//! enums (`oram::OramError`, `pki::PkiError`, `pki::VerificationError`).

pub mod config;
pub mod logging;

pub use config::{AppConfig, ConfigError};
pub use logging::{init_logging, EventCategory, LogEvent, LogLevel, LoggingError};
