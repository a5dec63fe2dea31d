//! Environment-based Configuration
//!
//! Defaults for both subsystems come from environment variables, never
//! from hardcoded call sites, so the crate's demonstration strength
//! (e.g. the deliberately weak 512-bit RSA modulus) is visibly opt-in
//! rather than silently baked into library code paths.
//!
//! # Recognized Environment Variables
//!
//! - `OBLIVION_ORAM_TREE_SIZE` — requested slot count for a fresh `Server`
//!   (default: 1024; rounded up to `2^k - 1` by `PerfectTree::new`)
//! - `OBLIVION_PKI_RSA_BITS` — RSA modulus size for new entities/CAs
//!   (default: 512 — intentionally weak, demonstration only)
//! - `OBLIVION_PKI_ROOT_VALIDITY_YEARS` — validity window for a root CA's
//!   own certificate (default: 10)
//! - `OBLIVION_PKI_CERT_VALIDITY_YEARS` — default validity window for
//!   issued leaf/intermediate certificates (default: 1)
//! - `OBLIVION_LOG_LEVEL` — `trace`/`debug`/`info`/`warn`/`error` (default: `info`)
//! - `OBLIVION_LOG_JSON` — `"1"` to emit JSON-formatted logs (default: pretty)

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("{0} must be at least {1}")]
    BelowMinimum(String, u64),
}

/// Resolved configuration for both subsystems.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Requested slot count for a freshly constructed oblivious-storage `Server`.
    pub oram_tree_size: u64,
    /// RSA modulus size in bits used for newly generated PKI keypairs.
    pub pki_rsa_bits: usize,
    /// Validity window, in years, for a root CA's self-issued certificate.
    pub pki_root_validity_years: i64,
    /// Default validity window, in years, for issued certificates.
    pub pki_cert_validity_years: i64,
    /// Minimum log level.
    pub log_level: String,
    /// Whether to emit JSON-formatted logs (vs. human-readable pretty output).
    pub log_json: bool,
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// demonstration-safe defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let oram_tree_size = parse_env_or("OBLIVION_ORAM_TREE_SIZE", 1024u64)?;
        let pki_rsa_bits = parse_env_or("OBLIVION_PKI_RSA_BITS", 512usize)?;
        let pki_root_validity_years = parse_env_or("OBLIVION_PKI_ROOT_VALIDITY_YEARS", 10i64)?;
        let pki_cert_validity_years = parse_env_or("OBLIVION_PKI_CERT_VALIDITY_YEARS", 1i64)?;
        let log_level = env::var("OBLIVION_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_json = env::var("OBLIVION_LOG_JSON")
            .map(|v| v == "1")
            .unwrap_or(false);

        let config = Self {
            oram_tree_size,
            pki_rsa_bits,
            pki_root_validity_years,
            pki_cert_validity_years,
            log_level,
            log_json,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.oram_tree_size < 1 {
            return Err(ConfigError::BelowMinimum(
                "OBLIVION_ORAM_TREE_SIZE".to_string(),
                1,
            ));
        }
        if self.pki_rsa_bits < 512 {
            return Err(ConfigError::BelowMinimum(
                "OBLIVION_PKI_RSA_BITS".to_string(),
                512,
            ));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            oram_tree_size: 1024,
            pki_rsa_bits: 512,
            pki_root_validity_years: 10,
            pki_cert_validity_years: 1,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

fn parse_env_or<T>(var_name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
{
    match env::var(var_name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(var_name.to_string(), value)),
        Err(_) => Ok(default),
    }
}
