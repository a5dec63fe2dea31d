//! Structured Logging
//!
//! Provides structured logging for both trust primitives:
//! - JSON output for log aggregation when `AppConfig::log_json` is set
//! - Correlation via the logical ID / certificate name under operation
//! - Distinct event categories for the oblivious-storage and PKI subsystems
//!
//! # Usage
//!
//! ```rust,no_run
//! use oblivion::common::logging::{init_logging, LogLevel};
//!
//! init_logging(LogLevel::Info, false).ok();
//! ```

use serde::Serialize;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Minimum log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl From<&str> for LogLevel {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

/// Event categories for structured logging.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Oblivious-storage store/retrieve/delete/push-down events.
    Oram,
    /// Certificate issuance/revocation/verification events.
    Pki,
    /// Security-relevant outcomes (verification failures, revocations).
    Security,
}

/// A structured log event.
#[derive(Debug, Serialize)]
pub struct LogEvent {
    pub category: EventCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl LogEvent {
    pub fn new(category: EventCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            correlation_id: None,
            data: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| format!("{{\"message\": \"{}\"}}", self.message))
    }
}

/// Log an oblivious-storage operation outcome.
pub fn log_oram_event(op: &str, id: u64, success: bool, detail: Option<&str>) {
    let event = LogEvent::new(EventCategory::Oram, op)
        .with_correlation_id(id.to_string())
        .with_data(serde_json::json!({ "id": id, "success": success, "detail": detail }));

    if success {
        tracing::info!(target: "oblivion::oram", "{}", event.to_json());
    } else {
        tracing::warn!(target: "oblivion::oram", "{}", event.to_json());
    }
}

/// Log a PKI issuance/revocation/verification outcome.
pub fn log_pki_event(op: &str, subject: &str, success: bool, detail: Option<&str>) {
    let category = if op == "verify" {
        EventCategory::Security
    } else {
        EventCategory::Pki
    };
    let event = LogEvent::new(category, op)
        .with_correlation_id(subject.to_string())
        .with_data(serde_json::json!({ "subject": subject, "success": success, "detail": detail }));

    if success {
        tracing::info!(target: "oblivion::pki", "{}", event.to_json());
    } else {
        tracing::warn!(target: "oblivion::pki", "{}", event.to_json());
    }
}

/// Initialize the global `tracing` subscriber.
pub fn init_logging(level: LogLevel, json_format: bool) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("oblivion={}", format!("{:?}", level).to_lowercase()))
    });

    if json_format {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE),
        );
        subscriber
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    } else {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .pretty()
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE),
        );
        subscriber
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    }

    Ok(())
}

/// Logging errors.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to initialize logging: {0}")]
    InitFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_event_serializes_expected_fields() {
        let event = LogEvent::new(EventCategory::Oram, "store")
            .with_correlation_id("42")
            .with_data(serde_json::json!({"success": true}));

        let json = event.to_json();
        assert!(json.contains("store"));
        assert!(json.contains("42"));
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        assert_eq!(LogLevel::from("DEBUG"), LogLevel::Debug);
        assert_eq!(LogLevel::from("warning"), LogLevel::Warn);
        assert_eq!(LogLevel::from("unknown"), LogLevel::Info);
    }
}
