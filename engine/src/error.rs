//! Error handling for the SLO report computation engine
//!
//! This module provides the error types for all engine operations,
//! including configuration validation, backend queries, and report export.

use std::io;

use thiserror::Error;

/// The main error type for the engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// SLO config or error budget policy is structurally invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A backend adapter failed to reach or query its provider
    #[error("Backend query error: {0}")]
    Backend(#[from] BackendError),

    /// SLI method name not recognized by any adapter capability
    #[error("Unsupported SLI method: {method}")]
    UnsupportedMethod { method: String },

    /// A report sink failed to deliver reports
    #[error("Exporter error: {0}")]
    Exporter(#[from] ExporterError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },

    #[error("SLO target {target} is outside (0, 1]")]
    TargetOutOfRange { target: f64 },

    #[error("SLO target of exactly 1.0 leaves no error budget")]
    ZeroErrorBudget,

    #[error("Unknown backend provider: {name}")]
    UnknownBackend { name: String },

    #[error("Unknown exporter: {name}")]
    UnknownExporter { name: String },

    #[error("Backend {name} does not host SLO definitions")]
    NotProvisionable { name: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },
}

/// Backend query errors
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Provider {provider} unreachable: {reason}")]
    Unreachable { provider: String, reason: String },

    #[error("Provider {provider} rejected query: {reason}")]
    QueryRejected { provider: String, reason: String },

    #[error("Query to provider {provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("Remote SLO not found: {resource}")]
    NotFound { resource: String },

    #[error("Malformed response from provider {provider}: {reason}")]
    MalformedResponse { provider: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Report export errors
#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Delivery to {exporter} failed: {reason}")]
    Delivery { exporter: String, reason: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, EngineError>;

/// A specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// A specialized result type for backend operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// A specialized result type for export operations
pub type ExporterResult<T> = std::result::Result<T, ExporterError>;

impl EngineError {
    /// Check if retrying the whole evaluation could succeed.
    ///
    /// The engine itself never retries; this is a hint for the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Backend(
                BackendError::Unreachable { .. }
                    | BackendError::Timeout { .. }
                    | BackendError::Http(_)
            )
        )
    }

    /// Get the error category for logging and metrics
    pub fn category(&self) -> &'static str {
        match self {
            EngineError::Config(_) => "config",
            EngineError::Backend(_) => "backend",
            EngineError::UnsupportedMethod { .. } => "unsupported_method",
            EngineError::Exporter(_) => "exporter",
            EngineError::Serialization(_) => "serialization",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categorization() {
        let config_error = EngineError::Config(ConfigError::ZeroErrorBudget);
        assert_eq!(config_error.category(), "config");
        assert!(!config_error.is_retryable());

        let timeout = EngineError::Backend(BackendError::Timeout {
            provider: "prometheus".to_string(),
            timeout_ms: 5000,
        });
        assert_eq!(timeout.category(), "backend");
        assert!(timeout.is_retryable());

        let rejected = EngineError::Backend(BackendError::QueryRejected {
            provider: "elasticsearch".to_string(),
            reason: "parse error".to_string(),
        });
        assert!(!rejected.is_retryable());

        let method = EngineError::UnsupportedMethod {
            method: "foo".to_string(),
        };
        assert_eq!(method.category(), "unsupported_method");
        assert!(!method.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let error = EngineError::Config(ConfigError::MissingField {
            field: "backend.measurement.query_good".to_string(),
        });
        assert!(error.to_string().contains("query_good"));

        let error = EngineError::UnsupportedMethod {
            method: "foo".to_string(),
        };
        assert_eq!(error.to_string(), "Unsupported SLI method: foo");
    }
}
