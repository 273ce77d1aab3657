//! Configuration model for SLO definitions and error budget policies
//!
//! This module defines the structured form of SLO configurations and
//! error budget policies. Parsing from files and environment-variable
//! substitution happen upstream (in the CLI); the engine only ever sees
//! already-parsed, validated data.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// A declarative SLO definition
///
/// Constructed once per evaluation cycle from external configuration and
/// immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SloConfig {
    /// Service the SLO belongs to
    pub service_name: String,

    /// Feature within the service
    pub feature_name: String,

    /// SLO identifier within the feature
    pub slo_name: String,

    /// Human-readable description
    #[serde(default)]
    pub slo_description: String,

    /// Goal compliance ratio, in (0, 1]
    pub slo_target: f64,

    /// Backend selector and measurement parameters
    pub backend: BackendConfig,

    /// Report sinks for this SLO
    #[serde(default)]
    pub exporters: Vec<ExporterConfig>,
}

/// Backend selector for an SLO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Registry key of the backend adapter (e.g. "prometheus")
    pub provider: String,

    /// SLI method name, resolved by the engine against the closed method set
    pub method: String,

    /// Base URL of the provider API, for HTTP backends
    #[serde(default)]
    pub url: Option<String>,

    /// Index to query, for document-store backends
    #[serde(default)]
    pub index: Option<String>,

    /// Timestamp field used for window filtering, for document-store backends
    #[serde(default)]
    pub date_field: Option<String>,

    /// Measurement queries and parameters for the selected method
    #[serde(default)]
    pub measurement: MeasurementConfig,
}

/// Measurement parameters for an SLI method
///
/// Which fields are required depends on the method and the adapter; adapters
/// report missing fields as configuration errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeasurementConfig {
    /// Query counting good events
    #[serde(default)]
    pub query_good: Option<serde_json::Value>,

    /// Query counting bad events (exclusive with `query_valid`)
    #[serde(default)]
    pub query_bad: Option<serde_json::Value>,

    /// Query counting valid events (exclusive with `query_bad`)
    #[serde(default)]
    pub query_valid: Option<serde_json::Value>,

    /// Query returning the SLI value directly
    #[serde(default)]
    pub query: Option<serde_json::Value>,

    /// Fixed good event count, for the in-memory backend
    #[serde(default)]
    pub good_count: Option<f64>,

    /// Fixed bad event count, for the in-memory backend
    #[serde(default)]
    pub bad_count: Option<f64>,

    /// Fixed valid event count, for the in-memory backend
    #[serde(default)]
    pub valid_count: Option<f64>,

    /// Fixed SLI value, for the in-memory backend
    #[serde(default)]
    pub value: Option<f64>,
}

/// Report sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Exporter kind: "json" or "http"
    pub class: String,

    /// Destination file, for the JSON-lines exporter
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Destination URL, for the HTTP exporter
    #[serde(default)]
    pub url: Option<String>,
}

/// An error budget policy: an ordered sequence of evaluation windows
///
/// Loaded once and shared read-only across all SLO evaluations in a run.
/// Steps are evaluated independently; their order is only the presentation
/// order of the resulting reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorBudgetPolicy {
    pub steps: Vec<ErrorBudgetPolicyStep>,
}

/// One window of an error budget policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBudgetPolicyStep {
    /// Step name (e.g. "1 hour", "28 days")
    pub name: String,

    /// Window length in seconds
    pub window_seconds: u64,

    /// Burn rate above which the step is in alert
    pub burn_rate_threshold: f64,

    /// Optional separate threshold for paging, carried into the report
    #[serde(default)]
    pub alerting_burn_rate_threshold: Option<f64>,

    /// Message attached to the report when the step alerts
    #[serde(default)]
    pub message_alert: String,

    /// Message attached to the report when the step is within budget
    #[serde(default)]
    pub message_ok: String,
}

impl SloConfig {
    /// Identity triple joined for logging and batch result keys
    pub fn full_name(&self) -> String {
        format!("{}/{}/{}", self.service_name, self.feature_name, self.slo_name)
    }

    /// Validate structural invariants of the SLO definition
    pub fn validate(&self) -> ConfigResult<()> {
        for (field, value) in [
            ("service_name", &self.service_name),
            ("feature_name", &self.feature_name),
            ("slo_name", &self.slo_name),
            ("backend.provider", &self.backend.provider),
            ("backend.method", &self.backend.method),
        ] {
            if value.is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                });
            }
        }

        if !(self.slo_target > 0.0 && self.slo_target <= 1.0) {
            return Err(ConfigError::TargetOutOfRange {
                target: self.slo_target,
            });
        }

        for exporter in &self.exporters {
            exporter.validate()?;
        }

        Ok(())
    }
}

impl MeasurementConfig {
    /// Get a query field as a string expression (e.g. a PromQL query)
    pub fn query_str(&self, field: &'static str) -> ConfigResult<&str> {
        self.query_field(field)?
            .as_str()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: format!("backend.measurement.{field}"),
                value: "expected a string query".to_string(),
            })
    }

    /// Get a query field as a structured query body (e.g. an ES query)
    pub fn query_body(&self, field: &'static str) -> ConfigResult<&serde_json::Value> {
        self.query_field(field)
    }

    fn query_field(&self, field: &'static str) -> ConfigResult<&serde_json::Value> {
        let value = match field {
            "query_good" => self.query_good.as_ref(),
            "query_bad" => self.query_bad.as_ref(),
            "query_valid" => self.query_valid.as_ref(),
            "query" => self.query.as_ref(),
            _ => None,
        };
        value.ok_or_else(|| ConfigError::MissingField {
            field: format!("backend.measurement.{field}"),
        })
    }
}

impl ExporterConfig {
    /// Validate that the exporter carries the parameters its class needs
    pub fn validate(&self) -> ConfigResult<()> {
        match self.class.as_str() {
            "json" => {
                if self.path.is_none() {
                    return Err(ConfigError::MissingField {
                        field: "exporters.path".to_string(),
                    });
                }
            }
            "http" => {
                if self.url.is_none() {
                    return Err(ConfigError::MissingField {
                        field: "exporters.url".to_string(),
                    });
                }
            }
            other => {
                return Err(ConfigError::UnknownExporter {
                    name: other.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl ErrorBudgetPolicy {
    /// Validate structural invariants of the policy
    pub fn validate(&self) -> ConfigResult<()> {
        if self.steps.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "error budget policy has no steps".to_string(),
            });
        }

        for step in &self.steps {
            if step.name.is_empty() {
                return Err(ConfigError::MissingField {
                    field: "steps.name".to_string(),
                });
            }
            if step.window_seconds == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("steps.{}.window_seconds", step.name),
                    value: "0".to_string(),
                });
            }
            if step.burn_rate_threshold <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("steps.{}.burn_rate_threshold", step.name),
                    value: step.burn_rate_threshold.to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> SloConfig {
        SloConfig {
            service_name: "web".to_string(),
            feature_name: "checkout".to_string(),
            slo_name: "availability".to_string(),
            slo_description: "Checkout availability".to_string(),
            slo_target: 0.99,
            backend: BackendConfig {
                provider: "prometheus".to_string(),
                method: "good_bad_ratio".to_string(),
                url: Some("http://localhost:9090".to_string()),
                index: None,
                date_field: None,
                measurement: MeasurementConfig {
                    query_good: Some(serde_json::json!("sum(rate(http_ok[window]))")),
                    query_bad: Some(serde_json::json!("sum(rate(http_err[window]))")),
                    ..Default::default()
                },
            },
            exporters: Vec::new(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_full_name() {
        assert_eq!(sample_config().full_name(), "web/checkout/availability");
    }

    #[test]
    fn test_target_out_of_range() {
        let mut config = sample_config();
        config.slo_target = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TargetOutOfRange { .. })
        ));

        config.slo_target = 1.2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TargetOutOfRange { .. })
        ));

        // Exactly 1.0 is structurally valid; the computation engine rejects
        // it separately because it leaves no error budget.
        config.slo_target = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_identity_field() {
        let mut config = sample_config();
        config.slo_name = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn test_query_str_accessors() {
        let config = sample_config();
        let measurement = &config.backend.measurement;
        assert!(measurement.query_str("query_good").is_ok());
        assert!(matches!(
            measurement.query_str("query_valid"),
            Err(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn test_policy_parsing_and_validation() {
        let yaml = r#"
- name: 1 hour
  window_seconds: 3600
  burn_rate_threshold: 9.0
  message_alert: "Page the on-call"
  message_ok: "Within budget"
- name: 28 days
  window_seconds: 2419200
  burn_rate_threshold: 1.0
"#;
        let policy: ErrorBudgetPolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.steps.len(), 2);
        assert_eq!(policy.steps[0].name, "1 hour");
        assert_eq!(policy.steps[1].window_seconds, 2419200);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_policy_rejects_zero_window() {
        let policy = ErrorBudgetPolicy {
            steps: vec![ErrorBudgetPolicyStep {
                name: "broken".to_string(),
                window_seconds: 0,
                burn_rate_threshold: 1.0,
                alerting_burn_rate_threshold: None,
                message_alert: String::new(),
                message_ok: String::new(),
            }],
        };
        assert!(matches!(
            policy.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_exporter_validation() {
        let exporter = ExporterConfig {
            class: "json".to_string(),
            path: None,
            url: None,
        };
        assert!(matches!(
            exporter.validate(),
            Err(ConfigError::MissingField { .. })
        ));

        let exporter = ExporterConfig {
            class: "carrier-pigeon".to_string(),
            path: None,
            url: None,
        };
        assert!(matches!(
            exporter.validate(),
            Err(ConfigError::UnknownExporter { .. })
        ));
    }
}
