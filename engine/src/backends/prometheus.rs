//! Prometheus backend adapter
//!
//! Queries the Prometheus HTTP API (`/api/v1/query`) with instant queries
//! evaluated at the report timestamp. Query expressions come from the SLO
//! configuration; the `[window]` placeholder in an expression is replaced
//! with the policy step's window (e.g. `[3600s]`) before the query is sent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::backend::{Measurement, MetricsBackend};
use crate::config::SloConfig;
use crate::error::{BackendError, ConfigError, Result};

const PROVIDER: &str = "prometheus";

/// Adapter for the Prometheus HTTP API
pub struct PrometheusBackend {
    client: reqwest::Client,
}

/// Response envelope of the Prometheus query API
#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

impl PrometheusBackend {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Substitute the step window into a query expression
    fn fmt_query(expression: &str, window_seconds: u64) -> String {
        expression.replace("[window]", &format!("[{window_seconds}s]"))
    }

    fn base_url(slo: &SloConfig) -> Result<&str> {
        slo.backend
            .url
            .as_deref()
            .ok_or_else(|| {
                ConfigError::MissingField {
                    field: "backend.url".to_string(),
                }
                .into()
            })
    }

    /// Run one instant query and sum the values of the resulting series
    async fn query_sum(
        &self,
        base_url: &str,
        expression: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<f64> {
        let data = self.instant_query(base_url, expression, timestamp).await?;
        let samples = Self::sample_values(&data)?;
        Ok(samples.iter().sum())
    }

    /// Run one instant query expecting a single value
    async fn query_scalar(
        &self,
        base_url: &str,
        expression: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<f64> {
        let data = self.instant_query(base_url, expression, timestamp).await?;
        let samples = Self::sample_values(&data)?;
        samples.first().copied().ok_or_else(|| {
            BackendError::MalformedResponse {
                provider: PROVIDER.to_string(),
                reason: format!("query returned no samples: {expression}"),
            }
            .into()
        })
    }

    async fn instant_query(
        &self,
        base_url: &str,
        expression: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<serde_json::Value> {
        let endpoint = format!("{}/api/v1/query", base_url.trim_end_matches('/'));
        debug!(query = expression, time = timestamp.timestamp(), "prometheus instant query");

        let time = timestamp.timestamp().to_string();
        let response: ApiResponse = self
            .client
            .get(&endpoint)
            .query(&[("query", expression), ("time", time.as_str())])
            .send()
            .await
            .map_err(BackendError::Http)?
            .error_for_status()
            .map_err(BackendError::Http)?
            .json()
            .await
            .map_err(BackendError::Http)?;

        if response.status != "success" {
            return Err(BackendError::QueryRejected {
                provider: PROVIDER.to_string(),
                reason: response
                    .error
                    .unwrap_or_else(|| "unspecified query error".to_string()),
            }
            .into());
        }

        Ok(response.data)
    }

    /// Extract sample values from the `data` section of a query response.
    ///
    /// Handles both instant vectors (a list of series, each with a
    /// `[timestamp, "value"]` pair) and scalar results.
    fn sample_values(data: &serde_json::Value) -> Result<Vec<f64>> {
        let malformed = |reason: &str| -> crate::error::EngineError {
            BackendError::MalformedResponse {
                provider: PROVIDER.to_string(),
                reason: reason.to_string(),
            }
            .into()
        };

        let result_type = data
            .get("resultType")
            .and_then(|v| v.as_str())
            .ok_or_else(|| malformed("missing resultType"))?;

        let parse_pair = |pair: &serde_json::Value| -> Result<f64> {
            pair.get(1)
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or_else(|| malformed("sample value is not a float string"))
        };

        match result_type {
            "vector" => {
                let series = data
                    .get("result")
                    .and_then(|v| v.as_array())
                    .ok_or_else(|| malformed("vector result is not a list"))?;
                let mut values = Vec::with_capacity(series.len());
                for entry in series {
                    let pair = entry
                        .get("value")
                        .ok_or_else(|| malformed("series entry has no value"))?;
                    values.push(parse_pair(pair)?);
                }
                Ok(values)
            }
            "scalar" => {
                let pair = data
                    .get("result")
                    .ok_or_else(|| malformed("scalar result is missing"))?;
                Ok(vec![parse_pair(pair)?])
            }
            other => Err(malformed(&format!("unexpected resultType {other}"))),
        }
    }
}

impl Default for PrometheusBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsBackend for PrometheusBackend {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn good_bad_ratio(
        &self,
        timestamp: DateTime<Utc>,
        window_seconds: u64,
        slo: &SloConfig,
    ) -> Result<Measurement> {
        let base_url = Self::base_url(slo)?;
        let measurement = &slo.backend.measurement;

        let query_good = Self::fmt_query(measurement.query_str("query_good")?, window_seconds);
        let good = self.query_sum(base_url, &query_good, timestamp).await?;

        // Exactly one of query_bad / query_valid drives the denominator;
        // query_bad wins when both are configured.
        if measurement.query_bad.is_some() {
            let query_bad = Self::fmt_query(measurement.query_str("query_bad")?, window_seconds);
            let bad = self.query_sum(base_url, &query_bad, timestamp).await?;
            Ok(Measurement::GoodBad { good, bad })
        } else if measurement.query_valid.is_some() {
            let query_valid =
                Self::fmt_query(measurement.query_str("query_valid")?, window_seconds);
            let valid = self.query_sum(base_url, &query_valid, timestamp).await?;
            Ok(Measurement::GoodValid { good, valid })
        } else {
            Err(ConfigError::ValidationFailed {
                reason: "one of backend.measurement.query_bad or query_valid is required"
                    .to_string(),
            }
            .into())
        }
    }

    async fn distribution_cut(
        &self,
        timestamp: DateTime<Utc>,
        window_seconds: u64,
        slo: &SloConfig,
    ) -> Result<Measurement> {
        let base_url = Self::base_url(slo)?;
        let measurement = &slo.backend.measurement;

        let query_good = Self::fmt_query(measurement.query_str("query_good")?, window_seconds);
        let query_valid = Self::fmt_query(measurement.query_str("query_valid")?, window_seconds);

        let good = self.query_sum(base_url, &query_good, timestamp).await?;
        let valid = self.query_sum(base_url, &query_valid, timestamp).await?;
        Ok(Measurement::GoodValid { good, valid })
    }

    async fn query_sli(
        &self,
        timestamp: DateTime<Utc>,
        window_seconds: u64,
        slo: &SloConfig,
    ) -> Result<Measurement> {
        let base_url = Self::base_url(slo)?;
        let expression = Self::fmt_query(
            slo.backend.measurement.query_str("query")?,
            window_seconds,
        );
        let value = self.query_scalar(base_url, &expression, timestamp).await?;
        Ok(Measurement::Value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_query_window_substitution() {
        let query = "sum(increase(http_requests_total{code=~\"5..\"}[window]))";
        assert_eq!(
            PrometheusBackend::fmt_query(query, 3600),
            "sum(increase(http_requests_total{code=~\"5..\"}[3600s]))"
        );
    }

    #[test]
    fn test_fmt_query_without_placeholder() {
        assert_eq!(PrometheusBackend::fmt_query("up", 60), "up");
    }

    #[test]
    fn test_sample_values_vector() {
        let data: serde_json::Value = serde_json::from_str(
            r#"{
                "resultType": "vector",
                "result": [
                    {"metric": {"job": "api"}, "value": [1705320000, "90"]},
                    {"metric": {"job": "web"}, "value": [1705320000, "10.5"]}
                ]
            }"#,
        )
        .unwrap();
        let values = PrometheusBackend::sample_values(&data).unwrap();
        assert_eq!(values, vec![90.0, 10.5]);
    }

    #[test]
    fn test_sample_values_scalar() {
        let data: serde_json::Value = serde_json::from_str(
            r#"{"resultType": "scalar", "result": [1705320000, "0.997"]}"#,
        )
        .unwrap();
        let values = PrometheusBackend::sample_values(&data).unwrap();
        assert_eq!(values, vec![0.997]);
    }

    #[test]
    fn test_sample_values_rejects_matrix() {
        let data: serde_json::Value =
            serde_json::from_str(r#"{"resultType": "matrix", "result": []}"#).unwrap();
        assert!(PrometheusBackend::sample_values(&data).is_err());
    }

    #[test]
    fn test_sample_values_empty_vector() {
        let data: serde_json::Value =
            serde_json::from_str(r#"{"resultType": "vector", "result": []}"#).unwrap();
        let values = PrometheusBackend::sample_values(&data).unwrap();
        assert!(values.is_empty());
    }
}
