//! Elasticsearch backend adapter
//!
//! Counts good and bad events with the `_count` API. The SLO configuration
//! supplies the query clause for each event class; the adapter wraps it in
//! a bool query with a time-range filter covering the policy window before
//! sending it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::backend::{Measurement, MetricsBackend};
use crate::config::SloConfig;
use crate::error::{BackendError, ConfigError, Result};

const PROVIDER: &str = "elasticsearch";
const DEFAULT_DATE_FIELD: &str = "@timestamp";

/// Adapter for the Elasticsearch `_count` API
pub struct ElasticsearchBackend {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: f64,
}

impl ElasticsearchBackend {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn base_url(slo: &SloConfig) -> Result<&str> {
        slo.backend.url.as_deref().ok_or_else(|| {
            ConfigError::MissingField {
                field: "backend.url".to_string(),
            }
            .into()
        })
    }

    fn index(slo: &SloConfig) -> Result<&str> {
        slo.backend.index.as_deref().ok_or_else(|| {
            ConfigError::MissingField {
                field: "backend.index".to_string(),
            }
            .into()
        })
    }

    /// Wrap a configured query clause in a bool query with the window's
    /// time-range filter
    fn build_query(
        clause: &serde_json::Value,
        date_field: &str,
        timestamp: DateTime<Utc>,
        window_seconds: u64,
    ) -> serde_json::Value {
        let end = timestamp.timestamp();
        let start = end - window_seconds as i64;
        let mut range = serde_json::Map::new();
        range.insert(
            date_field.to_string(),
            serde_json::json!({
                "gte": start,
                "lt": end,
                "format": "epoch_second"
            }),
        );
        serde_json::json!({
            "query": {
                "bool": {
                    "must": clause,
                    "filter": { "range": range }
                }
            }
        })
    }

    async fn count(
        &self,
        slo: &SloConfig,
        clause: &serde_json::Value,
        timestamp: DateTime<Utc>,
        window_seconds: u64,
    ) -> Result<f64> {
        let base_url = Self::base_url(slo)?;
        let index = Self::index(slo)?;
        let date_field = slo
            .backend
            .date_field
            .as_deref()
            .unwrap_or(DEFAULT_DATE_FIELD);

        let endpoint = format!("{}/{}/_count", base_url.trim_end_matches('/'), index);
        let body = Self::build_query(clause, date_field, timestamp, window_seconds);
        debug!(index, window_seconds, "elasticsearch count query");

        let response: CountResponse = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(BackendError::Http)?
            .error_for_status()
            .map_err(BackendError::Http)?
            .json()
            .await
            .map_err(BackendError::Http)?;

        Ok(response.count)
    }
}

impl Default for ElasticsearchBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsBackend for ElasticsearchBackend {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn good_bad_ratio(
        &self,
        timestamp: DateTime<Utc>,
        window_seconds: u64,
        slo: &SloConfig,
    ) -> Result<Measurement> {
        let measurement = &slo.backend.measurement;
        let good_clause = measurement.query_body("query_good")?;
        let good = self
            .count(slo, good_clause, timestamp, window_seconds)
            .await?;

        if let Some(bad_clause) = &measurement.query_bad {
            let bad = self.count(slo, bad_clause, timestamp, window_seconds).await?;
            Ok(Measurement::GoodBad { good, bad })
        } else if let Some(valid_clause) = &measurement.query_valid {
            let valid = self
                .count(slo, valid_clause, timestamp, window_seconds)
                .await?;
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
        let measurement = &slo.backend.measurement;
        let good = self
            .count(
                slo,
                measurement.query_body("query_good")?,
                timestamp,
                window_seconds,
            )
            .await?;
        let valid = self
            .count(
                slo,
                measurement.query_body("query_valid")?,
                timestamp,
                window_seconds,
            )
            .await?;
        Ok(Measurement::GoodValid { good, valid })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_build_query_injects_range_filter() {
        let clause = serde_json::json!({"term": {"status": "error"}});
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let query = ElasticsearchBackend::build_query(&clause, "@timestamp", timestamp, 3600);

        assert_eq!(query["query"]["bool"]["must"], clause);
        let range = &query["query"]["bool"]["filter"]["range"]["@timestamp"];
        assert_eq!(range["lt"], timestamp.timestamp());
        assert_eq!(range["gte"], timestamp.timestamp() - 3600);
        assert_eq!(range["format"], "epoch_second");
    }

    #[test]
    fn test_build_query_custom_date_field() {
        let clause = serde_json::json!({"match_all": {}});
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let query = ElasticsearchBackend::build_query(&clause, "event.ingested", timestamp, 60);
        assert!(query["query"]["bool"]["filter"]["range"]["event.ingested"].is_object());
    }

    #[test]
    fn test_count_response_parsing() {
        let response: CountResponse =
            serde_json::from_str(r#"{"count": 1234, "_shards": {"total": 1}}"#).unwrap();
        assert_eq!(response.count, 1234.0);
    }
}
