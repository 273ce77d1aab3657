//! In-memory backend adapter
//!
//! Serves measurements embedded directly in the SLO configuration. Useful
//! for dry runs, config validation, and tests, and doubles as the
//! reference implementation of the remote SLO lifecycle contract with an
//! in-memory definition store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::backend::{
    Measurement, MetricsBackend, RemoteSlo, SloId, SloLookup, SloProvisioner,
};
use crate::config::SloConfig;
use crate::error::{BackendError, ConfigError, Result};

const PROVIDER: &str = "memory";

/// Backend serving fixed measurements from configuration
pub struct MemoryBackend {
    store: RwLock<HashMap<SloId, RemoteSlo>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }

    fn fixed_count(value: Option<f64>, field: &str) -> Result<f64> {
        let count = value.ok_or_else(|| ConfigError::MissingField {
            field: format!("backend.measurement.{field}"),
        })?;
        if count < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: format!("backend.measurement.{field}"),
                value: count.to_string(),
            }
            .into());
        }
        Ok(count)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn good_bad_ratio(
        &self,
        _timestamp: DateTime<Utc>,
        _window_seconds: u64,
        slo: &SloConfig,
    ) -> Result<Measurement> {
        let measurement = &slo.backend.measurement;
        let good = Self::fixed_count(measurement.good_count, "good_count")?;

        if measurement.bad_count.is_some() {
            let bad = Self::fixed_count(measurement.bad_count, "bad_count")?;
            Ok(Measurement::GoodBad { good, bad })
        } else if measurement.valid_count.is_some() {
            let valid = Self::fixed_count(measurement.valid_count, "valid_count")?;
            Ok(Measurement::GoodValid { good, valid })
        } else {
            Err(ConfigError::ValidationFailed {
                reason: "one of backend.measurement.bad_count or valid_count is required"
                    .to_string(),
            }
            .into())
        }
    }

    async fn distribution_cut(
        &self,
        _timestamp: DateTime<Utc>,
        _window_seconds: u64,
        slo: &SloConfig,
    ) -> Result<Measurement> {
        let value = slo.backend.measurement.value.ok_or(ConfigError::MissingField {
            field: "backend.measurement.value".to_string(),
        })?;
        Ok(Measurement::Value(value))
    }

    async fn query_sli(
        &self,
        _timestamp: DateTime<Utc>,
        _window_seconds: u64,
        slo: &SloConfig,
    ) -> Result<Measurement> {
        let value = slo.backend.measurement.value.ok_or(ConfigError::MissingField {
            field: "backend.measurement.value".to_string(),
        })?;
        Ok(Measurement::Value(value))
    }

    fn provisioner(&self) -> Option<&dyn SloProvisioner> {
        Some(self)
    }
}

#[async_trait]
impl SloProvisioner for MemoryBackend {
    async fn get(&self, id: &SloId) -> Result<SloLookup> {
        let store = self.store.read().await;
        Ok(match store.get(id) {
            Some(remote) => SloLookup::Found(remote.clone()),
            None => SloLookup::NotFound,
        })
    }

    async fn create(&self, id: &SloId, slo: &SloConfig) -> Result<RemoteSlo> {
        let remote = RemoteSlo {
            id: id.clone(),
            display_name: slo.full_name(),
            goal: slo.slo_target,
        };
        let mut store = self.store.write().await;
        store.insert(id.clone(), remote.clone());
        Ok(remote)
    }

    async fn update(&self, id: &SloId, slo: &SloConfig) -> Result<RemoteSlo> {
        let mut store = self.store.write().await;
        if !store.contains_key(id) {
            return Err(BackendError::NotFound {
                resource: id.to_string(),
            }
            .into());
        }
        let remote = RemoteSlo {
            id: id.clone(),
            display_name: slo.full_name(),
            goal: slo.slo_target,
        };
        store.insert(id.clone(), remote.clone());
        Ok(remote)
    }

    async fn delete(&self, id: &SloId) -> Result<()> {
        let mut store = self.store.write().await;
        if store.remove(id).is_none() {
            return Err(BackendError::NotFound {
                resource: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn list(&self, service_name: &str) -> Result<Vec<RemoteSlo>> {
        let store = self.store.read().await;
        let mut slos: Vec<_> = store
            .values()
            .filter(|remote| remote.id.service_name == service_name)
            .cloned()
            .collect();
        slos.sort_by(|a, b| {
            (&a.id.feature_name, &a.id.slo_name, a.id.window_seconds).cmp(&(
                &b.id.feature_name,
                &b.id.slo_name,
                b.id.window_seconds,
            ))
        });
        Ok(slos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, MeasurementConfig};
    use chrono::TimeZone;

    fn slo_with_counts(good: Option<f64>, bad: Option<f64>, valid: Option<f64>) -> SloConfig {
        SloConfig {
            service_name: "web".to_string(),
            feature_name: "checkout".to_string(),
            slo_name: "availability".to_string(),
            slo_description: String::new(),
            slo_target: 0.99,
            backend: BackendConfig {
                provider: PROVIDER.to_string(),
                method: "good_bad_ratio".to_string(),
                url: None,
                index: None,
                date_field: None,
                measurement: MeasurementConfig {
                    good_count: good,
                    bad_count: bad,
                    valid_count: valid,
                    ..Default::default()
                },
            },
            exporters: Vec::new(),
        }
    }

    fn eval_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_good_bad_counts() {
        let backend = MemoryBackend::new();
        let slo = slo_with_counts(Some(90.0), Some(10.0), None);
        let measurement = backend.good_bad_ratio(eval_time(), 3600, &slo).await.unwrap();
        assert_eq!(
            measurement,
            Measurement::GoodBad {
                good: 90.0,
                bad: 10.0
            }
        );
    }

    #[tokio::test]
    async fn test_missing_denominator_is_config_error() {
        let backend = MemoryBackend::new();
        let slo = slo_with_counts(Some(90.0), None, None);
        let err = backend
            .good_bad_ratio(eval_time(), 3600, &slo)
            .await
            .unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[tokio::test]
    async fn test_negative_count_rejected() {
        let backend = MemoryBackend::new();
        let slo = slo_with_counts(Some(-1.0), Some(10.0), None);
        assert!(backend.good_bad_ratio(eval_time(), 3600, &slo).await.is_err());
    }

    #[tokio::test]
    async fn test_lifecycle_roundtrip() {
        let backend = MemoryBackend::new();
        let slo = slo_with_counts(Some(1.0), Some(0.0), None);
        let id = SloId::new(&slo, 3600);

        assert_eq!(backend.get(&id).await.unwrap(), SloLookup::NotFound);

        let created = backend.create(&id, &slo).await.unwrap();
        assert_eq!(created.goal, 0.99);
        assert!(matches!(
            backend.get(&id).await.unwrap(),
            SloLookup::Found(_)
        ));

        let listed = backend.list("web").await.unwrap();
        assert_eq!(listed.len(), 1);

        backend.delete(&id).await.unwrap();
        let err = backend.delete(&id).await.unwrap_err();
        assert_eq!(err.category(), "backend");
    }
}
