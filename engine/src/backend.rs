//! Backend adapter contract
//!
//! A metrics backend is the capability set the report computation engine
//! queries: one method per SLI measurement method, each taking the
//! evaluation instant, a window length, and the SLO configuration, and
//! returning a [`Measurement`]. Adapters implement only the capabilities
//! their provider supports; the default bodies report the method as
//! unsupported.
//!
//! Backends that host SLO definitions remotely additionally expose a
//! [`SloProvisioner`], keyed by the SLO identity triple plus window so the
//! engine's provisioning and delete paths route correctly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SloConfig;
use crate::error::{EngineError, Result};

/// The closed set of SLI measurement methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliMethod {
    /// Two event counters, good and bad (or good and valid)
    GoodBadRatio,
    /// Share of a distribution below a threshold
    DistributionCut,
    /// Provider-assisted SLI for well-known service types
    Basic,
    /// Provider-assisted window-based SLI
    Window,
    /// A query whose scalar result is the SLI
    QuerySli,
}

impl SliMethod {
    /// Resolve a method name from configuration.
    ///
    /// Unknown names surface as [`EngineError::UnsupportedMethod`], fatal for
    /// the affected SLO only.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "good_bad_ratio" => Ok(SliMethod::GoodBadRatio),
            "distribution_cut" => Ok(SliMethod::DistributionCut),
            "basic" => Ok(SliMethod::Basic),
            "window" => Ok(SliMethod::Window),
            "query_sli" => Ok(SliMethod::QuerySli),
            other => Err(EngineError::UnsupportedMethod {
                method: other.to_string(),
            }),
        }
    }

    /// Method name as it appears in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            SliMethod::GoodBadRatio => "good_bad_ratio",
            SliMethod::DistributionCut => "distribution_cut",
            SliMethod::Basic => "basic",
            SliMethod::Window => "window",
            SliMethod::QuerySli => "query_sli",
        }
    }
}

impl std::fmt::Display for SliMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time measurement returned by a backend adapter
///
/// Transient: produced per window per evaluation, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// Raw good and bad event counts
    GoodBad { good: f64, bad: f64 },

    /// Raw good and valid event counts
    GoodValid { good: f64, valid: f64 },

    /// A directly measured SLI value
    Value(f64),
}

impl Measurement {
    /// Derive the SLI value from this measurement.
    ///
    /// Zero-traffic windows (all counts zero) are fully compliant: an SLI of
    /// exactly 1.0. This is a deliberate policy, not an artifact of the
    /// division guard.
    pub fn sli_value(&self) -> f64 {
        match *self {
            Measurement::GoodBad { good, bad } => {
                let total = good + bad;
                if total == 0.0 {
                    1.0
                } else {
                    good / total
                }
            }
            Measurement::GoodValid { good, valid } => {
                if valid == 0.0 {
                    1.0
                } else {
                    good / valid
                }
            }
            Measurement::Value(value) => value,
        }
    }
}

/// Capability contract implemented by every metrics-query backend
///
/// Each capability takes the evaluation instant, the window length in
/// seconds, and the SLO configuration. Adapters fail with a backend error
/// when the provider is unreachable or rejects the query, and with a
/// configuration error when required measurement fields are missing. The
/// engine never retries; retry policy belongs to the caller.
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    /// Registry key and logging name of this adapter
    fn name(&self) -> &'static str;

    /// Query good and bad (or good and valid) event counters
    async fn good_bad_ratio(
        &self,
        timestamp: DateTime<Utc>,
        window_seconds: u64,
        slo: &SloConfig,
    ) -> Result<Measurement> {
        let _ = (timestamp, window_seconds, slo);
        Err(EngineError::UnsupportedMethod {
            method: SliMethod::GoodBadRatio.as_str().to_string(),
        })
    }

    /// Measure the share of a distribution below a configured threshold
    async fn distribution_cut(
        &self,
        timestamp: DateTime<Utc>,
        window_seconds: u64,
        slo: &SloConfig,
    ) -> Result<Measurement> {
        let _ = (timestamp, window_seconds, slo);
        Err(EngineError::UnsupportedMethod {
            method: SliMethod::DistributionCut.as_str().to_string(),
        })
    }

    /// Provider-assisted SLI for well-known service types
    async fn basic(
        &self,
        timestamp: DateTime<Utc>,
        window_seconds: u64,
        slo: &SloConfig,
    ) -> Result<Measurement> {
        let _ = (timestamp, window_seconds, slo);
        Err(EngineError::UnsupportedMethod {
            method: SliMethod::Basic.as_str().to_string(),
        })
    }

    /// Provider-assisted window-based SLI
    async fn window(
        &self,
        timestamp: DateTime<Utc>,
        window_seconds: u64,
        slo: &SloConfig,
    ) -> Result<Measurement> {
        let _ = (timestamp, window_seconds, slo);
        Err(EngineError::UnsupportedMethod {
            method: SliMethod::Window.as_str().to_string(),
        })
    }

    /// Run a query whose scalar result is the SLI
    async fn query_sli(
        &self,
        timestamp: DateTime<Utc>,
        window_seconds: u64,
        slo: &SloConfig,
    ) -> Result<Measurement> {
        let _ = (timestamp, window_seconds, slo);
        Err(EngineError::UnsupportedMethod {
            method: SliMethod::QuerySli.as_str().to_string(),
        })
    }

    /// Remote SLO lifecycle operations, for providers that host definitions
    fn provisioner(&self) -> Option<&dyn SloProvisioner> {
        None
    }
}

/// Identity of a remotely hosted SLO definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SloId {
    pub service_name: String,
    pub feature_name: String,
    pub slo_name: String,
    pub window_seconds: u64,
}

impl SloId {
    /// Build the identity for one policy window of an SLO
    pub fn new(slo: &SloConfig, window_seconds: u64) -> Self {
        Self {
            service_name: slo.service_name.clone(),
            feature_name: slo.feature_name.clone(),
            slo_name: slo.slo_name.clone(),
            window_seconds,
        }
    }
}

impl std::fmt::Display for SloId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}:{}s",
            self.service_name, self.feature_name, self.slo_name, self.window_seconds
        )
    }
}

/// A remotely hosted SLO definition as seen through the adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSlo {
    /// Identity of the hosted definition
    pub id: SloId,

    /// Display name on the provider side
    pub display_name: String,

    /// Compliance goal of the hosted definition
    pub goal: f64,
}

/// Outcome of a remote SLO lookup
///
/// An absent definition is an expected state the engine branches on, not an
/// error to catch.
#[derive(Debug, Clone, PartialEq)]
pub enum SloLookup {
    Found(RemoteSlo),
    NotFound,
}

/// Lifecycle operations for provider-hosted SLO definitions
#[async_trait]
pub trait SloProvisioner: Send + Sync {
    /// Look up a hosted definition by identity
    async fn get(&self, id: &SloId) -> Result<SloLookup>;

    /// Create a hosted definition for one policy window
    async fn create(&self, id: &SloId, slo: &SloConfig) -> Result<RemoteSlo>;

    /// Replace a hosted definition that drifted from configuration
    async fn update(&self, id: &SloId, slo: &SloConfig) -> Result<RemoteSlo>;

    /// Delete a hosted definition; absent definitions surface as not-found
    async fn delete(&self, id: &SloId) -> Result<()>;

    /// List hosted definitions for a service
    async fn list(&self, service_name: &str) -> Result<Vec<RemoteSlo>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!(
            SliMethod::parse("good_bad_ratio").unwrap(),
            SliMethod::GoodBadRatio
        );
        assert_eq!(SliMethod::parse("query_sli").unwrap(), SliMethod::QuerySli);

        let err = SliMethod::parse("foo").unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnsupportedMethod { ref method } if method == "foo"
        ));
    }

    #[test]
    fn test_sli_from_good_bad() {
        let m = Measurement::GoodBad {
            good: 90.0,
            bad: 10.0,
        };
        assert!((m.sli_value() - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sli_from_good_valid() {
        let m = Measurement::GoodValid {
            good: 45.0,
            valid: 50.0,
        };
        assert!((m.sli_value() - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_traffic_is_compliant() {
        let m = Measurement::GoodBad { good: 0.0, bad: 0.0 };
        assert_eq!(m.sli_value(), 1.0);

        let m = Measurement::GoodValid {
            good: 0.0,
            valid: 0.0,
        };
        assert_eq!(m.sli_value(), 1.0);
    }

    #[test]
    fn test_direct_value_passthrough() {
        // Some distribution methods legitimately exceed 1.0; the measurement
        // does not clamp.
        let m = Measurement::Value(1.07);
        assert_eq!(m.sli_value(), 1.07);
    }
}
