//! SLO report computation engine
//!
//! This library computes SLO compliance reports from measurements pulled
//! out of pluggable metrics backends. Given a declarative SLO definition
//! and an error budget policy, it produces one report per policy window
//! describing compliance status, error budget consumption, and burn rate.

pub mod backend;
pub mod backends;
pub mod compute;
pub mod config;
pub mod error;
pub mod exporters;
pub mod metrics;
pub mod provision;
pub mod registry;
pub mod report;

// Re-export commonly used types
pub use backend::{Measurement, MetricsBackend, RemoteSlo, SliMethod, SloId, SloLookup, SloProvisioner};
pub use compute::{compute, compute_batch, BatchOutcome, ComputeOptions, SloEvaluation};
pub use config::{ErrorBudgetPolicy, ErrorBudgetPolicyStep, SloConfig};
pub use error::{BackendError, ConfigError, EngineError, ExporterError, Result};
pub use exporters::Exporter;
pub use metrics::EngineMetrics;
pub use registry::BackendRegistry;
pub use report::Report;
