//! Report computation engine
//!
//! Produces the ordered sequence of [`Report`]s for one SLO evaluated
//! against one error budget policy at one instant, and the batch layer that
//! evaluates many SLO configs independently.
//!
//! Policy steps have no ordering dependency, so they are queried
//! concurrently; report order always follows policy declaration order. A
//! step whose backend query fails yields no report, and does not abort the
//! remaining steps: successful reports are returned alongside per-step
//! failures. Cancelling (dropping) a computation abandons in-flight backend
//! calls and discards all partial state; no report is ever observable
//! half-computed.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, error, info};

use crate::backend::{Measurement, MetricsBackend, SliMethod};
use crate::config::{ErrorBudgetPolicy, ErrorBudgetPolicyStep, SloConfig};
use crate::error::{BackendError, ConfigError, EngineError, Result};
use crate::registry::BackendRegistry;
use crate::report::Report;

/// Caller-tunable evaluation options
#[derive(Debug, Clone, Default)]
pub struct ComputeOptions {
    /// Upper bound for each backend query; a timed-out step fails with a
    /// backend timeout error and yields no report
    pub timeout: Option<Duration>,
}

/// A step whose evaluation failed, with enough context to log and continue
#[derive(Debug)]
pub struct StepFailure {
    /// Name of the failed policy step
    pub step_name: String,

    /// Window of the failed step, in seconds
    pub window_seconds: u64,

    /// What went wrong
    pub error: EngineError,
}

/// Outcome of evaluating one SLO against one policy
#[derive(Debug, Default)]
pub struct SloEvaluation {
    /// Reports for the steps that succeeded, in policy order
    pub reports: Vec<Report>,

    /// Failures for the steps that did not, in policy order
    pub failures: Vec<StepFailure>,
}

impl SloEvaluation {
    /// Whether every policy step produced a report
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Evaluate one SLO against an error budget policy at one instant.
///
/// Fatal errors (unknown SLI method, a target of exactly 1.0) abort the
/// whole SLO before any backend query. Backend failures are step-scoped and
/// collected into [`SloEvaluation::failures`]. Identical inputs with
/// identical adapter responses produce identical reports; the engine never
/// reads the wall clock.
pub async fn compute(
    slo: &SloConfig,
    policy: &ErrorBudgetPolicy,
    timestamp: DateTime<Utc>,
    backend: &dyn MetricsBackend,
    options: &ComputeOptions,
) -> Result<SloEvaluation> {
    let method = SliMethod::parse(&slo.backend.method)?;

    if slo.slo_target == 1.0 {
        return Err(ConfigError::ZeroErrorBudget.into());
    }
    if !(slo.slo_target > 0.0 && slo.slo_target < 1.0) {
        return Err(ConfigError::TargetOutOfRange {
            target: slo.slo_target,
        }
        .into());
    }

    debug!(
        slo = %slo.full_name(),
        method = %method,
        steps = policy.steps.len(),
        "computing SLO reports"
    );

    let step_results = join_all(policy.steps.iter().map(|step| async move {
        let result = evaluate_step(slo, step, method, timestamp, backend, options).await;
        (step, result)
    }))
    .await;

    let mut evaluation = SloEvaluation::default();
    for (step, result) in step_results {
        match result {
            Ok(report) => {
                debug!(
                    slo = %slo.full_name(),
                    step = %step.name,
                    sli = report.sli_measurement,
                    burn_rate = report.burn_rate,
                    alert = report.alert,
                    "step evaluated"
                );
                evaluation.reports.push(report);
            }
            Err(err) => {
                error!(
                    slo = %slo.full_name(),
                    step = %step.name,
                    window_seconds = step.window_seconds,
                    method = %method,
                    error = %err,
                    "step evaluation failed"
                );
                evaluation.failures.push(StepFailure {
                    step_name: step.name.clone(),
                    window_seconds: step.window_seconds,
                    error: err,
                });
            }
        }
    }

    Ok(evaluation)
}

/// Query the backend for one step and assemble its report
async fn evaluate_step(
    slo: &SloConfig,
    step: &ErrorBudgetPolicyStep,
    method: SliMethod,
    timestamp: DateTime<Utc>,
    backend: &dyn MetricsBackend,
    options: &ComputeOptions,
) -> Result<Report> {
    let measurement = query_measurement(slo, step, method, timestamp, backend, options).await?;
    let sli = measurement.sli_value();
    Ok(Report::build(slo, step, timestamp, sli))
}

/// Dispatch the adapter capability for the method, bounded by the timeout
async fn query_measurement(
    slo: &SloConfig,
    step: &ErrorBudgetPolicyStep,
    method: SliMethod,
    timestamp: DateTime<Utc>,
    backend: &dyn MetricsBackend,
    options: &ComputeOptions,
) -> Result<Measurement> {
    let window = step.window_seconds;
    let query = async {
        match method {
            SliMethod::GoodBadRatio => backend.good_bad_ratio(timestamp, window, slo).await,
            SliMethod::DistributionCut => backend.distribution_cut(timestamp, window, slo).await,
            SliMethod::Basic => backend.basic(timestamp, window, slo).await,
            SliMethod::Window => backend.window(timestamp, window, slo).await,
            SliMethod::QuerySli => backend.query_sli(timestamp, window, slo).await,
        }
    };

    match options.timeout {
        Some(timeout) => match tokio::time::timeout(timeout, query).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout {
                provider: backend.name().to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }
            .into()),
        },
        None => query.await,
    }
}

/// Outcome of one SLO config within a batch run
#[derive(Debug)]
pub struct BatchEntry {
    /// Identity triple of the config (`service/feature/slo`)
    pub slo: String,

    /// The evaluation, or the fatal error that aborted this config
    pub outcome: Result<SloEvaluation>,
}

/// Outcome of a batch run over many SLO configs
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// One entry per config, in input order
    pub entries: Vec<BatchEntry>,
}

impl BatchOutcome {
    /// Number of configs that aborted or had failed steps
    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| match &entry.outcome {
                Ok(evaluation) => !evaluation.is_complete(),
                Err(_) => true,
            })
            .count()
    }

    /// Whether every config evaluated every step successfully
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }

    /// All reports across the batch, in input order
    pub fn reports(&self) -> impl Iterator<Item = &Report> {
        self.entries
            .iter()
            .filter_map(|entry| entry.outcome.as_ref().ok())
            .flat_map(|evaluation| evaluation.reports.iter())
    }
}

/// Evaluate many SLO configs against one policy.
///
/// Evaluations are fully independent and run concurrently. A misconfigured
/// or failing SLO never prevents the others from being evaluated; its error
/// is recorded in the batch outcome for end-of-run reporting.
pub async fn compute_batch(
    configs: &[SloConfig],
    policy: &ErrorBudgetPolicy,
    timestamp: DateTime<Utc>,
    registry: &BackendRegistry,
    options: &ComputeOptions,
) -> BatchOutcome {
    let entries = join_all(configs.iter().map(|slo| async move {
        let outcome = match registry.resolve(&slo.backend.provider) {
            Ok(backend) => compute(slo, policy, timestamp, backend.as_ref(), options).await,
            Err(err) => Err(err),
        };
        BatchEntry {
            slo: slo.full_name(),
            outcome,
        }
    }))
    .await;

    let outcome = BatchOutcome { entries };
    info!(
        configs = configs.len(),
        failed = outcome.failed(),
        "batch evaluation finished"
    );
    outcome
}
