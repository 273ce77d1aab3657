//! Runtime metrics for the report computation engine
//!
//! Counters and timings describing an evaluation run, registered in a
//! prometheus registry. The collector is an explicit handle created per
//! run and passed where it is needed; there is no process-wide singleton.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder};

use crate::compute::BatchOutcome;

/// Metrics collector for one evaluation run
pub struct EngineMetrics {
    registry: Registry,

    /// SLO evaluations attempted
    pub evaluations_total: IntCounter,

    /// SLO evaluations that aborted or had failed steps
    pub evaluation_failures_total: IntCounter,

    /// Policy steps that failed to produce a report
    pub step_failures_total: IntCounter,

    /// Reports produced
    pub reports_total: IntCounter,

    /// Wall-clock duration of whole batch evaluations, in seconds
    pub batch_duration_seconds: Histogram,
}

impl EngineMetrics {
    /// Create a collector with all metrics registered
    pub fn new() -> std::result::Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let evaluations_total = IntCounter::with_opts(Opts::new(
            "slo_evaluations_total",
            "SLO evaluations attempted",
        ))?;
        let evaluation_failures_total = IntCounter::with_opts(Opts::new(
            "slo_evaluation_failures_total",
            "SLO evaluations that aborted or had failed steps",
        ))?;
        let step_failures_total = IntCounter::with_opts(Opts::new(
            "slo_step_failures_total",
            "Policy steps that failed to produce a report",
        ))?;
        let reports_total =
            IntCounter::with_opts(Opts::new("slo_reports_total", "Reports produced"))?;
        let batch_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "slo_batch_duration_seconds",
            "Wall-clock duration of batch evaluations",
        ))?;

        registry.register(Box::new(evaluations_total.clone()))?;
        registry.register(Box::new(evaluation_failures_total.clone()))?;
        registry.register(Box::new(step_failures_total.clone()))?;
        registry.register(Box::new(reports_total.clone()))?;
        registry.register(Box::new(batch_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            evaluations_total,
            evaluation_failures_total,
            step_failures_total,
            reports_total,
            batch_duration_seconds,
        })
    }

    /// Record the outcome of a batch evaluation
    pub fn observe_batch(&self, outcome: &BatchOutcome) {
        for entry in &outcome.entries {
            self.evaluations_total.inc();
            match &entry.outcome {
                Ok(evaluation) => {
                    self.reports_total.inc_by(evaluation.reports.len() as u64);
                    self.step_failures_total
                        .inc_by(evaluation.failures.len() as u64);
                    if !evaluation.is_complete() {
                        self.evaluation_failures_total.inc();
                    }
                }
                Err(_) => self.evaluation_failures_total.inc(),
            }
        }
    }

    /// Render the registry in the prometheus text exposition format
    pub fn render(&self) -> std::result::Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
