use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use clap::Args;
use tracing::{error, info, warn};

use slo_engine::compute::{compute_batch, ComputeOptions};
use slo_engine::config::{ErrorBudgetPolicy, SloConfig};
use slo_engine::exporters;
use slo_engine::metrics::EngineMetrics;
use slo_engine::registry::BackendRegistry;

use crate::error::{Result, SloctlError};
use crate::loader;
use crate::output::OutputManager;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// SLO config file, or directory containing slo_*.yaml files
    #[arg(short = 'f', long)]
    pub slo_config: PathBuf,

    /// Error budget policy file
    #[arg(short = 'b', long, default_value = "error_budget_policy.yaml")]
    pub error_budget_policy: PathBuf,

    /// Export reports to the sinks configured in each SLO
    #[arg(short, long)]
    pub export: bool,

    /// Per-query timeout in seconds (0 disables the bound)
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Evaluation timestamp override, unix seconds (defaults to now)
    #[arg(long)]
    pub timestamp: Option<i64>,

    /// Print engine metrics after the run
    #[arg(long)]
    pub metrics: bool,
}

pub async fn run(args: ReportArgs, output: &OutputManager) -> Result<()> {
    let policy: ErrorBudgetPolicy = loader::parse_file(&args.error_budget_policy)?;
    policy
        .validate()
        .map_err(|err| SloctlError::Engine(err.into()))?;

    let paths = loader::discover_configs(&args.slo_config)?;
    let (configs, load_failures) = load_configs(&paths);
    let timestamp = resolve_timestamp(args.timestamp)?;

    let options = ComputeOptions {
        timeout: match args.timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        },
    };
    let registry = BackendRegistry::with_defaults();
    let metrics =
        EngineMetrics::new().map_err(|err| SloctlError::Metrics(err.to_string()))?;

    info!(
        configs = configs.len(),
        steps = policy.steps.len(),
        timestamp = timestamp.timestamp(),
        "computing SLO reports"
    );

    let started = Instant::now();
    let outcome = compute_batch(&configs, &policy, timestamp, &registry, &options).await;
    metrics
        .batch_duration_seconds
        .observe(started.elapsed().as_secs_f64());
    metrics.observe_batch(&outcome);

    let reports: Vec<_> = outcome.reports().cloned().collect();
    output.print_reports(&reports)?;
    output.print_batch_summary(&outcome);
    output.print_failures(&outcome);

    let export_failures = if args.export {
        export_reports(&configs, &outcome).await
    } else {
        0
    };

    if args.metrics {
        println!(
            "{}",
            metrics
                .render()
                .map_err(|err| SloctlError::Metrics(err.to_string()))?
        );
    }

    let failed = outcome.failed() + load_failures + export_failures;
    if failed > 0 {
        return Err(SloctlError::BatchFailed { count: failed });
    }
    Ok(())
}

/// Parse and validate each config, isolating per-file failures so one
/// broken file never blocks the rest of the batch
fn load_configs(paths: &[PathBuf]) -> (Vec<SloConfig>, usize) {
    let mut configs = Vec::with_capacity(paths.len());
    let mut failures = 0;
    for path in paths {
        let loaded = loader::parse_file::<SloConfig>(path).and_then(|slo| {
            slo.validate()
                .map_err(|err| SloctlError::Engine(err.into()))?;
            Ok(slo)
        });
        match loaded {
            Ok(slo) => configs.push(slo),
            Err(err) => {
                failures += 1;
                error!(path = %path.display(), error = %err, "failed to load SLO config");
            }
        }
    }
    (configs, failures)
}

fn resolve_timestamp(override_secs: Option<i64>) -> Result<DateTime<Utc>> {
    match override_secs {
        Some(secs) => Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or(SloctlError::InvalidTimestamp { value: secs }),
        None => Ok(Utc::now()),
    }
}

/// Push each config's reports to its configured sinks
async fn export_reports(configs: &[SloConfig], outcome: &slo_engine::BatchOutcome) -> usize {
    let mut failures = 0;
    for (slo, entry) in configs.iter().zip(&outcome.entries) {
        let Ok(evaluation) = &entry.outcome else {
            continue;
        };
        if evaluation.reports.is_empty() {
            continue;
        }
        if slo.exporters.is_empty() {
            warn!(slo = %entry.slo, "export requested but no exporters configured");
            continue;
        }
        for exporter_config in &slo.exporters {
            let result = match exporters::build(exporter_config) {
                Ok(exporter) => exporter
                    .export(&evaluation.reports)
                    .await
                    .map_err(slo_engine::EngineError::from),
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                failures += 1;
                error!(
                    slo = %entry.slo,
                    exporter = %exporter_config.class,
                    error = %err,
                    "report export failed"
                );
            }
        }
    }
    failures
}
