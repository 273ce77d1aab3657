use std::path::PathBuf;

use clap::Args;
use tracing::error;

use slo_engine::config::ErrorBudgetPolicy;
use slo_engine::provision;
use slo_engine::registry::BackendRegistry;
use slo_engine::SloConfig;

use crate::error::{Result, SloctlError};
use crate::loader;
use crate::output::OutputManager;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// SLO config file, or directory containing slo_*.yaml files
    #[arg(short = 'f', long)]
    pub slo_config: PathBuf,

    /// Error budget policy file naming the windows to delete
    #[arg(short = 'b', long, default_value = "error_budget_policy.yaml")]
    pub error_budget_policy: PathBuf,
}

/// Delete provider-hosted SLO definitions for every policy window.
///
/// Only meaningful for backends that host definitions remotely; per-config
/// failures are isolated like any batch operation.
pub async fn run(args: DeleteArgs, output: &OutputManager) -> Result<()> {
    let policy: ErrorBudgetPolicy = loader::parse_file(&args.error_budget_policy)?;
    policy
        .validate()
        .map_err(|err| SloctlError::Engine(err.into()))?;

    let registry = BackendRegistry::with_defaults();
    let mut failures = 0;

    for path in loader::discover_configs(&args.slo_config)? {
        let outcome = delete_one(&path, &policy, &registry).await;
        match outcome {
            Ok((slo_name, deleted, missing)) => {
                output.print_delete_outcome(&slo_name, deleted, missing);
            }
            Err(err) => {
                failures += 1;
                error!(path = %path.display(), error = %err, "delete failed");
            }
        }
    }

    if failures > 0 {
        return Err(SloctlError::BatchFailed { count: failures });
    }
    Ok(())
}

async fn delete_one(
    path: &PathBuf,
    policy: &ErrorBudgetPolicy,
    registry: &BackendRegistry,
) -> Result<(String, usize, usize)> {
    let slo: SloConfig = loader::parse_file(path)?;
    slo.validate()
        .map_err(|err| SloctlError::Engine(err.into()))?;

    let backend = registry.resolve(&slo.backend.provider)?;
    let outcome = provision::delete(&slo, policy, backend.as_ref()).await?;
    Ok((slo.full_name(), outcome.deleted.len(), outcome.missing.len()))
}
