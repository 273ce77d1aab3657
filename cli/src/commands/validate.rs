use std::path::PathBuf;

use clap::Args;
use console::style;

use slo_engine::config::{ErrorBudgetPolicy, SloConfig};

use crate::error::{Result, SloctlError};
use crate::loader;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// SLO config file, or directory containing slo_*.yaml files
    #[arg(short = 'f', long)]
    pub slo_config: PathBuf,

    /// Error budget policy file to validate alongside the configs
    #[arg(short = 'b', long)]
    pub error_budget_policy: Option<PathBuf>,
}

pub async fn run(args: ValidateArgs) -> Result<()> {
    let mut failures = 0;

    if let Some(policy_path) = &args.error_budget_policy {
        let result = loader::parse_file::<ErrorBudgetPolicy>(policy_path).and_then(|policy| {
            policy
                .validate()
                .map_err(|err| SloctlError::Engine(err.into()))
        });
        failures += print_result(policy_path, result);
    }

    for path in loader::discover_configs(&args.slo_config)? {
        let result = loader::parse_file::<SloConfig>(&path).and_then(|slo| {
            slo.validate()
                .map_err(|err| SloctlError::Engine(err.into()))
        });
        failures += print_result(&path, result);
    }

    if failures > 0 {
        return Err(SloctlError::BatchFailed { count: failures });
    }
    Ok(())
}

fn print_result(path: &PathBuf, result: Result<()>) -> usize {
    match result {
        Ok(()) => {
            println!("{} {}", style("ok").green(), path.display());
            0
        }
        Err(err) => {
            println!("{} {}: {}", style("invalid").red().bold(), path.display(), err);
            1
        }
    }
}
