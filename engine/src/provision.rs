//! Provisioning of provider-hosted SLO definitions
//!
//! Some backends host SLO definitions remotely. Before such a backend can
//! measure anything, the definition for each policy window must exist on
//! the provider side. Lookups return an explicit found/not-found variant
//! and the engine branches on it; an absent definition is an expected
//! state, not an error to catch.

use tracing::{info, warn};

use crate::backend::{MetricsBackend, RemoteSlo, SloId, SloLookup, SloProvisioner};
use crate::config::{ErrorBudgetPolicy, SloConfig};
use crate::error::{BackendError, ConfigError, EngineError, Result};

/// Outcome of a delete pass over a policy's windows
#[derive(Debug, Default)]
pub struct DeleteOutcome {
    /// Definitions that were deleted
    pub deleted: Vec<SloId>,

    /// Definitions that were already absent
    pub missing: Vec<SloId>,
}

/// Ensure a hosted definition exists for every policy window.
///
/// Absent definitions are created; definitions whose goal or display name
/// drifted from configuration are updated in place.
pub async fn provision(
    slo: &SloConfig,
    policy: &ErrorBudgetPolicy,
    backend: &dyn MetricsBackend,
) -> Result<Vec<RemoteSlo>> {
    let provisioner = require_provisioner(backend)?;
    let mut provisioned = Vec::with_capacity(policy.steps.len());

    for step in &policy.steps {
        let id = SloId::new(slo, step.window_seconds);
        let remote = match provisioner.get(&id).await? {
            SloLookup::NotFound => {
                info!(id = %id, "remote SLO not found, creating");
                provisioner.create(&id, slo).await?
            }
            SloLookup::Found(remote) if drifted(&remote, slo) => {
                info!(id = %id, "remote SLO drifted from configuration, updating");
                provisioner.update(&id, slo).await?
            }
            SloLookup::Found(remote) => remote,
        };
        provisioned.push(remote);
    }

    Ok(provisioned)
}

/// Delete the hosted definition for every policy window.
///
/// Windows that were already absent are reported separately rather than
/// aborting the pass.
pub async fn delete(
    slo: &SloConfig,
    policy: &ErrorBudgetPolicy,
    backend: &dyn MetricsBackend,
) -> Result<DeleteOutcome> {
    let provisioner = require_provisioner(backend)?;
    let mut outcome = DeleteOutcome::default();

    for step in &policy.steps {
        let id = SloId::new(slo, step.window_seconds);
        match provisioner.delete(&id).await {
            Ok(()) => {
                info!(id = %id, "remote SLO deleted");
                outcome.deleted.push(id);
            }
            Err(EngineError::Backend(BackendError::NotFound { .. })) => {
                warn!(id = %id, "remote SLO already absent");
                outcome.missing.push(id);
            }
            Err(err) => return Err(err),
        }
    }

    Ok(outcome)
}

fn require_provisioner(backend: &dyn MetricsBackend) -> Result<&dyn SloProvisioner> {
    backend.provisioner().ok_or_else(|| {
        ConfigError::NotProvisionable {
            name: backend.name().to_string(),
        }
        .into()
    })
}

fn drifted(remote: &RemoteSlo, slo: &SloConfig) -> bool {
    remote.goal != slo.slo_target || remote.display_name != slo.full_name()
}
