//! Account deletion.
//!
//! Purges every user-owned table in schema order, then the profile, inside one
//! store session, and finally removes the login identity. Per-table failures
//! are recorded and skipped. The identity step is the only fatal one; by the
//! time it runs the purge is already committed.

use serde::Serialize;

use crate::db::ownership::{OwnedTable, USER_OWNED_TABLES};
use crate::db::RecordStore;
use crate::error::{AppError, Result};
use crate::identity::IdentityProvider;

/// Outcome of one schema entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Purged { step: OwnedTable, rows: u64 },
    Failed { step: OwnedTable, error: String },
}

/// What a completed deregistration touched
#[derive(Debug, Clone, Default)]
pub struct DeregistrationReport {
    pub steps: Vec<StepOutcome>,
    pub profile_rows: u64,
}

/// A schema entry whose purge did not complete
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedStep {
    pub step: String,
    pub error: String,
}

impl DeregistrationReport {
    pub fn rows_purged(&self) -> u64 {
        self.steps
            .iter()
            .map(|s| match s {
                StepOutcome::Purged { rows, .. } => *rows,
                StepOutcome::Failed { .. } => 0,
            })
            .sum::<u64>()
            + self.profile_rows
    }

    pub fn failed_steps(&self) -> Vec<FailedStep> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                StepOutcome::Failed { step, error } => Some(FailedStep {
                    step: step.label(),
                    error: error.clone(),
                }),
                StepOutcome::Purged { .. } => None,
            })
            .collect()
    }
}

/// Delete a user and everything they own
pub async fn deregister(
    store: &dyn RecordStore,
    identity: &dyn IdentityProvider,
    user_id: &str,
) -> Result<DeregistrationReport> {
    let mut report = DeregistrationReport {
        steps: Vec::with_capacity(USER_OWNED_TABLES.len()),
        profile_rows: 0,
    };

    let mut session = store.begin_purge().await?;

    for step in USER_OWNED_TABLES {
        match session.purge_step(step, user_id).await {
            Ok(rows) => {
                tracing::debug!(user_id = %user_id, step = %step.label(), rows, "Purged");
                report.steps.push(StepOutcome::Purged { step: *step, rows });
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, step = %step.label(), error = %e, "Purge step failed, continuing");
                report.steps.push(StepOutcome::Failed {
                    step: *step,
                    error: e.to_string(),
                });
            }
        }
    }

    report.profile_rows = session.delete_profile(user_id).await?;
    session.commit().await?;

    identity.delete_user(user_id).await.map_err(|e| {
        tracing::error!(
            user_id = %user_id,
            error = %e,
            "Identity deletion failed after user data was purged"
        );
        AppError::Identity(e.to_string())
    })?;

    let failed = report.failed_steps();
    tracing::info!(
        user_id = %user_id,
        rows = report.rows_purged(),
        failed_steps = failed.len(),
        "User deregistered"
    );

    Ok(report)
}
