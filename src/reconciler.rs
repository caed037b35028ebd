//! Reconciler module for ovh-reconciler
//!
//! Runs one reconciliation: parse the desired state, fetch the live zone,
//! diff, apply, and publish the zone if anything changed.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::apply::{apply, ApplyReport, Operation};
use crate::constants::{EXIT_APPLY_FAILED, EXIT_SUCCESS};
use crate::diff::{diff, Plan};
use crate::error::ReconcileError;
use crate::fetch::fetch_snapshot;
use crate::record::{parse_records, Record, RemoteRecord};
use crate::zone_api::ZoneApi;

//==============================================================================
// Helpers
//==============================================================================

/// Redacts secrets from messages before they are logged
///
/// Every non-empty secret is replaced with `***REDACTED***`.
///
/// # Examples
///
/// ```
/// use ovh_reconciler::reconciler::redact_secrets;
///
/// let redacted = redact_secrets("bad signature for ck abc123", &["abc123"]);
/// assert_eq!(redacted, "bad signature for ck ***REDACTED***");
/// ```
#[must_use]
pub fn redact_secrets(message: &str, secrets: &[&str]) -> String {
    secrets
        .iter()
        .filter(|s| !s.is_empty())
        .fold(message.to_string(), |acc, secret| {
            acc.replace(secret, "***REDACTED***")
        })
}

/// Reads the desired-state file
pub async fn read_input(path: &Path) -> Result<String, ReconcileError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ReconcileError::Read {
            path: path.to_path_buf(),
            source,
        })
}

//==============================================================================
// Summary
//==============================================================================

/// Result of a run that got past parsing and fetching
#[derive(Debug)]
pub struct RunSummary {
    pub plan: Plan,
    /// `None` on dry runs
    pub report: Option<ApplyReport>,
    /// Set when publishing the zone after changes failed
    pub refresh_error: Option<String>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.refresh_error.is_none() && self.report.as_ref().map_or(true, ApplyReport::is_success)
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_APPLY_FAILED
        }
    }
}

//==============================================================================
// Reconciler
//==============================================================================

pub struct Reconciler {
    zone: String,
    api: Arc<dyn ZoneApi>,
    /// Redacted from every failure message kept in the summary
    secrets: Vec<Zeroizing<String>>,
}

impl Reconciler {
    pub fn new(zone: &str, api: Arc<dyn ZoneApi>) -> Self {
        Self {
            zone: zone.to_string(),
            api,
            secrets: Vec::new(),
        }
    }

    pub fn with_secrets(mut self, secrets: &[&str]) -> Self {
        self.secrets = secrets
            .iter()
            .map(|s| Zeroizing::new(s.to_string()))
            .collect();
        self
    }

    /// Parses `input`, fetches the zone and computes the plan
    ///
    /// Nothing is mutated; a parse error is reported before the API is called.
    pub async fn plan(&self, input: &str) -> Result<Plan, ReconcileError> {
        let desired: BTreeSet<Record> = parse_records(input, &self.zone)?;
        debug!("Desired state: {} records", desired.len());

        let actual: BTreeSet<RemoteRecord> = fetch_snapshot(self.api.as_ref(), &self.zone).await?;
        debug!("Live state: {} records", actual.len());

        Ok(diff(&desired, &actual))
    }

    /// Runs a full reconciliation
    ///
    /// Returns `Err` only for fatal errors (parse, fetch), in which case the
    /// zone was not touched. Individual apply failures are in the summary.
    pub async fn run(&self, input: &str, dry_run: bool) -> Result<RunSummary, ReconcileError> {
        info!("Reconciling zone {}", self.zone);
        let plan = self.plan(input).await?;
        log_plan(&plan);

        if plan.is_empty() {
            info!("Zone {} is up to date", self.zone);
            return Ok(RunSummary {
                plan,
                report: None,
                refresh_error: None,
            });
        }
        if dry_run {
            info!("Dry run, no changes made");
            return Ok(RunSummary {
                plan,
                report: None,
                refresh_error: None,
            });
        }

        let secrets: Vec<&str> = self.secrets.iter().map(|s| s.as_str()).collect();
        let report = apply(self.api.as_ref(), &self.zone, &plan, &secrets).await;

        let mut refresh_error = None;
        if report.applied() > 0 {
            match self.api.refresh(&self.zone).await {
                Ok(()) => debug!("Zone {} refreshed", self.zone),
                Err(e) => {
                    let message = redact_secrets(&format!("{e:#}"), &secrets);
                    warn!("Failed to refresh zone {}: {}", self.zone, message);
                    refresh_error = Some(message);
                }
            }
        }

        Ok(RunSummary {
            plan,
            report: Some(report),
            refresh_error,
        })
    }
}

fn log_plan(plan: &Plan) {
    info!(
        "Plan: {} to delete, {} to create",
        plan.to_delete.len(),
        plan.to_create.len()
    );
    for remote in &plan.to_delete {
        info!("  {}", Operation::Delete(remote.clone()));
    }
    for record in &plan.to_create {
        info!("  {}", Operation::Create(record.clone()));
    }
}

//==============================================================================
// Tests
//==============================================================================
