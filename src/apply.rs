//! Apply engine
//!
//! Executes a [`Plan`] against the zone: every delete, then every create,
//! one call at a time. A failed call is recorded and the batch goes on;
//! nothing already applied is rolled back.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::diff::Plan;
use crate::error::ApplyError;
use crate::reconciler::redact_secrets;
use crate::record::{Record, RemoteRecord};
use crate::zone_api::{NewRecord, ZoneApi};

//==============================================================================
// Types
//==============================================================================

/// A planned mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Delete(RemoteRecord),
    Create(Record),
}

impl Operation {
    pub fn record(&self) -> &Record {
        match self {
            Self::Delete(remote) => &remote.record,
            Self::Create(record) => record,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::Delete(_) => "delete",
            Self::Create(_) => "create",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete(remote) => write!(f, "- {remote}"),
            Self::Create(record) => write!(f, "+ {record}"),
        }
    }
}

/// Final state of one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created { record: Record, id: u64 },
    Deleted(RemoteRecord),
    Failed { operation: Operation, error: ApplyError },
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Per-record results of an apply run
#[derive(Debug, Clone)]
pub struct ApplyReport {
    /// Outcomes in execution order (deletes first)
    pub outcomes: Vec<Outcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ApplyReport {
    pub fn created(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Created { .. }))
            .count()
    }

    pub fn deleted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Deleted(_)))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Operation, &ApplyError)> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Failed { operation, error } => Some((operation, error)),
            _ => None,
        })
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    /// Number of mutations the provider accepted
    pub fn applied(&self) -> usize {
        self.created() + self.deleted()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Wall-clock time spent talking to the provider
    pub fn duration(&self) -> Duration {
        self.finished_at - self.started_at
    }
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} deleted, {} failed",
            self.created(),
            self.deleted(),
            self.failed()
        )
    }
}

//==============================================================================
// Engine
//==============================================================================

/// Applies `plan` to `zone`, deletes before creates.
///
/// `secrets` are redacted from failure reasons before they are logged or
/// stored in the report.
pub async fn apply(
    api: &dyn ZoneApi,
    zone: &str,
    plan: &Plan,
    secrets: &[&str],
) -> ApplyReport {
    let started_at = Utc::now();
    let mut outcomes = Vec::with_capacity(plan.len());

    let operations = plan
        .to_delete
        .iter()
        .cloned()
        .map(Operation::Delete)
        .chain(plan.to_create.iter().cloned().map(Operation::Create));

    for operation in operations {
        outcomes.push(execute(api, zone, operation, secrets).await);
    }

    ApplyReport {
        outcomes,
        started_at,
        finished_at: Utc::now(),
    }
}

async fn execute(
    api: &dyn ZoneApi,
    zone: &str,
    operation: Operation,
    secrets: &[&str],
) -> Outcome {
    let result = match &operation {
        Operation::Delete(remote) => api.delete(zone, remote.id).await.map(|()| None),
        Operation::Create(record) => api
            .create(zone, &new_record(record, zone))
            .await
            .map(Some),
    };

    match (result, operation) {
        (Ok(_), Operation::Delete(remote)) => {
            info!("Deleted {}", remote);
            Outcome::Deleted(remote)
        }
        (Ok(id), Operation::Create(record)) => {
            let id = id.unwrap_or_default();
            info!("Created {} (id {})", record, id);
            Outcome::Created { record, id }
        }
        (Err(e), operation) => {
            let error = ApplyError {
                record: operation.record().clone(),
                reason: redact_secrets(&format!("{e:#}"), secrets),
            };
            warn!("Failed to {} {}", operation.verb(), error);
            Outcome::Failed { operation, error }
        }
    }
}

/// Provider payload for creating `record`.
pub fn new_record(record: &Record, zone: &str) -> NewRecord {
    NewRecord {
        field_type: record.record_type.as_str().to_string(),
        sub_domain: record.name.clone(),
        target: record.api_target(zone),
    }
}

//==============================================================================
// Tests
//==============================================================================
