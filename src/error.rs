//! Error types for a reconciliation run
//!
//! Parse and fetch errors abort the run before anything is mutated. Apply
//! errors never abort: they are collected per record in the apply report.

use std::path::PathBuf;

use thiserror::Error;

use crate::record::Record;

/// Fatal errors that stop a run before any create or delete is issued.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A line with a supported record type could not be turned into a record
    #[error("line {line}: {reason}")]
    Parse {
        /// 1-based line number in the input file
        line: usize,
        /// What was wrong with the line
        reason: String,
    },

    /// The desired-state file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The live zone snapshot could not be retrieved in full
    #[error("failed to fetch zone {zone}: {source:#}")]
    Fetch {
        zone: String,
        #[source]
        source: anyhow::Error,
    },
}

/// A single create or delete that the provider rejected or that failed in transit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{record}: {reason}")]
pub struct ApplyError {
    pub record: Record,
    pub reason: String,
}
