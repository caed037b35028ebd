//! Diff engine
//!
//! Pure set difference between the desired records and the live snapshot.
//! There is no update operation: a changed record shows up as one delete
//! plus one create.

use std::collections::{BTreeSet, HashSet};

use crate::record::{Record, RemoteRecord};

/// Operations needed to converge the zone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub to_create: BTreeSet<Record>,
    pub to_delete: BTreeSet<RemoteRecord>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_create.len() + self.to_delete.len()
    }
}

/// Computes what to delete (live but not desired) and what to create
/// (desired but not live).
///
/// Live duplicates of a desired record (same normalized tuple under two
/// ids) are all kept.
pub fn diff(desired: &BTreeSet<Record>, actual: &BTreeSet<RemoteRecord>) -> Plan {
    let live: HashSet<&Record> = actual.iter().map(|r| &r.record).collect();

    let to_delete = actual
        .iter()
        .filter(|remote| !desired.contains(&remote.record))
        .cloned()
        .collect();
    let to_create = desired
        .iter()
        .filter(|record| !live.contains(record))
        .cloned()
        .collect();

    Plan {
        to_create,
        to_delete,
    }
}
