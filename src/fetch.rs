//! Zone snapshot fetcher
//!
//! Turns the provider listing into the actual-set: unsupported types are
//! dropped first, the rest go through the same normalization as the input
//! file.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::error::ReconcileError;
use crate::record::{Record, RecordType, RemoteRecord};
use crate::zone_api::{RawRecord, ZoneApi};

/// Fetches and normalizes the live state of `zone`.
///
/// Any listing error fails the whole fetch.
pub async fn fetch_snapshot(
    api: &dyn ZoneApi,
    zone: &str,
) -> Result<BTreeSet<RemoteRecord>, ReconcileError> {
    let raw = api.list(zone).await.map_err(|source| ReconcileError::Fetch {
        zone: zone.to_string(),
        source,
    })?;
    let total = raw.len();
    let snapshot: BTreeSet<RemoteRecord> = raw
        .into_iter()
        .filter_map(|r| to_remote_record(r, zone))
        .collect();
    debug!(
        "Fetched {} records from {}, {} of supported types",
        total,
        zone,
        snapshot.len()
    );
    Ok(snapshot)
}

/// Normalizes one listed record, or `None` if its type is unsupported.
///
/// A supported record the normalizer rejects is kept with its raw (trimmed,
/// lowercased name) values: it can never equal a desired record, so the
/// diff schedules it for deletion instead of pretending it does not exist.
pub fn to_remote_record(raw: RawRecord, zone: &str) -> Option<RemoteRecord> {
    let record_type = RecordType::from_token(&raw.field_type)?;
    let record = match Record::normalize(&raw.sub_domain, record_type, &raw.target, zone) {
        Ok(record) => record,
        Err(reason) => {
            warn!(
                "Record {} ({} {} {}) does not normalize: {}",
                raw.id, raw.sub_domain, raw.field_type, raw.target, reason
            );
            Record::new(
                &raw.sub_domain.trim().to_ascii_lowercase(),
                record_type,
                raw.target.trim(),
            )
        }
    };
    Some(RemoteRecord { id: raw.id, record })
}
