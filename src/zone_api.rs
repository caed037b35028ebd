//! Zone API abstraction layer
//!
//! This module defines the capability the reconciler needs from a DNS
//! provider: list the records of a zone, create one, delete one, and
//! publish pending changes. [`crate::ovh::OvhClient`] is the production
//! implementation; tests drive the engine through in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

//==============================================================================
// Types
//==============================================================================

/// A record as the provider reports it, before normalization
///
/// Field names follow the OVH JSON payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    /// Provider-assigned identifier, required to delete the record
    pub id: u64,
    /// Subdomain relative to the zone, empty for the apex
    #[serde(default)]
    pub sub_domain: String,
    /// Record type as a string; may be any type the provider supports
    pub field_type: String,
    /// Record content in provider format
    pub target: String,
}

/// Payload for creating a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub field_type: String,
    pub sub_domain: String,
    pub target: String,
}

//==============================================================================
// Trait
//==============================================================================

/// DNS zone operations used by the reconciler
///
/// Every call is independent; the reconciler issues them sequentially and
/// never retries. Transport timeouts surface as errors.
#[async_trait]
pub trait ZoneApi: Send + Sync {
    /// Lists every record in the zone, of any type
    ///
    /// # Errors
    ///
    /// Fails if any part of the listing fails; a partial listing is never returned.
    async fn list(&self, zone: &str) -> anyhow::Result<Vec<RawRecord>>;

    /// Creates a record and returns its provider-assigned id
    async fn create(&self, zone: &str, record: &NewRecord) -> anyhow::Result<u64>;

    /// Deletes the record with the given id
    async fn delete(&self, zone: &str, id: u64) -> anyhow::Result<()>;

    /// Publishes pending changes so the zone serves them
    async fn refresh(&self, zone: &str) -> anyhow::Result<()>;
}

//==============================================================================
// Tests
//==============================================================================
