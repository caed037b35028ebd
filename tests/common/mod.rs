//! In-memory zone shared by the integration tests

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::bail;
use async_trait::async_trait;

use ovh_reconciler::zone_api::{NewRecord, RawRecord, ZoneApi};

#[derive(Default)]
struct State {
    records: BTreeMap<u64, RawRecord>,
    next_id: u64,
    calls: Vec<String>,
}

/// A zone that behaves like the provider: ids are assigned on create and
/// targets are stored verbatim.
#[derive(Default)]
pub struct FakeZone {
    state: Mutex<State>,
    fail_targets: Vec<String>,
    fail_list: bool,
    fail_refresh: bool,
}

#[allow(dead_code)]
impl FakeZone {
    pub fn with_records(records: &[(&str, &str, &str)]) -> Self {
        let zone = Self::default();
        {
            let mut state = zone.state.lock().unwrap();
            for (sub_domain, field_type, target) in records {
                state.next_id += 1;
                let id = state.next_id;
                state.records.insert(
                    id,
                    RawRecord {
                        id,
                        sub_domain: sub_domain.to_string(),
                        field_type: field_type.to_string(),
                        target: target.to_string(),
                    },
                );
            }
        }
        zone
    }

    /// Creates with one of `targets` fail
    pub fn failing_creates(targets: &[&str]) -> Self {
        Self {
            fail_targets: targets.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing_list() -> Self {
        Self {
            fail_list: true,
            ..Self::default()
        }
    }

    pub fn failing_refresh() -> Self {
        Self {
            fail_refresh: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("create") || c.starts_with("delete"))
            .collect()
    }

    pub fn records(&self) -> Vec<RawRecord> {
        self.state.lock().unwrap().records.values().cloned().collect()
    }
}

#[async_trait]
impl ZoneApi for FakeZone {
    async fn list(&self, zone: &str) -> anyhow::Result<Vec<RawRecord>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("list {zone}"));
        if self.fail_list {
            bail!("Authentication failed (HTTP 401): Invalid credential");
        }
        Ok(state.records.values().cloned().collect())
    }

    async fn create(&self, _zone: &str, record: &NewRecord) -> anyhow::Result<u64> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!(
            "create {} {} {}",
            record.sub_domain, record.field_type, record.target
        ));
        if self.fail_targets.contains(&record.target) {
            bail!("API error (HTTP 400): Invalid target");
        }
        state.next_id += 1;
        let id = state.next_id;
        state.records.insert(
            id,
            RawRecord {
                id,
                sub_domain: record.sub_domain.clone(),
                field_type: record.field_type.clone(),
                target: record.target.clone(),
            },
        );
        Ok(id)
    }

    async fn delete(&self, _zone: &str, id: u64) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("delete {id}"));
        if state.records.remove(&id).is_none() {
            bail!("Not found (HTTP 404): record {id}");
        }
        Ok(())
    }

    async fn refresh(&self, zone: &str) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("refresh {zone}"));
        if self.fail_refresh {
            bail!("OVH server error: 500: internal");
        }
        Ok(())
    }
}
