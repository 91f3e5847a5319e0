// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use crate::errors::ResultSetError;
use crate::model::merge::merged;
use crate::model::record::{InstanceFilter, InstanceRecord, ALTERNATIVE_URLS_KEY};
use crate::model::report::{Report, RunMetadata};

/// Side tables filled incrementally by fetchers.
///
/// Append-only within a run: the first writer of a key wins and later
/// duplicates are ignored.
#[derive(Debug, Default)]
pub(crate) struct SideTables {
    pub hashes: BTreeMap<String, Value>,
    pub engines: BTreeMap<String, Value>,
    pub categories: Vec<String>,
    pub forks: Vec<String>,
    pub cidrs: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
struct NetworkMetadata {
    ips: BTreeMap<String, Value>,
    ipv6: bool,
}

/// The shared, incrementally enriched record set of one run.
///
/// Instances are keyed by canonical URL and iterated in URL order. Every
/// mutation of a record goes through a strict merge, so two fetchers can never
/// silently overwrite each other. The instance map is guarded by a single
/// lock, which serializes writers to the same record; merges are short and
/// never hold the lock across a probe.
#[derive(Debug)]
pub struct ResultSet {
    timestamp: u64,
    private: bool,
    network: RwLock<NetworkMetadata>,
    instances: RwLock<BTreeMap<String, InstanceRecord>>,
    tables: RwLock<SideTables>,
}

impl ResultSet {
    /// Empty result set stamped with the current time.
    pub fn new(private: bool) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self::with_timestamp(timestamp, private)
    }

    pub fn with_timestamp(timestamp: u64, private: bool) -> Self {
        Self {
            timestamp,
            private,
            network: RwLock::new(NetworkMetadata::default()),
            instances: RwLock::new(BTreeMap::new()),
            tables: RwLock::new(SideTables::default()),
        }
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    pub async fn len(&self) -> usize {
        self.instances.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.instances.read().await.is_empty()
    }

    pub async fn contains(&self, url: &str) -> bool {
        self.instances.read().await.contains_key(url)
    }

    pub async fn urls(&self) -> Vec<String> {
        self.instances.read().await.keys().cloned().collect()
    }

    /// Snapshot of one record.
    pub async fn get_instance(&self, url: &str) -> Option<InstanceRecord> {
        self.instances.read().await.get(url).cloned()
    }

    /// Track a new instance, or merge into the record already tracked under `url`.
    pub async fn add_instance(&self, url: &str, record: InstanceRecord) -> Result<(), ResultSetError> {
        let mut instances = self.instances.write().await;
        match instances.get_mut(url) {
            Some(existing) => {
                let combined = merged(&existing.0, &record.0).map_err(|conflict| ResultSetError::Conflict {
                    url: url.to_string(),
                    conflict,
                })?;
                existing.0 = combined;
            }
            None => {
                instances.insert(url.to_string(), record);
            }
        }
        Ok(())
    }

    /// Merge a detail fragment into a tracked instance.
    ///
    /// The merge is all-or-nothing: on conflict the record is left unchanged.
    pub async fn merge_instance(&self, url: &str, fragment: &Value) -> Result<(), ResultSetError> {
        let fragment = fragment
            .as_object()
            .ok_or_else(|| ResultSetError::NotAnObject(url.to_string()))?;
        let mut instances = self.instances.write().await;
        let existing = instances
            .get_mut(url)
            .ok_or_else(|| ResultSetError::UnknownInstance(url.to_string()))?;
        existing.0 = merged(&existing.0, fragment).map_err(|conflict| ResultSetError::Conflict {
            url: url.to_string(),
            conflict,
        })?;
        Ok(())
    }

    /// Move the record tracked under `old_url` to `new_url`.
    ///
    /// Used when a probe finds that `old_url` permanently redirects. The old
    /// record is merged into the new key (creating it if needed), `old_url` is
    /// recorded under `alternativeUrls` with `reason`, and the old key is removed.
    pub async fn rename_instance(&self, old_url: &str, new_url: &str, reason: &str) -> Result<(), ResultSetError> {
        if old_url == new_url {
            return Ok(());
        }
        let mut instances = self.instances.write().await;
        let old = instances
            .get(old_url)
            .cloned()
            .ok_or_else(|| ResultSetError::UnknownInstance(old_url.to_string()))?;

        let mut incoming = old.0;
        let alternatives = incoming
            .entry(ALTERNATIVE_URLS_KEY.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(alternatives) = alternatives {
            alternatives
                .entry(old_url.to_string())
                .or_insert_with(|| Value::String(reason.to_string()));
        }

        let base = instances.get(new_url).map(|r| r.0.clone()).unwrap_or_default();
        let combined = merged(&base, &incoming).map_err(|conflict| ResultSetError::Conflict {
            url: new_url.to_string(),
            conflict,
        })?;
        instances.insert(new_url.to_string(), InstanceRecord(combined));
        instances.remove(old_url);
        Ok(())
    }

    /// Filtered snapshot of `(url, record)` pairs in URL order.
    pub async fn iterate(&self, filter: InstanceFilter) -> Vec<(String, InstanceRecord)> {
        self.instances
            .read()
            .await
            .iter()
            .filter(|(url, record)| filter.accepts(url, record, self.private))
            .map(|(url, record)| (url.clone(), record.clone()))
            .collect()
    }

    pub async fn add_hash(&self, hash: &str, detail: Value) -> bool {
        insert_first(&mut self.tables.write().await.hashes, hash, detail)
    }

    pub async fn add_engine(&self, name: &str, detail: Value) -> bool {
        insert_first(&mut self.tables.write().await.engines, name, detail)
    }

    pub async fn add_cidr(&self, cidr: &str, detail: Value) -> bool {
        insert_first(&mut self.tables.write().await.cidrs, cidr, detail)
    }

    pub async fn add_category(&self, category: &str) -> bool {
        push_unique(&mut self.tables.write().await.categories, category)
    }

    pub async fn add_fork(&self, git_url: &str) -> bool {
        push_unique(&mut self.tables.write().await.forks, git_url)
    }

    pub async fn forks(&self) -> Vec<String> {
        self.tables.read().await.forks.clone()
    }

    /// Record a public IP of the probing host; the first detail for an IP wins.
    pub async fn add_public_ip(&self, ip: &str, detail: Value) -> bool {
        insert_first(&mut self.network.write().await.ips, ip, detail)
    }

    pub async fn set_ipv6(&self, reachable: bool) {
        self.network.write().await.ipv6 = reachable;
    }

    /// Plain projection handed to the renderer.
    pub async fn report(&self) -> Report {
        let network = self.network.read().await;
        let instances = self.instances.read().await;
        let tables = self.tables.read().await;
        Report {
            metadata: RunMetadata {
                timestamp: self.timestamp,
                private: self.private,
                ips: network.ips.clone(),
                ipv6: network.ipv6,
            },
            instances: instances
                .iter()
                .map(|(url, record)| (url.clone(), record.clone().into_value()))
                .collect(),
            hashes: tables.hashes.clone(),
            engines: tables.engines.clone(),
            categories: tables.categories.clone(),
            forks: tables.forks.clone(),
            cidrs: tables.cidrs.clone(),
        }
    }

    /// Serialize the projection as pretty JSON to `path`, creating parent directories.
    pub async fn write_report(&self, path: &Path) -> anyhow::Result<()> {
        let report = self.report().await;
        let content = serde_json::to_string_pretty(&report)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

fn insert_first(table: &mut BTreeMap<String, Value>, key: &str, detail: Value) -> bool {
    if table.contains_key(key) {
        return false;
    }
    table.insert(key.to_string(), detail);
    true
}

fn push_unique(list: &mut Vec<String>, item: &str) -> bool {
    if list.iter().any(|existing| existing == item) {
        return false;
    }
    list.push(item.to_string());
    true
}
