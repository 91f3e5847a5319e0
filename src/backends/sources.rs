// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::model::{normalize_url, InstanceRecord, ALTERNATIVE_URLS_KEY};
use crate::observability::messages::{config::InstanceUrlRejected, StructuredLog};
use crate::traits::InstanceSource;

fn accept(url: &str) -> Option<String> {
    let normalized = normalize_url(url);
    match url::Url::parse(&normalized) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some() => Some(normalized),
        Ok(_) => {
            InstanceUrlRejected {
                url,
                reason: "not an http(s) URL with a host",
            }
            .log();
            None
        }
        Err(error) => {
            let reason = error.to_string();
            InstanceUrlRejected { url, reason: &reason }.log();
            None
        }
    }
}

/// Seeds the result set from an explicit URL list.
pub struct UrlListSource {
    urls: Vec<String>,
}

impl UrlListSource {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl InstanceSource for UrlListSource {
    fn name(&self) -> &str {
        "url-list"
    }

    async fn load(&self) -> anyhow::Result<BTreeMap<String, InstanceRecord>> {
        Ok(self
            .urls
            .iter()
            .filter_map(|url| accept(url))
            .map(|url| (url, InstanceRecord::new()))
            .collect())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListedInstance {
    #[serde(default)]
    comments: Vec<String>,
    #[serde(default)]
    additional_urls: BTreeMap<String, String>,
}

/// Seeds the result set from a YAML instance list.
///
/// ```yaml
/// https://a.example:
///   comments: ["hosted by a university"]
///   additional_urls:
///     http://a7xyz.onion: Hidden service
/// https://b.example: {}
/// ```
pub struct YamlListSource {
    path: PathBuf,
}

impl YamlListSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse(content: &str) -> anyhow::Result<BTreeMap<String, InstanceRecord>> {
        let listed: BTreeMap<String, Option<ListedInstance>> = serde_yaml::from_str(content)?;
        let mut instances = BTreeMap::new();
        for (url, entry) in listed {
            let Some(url) = accept(&url) else {
                continue;
            };
            let entry = entry.unwrap_or_default();
            let mut record = Map::new();
            if !entry.comments.is_empty() {
                record.insert("comments".to_string(), json!(entry.comments));
            }
            if !entry.additional_urls.is_empty() {
                let alternatives: Map<String, Value> = entry
                    .additional_urls
                    .into_iter()
                    .map(|(alt, reason)| (normalize_url(&alt), Value::String(reason)))
                    .collect();
                record.insert(ALTERNATIVE_URLS_KEY.to_string(), Value::Object(alternatives));
            }
            instances.insert(url, InstanceRecord(record));
        }
        Ok(instances)
    }
}

#[async_trait]
impl InstanceSource for YamlListSource {
    fn name(&self) -> &str {
        "yaml-list"
    }

    async fn load(&self) -> anyhow::Result<BTreeMap<String, InstanceRecord>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading instance list {}", self.path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing instance list {}", self.path.display()))
    }
}
