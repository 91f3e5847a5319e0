// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::errors::MergeConflict;
use crate::model::merge::dict_merge;
use crate::model::network::NetworkType;

pub const VERSION_KEY: &str = "version";
pub const ERROR_KEY: &str = "error";
pub const ALTERNATIVE_URLS_KEY: &str = "alternativeUrls";
pub const NETWORK_TYPE_KEY: &str = "network_type";

/// Reason tags used in `alternativeUrls`.
pub const REASON_REDIRECT_FROM: &str = "redirect from";
pub const REASON_SAME_IP: &str = "same IP";

/// Everything known about one probed instance.
///
/// The record is an open JSON object: each fetcher contributes its own nested
/// fields (`network`, `tls`, `timing`, ...). A few well-known keys carry the
/// validity rules: `version` (detected engine version) and `error` (terminal
/// error recorded by a probe).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceRecord(pub Map<String, Value>);

impl InstanceRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a record from a JSON value; anything but an object yields `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Detected engine version, ignoring `null`.
    pub fn version(&self) -> Option<&str> {
        self.0.get(VERSION_KEY).and_then(Value::as_str)
    }

    pub fn error(&self) -> Option<&Value> {
        self.0.get(ERROR_KEY)
    }

    pub fn has_error(&self) -> bool {
        self.0.contains_key(ERROR_KEY)
    }

    /// A detected version and no recorded error.
    pub fn is_valid(&self) -> bool {
        self.0.get(VERSION_KEY).map_or(false, |v| !v.is_null()) && !self.has_error()
    }

    /// `alternativeUrls` as `url -> reason`.
    pub fn alternative_urls(&self) -> BTreeMap<String, String> {
        self.0
            .get(ALTERNATIVE_URLS_KEY)
            .and_then(Value::as_object)
            .map(|urls| {
                urls.iter()
                    .map(|(url, reason)| (url.clone(), reason.as_str().unwrap_or_default().to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn add_alternative_url(&mut self, url: &str, reason: &str) -> Result<(), MergeConflict> {
        let mut urls = Map::new();
        urls.insert(url.to_string(), Value::String(reason.to_string()));
        let mut fragment = Map::new();
        fragment.insert(ALTERNATIVE_URLS_KEY.to_string(), Value::Object(urls));
        self.merge(&fragment)
    }

    /// Strict merge of a fragment into this record, see [`dict_merge`].
    pub fn merge(&mut self, fragment: &Map<String, Value>) -> Result<(), MergeConflict> {
        dict_merge(&mut self.0, fragment)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for InstanceRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Selection applied by fetchers when iterating a [`ResultSet`](crate::model::ResultSet).
///
/// * `only_valid` keeps records with a detected version and no error.
/// * `valid_or_private` keeps valid records, or every record when the run is private.
/// * `network` keeps records whose URL host belongs to the given transport class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstanceFilter {
    pub only_valid: bool,
    pub valid_or_private: bool,
    pub network: Option<NetworkType>,
}

impl InstanceFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn valid() -> Self {
        Self {
            only_valid: true,
            ..Self::default()
        }
    }

    pub fn valid_or_private() -> Self {
        Self {
            valid_or_private: true,
            ..Self::default()
        }
    }

    pub fn with_network(mut self, network: NetworkType) -> Self {
        self.network = Some(network);
        self
    }

    pub fn accepts(&self, url: &str, record: &InstanceRecord, private: bool) -> bool {
        let valid = record.is_valid();
        if self.only_valid && !valid {
            return false;
        }
        if self.valid_or_private && !(valid || private) {
            return false;
        }
        match self.network {
            Some(network) => NetworkType::from_url(url) == network,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> InstanceRecord {
        InstanceRecord::from_value(v).unwrap()
    }

    #[test]
    fn test_validity_rules() {
        assert!(record(json!({"version": "1.0"})).is_valid());
        assert!(!record(json!({})).is_valid());
        assert!(!record(json!({"version": null})).is_valid());
        assert!(!record(json!({"version": "1.0", "error": "Connection refused"})).is_valid());
        // an explicit null error still counts as a recorded error
        assert!(!record(json!({"version": "1.0", "error": null})).is_valid());
    }

    #[test]
    fn test_filter_network_class() {
        let filter = InstanceFilter::all().with_network(NetworkType::Tor);
        let r = record(json!({}));
        assert!(filter.accepts("http://xyz.onion/", &r, false));
        assert!(!filter.accepts("https://xyz.org/", &r, false));
    }

    #[test]
    fn test_alternative_urls_roundtrip_and_conflict() {
        let mut r = InstanceRecord::new();
        r.add_alternative_url("http://old.example/", REASON_REDIRECT_FROM).unwrap();
        r.add_alternative_url("http://old.example/", REASON_REDIRECT_FROM).unwrap();
        assert_eq!(
            r.alternative_urls().get("http://old.example/").map(String::as_str),
            Some(REASON_REDIRECT_FROM)
        );
        assert!(r.add_alternative_url("http://old.example/", REASON_SAME_IP).is_err());
    }
}
