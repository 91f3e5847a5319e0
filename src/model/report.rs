// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Run-level metadata of a [`Report`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Seconds since the epoch at which the run started.
    pub timestamp: u64,
    pub private: bool,
    /// Public IPs of the probing host.
    pub ips: BTreeMap<String, Value>,
    pub ipv6: bool,
}

/// Plain, serializable projection of a [`ResultSet`](crate::model::ResultSet).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub metadata: RunMetadata,
    pub instances: BTreeMap<String, Value>,
    pub hashes: BTreeMap<String, Value>,
    pub engines: BTreeMap<String, Value>,
    pub categories: Vec<String>,
    pub forks: Vec<String>,
    pub cidrs: BTreeMap<String, Value>,
}
