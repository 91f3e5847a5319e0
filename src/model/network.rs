// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport class of an instance, inferred from its host suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Normal,
    Tor,
    I2p,
}

impl NetworkType {
    pub fn from_url(instance_url: &str) -> Self {
        match host_of(instance_url) {
            Some(host) if host.ends_with(".onion") => NetworkType::Tor,
            Some(host) if host.ends_with(".i2p") => NetworkType::I2p,
            _ => NetworkType::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Normal => "normal",
            NetworkType::Tor => "tor",
            NetworkType::I2p => "i2p",
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower-cased host of a URL, `None` when the URL does not parse.
pub fn host_of(instance_url: &str) -> Option<String> {
    url::Url::parse(instance_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

/// Canonical form of an instance URL: trimmed, with a trailing slash.
pub fn normalize_url(instance_url: &str) -> String {
    let trimmed = instance_url.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}
