// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::model::InstanceRecord;

/// Provides the initial instance list that seeds a result set.
#[async_trait]
pub trait InstanceSource: Send + Sync {
    fn name(&self) -> &str;

    /// Canonical URL to seed record.
    async fn load(&self) -> anyhow::Result<BTreeMap<String, InstanceRecord>>;
}
