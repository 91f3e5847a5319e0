// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use crate::model::{InstanceFilter, NetworkType, ResultSet, NETWORK_TYPE_KEY};
use crate::traits::{Fetcher, FetcherDescriptor};

pub const NETWORK_CLASS_FETCHER: &str = "network-class";

/// Records the transport class (`normal`, `tor`, `i2p`) of every instance.
///
/// Mandatory: later fetchers filter on it and the renderer groups by it.
pub struct NetworkClassFetcher {
    descriptor: FetcherDescriptor,
}

impl NetworkClassFetcher {
    pub fn new() -> Self {
        Self {
            descriptor: FetcherDescriptor::new(NETWORK_CLASS_FETCHER, "Classify instances by transport network")
                .mandatory(),
        }
    }
}

impl Default for NetworkClassFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for NetworkClassFetcher {
    fn descriptor(&self) -> &FetcherDescriptor {
        &self.descriptor
    }

    async fn fetch(&self, results: Arc<ResultSet>) -> anyhow::Result<()> {
        for (url, _) in results.iterate(InstanceFilter::all()).await {
            let network = NetworkType::from_url(&url);
            results
                .merge_instance(&url, &json!({ NETWORK_TYPE_KEY: network }))
                .await?;
        }
        Ok(())
    }
}
