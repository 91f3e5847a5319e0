// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use super::network_class::{NetworkClassFetcher, NETWORK_CLASS_FETCHER};
use crate::traits::Fetcher;

/// Factory for the fetchers that ship with the crate and need no network access.
pub struct LocalFetcherFactory;

impl LocalFetcherFactory {
    pub fn create_fetcher(name: &str) -> Result<Arc<dyn Fetcher>, String> {
        match name {
            NETWORK_CLASS_FETCHER => Ok(Arc::new(NetworkClassFetcher::new())),
            _ => Err(format!("Unknown local fetcher: '{}'", name)),
        }
    }

    pub fn list_available_implementations() -> Vec<&'static str> {
        vec![NETWORK_CLASS_FETCHER]
    }

    /// One instance of every built-in fetcher, in declaration order.
    pub fn builtin() -> Vec<Arc<dyn Fetcher>> {
        Self::list_available_implementations()
            .into_iter()
            .filter_map(|name| Self::create_fetcher(name).ok())
            .collect()
    }
}
