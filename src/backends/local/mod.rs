// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod factory;
pub mod network_class;

pub use factory::LocalFetcherFactory;
pub use network_class::{NetworkClassFetcher, NETWORK_CLASS_FETCHER};
