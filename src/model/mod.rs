// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Result model shared by every fetcher of a run.
//!
//! A run owns one [`ResultSet`]. Fetchers enrich its [`InstanceRecord`]s with
//! strict merges ([`dict_merge`]) and select the records they care about with
//! an [`InstanceFilter`].

mod merge;
mod network;
mod record;
mod report;
mod result_set;

pub use merge::{dict_merge, merged};
pub use network::{host_of, normalize_url, NetworkType};
pub use record::{
    InstanceFilter, InstanceRecord, ALTERNATIVE_URLS_KEY, ERROR_KEY, NETWORK_TYPE_KEY, REASON_REDIRECT_FROM,
    REASON_SAME_IP, VERSION_KEY,
};
pub use report::{Report, RunMetadata};
pub use result_set::ResultSet;
