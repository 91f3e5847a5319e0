// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;
use thiserror::Error;

/// Two fetchers disagree about the same leaf of the same record.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Conflict at {path}: existing {existing} != incoming {incoming}")]
pub struct MergeConflict {
    /// Dotted path of the conflicting key.
    pub path: String,
    pub existing: Value,
    pub incoming: Value,
}

/// Errors raised by [`ResultSet`](crate::model::ResultSet) mutations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResultSetError {
    #[error("instance '{0}' is not tracked")]
    UnknownInstance(String),

    #[error("instance '{url}': {conflict}")]
    Conflict {
        url: String,
        #[source]
        conflict: MergeConflict,
    },

    #[error("fragment for instance '{0}' is not a JSON object")]
    NotAnObject(String),
}
