// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;

pub const ONE_HOUR: Duration = Duration::from_secs(60 * 60);
pub const ONE_DAY: Duration = Duration::from_secs(24 * 60 * 60);
pub const ONE_WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Where the report is written when `output` is not configured.
pub const DEFAULT_OUTPUT_PATH: &str = "html/data/instances.json";

/// Probe parallelism used when `executor_options.max_concurrency` is not set.
pub const DEFAULT_PROBE_CONCURRENCY: usize = 8;

/// Attempts made while an external grader reports "in progress" (3 minutes in total).
pub const GRADER_POLL_ATTEMPTS: u32 = 18;
pub const GRADER_POLL_INTERVAL: Duration = Duration::from_secs(10);
