// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tb-core: Shared vocabulary for the Trackbridge sync engine

pub mod macros;

pub mod artifact;
pub mod clock;
pub mod config;
pub mod log;
pub mod mapping;
pub mod status;
pub mod time;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use artifact::{ArtifactKind, WorkItemClass};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{SyncConfig, SyncConfigBuilder};
pub use log::{log_chunked, EventLog, LogSeverity, TracingLog, LOG_CHUNK_LEN};
#[cfg(any(test, feature = "test-support"))]
pub use log::{LogEntry, RecordingLog};
pub use mapping::{
    find_by_external_key, find_by_internal_id, find_external, find_internal, Mapping, StateReason,
};
pub use status::RunStatus;
pub use time::{first_run_watermark, utc_to_wits_local, wits_local_to_utc};
