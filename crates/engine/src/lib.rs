// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tb-engine: The bidirectional synchronization engine.
//!
//! One [`SyncEngine::run`] call performs a full cycle: authenticate both
//! clients, walk the mapped projects, discover new and changed records since
//! the watermark, and propagate them across the boundary while keeping the
//! cross-reference tables consistent.

mod context;
mod cycle;
mod error;
mod links;
mod processors;
mod props;
mod releases;
mod text;
mod translate;

#[cfg(test)]
mod test_util;

pub use cycle::{SyncEngine, PAGE_SIZE};
pub use error::EngineError;
pub use releases::{sanitize_iteration_name, RELEASE_VERSION_PREFIX};
pub use text::html_to_text;
