// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tb-store: Cross-reference mapping store client

mod client;
mod memory;

pub use client::{CustomPropertyMapping, FieldKind, MappingStore, StoreError};
pub use memory::MemoryMappingStore;
