// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External work-item-tracking service client surface.

mod client;
pub mod fields;
mod query;
mod types;

pub use client::WitsClient;
pub use query::{changed_since, created_since, field_equals, QUERY_CAP_FALLBACK_DAYS};
pub use types::{
    FieldDefinition, FieldValue, IterationNode, Revision, WitsAttachment, WitsFieldType, WitsUser,
    WorkItem, WorkItemLink, WorkItemTypeDefinition,
};
