// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Internal project-management service client surface.

mod client;
mod types;

pub use client::PmsClient;
pub use types::{
    artifact_url, Association, CustomProperties, CustomPropertyDefinition, Incident,
    PmsAttachment, PmsComment, PmsProject, PmsUser, PropertyType, PropertyValue, Release,
    Requirement, Task, CUSTOM_PROPERTY_SLOTS,
};
