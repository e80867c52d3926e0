// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The mapping-store surface consumed by the engine.
//!
//! All tables are scoped by the plug-in id the store was opened with.
//! Artifact mappings are additionally scoped by project and artifact kind;
//! field-value and custom-property tables are translation data maintained by
//! operators and read-only from the engine's perspective.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tb_core::{ArtifactKind, Mapping};
use thiserror::Error;

/// Errors from mapping-store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("mapping store unavailable: {0}")]
    Unavailable(String),
    #[error("mapping table corrupt: {0}")]
    Corrupt(String),
}

/// Which enum field a value-mapping table translates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Priority,
    Severity,
    /// Incident status rows carry composite `<state>+<reason>` external keys.
    Status,
    Type,
    Importance,
}

tb_core::display_names! {
    FieldKind {
        Priority => "priority",
        Severity => "severity",
        Status => "status",
        Type => "type",
        Importance => "importance",
    }
}

/// Destination mapping for one positional custom-property slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomPropertyMapping {
    /// 1-based slot number on the internal artifact.
    pub property_number: u8,
    /// External field name, or one of the reserved names (`"Area"`,
    /// `"TfsWorkItemId"`, `"Incident.ID"`).
    pub external_field: String,
}

/// Read/write access to the cross-reference tables.
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Internal project id ↔ external project name, one row per synced project.
    async fn list_project_mappings(&self) -> Result<Vec<Mapping>, StoreError>;

    /// Internal user id ↔ external display name. Not project-scoped.
    async fn list_user_mappings(&self) -> Result<Vec<Mapping>, StoreError>;

    /// All artifact rows of one kind within a project.
    async fn list_artifact_mappings(
        &self,
        project_id: i32,
        kind: ArtifactKind,
    ) -> Result<Vec<Mapping>, StoreError>;

    /// Enum-value translation rows for one field of one kind.
    async fn list_field_value_mappings(
        &self,
        project_id: i32,
        kind: ArtifactKind,
        field: FieldKind,
    ) -> Result<Vec<Mapping>, StoreError>;

    /// Destination field for one custom-property slot, if mapped.
    async fn custom_property_mapping(
        &self,
        project_id: i32,
        kind: ArtifactKind,
        property_number: u8,
    ) -> Result<Option<CustomPropertyMapping>, StoreError>;

    /// Value translation rows for one list/multi-list custom-property slot.
    async fn list_custom_property_value_mappings(
        &self,
        project_id: i32,
        kind: ArtifactKind,
        property_number: u8,
    ) -> Result<Vec<Mapping>, StoreError>;

    /// Batched insert. Rows whose `(project, kind, internal_id)` already
    /// exist are silently ignored.
    async fn add_artifact_mappings(
        &self,
        kind: ArtifactKind,
        entries: &[Mapping],
    ) -> Result<(), StoreError>;

    /// Batched removal. Rows that are already gone are silently ignored.
    async fn remove_artifact_mappings(
        &self,
        kind: ArtifactKind,
        entries: &[Mapping],
    ) -> Result<(), StoreError>;
}
