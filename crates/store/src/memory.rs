// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory mapping store for tests and embedding hosts.

use crate::client::{CustomPropertyMapping, FieldKind, MappingStore, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tb_core::{ArtifactKind, Mapping};

#[derive(Default)]
struct Tables {
    projects: Vec<Mapping>,
    users: Vec<Mapping>,
    artifacts: HashMap<ArtifactKind, Vec<Mapping>>,
    field_values: HashMap<(i32, ArtifactKind, FieldKind), Vec<Mapping>>,
    custom_properties: HashMap<(i32, ArtifactKind, u8), CustomPropertyMapping>,
    custom_property_values: HashMap<(i32, ArtifactKind, u8), Vec<Mapping>>,
}

/// Mapping store backed by process memory.
///
/// Enforces the uniqueness invariants on insert: one row per
/// `(project, kind, internal_id)`, at most one primary row per
/// `(project, kind, external_key)`.
#[derive(Clone, Default)]
pub struct MemoryMappingStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_project_mappings(&self, rows: Vec<Mapping>) {
        self.tables.lock().projects = rows;
    }

    pub fn set_user_mappings(&self, rows: Vec<Mapping>) {
        self.tables.lock().users = rows;
    }

    pub fn seed_artifact_mappings(&self, kind: ArtifactKind, rows: Vec<Mapping>) {
        self.tables.lock().artifacts.insert(kind, rows);
    }

    pub fn set_field_value_mappings(
        &self,
        project_id: i32,
        kind: ArtifactKind,
        field: FieldKind,
        rows: Vec<Mapping>,
    ) {
        self.tables.lock().field_values.insert((project_id, kind, field), rows);
    }

    pub fn set_custom_property_mapping(
        &self,
        project_id: i32,
        kind: ArtifactKind,
        mapping: CustomPropertyMapping,
    ) {
        self.tables
            .lock()
            .custom_properties
            .insert((project_id, kind, mapping.property_number), mapping);
    }

    pub fn set_custom_property_value_mappings(
        &self,
        project_id: i32,
        kind: ArtifactKind,
        property_number: u8,
        rows: Vec<Mapping>,
    ) {
        self.tables
            .lock()
            .custom_property_values
            .insert((project_id, kind, property_number), rows);
    }

    /// Snapshot of one kind's artifact table, for assertions.
    pub fn artifact_mappings(&self, kind: ArtifactKind) -> Vec<Mapping> {
        self.tables.lock().artifacts.get(&kind).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl MappingStore for MemoryMappingStore {
    async fn list_project_mappings(&self) -> Result<Vec<Mapping>, StoreError> {
        Ok(self.tables.lock().projects.clone())
    }

    async fn list_user_mappings(&self) -> Result<Vec<Mapping>, StoreError> {
        Ok(self.tables.lock().users.clone())
    }

    async fn list_artifact_mappings(
        &self,
        project_id: i32,
        kind: ArtifactKind,
    ) -> Result<Vec<Mapping>, StoreError> {
        Ok(self
            .tables
            .lock()
            .artifacts
            .get(&kind)
            .map(|rows| rows.iter().filter(|m| m.project_id == project_id).cloned().collect())
            .unwrap_or_default())
    }

    async fn list_field_value_mappings(
        &self,
        project_id: i32,
        kind: ArtifactKind,
        field: FieldKind,
    ) -> Result<Vec<Mapping>, StoreError> {
        Ok(self
            .tables
            .lock()
            .field_values
            .get(&(project_id, kind, field))
            .cloned()
            .unwrap_or_default())
    }

    async fn custom_property_mapping(
        &self,
        project_id: i32,
        kind: ArtifactKind,
        property_number: u8,
    ) -> Result<Option<CustomPropertyMapping>, StoreError> {
        Ok(self
            .tables
            .lock()
            .custom_properties
            .get(&(project_id, kind, property_number))
            .cloned())
    }

    async fn list_custom_property_value_mappings(
        &self,
        project_id: i32,
        kind: ArtifactKind,
        property_number: u8,
    ) -> Result<Vec<Mapping>, StoreError> {
        Ok(self
            .tables
            .lock()
            .custom_property_values
            .get(&(project_id, kind, property_number))
            .cloned()
            .unwrap_or_default())
    }

    async fn add_artifact_mappings(
        &self,
        kind: ArtifactKind,
        entries: &[Mapping],
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        let rows = tables.artifacts.entry(kind).or_default();
        for entry in entries {
            let exists = rows
                .iter()
                .any(|m| m.project_id == entry.project_id && m.internal_id == entry.internal_id);
            if exists {
                continue;
            }
            let mut entry = entry.clone();
            if entry.primary {
                // Demote to alias if a primary row already claims this key
                let primary_taken = rows.iter().any(|m| {
                    m.project_id == entry.project_id
                        && m.external_key == entry.external_key
                        && m.primary
                });
                if primary_taken {
                    entry.primary = false;
                }
            }
            rows.push(entry);
        }
        Ok(())
    }

    async fn remove_artifact_mappings(
        &self,
        kind: ArtifactKind,
        entries: &[Mapping],
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        if let Some(rows) = tables.artifacts.get_mut(&kind) {
            rows.retain(|m| {
                !entries.iter().any(|e| {
                    e.project_id == m.project_id
                        && e.internal_id == m.internal_id
                        && e.external_key == m.external_key
                })
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
