// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-project working state for one sync cycle.
//!
//! Everything here is loaded when the engine enters a project and discarded
//! when it leaves. Mapping writes accumulate in buffers and flush to the
//! store at phase boundaries, never per artifact.

use std::collections::HashMap;
use tb_clients::pms::{CustomPropertyDefinition, PmsUser};
use tb_clients::wits::{WitsUser, WorkItemTypeDefinition};
use tb_core::{find_external, find_internal, ArtifactKind, Mapping};
use tb_store::FieldKind;

pub(crate) struct ProjectState {
    pub project_id: i32,
    /// External project name (the project mapping's external key).
    pub project_name: String,
    /// Persisted rows plus anything flushed earlier this cycle.
    pub artifact_mappings: HashMap<ArtifactKind, Vec<Mapping>>,
    /// Rows created this phase, pending flush.
    pub new_mappings: HashMap<ArtifactKind, Vec<Mapping>>,
    /// Auto-created release rows whose source iteration has disappeared.
    pub retired_release_mappings: Vec<Mapping>,
    pub user_mappings: Vec<Mapping>,
    /// External user roster, read once per cycle.
    pub roster: Vec<WitsUser>,
    pub field_values: HashMap<(ArtifactKind, FieldKind), Vec<Mapping>>,
    pub type_definitions: HashMap<String, WorkItemTypeDefinition>,
    pub property_definitions: HashMap<ArtifactKind, Vec<CustomPropertyDefinition>>,
    /// Runtime user translation caches for the auto-map path.
    pub pms_user_cache: HashMap<i32, Option<PmsUser>>,
    pub login_user_cache: HashMap<String, Option<PmsUser>>,
}

impl ProjectState {
    pub fn new(project_id: i32, project_name: impl Into<String>) -> Self {
        Self {
            project_id,
            project_name: project_name.into(),
            artifact_mappings: HashMap::new(),
            new_mappings: HashMap::new(),
            retired_release_mappings: Vec::new(),
            user_mappings: Vec::new(),
            roster: Vec::new(),
            field_values: HashMap::new(),
            type_definitions: HashMap::new(),
            property_definitions: HashMap::new(),
            pms_user_cache: HashMap::new(),
            login_user_cache: HashMap::new(),
        }
    }

    fn flushed(&self, kind: ArtifactKind) -> &[Mapping] {
        self.artifact_mappings.get(&kind).map_or(&[], Vec::as_slice)
    }

    fn pending(&self, kind: ArtifactKind) -> &[Mapping] {
        self.new_mappings.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Mapping for an internal id, checking flushed rows and this phase's
    /// pending buffer.
    pub fn mapping_for(&self, kind: ArtifactKind, internal_id: i32) -> Option<&Mapping> {
        find_internal(internal_id, self.flushed(kind))
            .or_else(|| find_internal(internal_id, self.pending(kind)))
    }

    /// Mapping for an external key, checking flushed and pending rows.
    pub fn mapping_for_external(&self, kind: ArtifactKind, key: &str) -> Option<&Mapping> {
        find_external(key, self.flushed(kind), true)
            .or_else(|| find_external(key, self.pending(kind), true))
    }

    /// Buffer a freshly created mapping for the next flush. Only called
    /// after the counterpart artifact exists remotely.
    pub fn add_mapping(&mut self, kind: ArtifactKind, mapping: Mapping) {
        if self.mapping_for(kind, mapping.internal_id).is_some() {
            return;
        }
        self.new_mappings.entry(kind).or_default().push(mapping);
    }

    /// Retire an auto-created release row whose iteration no longer exists.
    pub fn retire_release_mapping(&mut self, mapping: Mapping) {
        if let Some(rows) = self.artifact_mappings.get_mut(&ArtifactKind::Release) {
            rows.retain(|m| m.internal_id != mapping.internal_id);
        }
        self.retired_release_mappings.push(mapping);
    }

    pub fn field_value_table(&self, kind: ArtifactKind, field: FieldKind) -> &[Mapping] {
        self.field_values.get(&(kind, field)).map_or(&[], Vec::as_slice)
    }

    /// Move this phase's pending rows into the flushed snapshot; returns
    /// what must be written to the store, grouped by kind.
    pub fn take_pending_mappings(&mut self) -> Vec<(ArtifactKind, Vec<Mapping>)> {
        let mut out = Vec::new();
        for (kind, rows) in self.new_mappings.drain() {
            if rows.is_empty() {
                continue;
            }
            self.artifact_mappings.entry(kind).or_default().extend(rows.iter().cloned());
            out.push((kind, rows));
        }
        out
    }

    /// Take the retired release rows for removal from the store.
    pub fn take_retired_releases(&mut self) -> Vec<Mapping> {
        std::mem::take(&mut self.retired_release_mappings)
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
