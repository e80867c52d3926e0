// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requirement flows: inbound creation and inbound-only updates.

use super::common::{description_from_work_item, differs, DEFAULT_AUTHOR_ID};
use crate::context::ProjectState;
use crate::cycle::SyncEngine;
use crate::error::EngineError;
use tb_clients::pms::{PmsClient, Requirement};
use tb_clients::wits::{fields, WitsClient, WorkItem};
use tb_core::{wits_local_to_utc, ArtifactKind, Clock, LogSeverity, Mapping};
use tb_store::{FieldKind, MappingStore};

impl<P, W, S, C> SyncEngine<P, W, S, C>
where
    P: PmsClient,
    W: WitsClient,
    S: MappingStore,
    C: Clock,
{
    /// Create an internal requirement for a work item from the requirement
    /// type list.
    pub(crate) async fn create_requirement_inbound(
        &self,
        state: &mut ProjectState,
        work_item: &WorkItem,
    ) -> Result<(), EngineError> {
        if state
            .mapping_for_external(ArtifactKind::Requirement, &work_item.id.to_string())
            .is_some()
        {
            return Ok(());
        }
        // The prefixed id written back by a crashed run identifies an
        // internal record whose mapping was never flushed
        if let Some(internal_id) =
            self.written_back_internal_id(work_item, ArtifactKind::Requirement)
        {
            if let Ok(existing) = self.pms.requirement(internal_id).await {
                if existing.project_id == state.project_id {
                    self.log_event(
                        LogSeverity::Warning,
                        &format!(
                            "work item {} is already requirement {internal_id}; restoring the mapping",
                            work_item.id
                        ),
                    );
                    state.add_mapping(
                        ArtifactKind::Requirement,
                        Mapping::new(state.project_id, internal_id, work_item.id.to_string()),
                    );
                    return Ok(());
                }
            }
        }

        let status_id =
            match self.status_from_work_item(state, ArtifactKind::Requirement, work_item) {
                Some(id) => id,
                None => {
                    self.log_event(
                        LogSeverity::Warning,
                        &format!(
                            "work item {}: status '{}' unmapped, using the default",
                            work_item.id,
                            work_item.state()
                        ),
                    );
                    1
                }
            };

        // The external priority translates to the internal importance scale
        let importance_id = match work_item.field_text(fields::PRIORITY) {
            Some(text) if !text.trim().is_empty() => self.value_to_internal(
                state,
                ArtifactKind::Requirement,
                FieldKind::Importance,
                text.trim(),
            ),
            _ => None,
        };

        let author_id = match work_item.field_text(fields::CREATED_BY) {
            Some(name) => self.user_id_for(state, &name).await.unwrap_or(DEFAULT_AUTHOR_ID),
            None => DEFAULT_AUTHOR_ID,
        };
        let owner_id = match work_item.assigned_to() {
            Some(name) => self.user_id_for(state, &name).await,
            None => None,
        };
        let release_id = match work_item.iteration_id {
            Some(iteration_id) => self.release_for_iteration(state, iteration_id).await,
            None => None,
        };

        let offset = self.config.time_offset_hours;
        let now = self.clock.now_utc();
        let mut custom_properties = Default::default();
        self.copy_properties_inbound(
            state,
            ArtifactKind::Requirement,
            work_item,
            &mut custom_properties,
        )
        .await?;

        let requirement = Requirement {
            id: 0,
            project_id: state.project_id,
            name: work_item.title(),
            description: description_from_work_item(work_item),
            status_id,
            author_id,
            owner_id,
            importance_id,
            release_id,
            creation_date: work_item
                .created_date()
                .map(|d| wits_local_to_utc(d, offset))
                .unwrap_or(now),
            last_update_date: work_item
                .changed_date()
                .map(|d| wits_local_to_utc(d, offset))
                .unwrap_or(now),
            custom_properties,
        };
        let created = self.pms.create_requirement(requirement).await?;

        state.add_mapping(
            ArtifactKind::Requirement,
            Mapping::new(state.project_id, created.id, work_item.id.to_string()),
        );

        self.import_revision_comments(
            state,
            work_item,
            ArtifactKind::Requirement,
            created.id,
            author_id,
        )
        .await?;
        self.copy_links_inbound(
            state,
            work_item,
            ArtifactKind::Requirement,
            created.id,
            author_id,
        )
        .await;
        self.write_artifact_id_field(work_item.id, ArtifactKind::Requirement, created.id)
            .await?;

        self.trace_event(&format!(
            "work item {} created as requirement {}",
            work_item.id, created.id
        ));
        Ok(())
    }

    /// Update a mapped requirement from its work item. Requirements never
    /// flow outward.
    pub(crate) async fn update_requirement_inbound(
        &self,
        state: &mut ProjectState,
        internal_id: i32,
        external_key: &str,
    ) -> Result<(), EngineError> {
        let Ok(work_item_id) = external_key.parse::<i32>() else {
            self.log_event(
                LogSeverity::Warning,
                &format!(
                    "requirement {internal_id} has non-numeric external key '{external_key}'"
                ),
            );
            return Ok(());
        };
        let work_item = self.wits.work_item(work_item_id).await?;
        let mut requirement = self.pms.requirement(internal_id).await?;
        let mut dirty = false;

        let title = work_item.title();
        if differs(&requirement.name, &title) {
            requirement.name = title;
            dirty = true;
        }
        let description = description_from_work_item(&work_item);
        if differs(&requirement.description, &description) {
            requirement.description = description;
            dirty = true;
        }
        if let Some(status_id) =
            self.status_from_work_item(state, ArtifactKind::Requirement, &work_item)
        {
            if requirement.status_id != status_id {
                requirement.status_id = status_id;
                dirty = true;
            }
        }
        if let Some(text) = work_item.field_text(fields::PRIORITY) {
            if !text.trim().is_empty() {
                if let Some(importance_id) = self.value_to_internal(
                    state,
                    ArtifactKind::Requirement,
                    FieldKind::Importance,
                    text.trim(),
                ) {
                    if requirement.importance_id != Some(importance_id) {
                        requirement.importance_id = Some(importance_id);
                        dirty = true;
                    }
                }
            }
        }
        if let Some(name) = work_item.assigned_to() {
            if let Some(owner_id) = self.user_id_for(state, &name).await {
                if requirement.owner_id != Some(owner_id) {
                    requirement.owner_id = Some(owner_id);
                    dirty = true;
                }
            }
        }
        if let Some(iteration_id) = work_item.iteration_id {
            if let Some(release_id) = self.release_for_iteration(state, iteration_id).await {
                if requirement.release_id != Some(release_id) {
                    requirement.release_id = Some(release_id);
                    dirty = true;
                }
            }
        }

        dirty |= self
            .copy_properties_inbound(
                state,
                ArtifactKind::Requirement,
                &work_item,
                &mut requirement.custom_properties,
            )
            .await?;

        let requirement_id = requirement.id;
        if dirty {
            self.pms.update_requirement(requirement).await?;
            self.trace_event(&format!(
                "requirement {requirement_id} updated from the external side"
            ));
        }

        self.import_revision_comments(
            state,
            &work_item,
            ArtifactKind::Requirement,
            requirement_id,
            DEFAULT_AUTHOR_ID,
        )
        .await
    }
}

#[cfg(test)]
#[path = "requirement_tests.rs"]
mod tests;
