// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task flows: inbound creation and inbound-only updates.

use super::common::{description_from_work_item, differs, hours_to_minutes, DEFAULT_AUTHOR_ID};
use crate::context::ProjectState;
use crate::cycle::SyncEngine;
use crate::error::EngineError;
use tb_clients::pms::{PmsClient, Task};
use tb_clients::wits::{fields, FieldValue, WitsClient, WorkItem};
use tb_core::{wits_local_to_utc, ArtifactKind, Clock, LogSeverity, Mapping};
use tb_store::MappingStore;

impl<P, W, S, C> SyncEngine<P, W, S, C>
where
    P: PmsClient,
    W: WitsClient,
    S: MappingStore,
    C: Clock,
{
    /// Create an internal task for a work item from the task type list.
    pub(crate) async fn create_task_inbound(
        &self,
        state: &mut ProjectState,
        work_item: &WorkItem,
    ) -> Result<(), EngineError> {
        if state.mapping_for_external(ArtifactKind::Task, &work_item.id.to_string()).is_some() {
            return Ok(());
        }
        // The prefixed id written back by a crashed run identifies an
        // internal record whose mapping was never flushed
        if let Some(internal_id) = self.written_back_internal_id(work_item, ArtifactKind::Task) {
            if let Ok(existing) = self.pms.task(internal_id).await {
                if existing.project_id == state.project_id {
                    self.log_event(
                        LogSeverity::Warning,
                        &format!(
                            "work item {} is already task {internal_id}; restoring the mapping",
                            work_item.id
                        ),
                    );
                    state.add_mapping(
                        ArtifactKind::Task,
                        Mapping::new(state.project_id, internal_id, work_item.id.to_string()),
                    );
                    return Ok(());
                }
            }
        }

        let status_id = match self.status_from_work_item(state, ArtifactKind::Task, work_item) {
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

        let creator_id = match work_item.field_text(fields::CREATED_BY) {
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
        self.copy_properties_inbound(state, ArtifactKind::Task, work_item, &mut custom_properties)
            .await?;

        let task = Task {
            id: 0,
            project_id: state.project_id,
            name: work_item.title(),
            description: description_from_work_item(work_item),
            status_id,
            creator_id,
            owner_id,
            release_id,
            start_date: work_item
                .field(fields::START_DATE)
                .and_then(FieldValue::as_date)
                .map(|d| wits_local_to_utc(d, offset)),
            end_date: work_item
                .field(fields::FINISH_DATE)
                .and_then(FieldValue::as_date)
                .map(|d| wits_local_to_utc(d, offset)),
            actual_effort_minutes: work_item
                .field(fields::COMPLETED_WORK)
                .and_then(FieldValue::as_double)
                .map(hours_to_minutes),
            estimated_effort_minutes: work_item
                .field(fields::ESTIMATE)
                .and_then(FieldValue::as_double)
                .map(hours_to_minutes),
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
        let created = self.pms.create_task(task).await?;

        state.add_mapping(
            ArtifactKind::Task,
            Mapping::new(state.project_id, created.id, work_item.id.to_string()),
        );

        self.import_revision_comments(
            state,
            work_item,
            ArtifactKind::Task,
            created.id,
            creator_id,
        )
        .await?;
        self.copy_links_inbound(state, work_item, ArtifactKind::Task, created.id, creator_id)
            .await;
        self.write_artifact_id_field(work_item.id, ArtifactKind::Task, created.id).await?;

        self.trace_event(&format!("work item {} created as task {}", work_item.id, created.id));
        Ok(())
    }

    /// Update a mapped task from its work item. Tasks never flow outward.
    pub(crate) async fn update_task_inbound(
        &self,
        state: &mut ProjectState,
        internal_id: i32,
        external_key: &str,
    ) -> Result<(), EngineError> {
        let Ok(work_item_id) = external_key.parse::<i32>() else {
            self.log_event(
                LogSeverity::Warning,
                &format!("task {internal_id} has non-numeric external key '{external_key}'"),
            );
            return Ok(());
        };
        let work_item = self.wits.work_item(work_item_id).await?;
        let mut task = self.pms.task(internal_id).await?;
        let mut dirty = false;

        let title = work_item.title();
        if differs(&task.name, &title) {
            task.name = title;
            dirty = true;
        }
        let description = description_from_work_item(&work_item);
        if differs(&task.description, &description) {
            task.description = description;
            dirty = true;
        }
        if let Some(status_id) = self.status_from_work_item(state, ArtifactKind::Task, &work_item)
        {
            if task.status_id != status_id {
                task.status_id = status_id;
                dirty = true;
            }
        }
        if let Some(name) = work_item.assigned_to() {
            if let Some(owner_id) = self.user_id_for(state, &name).await {
                if task.owner_id != Some(owner_id) {
                    task.owner_id = Some(owner_id);
                    dirty = true;
                }
            }
        }
        if let Some(iteration_id) = work_item.iteration_id {
            if let Some(release_id) = self.release_for_iteration(state, iteration_id).await {
                if task.release_id != Some(release_id) {
                    task.release_id = Some(release_id);
                    dirty = true;
                }
            }
        }
        if let Some(hours) =
            work_item.field(fields::COMPLETED_WORK).and_then(FieldValue::as_double)
        {
            let minutes = hours_to_minutes(hours);
            if task.actual_effort_minutes != Some(minutes) {
                task.actual_effort_minutes = Some(minutes);
                dirty = true;
            }
        }

        dirty |= self
            .copy_properties_inbound(
                state,
                ArtifactKind::Task,
                &work_item,
                &mut task.custom_properties,
            )
            .await?;

        let task_id = task.id;
        if dirty {
            self.pms.update_task(task).await?;
            self.trace_event(&format!("task {task_id} updated from the external side"));
        }

        self.import_revision_comments(
            state,
            &work_item,
            ArtifactKind::Task,
            task_id,
            DEFAULT_AUTHOR_ID,
        )
        .await
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
