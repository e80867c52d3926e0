// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Incident flows: the only kind created outward and the only kind merged
//! in both directions.

use super::common::{
    description_from_work_item, differs, typed_field_value, DEFAULT_AUTHOR_ID,
};
use crate::context::ProjectState;
use crate::cycle::SyncEngine;
use crate::error::EngineError;
use crate::text::html_to_text;
use tb_clients::pms::{artifact_url, Incident, PmsClient};
use tb_clients::wits::{
    field_equals, fields, FieldValue, WitsClient, WorkItem, WorkItemLink,
};
use tb_clients::ClientError;
use tb_core::{
    wits_local_to_utc, ArtifactKind, Clock, LogSeverity, Mapping, StateReason,
};
use tb_store::{FieldKind, MappingStore};

impl<P, W, S, C> SyncEngine<P, W, S, C>
where
    P: PmsClient,
    W: WitsClient,
    S: MappingStore,
    C: Clock,
{
    /// Create a work item for a new internal incident.
    ///
    /// The save is two-step: first in the default state, then with the
    /// mapped state and reason, because the external state machine refuses
    /// arbitrary initial transitions. The mapping is buffered before
    /// comments, attachments, and associations are copied so a downstream
    /// failure cannot orphan the work item.
    pub(crate) async fn create_incident_outbound(
        &self,
        state: &mut ProjectState,
        incident: &Incident,
    ) -> Result<(), EngineError> {
        if state.mapping_for(ArtifactKind::Incident, incident.id).is_some() {
            self.trace_event(&format!("incident {} is already mapped", incident.id));
            return Ok(());
        }
        // The local table alone cannot be trusted: a crash between a remote
        // create and the phase flush loses the buffered row. Probe the live
        // external side before creating anything.
        if let Some(existing_id) = self.find_existing_work_item(state, incident).await {
            self.log_event(
                LogSeverity::Warning,
                &format!(
                    "incident {} already exists as work item {existing_id}; restoring the mapping",
                    incident.id
                ),
            );
            state.add_mapping(
                ArtifactKind::Incident,
                Mapping::new(state.project_id, incident.id, existing_id.to_string()),
            );
            return Ok(());
        }

        let type_table = state.field_value_table(ArtifactKind::Incident, FieldKind::Type);
        let Some(type_name) =
            crate::translate::internal_to_external(type_table, incident.type_id)
        else {
            return Err(EngineError::UnmappedType { value: incident.type_id.to_string() });
        };
        let status_table = state.field_value_table(ArtifactKind::Incident, FieldKind::Status);
        let Some(status_key) =
            crate::translate::internal_to_external(status_table, incident.status_id)
        else {
            return Err(EngineError::UnmappedStatus { value: incident.status_id.to_string() });
        };
        let target_state = StateReason::parse(&status_key);

        let iteration_id = match incident.detected_release_id {
            Some(release_id) => self.iteration_for_release(state, release_id).await,
            None => None,
        };

        let type_def = self.type_definition(state, &type_name).await?;
        let mut work_item = WorkItem::new(state.project_name.clone(), type_name.clone());
        work_item.set_field(fields::TITLE, FieldValue::Text(incident.name.clone()));

        if type_def.has_field(fields::REPRO_STEPS) {
            work_item
                .set_field(fields::REPRO_STEPS, FieldValue::Text(incident.description.clone()));
        } else if type_def.has_field(fields::DESCRIPTION_HTML) {
            work_item.set_field(
                fields::DESCRIPTION_HTML,
                FieldValue::Text(incident.description.clone()),
            );
        } else {
            work_item.set_field(
                fields::DESCRIPTION,
                FieldValue::Text(html_to_text(&incident.description)),
            );
        }
        work_item.iteration_id = iteration_id;

        if let Some(field_name) = self.config.artifact_id_field.clone() {
            if type_def.has_field(&field_name) {
                if let Some(prefixed) = ArtifactKind::Incident.prefixed_id(incident.id) {
                    work_item.set_field(field_name, FieldValue::Text(prefixed));
                }
            }
        }
        if let Some(field_name) = self.config.opener_field.clone() {
            if type_def.has_field(&field_name) {
                if let Some(display) = self.user_display_for(state, incident.opener_id).await {
                    work_item.set_field(field_name, FieldValue::Text(display));
                }
            }
        }

        if let Some(priority_id) = incident.priority_id {
            if let Some(value) = self.value_to_external(
                state,
                ArtifactKind::Incident,
                FieldKind::Priority,
                priority_id,
            ) {
                if let Some(def) = type_def.field(fields::PRIORITY) {
                    work_item
                        .set_field(fields::PRIORITY, typed_field_value(def.field_type, &value));
                }
            }
        }
        if let Some(severity_id) = incident.severity_id {
            if let Some(value) = self.value_to_external(
                state,
                ArtifactKind::Incident,
                FieldKind::Severity,
                severity_id,
            ) {
                if let Some(def) = type_def.field(fields::SEVERITY) {
                    work_item
                        .set_field(fields::SEVERITY, typed_field_value(def.field_type, &value));
                }
            }
        }
        if let Some(owner_id) = incident.owner_id {
            if let Some(display) = self.user_display_for(state, owner_id).await {
                work_item.set_field(fields::ASSIGNED_TO, FieldValue::Text(display));
            }
        }

        self.copy_properties_outbound(
            state,
            ArtifactKind::Incident,
            &incident.custom_properties,
            &mut work_item,
            &type_def,
        )
        .await?;

        // Save in the default state first
        let saved = match self.wits.save_work_item(&work_item).await {
            Ok(saved) => saved,
            Err(ClientError::Validation { message, fields: bad_fields }) => {
                self.report_invalid_fields(incident.id, &message, &bad_fields);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        // Then transition to the mapped state and reason together
        let mut staged = saved.clone();
        staged.set_field(fields::STATE, FieldValue::Text(target_state.state.clone()));
        if !target_state.reason.is_empty() {
            staged.set_field(fields::REASON, FieldValue::Text(target_state.reason.clone()));
        }
        let saved = match self.wits.save_work_item(&staged).await {
            Ok(transitioned) => transitioned,
            Err(ClientError::Validation { message, fields: bad_fields }) => {
                // The item exists in its default state; keep going with it
                self.report_invalid_fields(incident.id, &message, &bad_fields);
                saved
            }
            Err(other) => return Err(other.into()),
        };

        let url = artifact_url(
            &self.config.pms_base_url,
            ArtifactKind::Incident,
            state.project_id,
            incident.id,
        );
        if let Err(e) = self.wits.add_hyperlink(saved.id, &url).await {
            self.log_event(LogSeverity::Warning, &format!("backlink not added: {e}"));
        }

        // Mapping first; everything after this survives partial failure
        state.add_mapping(
            ArtifactKind::Incident,
            Mapping::new(state.project_id, incident.id, saved.id.to_string()),
        );

        self.export_comments_to_work_item(ArtifactKind::Incident, incident.id, &saved).await?;
        self.copy_attachments_outbound(ArtifactKind::Incident, incident.id, saved.id).await;
        self.copy_associations_outbound(state, ArtifactKind::Incident, incident.id, saved.id)
            .await;

        self.trace_event(&format!(
            "incident {} created as work item {}",
            incident.id, saved.id
        ));
        Ok(())
    }

    /// Probe the external side for a work item a crashed run already
    /// created for this incident. Matches on the artifact-id field when
    /// one is configured; otherwise candidates are found by title and
    /// confirmed by the backlink hyperlink.
    async fn find_existing_work_item(
        &self,
        state: &ProjectState,
        incident: &Incident,
    ) -> Option<i32> {
        let query = match (
            self.config.artifact_id_field.as_deref(),
            ArtifactKind::Incident.prefixed_id(incident.id),
        ) {
            (Some(field), Some(prefixed)) => {
                field_equals(&state.project_name, field, &prefixed)
            }
            _ => field_equals(&state.project_name, fields::TITLE, &incident.name),
        };
        let ids = match self.wits.run_query(&query).await {
            Ok(ids) => ids,
            Err(e) => {
                self.log_event(
                    LogSeverity::Warning,
                    &format!("duplicate probe for incident {} failed: {e}", incident.id),
                );
                return None;
            }
        };
        if self.config.artifact_id_field.is_some() {
            return ids.into_iter().next();
        }

        // Titles collide; only the backlink proves identity
        let url = artifact_url(
            &self.config.pms_base_url,
            ArtifactKind::Incident,
            state.project_id,
            incident.id,
        );
        for id in ids {
            if let Ok(candidate) = self.wits.work_item(id).await {
                let backlinked = candidate
                    .links
                    .iter()
                    .any(|l| matches!(l, WorkItemLink::Hyperlink(u) if *u == url));
                if backlinked {
                    return Some(id);
                }
            }
        }
        None
    }

    fn report_invalid_fields(&self, incident_id: i32, message: &str, bad_fields: &[String]) {
        self.log_event(
            LogSeverity::Error,
            &format!("incident {incident_id} failed field validation: {message}"),
        );
        for field in bad_fields {
            self.log_event(
                LogSeverity::Error,
                &format!("incident {incident_id}: field '{field}' rejected"),
            );
        }
    }

    /// Create an internal incident for a work item whose type matched
    /// neither configured list.
    pub(crate) async fn create_incident_inbound(
        &self,
        state: &mut ProjectState,
        work_item: &WorkItem,
    ) -> Result<(), EngineError> {
        if state
            .mapping_for_external(ArtifactKind::Incident, &work_item.id.to_string())
            .is_some()
        {
            return Ok(());
        }
        // The prefixed id written back by a crashed run identifies an
        // internal record whose mapping was never flushed
        if let Some(internal_id) =
            self.written_back_internal_id(work_item, ArtifactKind::Incident)
        {
            if let Ok(existing) = self.pms.incident(internal_id).await {
                if existing.project_id == state.project_id {
                    self.log_event(
                        LogSeverity::Warning,
                        &format!(
                            "work item {} is already incident {internal_id}; restoring the mapping",
                            work_item.id
                        ),
                    );
                    state.add_mapping(
                        ArtifactKind::Incident,
                        Mapping::new(state.project_id, internal_id, work_item.id.to_string()),
                    );
                    return Ok(());
                }
            }
        }

        let status_id = match self.status_from_work_item(state, ArtifactKind::Incident, work_item)
        {
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
        let priority_id = match work_item.field_text(fields::PRIORITY) {
            Some(text) if !text.trim().is_empty() => self.value_to_internal(
                state,
                ArtifactKind::Incident,
                FieldKind::Priority,
                text.trim(),
            ),
            _ => None,
        };
        let severity_id = match work_item.field_text(fields::SEVERITY) {
            Some(text) if !text.trim().is_empty() => self.value_to_internal(
                state,
                ArtifactKind::Incident,
                FieldKind::Severity,
                text.trim(),
            ),
            _ => None,
        };

        let opener_id = match work_item.field_text(fields::CREATED_BY) {
            Some(name) => self.user_id_for(state, &name).await.unwrap_or(DEFAULT_AUTHOR_ID),
            None => DEFAULT_AUTHOR_ID,
        };
        let owner_id = match work_item.assigned_to() {
            Some(name) => self.user_id_for(state, &name).await,
            None => None,
        };

        let detected_release_id = match work_item.iteration_id {
            Some(iteration_id) => self.release_for_iteration(state, iteration_id).await,
            None => None,
        };

        let offset = self.config.time_offset_hours;
        let now = self.clock.now_utc();
        let creation_date =
            work_item.created_date().map(|d| wits_local_to_utc(d, offset)).unwrap_or(now);
        let last_update_date =
            work_item.changed_date().map(|d| wits_local_to_utc(d, offset)).unwrap_or(now);

        let mut custom_properties = Default::default();
        self.copy_properties_inbound(
            state,
            ArtifactKind::Incident,
            work_item,
            &mut custom_properties,
        )
        .await?;

        let type_id = crate::translate::external_to_internal(
            state.field_value_table(ArtifactKind::Incident, FieldKind::Type),
            &work_item.work_item_type,
        )
        .unwrap_or(0);

        let incident = Incident {
            id: 0,
            project_id: state.project_id,
            name: work_item.title(),
            description: description_from_work_item(work_item),
            status_id,
            type_id,
            priority_id,
            severity_id,
            opener_id,
            owner_id,
            detected_release_id,
            start_date: work_item
                .field(fields::START_DATE)
                .and_then(FieldValue::as_date)
                .map(|d| wits_local_to_utc(d, offset)),
            closed_date: None,
            creation_date,
            last_update_date,
            custom_properties,
        };
        let created = self.pms.create_incident(incident).await?;

        state.add_mapping(
            ArtifactKind::Incident,
            Mapping::new(state.project_id, created.id, work_item.id.to_string()),
        );

        self.import_revision_comments(
            state,
            work_item,
            ArtifactKind::Incident,
            created.id,
            opener_id,
        )
        .await?;
        self.copy_links_inbound(state, work_item, ArtifactKind::Incident, created.id, opener_id)
            .await;
        self.write_artifact_id_field(work_item.id, ArtifactKind::Incident, created.id).await?;

        self.trace_event(&format!(
            "work item {} created as incident {}",
            work_item.id, created.id
        ));
        Ok(())
    }

    /// Reconcile a mapped incident. The side with the later offset-adjusted
    /// update wins; ties go to the external side. Nothing is saved when no
    /// field actually changed, which is what keeps consecutive cycles from
    /// oscillating.
    pub(crate) async fn merge_incident(
        &self,
        state: &mut ProjectState,
        internal_id: i32,
        external_key: &str,
    ) -> Result<(), EngineError> {
        let Ok(work_item_id) = external_key.parse::<i32>() else {
            self.log_event(
                LogSeverity::Warning,
                &format!("incident {internal_id} has non-numeric external key '{external_key}'"),
            );
            return Ok(());
        };
        let work_item = self.wits.work_item(work_item_id).await?;
        let incident = self.pms.incident(internal_id).await?;

        let offset = self.config.time_offset_hours;
        let wits_updated = work_item
            .changed_date()
            .or_else(|| work_item.created_date())
            .map(|d| wits_local_to_utc(d, offset));

        match wits_updated {
            Some(wits_utc) if wits_utc >= incident.last_update_date => {
                self.trace_event(&format!(
                    "incident {internal_id}: external side is newer ({wits_utc} >= {})",
                    incident.last_update_date
                ));
                self.merge_incident_inbound(state, &work_item, incident).await
            }
            _ => {
                self.trace_event(&format!("incident {internal_id}: internal side is newer"));
                self.merge_incident_outbound(state, &incident, work_item).await
            }
        }
    }

    /// Inbound half of the merge: external fields onto the internal record.
    async fn merge_incident_inbound(
        &self,
        state: &mut ProjectState,
        work_item: &WorkItem,
        mut incident: Incident,
    ) -> Result<(), EngineError> {
        let mut dirty = false;

        let title = work_item.title();
        if differs(&incident.name, &title) {
            incident.name = title;
            dirty = true;
        }
        let description = description_from_work_item(work_item);
        if differs(&incident.description, &description) {
            incident.description = description;
            dirty = true;
        }

        match self.status_from_work_item(state, ArtifactKind::Incident, work_item) {
            Some(status_id) => {
                if status_id != incident.status_id {
                    incident.status_id = status_id;
                    dirty = true;
                }
            }
            None => {
                let composite =
                    format!("{}+{}", work_item.state(), work_item.reason());
                return Err(EngineError::UnmappedStatus { value: composite });
            }
        }

        if let Some(text) = work_item.field_text(fields::PRIORITY) {
            if !text.trim().is_empty() {
                if let Some(priority_id) = self.value_to_internal(
                    state,
                    ArtifactKind::Incident,
                    FieldKind::Priority,
                    text.trim(),
                ) {
                    if incident.priority_id != Some(priority_id) {
                        incident.priority_id = Some(priority_id);
                        dirty = true;
                    }
                }
            }
        }
        if let Some(text) = work_item.field_text(fields::SEVERITY) {
            if !text.trim().is_empty() {
                if let Some(severity_id) = self.value_to_internal(
                    state,
                    ArtifactKind::Incident,
                    FieldKind::Severity,
                    text.trim(),
                ) {
                    if incident.severity_id != Some(severity_id) {
                        incident.severity_id = Some(severity_id);
                        dirty = true;
                    }
                }
            }
        }
        if let Some(name) = work_item.assigned_to() {
            if let Some(owner_id) = self.user_id_for(state, &name).await {
                if incident.owner_id != Some(owner_id) {
                    incident.owner_id = Some(owner_id);
                    dirty = true;
                }
            }
        }
        if let Some(iteration_id) = work_item.iteration_id {
            if let Some(release_id) = self.release_for_iteration(state, iteration_id).await {
                if incident.detected_release_id != Some(release_id) {
                    incident.detected_release_id = Some(release_id);
                    dirty = true;
                }
            }
        }

        dirty |= self
            .copy_properties_inbound(
                state,
                ArtifactKind::Incident,
                work_item,
                &mut incident.custom_properties,
            )
            .await?;

        let incident_id = incident.id;
        if dirty {
            self.pms.update_incident(incident).await?;
            self.trace_event(&format!("incident {incident_id} updated from the external side"));
        }

        self.import_revision_comments(
            state,
            work_item,
            ArtifactKind::Incident,
            incident_id,
            DEFAULT_AUTHOR_ID,
        )
        .await
    }

    /// Outbound half of the merge: internal fields onto the work item. The
    /// item already exists, so state and reason are set directly.
    async fn merge_incident_outbound(
        &self,
        state: &mut ProjectState,
        incident: &Incident,
        work_item: WorkItem,
    ) -> Result<(), EngineError> {
        let status_table = state.field_value_table(ArtifactKind::Incident, FieldKind::Status);
        let Some(status_key) =
            crate::translate::internal_to_external(status_table, incident.status_id)
        else {
            return Err(EngineError::UnmappedStatus { value: incident.status_id.to_string() });
        };
        let target_state = StateReason::parse(&status_key);

        let type_def = self.type_definition(state, &work_item.work_item_type.clone()).await?;
        let before = (work_item.sorted_fields(), work_item.area_id, work_item.iteration_id);
        let mut item = work_item;

        item.set_field(fields::TITLE, FieldValue::Text(incident.name.clone()));
        if type_def.has_field(fields::REPRO_STEPS) {
            item.set_field(fields::REPRO_STEPS, FieldValue::Text(incident.description.clone()));
        } else if type_def.has_field(fields::DESCRIPTION_HTML) {
            item.set_field(
                fields::DESCRIPTION_HTML,
                FieldValue::Text(incident.description.clone()),
            );
        } else {
            item.set_field(
                fields::DESCRIPTION,
                FieldValue::Text(html_to_text(&incident.description)),
            );
        }

        item.set_field(fields::STATE, FieldValue::Text(target_state.state.clone()));
        if !target_state.reason.is_empty() {
            item.set_field(fields::REASON, FieldValue::Text(target_state.reason.clone()));
        }

        if let Some(priority_id) = incident.priority_id {
            if let Some(value) = self.value_to_external(
                state,
                ArtifactKind::Incident,
                FieldKind::Priority,
                priority_id,
            ) {
                if let Some(def) = type_def.field(fields::PRIORITY) {
                    item.set_field(fields::PRIORITY, typed_field_value(def.field_type, &value));
                }
            }
        }
        if let Some(severity_id) = incident.severity_id {
            if let Some(value) = self.value_to_external(
                state,
                ArtifactKind::Incident,
                FieldKind::Severity,
                severity_id,
            ) {
                if let Some(def) = type_def.field(fields::SEVERITY) {
                    item.set_field(fields::SEVERITY, typed_field_value(def.field_type, &value));
                }
            }
        }
        if let Some(owner_id) = incident.owner_id {
            if let Some(display) = self.user_display_for(state, owner_id).await {
                item.set_field(fields::ASSIGNED_TO, FieldValue::Text(display));
            }
        }
        if let Some(release_id) = incident.detected_release_id {
            if let Some(iteration_id) = self.iteration_for_release(state, release_id).await {
                item.iteration_id = Some(iteration_id);
            }
        }

        self.copy_properties_outbound(
            state,
            ArtifactKind::Incident,
            &incident.custom_properties,
            &mut item,
            &type_def,
        )
        .await?;

        let after = (item.sorted_fields(), item.area_id, item.iteration_id);
        if after != before {
            match self.wits.save_work_item(&item).await {
                Ok(saved) => {
                    self.trace_event(&format!(
                        "work item {} updated from the internal side",
                        saved.id
                    ));
                    item = saved;
                }
                Err(ClientError::Validation { message, fields: bad_fields }) => {
                    self.report_invalid_fields(incident.id, &message, &bad_fields);
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.export_comments_to_work_item(ArtifactKind::Incident, incident.id, &item).await
    }
}

#[cfg(test)]
#[path = "incident_tests.rs"]
mod tests;
