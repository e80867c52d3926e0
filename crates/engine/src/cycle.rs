// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-invocation sync pipeline.
//!
//! For each mapped project the engine runs four phases: new internal
//! incidents outward (P1), new external work items inward (P2), updated
//! records on either side (P3), and release-mapping persistence (P4).
//! Mapping buffers flush at phase boundaries. Sessions are re-established
//! before each phase because the internal client can time out between them.
//!
//! Error containment is layered: artifact failures are logged and the batch
//! continues; project failures are logged and the remaining projects run;
//! only the inability to authenticate at all fails the run.

use crate::context::ProjectState;
use crate::error::EngineError;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tb_clients::pms::PmsClient;
use tb_clients::wits::{changed_since, created_since, WitsClient, QUERY_CAP_FALLBACK_DAYS};
use tb_core::{
    first_run_watermark, log_chunked, ArtifactKind, Clock, EventLog, LogSeverity, Mapping,
    RunStatus, SyncConfig, WorkItemClass,
};
use tb_store::{FieldKind, MappingStore};
use tracing::Instrument;

/// Page size for internal incident discovery.
pub const PAGE_SIZE: usize = 100;

/// The synchronization engine. One instance per plug-in configuration;
/// [`SyncEngine::run`] performs one full cycle.
pub struct SyncEngine<P, W, S, C> {
    pub(crate) pms: P,
    pub(crate) wits: W,
    pub(crate) store: S,
    pub(crate) clock: C,
    pub(crate) config: SyncConfig,
    pub(crate) log: Arc<dyn EventLog>,
}

impl<P, W, S, C> SyncEngine<P, W, S, C>
where
    P: PmsClient,
    W: WitsClient,
    S: MappingStore,
    C: Clock,
{
    pub fn new(
        pms: P,
        wits: W,
        store: S,
        config: SyncConfig,
        log: Arc<dyn EventLog>,
        clock: C,
    ) -> Self {
        Self { pms, wits, store, clock, config, log }
    }

    /// Deliver an operator-visible event, mirrored to tracing.
    pub(crate) fn log_event(&self, severity: LogSeverity, message: &str) {
        match severity {
            LogSeverity::Info | LogSeverity::SuccessAudit => tracing::info!("{message}"),
            LogSeverity::Warning => tracing::warn!("{message}"),
            LogSeverity::Error | LogSeverity::FailureAudit => tracing::error!("{message}"),
        }
        log_chunked(self.log.as_ref(), message, severity);
    }

    /// Verbose diagnostics, only delivered when trace logging is enabled.
    pub(crate) fn trace_event(&self, message: &str) {
        tracing::debug!("{message}");
        if self.config.trace_logging {
            log_chunked(self.log.as_ref(), message, LogSeverity::Info);
        }
    }

    /// Run one sync cycle. `last_sync` is the host-persisted watermark
    /// (`None` on first run); `server_time` anchors fallback windows.
    pub async fn run(
        &self,
        last_sync: Option<DateTime<Utc>>,
        server_time: DateTime<Utc>,
    ) -> RunStatus {
        let watermark = last_sync.unwrap_or_else(first_run_watermark);
        self.trace_event(&format!("cycle starting with watermark {watermark}"));

        if let Err(e) = self.pms.authenticate().await {
            self.log_event(LogSeverity::FailureAudit, &format!("internal sign-in failed: {e}"));
            return RunStatus::Error;
        }
        if let Err(e) = self.wits.authenticate().await {
            self.log_event(LogSeverity::FailureAudit, &format!("external sign-in failed: {e}"));
            return RunStatus::Error;
        }

        let projects = match self.store.list_project_mappings().await {
            Ok(projects) => projects,
            Err(e) => {
                self.log_event(LogSeverity::Error, &format!("project mappings unavailable: {e}"));
                return RunStatus::Error;
            }
        };
        let user_mappings = match self.store.list_user_mappings().await {
            Ok(rows) => rows,
            Err(e) => {
                self.log_event(LogSeverity::Error, &format!("user mappings unavailable: {e}"));
                return RunStatus::Error;
            }
        };
        // Read once per cycle; immutable for the rest of the run
        let roster = match self.wits.users().await {
            Ok(roster) => roster,
            Err(e) => {
                self.log_event(LogSeverity::Warning, &format!("user roster unavailable: {e}"));
                Vec::new()
            }
        };

        let mut statuses = Vec::with_capacity(projects.len());
        for project in &projects {
            let span = tracing::info_span!(
                "sync.project",
                project_id = project.internal_id,
                project = %project.external_key,
            );
            let status = self
                .run_project(project, &user_mappings, &roster, watermark, server_time)
                .instrument(span)
                .await;
            statuses.push(status);
        }

        let overall = aggregate(&statuses);
        self.log_event(
            match overall {
                RunStatus::Error => LogSeverity::FailureAudit,
                _ => LogSeverity::SuccessAudit,
            },
            &format!("cycle finished: {overall}"),
        );
        overall
    }

    async fn run_project(
        &self,
        project: &Mapping,
        user_mappings: &[Mapping],
        roster: &[tb_clients::wits::WitsUser],
        watermark: DateTime<Utc>,
        server_time: DateTime<Utc>,
    ) -> RunStatus {
        let mut state = ProjectState::new(project.internal_id, project.external_key.clone());
        state.user_mappings = user_mappings.to_vec();
        state.roster = roster.to_vec();
        let mut status = RunStatus::Success;

        if self.reconnect(&state).await.is_err() {
            return RunStatus::Error;
        }
        if let Err(e) = self.load_project_tables(&mut state).await {
            self.log_event(
                LogSeverity::Error,
                &format!("project {} tables unavailable: {e}", state.project_id),
            );
            return RunStatus::Error;
        }

        // P1: new internal incidents outward
        self.phase_outbound_new(&mut state, watermark, &mut status).await;
        self.flush_mappings(&mut state, &mut status).await;

        // P2: new external work items inward
        if self.reconnect(&state).await.is_err() {
            return RunStatus::Error;
        }
        self.phase_inbound_new(&mut state, watermark, server_time, &mut status).await;
        self.flush_mappings(&mut state, &mut status).await;

        // P3: updates on either side
        if self.reconnect(&state).await.is_err() {
            return RunStatus::Error;
        }
        self.phase_updates(&mut state, watermark, server_time, &mut status).await;
        self.flush_mappings(&mut state, &mut status).await;

        // P4: retired release rows
        self.flush_release_removals(&mut state, &mut status).await;
        status
    }

    /// Re-establish both sessions and reselect the project. A single
    /// attempt; failure is fatal for this project only.
    async fn reconnect(&self, state: &ProjectState) -> Result<(), ()> {
        let result = async {
            self.pms.authenticate().await?;
            self.pms.connect_project(state.project_id).await?;
            self.wits.authenticate().await
        }
        .await;
        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                self.log_event(
                    LogSeverity::Error,
                    &format!("project {} reconnect failed: {e}", state.project_id),
                );
                Err(())
            }
        }
    }

    pub(crate) async fn load_project_tables(
        &self,
        state: &mut ProjectState,
    ) -> Result<(), EngineError> {
        for kind in [
            ArtifactKind::Incident,
            ArtifactKind::Task,
            ArtifactKind::Requirement,
            ArtifactKind::Release,
        ] {
            let rows = self.store.list_artifact_mappings(state.project_id, kind).await?;
            state.artifact_mappings.insert(kind, rows);
        }

        let tables = [
            (ArtifactKind::Incident, FieldKind::Priority),
            (ArtifactKind::Incident, FieldKind::Severity),
            (ArtifactKind::Incident, FieldKind::Status),
            (ArtifactKind::Incident, FieldKind::Type),
            (ArtifactKind::Task, FieldKind::Status),
            (ArtifactKind::Requirement, FieldKind::Status),
            (ArtifactKind::Requirement, FieldKind::Importance),
        ];
        for (kind, field) in tables {
            let rows =
                self.store.list_field_value_mappings(state.project_id, kind, field).await?;
            state.field_values.insert((kind, field), rows);
        }

        for kind in [ArtifactKind::Incident, ArtifactKind::Requirement] {
            let defs = self.pms.custom_property_definitions(kind).await?;
            state.property_definitions.insert(kind, defs);
        }
        let task_kind = self.property_kind_for(ArtifactKind::Task);
        if task_kind == ArtifactKind::Task {
            let defs = self.pms.custom_property_definitions(ArtifactKind::Task).await?;
            state.property_definitions.insert(ArtifactKind::Task, defs);
        }
        Ok(())
    }

    async fn phase_outbound_new(
        &self,
        state: &mut ProjectState,
        watermark: DateTime<Utc>,
        status: &mut RunStatus,
    ) {
        let mut start_row = 1;
        loop {
            let page = match self
                .pms
                .list_incidents_created_since(watermark, start_row, PAGE_SIZE)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    self.log_event(
                        LogSeverity::Error,
                        &format!("incident discovery failed: {e}"),
                    );
                    status.escalate(RunStatus::Warning);
                    return;
                }
            };
            let count = page.len();
            for incident in page {
                let incident_id = incident.id;
                if let Err(e) = self.create_incident_outbound(state, &incident).await {
                    self.report_artifact_error(
                        status,
                        &format!("incident {incident_id} not synced outward: {e}"),
                        &e,
                    );
                }
            }
            if count < PAGE_SIZE {
                break;
            }
            start_row += PAGE_SIZE;
        }
    }

    async fn phase_inbound_new(
        &self,
        state: &mut ProjectState,
        watermark: DateTime<Utc>,
        server_time: DateTime<Utc>,
        status: &mut RunStatus,
    ) {
        let since = window_start(watermark, self.config.time_offset_hours);
        let project = state.project_name.clone();
        let Some(ids) = self
            .run_discovery(server_time, status, |date| created_since(&project, date), since)
            .await
        else {
            return;
        };

        for id in ids {
            let key = id.to_string();
            let already_mapped = [
                ArtifactKind::Incident,
                ArtifactKind::Task,
                ArtifactKind::Requirement,
            ]
            .iter()
            .any(|kind| state.mapping_for_external(*kind, &key).is_some());
            if already_mapped {
                continue;
            }

            let work_item = match self.wits.work_item(id).await {
                Ok(wi) => wi,
                Err(e) if e.is_not_found() => {
                    self.log_event(LogSeverity::Info, &format!("work item {id} is gone"));
                    continue;
                }
                Err(e) => {
                    self.log_event(
                        LogSeverity::Error,
                        &format!("work item {id} could not be read: {e}"),
                    );
                    status.escalate(RunStatus::Warning);
                    continue;
                }
            };

            let class = WorkItemClass::classify(
                &work_item.work_item_type,
                &self.config.task_work_item_types,
                &self.config.requirement_work_item_types,
            );
            let result = match class {
                WorkItemClass::Task => self.create_task_inbound(state, &work_item).await,
                WorkItemClass::Requirement => {
                    self.create_requirement_inbound(state, &work_item).await
                }
                WorkItemClass::Incident => self.create_incident_inbound(state, &work_item).await,
            };
            if let Err(e) = result {
                self.report_artifact_error(
                    status,
                    &format!("work item {id} not synced inward: {e}"),
                    &e,
                );
            }
        }
    }

    async fn phase_updates(
        &self,
        state: &mut ProjectState,
        watermark: DateTime<Utc>,
        server_time: DateTime<Utc>,
        status: &mut RunStatus,
    ) {
        let mut incidents: Vec<(i32, String)> = Vec::new();
        let mut tasks: Vec<(i32, String)> = Vec::new();
        let mut requirements: Vec<(i32, String)> = Vec::new();
        let mut seen: HashSet<(ArtifactKind, i32)> = HashSet::new();

        match self.pms.list_incidents_updated_since(watermark).await {
            Ok(updated) => {
                for incident in updated {
                    if let Some(mapping) = state.mapping_for(ArtifactKind::Incident, incident.id) {
                        if seen.insert((ArtifactKind::Incident, incident.id)) {
                            incidents.push((incident.id, mapping.external_key.clone()));
                        }
                    }
                }
            }
            Err(e) => {
                self.log_event(
                    LogSeverity::Error,
                    &format!("updated-incident discovery failed: {e}"),
                );
                status.escalate(RunStatus::Warning);
            }
        }

        let since = window_start(watermark, self.config.time_offset_hours);
        let project = state.project_name.clone();
        if let Some(ids) = self
            .run_discovery(server_time, status, |date| changed_since(&project, date), since)
            .await
        {
            for id in ids {
                let key = id.to_string();
                for (kind, bucket) in [
                    (ArtifactKind::Incident, &mut incidents),
                    (ArtifactKind::Task, &mut tasks),
                    (ArtifactKind::Requirement, &mut requirements),
                ] {
                    if let Some(mapping) = state.mapping_for_external(kind, &key) {
                        if seen.insert((kind, mapping.internal_id)) {
                            bucket.push((mapping.internal_id, key.clone()));
                        }
                    }
                }
            }
        }

        for (internal_id, external_key) in incidents {
            if let Err(e) = self.merge_incident(state, internal_id, &external_key).await {
                self.report_artifact_error(
                    status,
                    &format!("incident {internal_id} not reconciled: {e}"),
                    &e,
                );
            }
        }
        for (internal_id, external_key) in tasks {
            if let Err(e) = self.update_task_inbound(state, internal_id, &external_key).await {
                self.report_artifact_error(
                    status,
                    &format!("task {internal_id} not reconciled: {e}"),
                    &e,
                );
            }
        }
        for (internal_id, external_key) in requirements {
            if let Err(e) =
                self.update_requirement_inbound(state, internal_id, &external_key).await
            {
                self.report_artifact_error(
                    status,
                    &format!("requirement {internal_id} not reconciled: {e}"),
                    &e,
                );
            }
        }
    }

    /// Run a discovery query; on a result-cap error, retry once with a
    /// 2-day window anchored at the server time.
    async fn run_discovery(
        &self,
        server_time: DateTime<Utc>,
        status: &mut RunStatus,
        query_for: impl Fn(NaiveDate) -> String,
        since: NaiveDate,
    ) -> Option<Vec<i32>> {
        match self.wits.run_query(&query_for(since)).await {
            Ok(ids) => Some(ids),
            Err(e) if e.is_query_cap() => {
                let fallback = (server_time - Duration::days(QUERY_CAP_FALLBACK_DAYS)).date_naive();
                self.log_event(
                    LogSeverity::Warning,
                    &format!("query hit the result cap; retrying from {fallback}"),
                );
                status.escalate(RunStatus::Warning);
                match self.wits.run_query(&query_for(fallback)).await {
                    Ok(ids) => Some(ids),
                    Err(e) => {
                        self.log_event(
                            LogSeverity::Error,
                            &format!("fallback query failed: {e}"),
                        );
                        None
                    }
                }
            }
            Err(e) => {
                self.log_event(LogSeverity::Error, &format!("discovery query failed: {e}"));
                status.escalate(RunStatus::Warning);
                None
            }
        }
    }

    async fn flush_mappings(&self, state: &mut ProjectState, status: &mut RunStatus) {
        for (kind, rows) in state.take_pending_mappings() {
            if let Err(e) = self.store.add_artifact_mappings(kind, &rows).await {
                self.log_event(
                    LogSeverity::Error,
                    &format!("could not persist {} {kind} mappings: {e}", rows.len()),
                );
                status.escalate(RunStatus::Warning);
            } else {
                self.trace_event(&format!("persisted {} {kind} mappings", rows.len()));
            }
        }
    }

    async fn flush_release_removals(&self, state: &mut ProjectState, status: &mut RunStatus) {
        let retired = state.take_retired_releases();
        if retired.is_empty() {
            return;
        }
        if let Err(e) =
            self.store.remove_artifact_mappings(ArtifactKind::Release, &retired).await
        {
            self.log_event(
                LogSeverity::Error,
                &format!("could not retire {} release mappings: {e}", retired.len()),
            );
            status.escalate(RunStatus::Warning);
        }
    }

    fn report_artifact_error(&self, status: &mut RunStatus, message: &str, error: &EngineError) {
        if error.is_missing_counterpart() {
            self.log_event(LogSeverity::Info, message);
        } else {
            self.log_event(LogSeverity::Error, message);
            status.escalate(RunStatus::Warning);
        }
    }
}

/// Day-precision window start for external discovery, widened by the
/// configured offset.
fn window_start(watermark: DateTime<Utc>, offset_hours: i32) -> NaiveDate {
    (watermark - Duration::hours(offset_hours as i64)).date_naive()
}

fn aggregate(statuses: &[RunStatus]) -> RunStatus {
    if statuses.is_empty() {
        return RunStatus::Success;
    }
    if statuses.iter().all(|s| *s == RunStatus::Error) {
        return RunStatus::Error;
    }
    if statuses.iter().any(|s| *s != RunStatus::Success) {
        return RunStatus::Warning;
    }
    RunStatus::Success
}

#[cfg(test)]
#[path = "cycle_tests.rs"]
mod tests;
