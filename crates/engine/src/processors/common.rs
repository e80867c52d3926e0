// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helpers shared by the per-kind processors.

use crate::context::ProjectState;
use crate::cycle::SyncEngine;
use crate::error::EngineError;
use tb_clients::pms::{PmsClient, PmsComment};
use tb_clients::wits::{fields, FieldValue, WitsClient, WitsFieldType, WorkItem};
use tb_core::{wits_local_to_utc, ArtifactKind, Clock, LogSeverity};
use tb_store::MappingStore;

/// Description used when the work item has no description at all.
pub(crate) const EMPTY_DESCRIPTION: &str = "Empty Description in TFS";

/// Author used when a revision or record author cannot be resolved.
pub(crate) const DEFAULT_AUTHOR_ID: i32 = 1;

/// Null-safe trimmed inequality, the change test for every copied field.
pub(crate) fn differs(a: &str, b: &str) -> bool {
    a.trim() != b.trim()
}

/// Completed work is recorded in fractional hours externally and integer
/// minutes internally.
pub(crate) fn hours_to_minutes(hours: f64) -> i32 {
    (hours * 60.0).round() as i32
}

/// Pick the work item's description: rich-text fields win, then plain text,
/// then the literal placeholder.
pub(crate) fn description_from_work_item(work_item: &WorkItem) -> String {
    for name in [fields::REPRO_STEPS, fields::DESCRIPTION_HTML, fields::DESCRIPTION] {
        if let Some(text) = work_item.field_text(name) {
            if !text.trim().is_empty() {
                return text;
            }
        }
    }
    EMPTY_DESCRIPTION.to_string()
}

/// Coerce a textual value into the destination field's declared type.
pub(crate) fn typed_field_value(field_type: WitsFieldType, text: &str) -> FieldValue {
    match field_type {
        WitsFieldType::Integer => match text.trim().parse::<i64>() {
            Ok(i) => FieldValue::Integer(i),
            Err(_) => FieldValue::Text(text.to_string()),
        },
        WitsFieldType::Double => match text.trim().parse::<f64>() {
            Ok(d) => FieldValue::Double(d),
            Err(_) => FieldValue::Text(text.to_string()),
        },
        _ => FieldValue::Text(text.to_string()),
    }
}

impl<P, W, S, C> SyncEngine<P, W, S, C>
where
    P: PmsClient,
    W: WitsClient,
    S: MappingStore,
    C: Clock,
{
    /// Field layout for a work-item type, cached per project.
    pub(crate) async fn type_definition(
        &self,
        state: &mut ProjectState,
        type_name: &str,
    ) -> Result<tb_clients::wits::WorkItemTypeDefinition, EngineError> {
        if let Some(def) = state.type_definitions.get(type_name) {
            return Ok(def.clone());
        }
        let def =
            self.wits.work_item_type_definition(&state.project_name, type_name).await?;
        state.type_definitions.insert(type_name.to_string(), def.clone());
        Ok(def)
    }

    /// Insert the work item's history entries as internal comments,
    /// skipping any whose trimmed text already exists.
    pub(crate) async fn import_revision_comments(
        &self,
        state: &mut ProjectState,
        work_item: &WorkItem,
        kind: ArtifactKind,
        artifact_id: i32,
        fallback_author_id: i32,
    ) -> Result<(), EngineError> {
        let existing: Vec<String> = self
            .pms
            .list_comments(kind, artifact_id)
            .await?
            .into_iter()
            .map(|c| c.text)
            .collect();

        let revisions: Vec<_> = work_item
            .history_revisions()
            .into_iter()
            .map(|r| (r.history.clone(), r.changed_by.clone(), r.changed_date))
            .collect();
        for (history, changed_by, changed_date) in revisions {
            if existing.iter().any(|c| !differs(c, &history)) {
                continue;
            }
            let author_id =
                self.user_id_for(state, &changed_by).await.unwrap_or(fallback_author_id);
            let comment = PmsComment {
                artifact_id,
                text: history,
                creator_id: author_id,
                creation_date: wits_local_to_utc(changed_date, self.config.time_offset_hours),
            };
            self.pms.create_comment(kind, comment).await?;
        }
        Ok(())
    }

    /// Insert internal comments missing from the work item's history.
    /// Each insert is a save; the history field itself never persists.
    pub(crate) async fn export_comments_to_work_item(
        &self,
        kind: ArtifactKind,
        artifact_id: i32,
        work_item: &WorkItem,
    ) -> Result<(), EngineError> {
        let comments = self.pms.list_comments(kind, artifact_id).await?;
        if comments.is_empty() {
            return Ok(());
        }
        let existing: Vec<String> =
            work_item.history_revisions().iter().map(|r| r.history.clone()).collect();

        let mut item = work_item.clone();
        for comment in comments {
            if existing.iter().any(|h| !differs(h, &comment.text)) {
                continue;
            }
            item.set_field(fields::HISTORY, FieldValue::Text(comment.text.clone()));
            item = self.wits.save_work_item(&item).await?;
        }
        Ok(())
    }

    /// Write the prefixed internal id into the configured external field.
    pub(crate) async fn write_artifact_id_field(
        &self,
        work_item_id: i32,
        kind: ArtifactKind,
        internal_id: i32,
    ) -> Result<(), EngineError> {
        let Some(field_name) = self.config.artifact_id_field.as_deref() else {
            return Ok(());
        };
        let Some(prefixed) = kind.prefixed_id(internal_id) else {
            return Ok(());
        };
        let mut item = self.wits.work_item(work_item_id).await?;
        if item.field_text(field_name).as_deref() == Some(prefixed.as_str()) {
            return Ok(());
        }
        item.set_field(field_name, FieldValue::Text(prefixed));
        match self.wits.save_work_item(&item).await {
            Ok(_) => Ok(()),
            Err(e) => {
                self.log_event(
                    LogSeverity::Warning,
                    &format!("artifact id field '{field_name}' not written: {e}"),
                );
                Ok(())
            }
        }
    }

    /// Internal id a previous run wrote back into the work item's
    /// artifact-id field.
    ///
    /// A run can crash between creating the internal record and flushing
    /// its mapping; the prefixed id on the live work item is the surviving
    /// evidence, and the inbound creators consult it before creating a
    /// duplicate.
    pub(crate) fn written_back_internal_id(
        &self,
        work_item: &WorkItem,
        kind: ArtifactKind,
    ) -> Option<i32> {
        let field = self.config.artifact_id_field.as_deref()?;
        let prefix = kind.id_prefix()?;
        let text = work_item.field_text(field)?;
        text.trim().strip_prefix(prefix)?.parse().ok()
    }

    /// Compose the external status key from the work item's state and
    /// reason and translate it, falling back to the bare state.
    pub(crate) fn status_from_work_item(
        &self,
        state: &ProjectState,
        kind: ArtifactKind,
        work_item: &WorkItem,
    ) -> Option<i32> {
        let table = state.field_value_table(kind, tb_store::FieldKind::Status);
        let composite = format!("{}+{}", work_item.state(), work_item.reason());
        crate::translate::external_to_internal(table, &composite)
            .or_else(|| crate::translate::external_to_internal(table, &work_item.state()))
    }
}

#[cfg(test)]
#[path = "common_tests.rs"]
mod tests;
