// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attachment, hyperlink, and association transfer.
//!
//! Attachment failures never fail the owning artifact: by the time these
//! run, the artifact exists on both sides and its mapping is buffered, so
//! everything here degrades to warnings.

use crate::context::ProjectState;
use crate::cycle::SyncEngine;
use tb_clients::pms::PmsClient;
use tb_clients::wits::{WitsClient, WorkItem, WorkItemLink};
use tb_core::{ArtifactKind, Clock, LogSeverity};
use tb_store::MappingStore;

impl<P, W, S, C> SyncEngine<P, W, S, C>
where
    P: PmsClient,
    W: WitsClient,
    S: MappingStore,
    C: Clock,
{
    /// Copy internal attachments onto a work item. URL attachments become
    /// hyperlinks; file attachments are materialized to disk and uploaded.
    pub(crate) async fn copy_attachments_outbound(
        &self,
        kind: ArtifactKind,
        artifact_id: i32,
        work_item_id: i32,
    ) {
        let attachments = match self.pms.list_attachments(kind, artifact_id).await {
            Ok(rows) => rows,
            Err(e) => {
                self.log_event(
                    LogSeverity::Warning,
                    &format!("could not list attachments for {kind} {artifact_id}: {e}"),
                );
                return;
            }
        };
        for attachment in attachments {
            let result = match &attachment.url {
                Some(url) => self.wits.add_hyperlink(work_item_id, url).await,
                None => self.transfer_file_outbound(&attachment, work_item_id).await,
            };
            if let Err(e) = result {
                // Typically a size limit; the artifact itself survives
                self.log_event(
                    LogSeverity::Warning,
                    &format!("attachment '{}' not copied: {e}", attachment.filename),
                );
            }
        }
    }

    async fn transfer_file_outbound(
        &self,
        attachment: &tb_clients::pms::PmsAttachment,
        work_item_id: i32,
    ) -> Result<(), tb_clients::ClientError> {
        let data = self.pms.attachment_data(attachment.id).await?;
        let dir = tempfile::tempdir()
            .map_err(|e| tb_clients::ClientError::Transport(format!("temp dir: {e}")))?;
        let path = dir.path().join(&attachment.filename);
        std::fs::write(&path, &data)
            .map_err(|e| tb_clients::ClientError::Transport(format!("temp file: {e}")))?;
        self.wits.upload_attachment(work_item_id, &path).await
    }

    /// Turn internal associations into related-work-item links, for the
    /// association targets that already have mappings.
    pub(crate) async fn copy_associations_outbound(
        &self,
        state: &ProjectState,
        kind: ArtifactKind,
        artifact_id: i32,
        work_item_id: i32,
    ) {
        let associations = match self.pms.list_associations(kind, artifact_id).await {
            Ok(rows) => rows,
            Err(e) => {
                self.log_event(
                    LogSeverity::Warning,
                    &format!("could not list associations for {kind} {artifact_id}: {e}"),
                );
                return;
            }
        };
        for assoc in associations {
            if assoc.dest_kind == ArtifactKind::Release {
                continue;
            }
            let Some(mapping) = state.mapping_for(assoc.dest_kind, assoc.dest_id) else {
                continue;
            };
            let Ok(target_id) = mapping.external_key.parse::<i32>() else {
                continue;
            };
            if let Err(e) =
                self.wits.add_related_link(work_item_id, target_id, &assoc.comment).await
            {
                self.log_event(
                    LogSeverity::Warning,
                    &format!("related link to work item {target_id} not created: {e}"),
                );
            }
        }
    }

    /// Copy a work item's links and attachments onto an internal artifact.
    pub(crate) async fn copy_links_inbound(
        &self,
        state: &ProjectState,
        work_item: &WorkItem,
        kind: ArtifactKind,
        artifact_id: i32,
        author_id: i32,
    ) {
        for link in &work_item.links {
            match link {
                WorkItemLink::Hyperlink(url) => {
                    if let Err(e) =
                        self.pms.upload_url_attachment(kind, artifact_id, url, author_id).await
                    {
                        self.log_event(
                            LogSeverity::Warning,
                            &format!("hyperlink '{url}' not copied: {e}"),
                        );
                    }
                }
                WorkItemLink::Related(target) => {
                    let key = target.to_string();
                    let resolved = [
                        ArtifactKind::Requirement,
                        ArtifactKind::Task,
                        ArtifactKind::Incident,
                    ]
                    .iter()
                    .find_map(|dest| {
                        state
                            .mapping_for_external(*dest, &key)
                            .map(|m| (*dest, m.internal_id))
                    });
                    let Some((dest_kind, dest_id)) = resolved else {
                        continue;
                    };
                    let association = tb_clients::pms::Association {
                        source_kind: kind,
                        source_id: artifact_id,
                        dest_kind,
                        dest_id,
                        comment: String::new(),
                    };
                    if let Err(e) = self.pms.create_association(association).await {
                        self.log_event(
                            LogSeverity::Warning,
                            &format!("association to {dest_kind} {dest_id} not created: {e}"),
                        );
                    }
                }
            }
        }

        for attachment in &work_item.attachments {
            if let Err(e) = self
                .transfer_file_inbound(work_item.id, attachment, kind, artifact_id, author_id)
                .await
            {
                self.log_event(
                    LogSeverity::Warning,
                    &format!("attachment '{}' not copied: {e}", attachment.name),
                );
            }
        }
    }

    async fn transfer_file_inbound(
        &self,
        work_item_id: i32,
        attachment: &tb_clients::wits::WitsAttachment,
        kind: ArtifactKind,
        artifact_id: i32,
        author_id: i32,
    ) -> Result<(), tb_clients::ClientError> {
        let path = self.wits.download_attachment(work_item_id, attachment.id).await?;
        let data = std::fs::read(&path)
            .map_err(|e| tb_clients::ClientError::Transport(format!("read temp: {e}")))?;
        let result = self
            .pms
            .upload_attachment(kind, artifact_id, &attachment.name, author_id, data)
            .await;
        let _ = std::fs::remove_file(&path);
        result
    }
}
