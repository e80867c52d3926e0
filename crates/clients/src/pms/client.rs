// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The internal-service surface consumed by the engine.
//!
//! Sessions are stateful: `authenticate` establishes a session and
//! `connect_project` selects the project all subsequent artifact calls
//! operate in. Sessions can time out between phases, so the engine
//! re-authenticates at phase boundaries.

use super::types::{
    Association, CustomPropertyDefinition, Incident, PmsAttachment, PmsComment, PmsProject,
    PmsUser, Release, Requirement, Task,
};
use crate::error::ClientError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tb_core::ArtifactKind;

#[async_trait]
pub trait PmsClient: Send + Sync {
    /// Establish (or re-establish) an authenticated session.
    async fn authenticate(&self) -> Result<(), ClientError>;

    /// Select the active project for subsequent calls.
    async fn connect_project(&self, project_id: i32) -> Result<(), ClientError>;

    async fn list_projects(&self) -> Result<Vec<PmsProject>, ClientError>;

    /// Incidents created at or after `since`, paged by `start_row`
    /// (1-based) and `page_size`, ordered by creation date.
    async fn list_incidents_created_since(
        &self,
        since: DateTime<Utc>,
        start_row: usize,
        page_size: usize,
    ) -> Result<Vec<Incident>, ClientError>;

    /// Incidents updated at or after `since` but created before it, i.e.
    /// pre-existing records with fresh changes.
    async fn list_incidents_updated_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Incident>, ClientError>;

    async fn incident(&self, id: i32) -> Result<Incident, ClientError>;
    async fn create_incident(&self, incident: Incident) -> Result<Incident, ClientError>;
    async fn update_incident(&self, incident: Incident) -> Result<(), ClientError>;

    async fn task(&self, id: i32) -> Result<Task, ClientError>;
    async fn create_task(&self, task: Task) -> Result<Task, ClientError>;
    async fn update_task(&self, task: Task) -> Result<(), ClientError>;

    async fn requirement(&self, id: i32) -> Result<Requirement, ClientError>;
    async fn create_requirement(&self, requirement: Requirement)
        -> Result<Requirement, ClientError>;
    async fn update_requirement(&self, requirement: Requirement) -> Result<(), ClientError>;

    async fn release(&self, id: i32) -> Result<Release, ClientError>;
    async fn create_release(&self, release: Release) -> Result<Release, ClientError>;

    /// Comments on one artifact, oldest first.
    async fn list_comments(
        &self,
        kind: ArtifactKind,
        artifact_id: i32,
    ) -> Result<Vec<PmsComment>, ClientError>;
    async fn create_comment(
        &self,
        kind: ArtifactKind,
        comment: PmsComment,
    ) -> Result<(), ClientError>;

    /// Attachment metadata for one artifact in ascending-id order.
    async fn list_attachments(
        &self,
        kind: ArtifactKind,
        artifact_id: i32,
    ) -> Result<Vec<PmsAttachment>, ClientError>;
    async fn attachment_data(&self, attachment_id: i32) -> Result<Vec<u8>, ClientError>;
    async fn upload_attachment(
        &self,
        kind: ArtifactKind,
        artifact_id: i32,
        filename: &str,
        author_id: i32,
        data: Vec<u8>,
    ) -> Result<(), ClientError>;
    async fn upload_url_attachment(
        &self,
        kind: ArtifactKind,
        artifact_id: i32,
        url: &str,
        author_id: i32,
    ) -> Result<(), ClientError>;

    async fn list_associations(
        &self,
        kind: ArtifactKind,
        artifact_id: i32,
    ) -> Result<Vec<Association>, ClientError>;
    async fn create_association(&self, association: Association) -> Result<(), ClientError>;

    /// Custom-property slot definitions for one artifact kind in the active
    /// project.
    async fn custom_property_definitions(
        &self,
        kind: ArtifactKind,
    ) -> Result<Vec<CustomPropertyDefinition>, ClientError>;

    async fn user(&self, user_id: i32) -> Result<PmsUser, ClientError>;
    async fn user_by_login(&self, login: &str) -> Result<PmsUser, ClientError>;
}
