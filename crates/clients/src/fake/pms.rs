// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake internal-service client.

use crate::error::ClientError;
use crate::pms::{
    Association, CustomPropertyDefinition, Incident, PmsAttachment, PmsClient, PmsComment,
    PmsProject, PmsUser, Release, Requirement, Task,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tb_core::ArtifactKind;

#[derive(Default)]
struct PmsState {
    auth_calls: u32,
    fail_auth: bool,
    connected_project: Option<i32>,
    projects: Vec<PmsProject>,
    incidents: HashMap<i32, Incident>,
    tasks: HashMap<i32, Task>,
    requirements: HashMap<i32, Requirement>,
    releases: HashMap<i32, Release>,
    comments: HashMap<(ArtifactKind, i32), Vec<PmsComment>>,
    attachments: HashMap<(ArtifactKind, i32), Vec<PmsAttachment>>,
    attachment_data: HashMap<i32, Vec<u8>>,
    associations: Vec<Association>,
    property_defs: HashMap<ArtifactKind, Vec<CustomPropertyDefinition>>,
    users: HashMap<i32, PmsUser>,
    next_id: i32,
    writes: u32,
}

impl PmsState {
    fn alloc_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn require_session(&self) -> Result<(), ClientError> {
        if self.auth_calls == 0 {
            return Err(ClientError::Auth("no session".into()));
        }
        Ok(())
    }
}

/// In-memory stand-in for the internal service.
#[derive(Clone, Default)]
pub struct FakePmsClient {
    state: Arc<Mutex<PmsState>>,
}

impl FakePmsClient {
    pub fn new() -> Self {
        let client = Self::default();
        client.state.lock().next_id = 1000;
        client
    }

    pub fn fail_auth(&self, fail: bool) {
        self.state.lock().fail_auth = fail;
    }

    pub fn auth_calls(&self) -> u32 {
        self.state.lock().auth_calls
    }

    /// Total create/update calls, for idempotence assertions.
    pub fn write_count(&self) -> u32 {
        self.state.lock().writes
    }

    pub fn seed_project(&self, project: PmsProject) {
        self.state.lock().projects.push(project);
    }

    pub fn seed_incident(&self, incident: Incident) {
        self.state.lock().incidents.insert(incident.id, incident);
    }

    pub fn seed_task(&self, task: Task) {
        self.state.lock().tasks.insert(task.id, task);
    }

    pub fn seed_requirement(&self, requirement: Requirement) {
        self.state.lock().requirements.insert(requirement.id, requirement);
    }

    pub fn seed_release(&self, release: Release) {
        self.state.lock().releases.insert(release.id, release);
    }

    pub fn seed_user(&self, user: PmsUser) {
        self.state.lock().users.insert(user.id, user);
    }

    pub fn seed_comment(&self, kind: ArtifactKind, comment: PmsComment) {
        self.state.lock().comments.entry((kind, comment.artifact_id)).or_default().push(comment);
    }

    pub fn seed_attachment(
        &self,
        kind: ArtifactKind,
        artifact_id: i32,
        attachment: PmsAttachment,
        data: Vec<u8>,
    ) {
        let mut state = self.state.lock();
        state.attachment_data.insert(attachment.id, data);
        state.attachments.entry((kind, artifact_id)).or_default().push(attachment);
    }

    pub fn seed_property_definitions(
        &self,
        kind: ArtifactKind,
        defs: Vec<CustomPropertyDefinition>,
    ) {
        self.state.lock().property_defs.insert(kind, defs);
    }

    pub fn incidents(&self) -> Vec<Incident> {
        let mut all: Vec<Incident> = self.state.lock().incidents.values().cloned().collect();
        all.sort_by_key(|i| i.id);
        all
    }

    pub fn tasks(&self) -> Vec<Task> {
        let mut all: Vec<Task> = self.state.lock().tasks.values().cloned().collect();
        all.sort_by_key(|t| t.id);
        all
    }

    pub fn requirements(&self) -> Vec<Requirement> {
        let mut all: Vec<Requirement> = self.state.lock().requirements.values().cloned().collect();
        all.sort_by_key(|r| r.id);
        all
    }

    pub fn releases(&self) -> Vec<Release> {
        let mut all: Vec<Release> = self.state.lock().releases.values().cloned().collect();
        all.sort_by_key(|r| r.id);
        all
    }

    pub fn comments(&self, kind: ArtifactKind, artifact_id: i32) -> Vec<PmsComment> {
        self.state.lock().comments.get(&(kind, artifact_id)).cloned().unwrap_or_default()
    }

    pub fn attachments(&self, kind: ArtifactKind, artifact_id: i32) -> Vec<PmsAttachment> {
        self.state.lock().attachments.get(&(kind, artifact_id)).cloned().unwrap_or_default()
    }

    pub fn associations(&self) -> Vec<Association> {
        self.state.lock().associations.clone()
    }

    pub fn connected_project(&self) -> Option<i32> {
        self.state.lock().connected_project
    }
}

#[async_trait]
impl PmsClient for FakePmsClient {
    async fn authenticate(&self) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        if state.fail_auth {
            return Err(ClientError::Auth("invalid credentials".into()));
        }
        state.auth_calls += 1;
        Ok(())
    }

    async fn connect_project(&self, project_id: i32) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        state.require_session()?;
        state.connected_project = Some(project_id);
        Ok(())
    }

    async fn list_projects(&self) -> Result<Vec<PmsProject>, ClientError> {
        Ok(self.state.lock().projects.clone())
    }

    async fn list_incidents_created_since(
        &self,
        since: DateTime<Utc>,
        start_row: usize,
        page_size: usize,
    ) -> Result<Vec<Incident>, ClientError> {
        let state = self.state.lock();
        state.require_session()?;
        let project = state.connected_project;
        let mut matched: Vec<Incident> = state
            .incidents
            .values()
            .filter(|i| Some(i.project_id) == project && i.creation_date >= since)
            .cloned()
            .collect();
        matched.sort_by_key(|i| (i.creation_date, i.id));
        Ok(matched.into_iter().skip(start_row.saturating_sub(1)).take(page_size).collect())
    }

    async fn list_incidents_updated_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Incident>, ClientError> {
        let state = self.state.lock();
        state.require_session()?;
        let project = state.connected_project;
        let mut matched: Vec<Incident> = state
            .incidents
            .values()
            .filter(|i| {
                Some(i.project_id) == project
                    && i.last_update_date >= since
                    && i.creation_date < since
            })
            .cloned()
            .collect();
        matched.sort_by_key(|i| (i.last_update_date, i.id));
        Ok(matched)
    }

    async fn incident(&self, id: i32) -> Result<Incident, ClientError> {
        self.state
            .lock()
            .incidents
            .get(&id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("incident {id}")))
    }

    async fn create_incident(&self, mut incident: Incident) -> Result<Incident, ClientError> {
        let mut state = self.state.lock();
        state.require_session()?;
        incident.id = state.alloc_id();
        state.writes += 1;
        state.incidents.insert(incident.id, incident.clone());
        Ok(incident)
    }

    async fn update_incident(&self, incident: Incident) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        state.require_session()?;
        if !state.incidents.contains_key(&incident.id) {
            return Err(ClientError::NotFound(format!("incident {}", incident.id)));
        }
        state.writes += 1;
        state.incidents.insert(incident.id, incident);
        Ok(())
    }

    async fn task(&self, id: i32) -> Result<Task, ClientError> {
        self.state
            .lock()
            .tasks
            .get(&id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("task {id}")))
    }

    async fn create_task(&self, mut task: Task) -> Result<Task, ClientError> {
        let mut state = self.state.lock();
        state.require_session()?;
        task.id = state.alloc_id();
        state.writes += 1;
        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update_task(&self, task: Task) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        state.require_session()?;
        if !state.tasks.contains_key(&task.id) {
            return Err(ClientError::NotFound(format!("task {}", task.id)));
        }
        state.writes += 1;
        state.tasks.insert(task.id, task);
        Ok(())
    }

    async fn requirement(&self, id: i32) -> Result<Requirement, ClientError> {
        self.state
            .lock()
            .requirements
            .get(&id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("requirement {id}")))
    }

    async fn create_requirement(
        &self,
        mut requirement: Requirement,
    ) -> Result<Requirement, ClientError> {
        let mut state = self.state.lock();
        state.require_session()?;
        requirement.id = state.alloc_id();
        state.writes += 1;
        state.requirements.insert(requirement.id, requirement.clone());
        Ok(requirement)
    }

    async fn update_requirement(&self, requirement: Requirement) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        state.require_session()?;
        if !state.requirements.contains_key(&requirement.id) {
            return Err(ClientError::NotFound(format!("requirement {}", requirement.id)));
        }
        state.writes += 1;
        state.requirements.insert(requirement.id, requirement);
        Ok(())
    }

    async fn release(&self, id: i32) -> Result<Release, ClientError> {
        self.state
            .lock()
            .releases
            .get(&id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("release {id}")))
    }

    async fn create_release(&self, mut release: Release) -> Result<Release, ClientError> {
        let mut state = self.state.lock();
        state.require_session()?;
        release.id = state.alloc_id();
        state.writes += 1;
        state.releases.insert(release.id, release.clone());
        Ok(release)
    }

    async fn list_comments(
        &self,
        kind: ArtifactKind,
        artifact_id: i32,
    ) -> Result<Vec<PmsComment>, ClientError> {
        Ok(self.state.lock().comments.get(&(kind, artifact_id)).cloned().unwrap_or_default())
    }

    async fn create_comment(
        &self,
        kind: ArtifactKind,
        comment: PmsComment,
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        state.require_session()?;
        state.writes += 1;
        state.comments.entry((kind, comment.artifact_id)).or_default().push(comment);
        Ok(())
    }

    async fn list_attachments(
        &self,
        kind: ArtifactKind,
        artifact_id: i32,
    ) -> Result<Vec<PmsAttachment>, ClientError> {
        let mut rows =
            self.state.lock().attachments.get(&(kind, artifact_id)).cloned().unwrap_or_default();
        rows.sort_by_key(|a| a.id);
        Ok(rows)
    }

    async fn attachment_data(&self, attachment_id: i32) -> Result<Vec<u8>, ClientError> {
        self.state
            .lock()
            .attachment_data
            .get(&attachment_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("attachment {attachment_id}")))
    }

    async fn upload_attachment(
        &self,
        kind: ArtifactKind,
        artifact_id: i32,
        filename: &str,
        author_id: i32,
        data: Vec<u8>,
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        state.require_session()?;
        let id = state.alloc_id();
        state.attachment_data.insert(id, data);
        state.attachments.entry((kind, artifact_id)).or_default().push(PmsAttachment {
            id,
            filename: filename.to_string(),
            url: None,
            author_id,
            creation_date: Utc::now(),
        });
        state.writes += 1;
        Ok(())
    }

    async fn upload_url_attachment(
        &self,
        kind: ArtifactKind,
        artifact_id: i32,
        url: &str,
        author_id: i32,
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        state.require_session()?;
        let id = state.alloc_id();
        state.attachments.entry((kind, artifact_id)).or_default().push(PmsAttachment {
            id,
            filename: url.to_string(),
            url: Some(url.to_string()),
            author_id,
            creation_date: Utc::now(),
        });
        state.writes += 1;
        Ok(())
    }

    async fn list_associations(
        &self,
        kind: ArtifactKind,
        artifact_id: i32,
    ) -> Result<Vec<Association>, ClientError> {
        Ok(self
            .state
            .lock()
            .associations
            .iter()
            .filter(|a| a.source_kind == kind && a.source_id == artifact_id)
            .cloned()
            .collect())
    }

    async fn create_association(&self, association: Association) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        state.require_session()?;
        let duplicate = state.associations.iter().any(|a| {
            a.source_kind == association.source_kind
                && a.source_id == association.source_id
                && a.dest_kind == association.dest_kind
                && a.dest_id == association.dest_id
        });
        if !duplicate {
            state.writes += 1;
            state.associations.push(association);
        }
        Ok(())
    }

    async fn custom_property_definitions(
        &self,
        kind: ArtifactKind,
    ) -> Result<Vec<CustomPropertyDefinition>, ClientError> {
        Ok(self.state.lock().property_defs.get(&kind).cloned().unwrap_or_default())
    }

    async fn user(&self, user_id: i32) -> Result<PmsUser, ClientError> {
        self.state
            .lock()
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("user {user_id}")))
    }

    async fn user_by_login(&self, login: &str) -> Result<PmsUser, ClientError> {
        self.state
            .lock()
            .users
            .values()
            .find(|u| u.login.eq_ignore_ascii_case(login))
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("user {login}")))
    }
}

#[cfg(test)]
#[path = "pms_tests.rs"]
mod tests;
