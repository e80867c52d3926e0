// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake external-service client.
//!
//! Models the behaviors the engine's protocols depend on: the state machine
//! rejecting non-default states on creation, revision stamping on save,
//! query result caps, and iteration nodes that only become visible after the
//! structure service catches up.

use crate::error::{ClientError, FIELD_VALIDATION_MARKER, QUERY_CAP_MARKER};
use crate::wits::{
    fields, IterationNode, Revision, WitsAttachment, WitsClient, WitsUser, WorkItem,
    WorkItemTypeDefinition,
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_STATE: &str = "New";

struct PendingIteration {
    project: String,
    name: String,
    polls_left: u32,
}

struct WitsState {
    auth_calls: u32,
    fail_auth: bool,
    now: NaiveDateTime,
    current_user: String,
    projects: Vec<String>,
    work_items: HashMap<i32, WorkItem>,
    type_definitions: HashMap<(String, String), WorkItemTypeDefinition>,
    users: Vec<WitsUser>,
    iterations: HashMap<String, IterationNode>,
    pending_iterations: Vec<PendingIteration>,
    iteration_lag: u32,
    attachment_data: HashMap<i32, Vec<u8>>,
    reject_fields: Vec<String>,
    cap_next_query: bool,
    cap_before: Option<NaiveDate>,
    next_id: i32,
    next_node_id: i32,
    saves: Vec<i32>,
}

impl Default for WitsState {
    fn default() -> Self {
        Self {
            auth_calls: 0,
            fail_auth: false,
            now: NaiveDateTime::default(),
            current_user: "Sync Service".to_string(),
            projects: Vec::new(),
            work_items: HashMap::new(),
            type_definitions: HashMap::new(),
            users: Vec::new(),
            iterations: HashMap::new(),
            pending_iterations: Vec::new(),
            iteration_lag: 0,
            attachment_data: HashMap::new(),
            reject_fields: Vec::new(),
            cap_next_query: false,
            cap_before: None,
            next_id: 100,
            next_node_id: 500,
            saves: Vec::new(),
        }
    }
}

impl WitsState {
    fn require_session(&self) -> Result<(), ClientError> {
        if self.auth_calls == 0 {
            return Err(ClientError::Auth("no session".into()));
        }
        Ok(())
    }

    /// Materialize pending iteration nodes whose visibility lag has expired.
    fn settle_iterations(&mut self, project: &str) {
        let mut matured = Vec::new();
        for pending in self.pending_iterations.iter_mut() {
            if pending.project != project {
                continue;
            }
            if pending.polls_left == 0 {
                matured.push(pending.name.clone());
            } else {
                pending.polls_left -= 1;
            }
        }
        if matured.is_empty() {
            return;
        }
        self.pending_iterations
            .retain(|p| !(p.project == project && matured.contains(&p.name)));
        let node_ids: Vec<i32> = matured
            .iter()
            .map(|_| {
                self.next_node_id += 1;
                self.next_node_id
            })
            .collect();
        if let Some(root) = self.iterations.get_mut(project) {
            for (name, id) in matured.into_iter().zip(node_ids) {
                let path = format!("{}\\{}", root.path, name);
                root.children.push(IterationNode { id, name, path, children: vec![] });
            }
        }
    }
}

/// In-memory stand-in for the external service.
#[derive(Clone, Default)]
pub struct FakeWitsClient {
    state: Arc<Mutex<WitsState>>,
}

impl FakeWitsClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_auth(&self, fail: bool) {
        self.state.lock().fail_auth = fail;
    }

    pub fn auth_calls(&self) -> u32 {
        self.state.lock().auth_calls
    }

    pub fn set_now(&self, now: NaiveDateTime) {
        self.state.lock().now = now;
    }

    pub fn set_current_user(&self, display_name: impl Into<String>) {
        self.state.lock().current_user = display_name.into();
    }

    pub fn seed_project(&self, name: impl Into<String>) {
        let name = name.into();
        let mut state = self.state.lock();
        state.iterations.entry(name.clone()).or_insert_with(|| IterationNode {
            id: 1,
            name: name.clone(),
            path: format!("\\{name}\\Iteration"),
            children: vec![],
        });
        state.projects.push(name);
    }

    pub fn seed_work_item(&self, work_item: WorkItem) {
        let mut state = self.state.lock();
        state.next_id = state.next_id.max(work_item.id);
        state.work_items.insert(work_item.id, work_item);
    }

    pub fn seed_type_definition(&self, project: &str, definition: WorkItemTypeDefinition) {
        self.state
            .lock()
            .type_definitions
            .insert((project.to_string(), definition.name.clone()), definition);
    }

    pub fn seed_user(&self, user: WitsUser) {
        self.state.lock().users.push(user);
    }

    pub fn seed_iteration(&self, project: &str, node: IterationNode) {
        if let Some(root) = self.state.lock().iterations.get_mut(project) {
            root.children.push(node);
        }
    }

    pub fn seed_attachment(&self, work_item_id: i32, attachment: WitsAttachment, data: Vec<u8>) {
        let mut state = self.state.lock();
        state.attachment_data.insert(attachment.id, data);
        if let Some(wi) = state.work_items.get_mut(&work_item_id) {
            wi.attachments.push(attachment);
        }
    }

    /// Newly created iteration nodes stay invisible for this many tree polls.
    pub fn set_iteration_lag(&self, polls: u32) {
        self.state.lock().iteration_lag = polls;
    }

    /// Reject the next saves that touch any of these fields.
    pub fn reject_fields(&self, names: Vec<String>) {
        self.state.lock().reject_fields = names;
    }

    /// Fail the next query with the result-cap marker.
    pub fn cap_next_query(&self) {
        self.state.lock().cap_next_query = true;
    }

    /// Fail any query whose window starts before this date, mimicking the
    /// server cap on unbounded history scans.
    pub fn cap_queries_before(&self, date: NaiveDate) {
        self.state.lock().cap_before = Some(date);
    }

    pub fn work_item_snapshot(&self, id: i32) -> Option<WorkItem> {
        self.state.lock().work_items.get(&id).cloned()
    }

    pub fn work_items(&self) -> Vec<WorkItem> {
        let mut all: Vec<WorkItem> = self.state.lock().work_items.values().cloned().collect();
        all.sort_by_key(|w| w.id);
        all
    }

    pub fn save_count(&self) -> usize {
        self.state.lock().saves.len()
    }

    pub fn saved_ids(&self) -> Vec<i32> {
        self.state.lock().saves.clone()
    }
}

enum QueryFilter {
    CreatedSince(NaiveDate),
    ChangedSince(NaiveDate),
    FieldEquals(String, String),
}

fn parse_query(query: &str) -> Option<(QueryFilter, String)> {
    let field = query.split("WHERE [").nth(1)?.split(']').next()?.to_string();
    let mut literals = query.split('\'');
    let value = literals.nth(1)?;
    let project = literals.nth(1)?;
    let filter = match field.as_str() {
        "System.CreatedDate" => {
            QueryFilter::CreatedSince(NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?)
        }
        "System.ChangedDate" => {
            QueryFilter::ChangedSince(NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?)
        }
        _ => QueryFilter::FieldEquals(field, value.to_string()),
    };
    Some((filter, project.to_string()))
}

#[async_trait]
impl WitsClient for FakeWitsClient {
    async fn authenticate(&self) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        if state.fail_auth {
            return Err(ClientError::Auth("invalid credentials".into()));
        }
        state.auth_calls += 1;
        Ok(())
    }

    async fn list_projects(&self) -> Result<Vec<String>, ClientError> {
        Ok(self.state.lock().projects.clone())
    }

    async fn run_query(&self, query: &str) -> Result<Vec<i32>, ClientError> {
        let mut state = self.state.lock();
        state.require_session()?;
        let (filter, project) = parse_query(query)
            .ok_or_else(|| ClientError::Transport(format!("malformed query: {query}")))?;
        if state.cap_next_query {
            state.cap_next_query = false;
            return Err(ClientError::QueryCap(format!(
                "{QUERY_CAP_MARKER}: The result set exceeds the size limit"
            )));
        }
        match filter {
            QueryFilter::CreatedSince(date) | QueryFilter::ChangedSince(date) => {
                if let Some(cap) = state.cap_before {
                    if date < cap {
                        return Err(ClientError::QueryCap(format!(
                            "{QUERY_CAP_MARKER}: The result set exceeds the size limit"
                        )));
                    }
                }
                let by_created = matches!(filter, QueryFilter::CreatedSince(_));
                let since = date.and_hms_opt(0, 0, 0).unwrap_or_default();
                let mut matched: Vec<&WorkItem> = state
                    .work_items
                    .values()
                    .filter(|wi| wi.project == project)
                    .filter(|wi| {
                        let stamp =
                            if by_created { wi.created_date() } else { wi.changed_date() };
                        stamp.map(|s| s >= since).unwrap_or(false)
                    })
                    .collect();
                matched.sort_by_key(|wi| {
                    (if by_created { wi.created_date() } else { wi.changed_date() }, wi.id)
                });
                Ok(matched.into_iter().map(|wi| wi.id).collect())
            }
            QueryFilter::FieldEquals(field, value) => {
                let value = value.replace("''", "'");
                let mut matched: Vec<i32> = state
                    .work_items
                    .values()
                    .filter(|wi| wi.project == project)
                    .filter(|wi| wi.field_text(&field).as_deref() == Some(value.as_str()))
                    .map(|wi| wi.id)
                    .collect();
                matched.sort_unstable();
                Ok(matched)
            }
        }
    }

    async fn work_item(&self, id: i32) -> Result<WorkItem, ClientError> {
        let state = self.state.lock();
        state.require_session()?;
        state
            .work_items
            .get(&id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("work item {id}")))
    }

    async fn work_item_type_definition(
        &self,
        project: &str,
        type_name: &str,
    ) -> Result<WorkItemTypeDefinition, ClientError> {
        self.state
            .lock()
            .type_definitions
            .get(&(project.to_string(), type_name.to_string()))
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("work item type {type_name}")))
    }

    async fn save_work_item(&self, work_item: &WorkItem) -> Result<WorkItem, ClientError> {
        let mut state = self.state.lock();
        state.require_session()?;
        let mut item = work_item.clone();

        let rejected: Vec<String> = state
            .reject_fields
            .iter()
            .filter(|name| item.fields.contains_key(*name))
            .cloned()
            .collect();
        if !rejected.is_empty() {
            return Err(ClientError::Validation {
                message: format!("{FIELD_VALIDATION_MARKER}: Work item is not ready to save"),
                fields: rejected,
            });
        }

        if item.id == 0 {
            // The state machine refuses arbitrary initial states.
            let state_field = item.field_text(fields::STATE);
            if let Some(s) = state_field {
                if !s.is_empty() && s != DEFAULT_STATE {
                    return Err(ClientError::Validation {
                        message: format!(
                            "{FIELD_VALIDATION_MARKER}: Work item is not ready to save"
                        ),
                        fields: vec![fields::STATE.to_string()],
                    });
                }
            }
            state.next_id += 1;
            item.id = state.next_id;
            item.set_field(
                fields::STATE,
                crate::wits::FieldValue::Text(DEFAULT_STATE.to_string()),
            );
            item.set_field(fields::CREATED_DATE, crate::wits::FieldValue::Date(state.now));
        } else {
            // Links, attachments, and revisions accumulate server-side;
            // saving a snapshot must not drop what other calls added.
            let Some(stored) = state.work_items.get(&item.id) else {
                return Err(ClientError::NotFound(format!("work item {}", item.id)));
            };
            for link in &stored.links {
                if !item.links.contains(link) {
                    item.links.push(link.clone());
                }
            }
            for attachment in &stored.attachments {
                if !item.attachments.iter().any(|a| a.id == attachment.id) {
                    item.attachments.push(attachment.clone());
                }
            }
            if stored.revisions.len() > item.revisions.len() {
                item.revisions = stored.revisions.clone();
            }
        }

        // A nonempty History entry becomes a revision rather than a field.
        if let Some(history) = item.remove_field(fields::HISTORY) {
            let text = history.as_text();
            if !text.trim().is_empty() {
                let number = item.revisions.len() as u32 + 1;
                let changed_by = state.current_user.clone();
                let changed_date = state.now;
                item.revisions.push(Revision { number, changed_by, changed_date, history: text });
            }
        }

        item.set_field(fields::CHANGED_DATE, crate::wits::FieldValue::Date(state.now));
        item.set_field(
            fields::CHANGED_BY,
            crate::wits::FieldValue::Text(state.current_user.clone()),
        );
        state.saves.push(item.id);
        state.work_items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn users(&self) -> Result<Vec<WitsUser>, ClientError> {
        Ok(self.state.lock().users.clone())
    }

    async fn add_hyperlink(&self, work_item_id: i32, url: &str) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        state.require_session()?;
        let link = crate::wits::WorkItemLink::Hyperlink(url.to_string());
        match state.work_items.get_mut(&work_item_id) {
            Some(wi) => {
                if !wi.links.contains(&link) {
                    wi.links.push(link);
                }
                Ok(())
            }
            None => Err(ClientError::NotFound(format!("work item {work_item_id}"))),
        }
    }

    async fn add_related_link(
        &self,
        work_item_id: i32,
        target_id: i32,
        _comment: &str,
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        state.require_session()?;
        let link = crate::wits::WorkItemLink::Related(target_id);
        match state.work_items.get_mut(&work_item_id) {
            Some(wi) => {
                if !wi.links.contains(&link) {
                    wi.links.push(link);
                }
                Ok(())
            }
            None => Err(ClientError::NotFound(format!("work item {work_item_id}"))),
        }
    }

    async fn upload_attachment(
        &self,
        work_item_id: i32,
        path: &Path,
    ) -> Result<(), ClientError> {
        let data = std::fs::read(path)
            .map_err(|e| ClientError::Transport(format!("read {}: {e}", path.display())))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let mut state = self.state.lock();
        state.require_session()?;
        state.next_id += 1;
        let id = state.next_id;
        state.attachment_data.insert(id, data);
        let created_date = state.now;
        match state.work_items.get_mut(&work_item_id) {
            Some(wi) => {
                wi.attachments.push(WitsAttachment { id, name, created_date });
                Ok(())
            }
            None => Err(ClientError::NotFound(format!("work item {work_item_id}"))),
        }
    }

    async fn download_attachment(
        &self,
        work_item_id: i32,
        attachment_id: i32,
    ) -> Result<PathBuf, ClientError> {
        let state = self.state.lock();
        state.require_session()?;
        let exists = state
            .work_items
            .get(&work_item_id)
            .map(|wi| wi.attachments.iter().any(|a| a.id == attachment_id))
            .unwrap_or(false);
        if !exists {
            return Err(ClientError::NotFound(format!("attachment {attachment_id}")));
        }
        let data = state
            .attachment_data
            .get(&attachment_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("attachment {attachment_id}")))?;
        let mut file = tempfile::NamedTempFile::new()
            .map_err(|e| ClientError::Transport(format!("temp file: {e}")))?;
        file.write_all(&data)
            .map_err(|e| ClientError::Transport(format!("temp file: {e}")))?;
        let (_, path) = file
            .keep()
            .map_err(|e| ClientError::Transport(format!("temp file: {e}")))?;
        Ok(path)
    }

    async fn iteration_tree(&self, project: &str) -> Result<IterationNode, ClientError> {
        let mut state = self.state.lock();
        state.require_session()?;
        state.settle_iterations(project);
        state
            .iterations
            .get(project)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("project {project}")))
    }

    async fn create_iteration(&self, project: &str, name: &str) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        state.require_session()?;
        if !state.iterations.contains_key(project) {
            return Err(ClientError::NotFound(format!("project {project}")));
        }
        let polls_left = state.iteration_lag;
        state.pending_iterations.push(PendingIteration {
            project: project.to_string(),
            name: name.to_string(),
            polls_left,
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "wits_tests.rs"]
mod tests;
