// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The external-service surface consumed by the engine.

use super::types::{IterationNode, WitsUser, WorkItem, WorkItemTypeDefinition};
use crate::error::ClientError;
use async_trait::async_trait;
use std::path::PathBuf;

#[async_trait]
pub trait WitsClient: Send + Sync {
    /// Establish (or re-establish) an authenticated connection. The
    /// implementation picks basic-auth or domain credentials from its
    /// configuration.
    async fn authenticate(&self) -> Result<(), ClientError>;

    async fn list_projects(&self) -> Result<Vec<String>, ClientError>;

    /// Run a structured query and return matching work-item ids in query
    /// order. Raises [`ClientError::QueryCap`] when the server refuses the
    /// result set size.
    async fn run_query(&self, query: &str) -> Result<Vec<i32>, ClientError>;

    /// Open a work item with fields, links, attachments, and revisions.
    async fn work_item(&self, id: i32) -> Result<WorkItem, ClientError>;

    /// Field layout for a work-item type in a project.
    async fn work_item_type_definition(
        &self,
        project: &str,
        type_name: &str,
    ) -> Result<WorkItemTypeDefinition, ClientError>;

    /// Create or update. New items (id 0) come back with their assigned id.
    /// Field-rule rejections surface as [`ClientError::Validation`] with the
    /// offending field names.
    async fn save_work_item(&self, work_item: &WorkItem) -> Result<WorkItem, ClientError>;

    /// The full user roster, read once per cycle.
    async fn users(&self) -> Result<Vec<WitsUser>, ClientError>;

    async fn add_hyperlink(&self, work_item_id: i32, url: &str) -> Result<(), ClientError>;
    async fn add_related_link(
        &self,
        work_item_id: i32,
        target_id: i32,
        comment: &str,
    ) -> Result<(), ClientError>;

    async fn upload_attachment(
        &self,
        work_item_id: i32,
        path: &std::path::Path,
    ) -> Result<(), ClientError>;

    /// Download one attachment to a temporary file and return its path.
    /// Caller deletes the file when done.
    async fn download_attachment(
        &self,
        work_item_id: i32,
        attachment_id: i32,
    ) -> Result<PathBuf, ClientError>;

    /// The project's iteration tree root.
    async fn iteration_tree(&self, project: &str) -> Result<IterationNode, ClientError>;

    /// Create an iteration node under the project's iteration root. The new
    /// node's id only becomes visible through [`Self::iteration_tree`] once
    /// the structure service catches up.
    async fn create_iteration(&self, project: &str, name: &str) -> Result<(), ClientError>;
}
