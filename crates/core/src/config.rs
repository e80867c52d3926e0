// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host-supplied engine configuration, static per plug-in instance.

use serde::{Deserialize, Serialize};

fn default_auto_release_duration_days() -> i64 {
    5
}

fn default_auto_release_creator_id() -> i32 {
    1
}

/// Configuration for one sync instance.
///
/// The host constructs this once (directly or from JSON) and passes it to
/// every invocation. Credentials are opaque to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Opaque key scoping all mapping-store reads and writes.
    pub plugin_id: i32,
    pub pms_base_url: String,
    pub pms_login: String,
    pub pms_password: String,
    /// Project-collection URL of the external service.
    pub wits_connection_string: String,
    pub wits_login: String,
    pub wits_password: String,
    /// Hours added to external local times when comparing against UTC.
    #[serde(default)]
    pub time_offset_hours: i32,
    /// Resolve user cross-references by login/display name at runtime
    /// instead of the stored user mapping table.
    #[serde(default)]
    pub auto_map_users: bool,
    /// Empty means basic-auth credentials; otherwise domain network
    /// credentials are used for the external service.
    #[serde(default)]
    pub windows_domain: String,
    /// External field that receives the prefixed internal id (`IN123`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_id_field: Option<String>,
    /// External field that receives the internal reporter's display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opener_field: Option<String>,
    /// Work-item-type names dispatched to the task processor.
    #[serde(default)]
    pub task_work_item_types: Vec<String>,
    /// Work-item-type names dispatched to the requirement processor.
    #[serde(default)]
    pub requirement_work_item_types: Vec<String>,
    #[serde(default)]
    pub trace_logging: bool,
    /// Duration of auto-created releases.
    #[serde(default = "default_auto_release_duration_days")]
    pub auto_release_duration_days: i64,
    /// Creator user id stamped on auto-created releases.
    #[serde(default = "default_auto_release_creator_id")]
    pub auto_release_creator_id: i32,
    /// Fetch task custom-property definitions with the task artifact type
    /// instead of the requirement type the legacy behavior uses.
    #[serde(default)]
    pub strict_task_properties: bool,
}

impl SyncConfig {
    pub fn builder(plugin_id: i32) -> SyncConfigBuilder {
        SyncConfigBuilder {
            plugin_id,
            pms_base_url: String::new(),
            pms_login: String::new(),
            pms_password: String::new(),
            wits_connection_string: String::new(),
            wits_login: String::new(),
            wits_password: String::new(),
            time_offset_hours: 0,
            auto_map_users: false,
            windows_domain: String::new(),
            artifact_id_field: None,
            opener_field: None,
            task_work_item_types: Vec::new(),
            requirement_work_item_types: Vec::new(),
            trace_logging: false,
            auto_release_duration_days: default_auto_release_duration_days(),
            auto_release_creator_id: default_auto_release_creator_id(),
            strict_task_properties: false,
        }
    }

    /// Split a comma-separated type list the way the host stores it.
    pub fn parse_type_list(csv: &str) -> Vec<String> {
        csv.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
    }
}

pub struct SyncConfigBuilder {
    plugin_id: i32,
    pms_base_url: String,
    pms_login: String,
    pms_password: String,
    wits_connection_string: String,
    wits_login: String,
    wits_password: String,
    time_offset_hours: i32,
    auto_map_users: bool,
    windows_domain: String,
    artifact_id_field: Option<String>,
    opener_field: Option<String>,
    task_work_item_types: Vec<String>,
    requirement_work_item_types: Vec<String>,
    trace_logging: bool,
    auto_release_duration_days: i64,
    auto_release_creator_id: i32,
    strict_task_properties: bool,
}

impl SyncConfigBuilder {
    crate::field_setters! {
        into {
            pms_base_url: String,
            pms_login: String,
            pms_password: String,
            wits_connection_string: String,
            wits_login: String,
            wits_password: String,
            windows_domain: String,
        }
        set {
            time_offset_hours: i32,
            auto_map_users: bool,
            task_work_item_types: Vec<String>,
            requirement_work_item_types: Vec<String>,
            trace_logging: bool,
            auto_release_duration_days: i64,
            auto_release_creator_id: i32,
            strict_task_properties: bool,
        }
        option {
            artifact_id_field: String,
            opener_field: String,
        }
    }

    pub fn build(self) -> SyncConfig {
        SyncConfig {
            plugin_id: self.plugin_id,
            pms_base_url: self.pms_base_url,
            pms_login: self.pms_login,
            pms_password: self.pms_password,
            wits_connection_string: self.wits_connection_string,
            wits_login: self.wits_login,
            wits_password: self.wits_password,
            time_offset_hours: self.time_offset_hours,
            auto_map_users: self.auto_map_users,
            windows_domain: self.windows_domain,
            artifact_id_field: self.artifact_id_field,
            opener_field: self.opener_field,
            task_work_item_types: self.task_work_item_types,
            requirement_work_item_types: self.requirement_work_item_types,
            trace_logging: self.trace_logging,
            auto_release_duration_days: self.auto_release_duration_days,
            auto_release_creator_id: self.auto_release_creator_id,
            strict_task_properties: self.strict_task_properties,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
