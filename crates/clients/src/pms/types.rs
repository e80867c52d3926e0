// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Record shapes on the internal side.
//!
//! All timestamps here are UTC. Ids are service-assigned integers; a zero id
//! marks a record that has not been created remotely yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tb_core::ArtifactKind;

/// Number of positional custom-property slots on every artifact.
pub const CUSTOM_PROPERTY_SLOTS: u8 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PmsProject {
    pub id: i32,
    pub name: String,
}

/// Type of one custom-property slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Text,
    Integer,
    Boolean,
    Decimal,
    Date,
    List,
    #[serde(rename = "multilist")]
    MultiList,
    User,
}

tb_core::display_names! {
    PropertyType {
        Text => "text",
        Integer => "integer",
        Boolean => "boolean",
        Decimal => "decimal",
        Date => "date",
        List => "list",
        MultiList => "multilist",
        User => "user",
    }
}

/// A typed value held in a custom-property slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Decimal(f64),
    Date(DateTime<Utc>),
    /// Internal id of the selected list value.
    List(i32),
    /// Internal ids of the selected values.
    #[serde(rename = "multilist")]
    MultiList(Vec<i32>),
    /// Internal user id.
    User(i32),
}

impl PropertyValue {
    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyValue::Text(_) => PropertyType::Text,
            PropertyValue::Integer(_) => PropertyType::Integer,
            PropertyValue::Boolean(_) => PropertyType::Boolean,
            PropertyValue::Decimal(_) => PropertyType::Decimal,
            PropertyValue::Date(_) => PropertyType::Date,
            PropertyValue::List(_) => PropertyType::List,
            PropertyValue::MultiList(_) => PropertyType::MultiList,
            PropertyValue::User(_) => PropertyType::User,
        }
    }
}

/// Definition of one custom-property slot for an artifact kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomPropertyDefinition {
    /// 1-based slot number.
    pub number: u8,
    pub name: String,
    pub property_type: PropertyType,
}

/// The positional custom-property slots, keyed by 1-based slot number.
pub type CustomProperties = BTreeMap<u8, PropertyValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: i32,
    pub project_id: i32,
    pub name: String,
    pub description: String,
    pub status_id: i32,
    pub type_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_id: Option<i32>,
    /// Reporter.
    pub opener_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_release_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_date: Option<DateTime<Utc>>,
    pub creation_date: DateTime<Utc>,
    pub last_update_date: DateTime<Utc>,
    #[serde(default)]
    pub custom_properties: CustomProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i32,
    pub project_id: i32,
    pub name: String,
    pub description: String,
    pub status_id: i32,
    pub creator_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Minutes of recorded work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_effort_minutes: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_effort_minutes: Option<i32>,
    pub creation_date: DateTime<Utc>,
    pub last_update_date: DateTime<Utc>,
    #[serde(default)]
    pub custom_properties: CustomProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: i32,
    pub project_id: i32,
    pub name: String,
    pub description: String,
    pub status_id: i32,
    pub author_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_id: Option<i32>,
    pub creation_date: DateTime<Utc>,
    pub last_update_date: DateTime<Utc>,
    #[serde(default)]
    pub custom_properties: CustomProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: i32,
    pub project_id: i32,
    pub name: String,
    pub version_number: String,
    pub creator_id: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub active: bool,
    #[serde(default)]
    pub non_working_days: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmsComment {
    pub artifact_id: i32,
    pub text: String,
    pub creator_id: i32,
    pub creation_date: DateTime<Utc>,
}

/// Attachment metadata. File data is fetched separately by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmsAttachment {
    pub id: i32,
    pub filename: String,
    /// URL attachments carry the target instead of file data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub author_id: i32,
    pub creation_date: DateTime<Utc>,
}

impl PmsAttachment {
    pub fn is_url(&self) -> bool {
        self.url.is_some()
    }
}

/// A typed association between two internal artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub source_kind: ArtifactKind,
    pub source_id: i32,
    pub dest_kind: ArtifactKind,
    pub dest_id: i32,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PmsUser {
    pub id: i32,
    pub login: String,
    pub display_name: String,
    #[serde(default)]
    pub active: bool,
}

/// Browser URL of an artifact, used for the hyperlink written onto the
/// external work item.
pub fn artifact_url(base_url: &str, kind: ArtifactKind, project_id: i32, artifact_id: i32) -> String {
    let segment = match kind {
        ArtifactKind::Incident => "Incident",
        ArtifactKind::Task => "Task",
        ArtifactKind::Requirement => "Requirement",
        ArtifactKind::Release => "Release",
    };
    format!("{}/{}/{}/{}.aspx", base_url.trim_end_matches('/'), project_id, segment, artifact_id)
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
