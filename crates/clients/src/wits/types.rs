// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work-item model on the external side.
//!
//! A work item is a named field dictionary plus links, attachments, and a
//! revision history. Field types are discovered from the work-item-type
//! definition, not from the values. Timestamps are server-local naive times;
//! the engine converts at the boundary.

use super::fields;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A field value in the work-item dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Double(f64),
    Date(NaiveDateTime),
    Bool(bool),
}

impl FieldValue {
    /// String form used for change comparison and display.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Double(d) => d.to_string(),
            FieldValue::Date(d) => d.format("%Y-%m-%dT%H:%M:%S").to_string(),
            FieldValue::Bool(b) => b.to_string(),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            FieldValue::Double(d) => Some(*d as i64),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            FieldValue::Double(d) => Some(*d),
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// Declared type of a field on a work-item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WitsFieldType {
    String,
    Integer,
    Double,
    DateTime,
    Boolean,
    Html,
    PlainText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Reference name (`System.Title`).
    pub reference_name: String,
    /// Display name (`Title`).
    pub name: String,
    pub field_type: WitsFieldType,
}

/// Field layout of one work-item type within a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemTypeDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

impl WorkItemTypeDefinition {
    pub fn field(&self, reference_name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.reference_name == reference_name)
    }

    pub fn has_field(&self, reference_name: &str) -> bool {
        self.field(reference_name).is_some()
    }
}

/// One revision in a work item's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub number: u32,
    pub changed_by: String,
    pub changed_date: NaiveDateTime,
    /// Free-text history entry; empty for field-only revisions.
    #[serde(default)]
    pub history: String,
}

/// A link attached to a work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum WorkItemLink {
    /// Related-work-item link to another work item.
    Related(i32),
    /// Plain hyperlink.
    Hyperlink(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WitsAttachment {
    pub id: i32,
    pub name: String,
    pub created_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitsUser {
    /// Account name the service authenticates (`DOMAIN\login` or UPN).
    pub account_name: String,
    pub display_name: String,
}

/// A node in the project's iteration tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationNode {
    pub id: i32,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub children: Vec<IterationNode>,
}

impl IterationNode {
    /// Depth-first search for a node by id.
    pub fn find(&self, id: i32) -> Option<&IterationNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Depth-first search for a node by name.
    pub fn find_by_name(&self, name: &str) -> Option<&IterationNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_name(name))
    }
}

/// A work item: field dictionary plus links, attachments, and revisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WorkItem {
    /// Zero until first save.
    pub id: i32,
    pub project: String,
    pub work_item_type: String,
    pub fields: HashMap<String, FieldValue>,
    #[serde(default)]
    pub area_id: Option<i32>,
    #[serde(default)]
    pub iteration_id: Option<i32>,
    #[serde(default)]
    pub links: Vec<WorkItemLink>,
    #[serde(default)]
    pub attachments: Vec<WitsAttachment>,
    #[serde(default)]
    pub revisions: Vec<Revision>,
}

impl WorkItem {
    pub fn new(project: impl Into<String>, work_item_type: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            work_item_type: work_item_type.into(),
            ..Default::default()
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn field_text(&self, name: &str) -> Option<String> {
        self.fields.get(name).map(FieldValue::as_text)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn remove_field(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn title(&self) -> String {
        self.field_text(fields::TITLE).unwrap_or_default()
    }

    pub fn state(&self) -> String {
        self.field_text(fields::STATE).unwrap_or_default()
    }

    pub fn reason(&self) -> String {
        self.field_text(fields::REASON).unwrap_or_default()
    }

    pub fn assigned_to(&self) -> Option<String> {
        self.field_text(fields::ASSIGNED_TO).filter(|s| !s.is_empty())
    }

    pub fn created_date(&self) -> Option<NaiveDateTime> {
        self.field(fields::CREATED_DATE).and_then(FieldValue::as_date)
    }

    pub fn changed_date(&self) -> Option<NaiveDateTime> {
        self.field(fields::CHANGED_DATE).and_then(FieldValue::as_date)
    }

    pub fn changed_by(&self) -> Option<String> {
        self.field_text(fields::CHANGED_BY).filter(|s| !s.is_empty())
    }

    /// Revisions carrying a nonempty history entry, oldest first.
    pub fn history_revisions(&self) -> Vec<&Revision> {
        let mut revs: Vec<&Revision> =
            self.revisions.iter().filter(|r| !r.history.trim().is_empty()).collect();
        revs.sort_by_key(|r| r.changed_date);
        revs
    }

    /// Stable field snapshot for diffing in tests.
    pub fn sorted_fields(&self) -> BTreeMap<String, String> {
        self.fields.iter().map(|(k, v)| (k.clone(), v.as_text())).collect()
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
