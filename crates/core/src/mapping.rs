// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-reference mapping records and lookup helpers.
//!
//! A [`Mapping`] links one internal id on the project-management side to one
//! external key on the work-item side. The same shape doubles as a
//! field-value translation row, where `internal_id` is an enum value id and
//! `external_key` the counterpart value (possibly a composite
//! `<state>+<reason>` pair for incident statuses).

use serde::{Deserialize, Serialize};

/// One cross-reference row.
///
/// Identity fields are immutable once written: a mapping is only created
/// after the counterpart artifact exists, and is never edited afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub project_id: i32,
    pub internal_id: i32,
    pub external_key: String,
    /// At most one primary row per internal id within a project; the primary
    /// row wins when resolving external key → internal value.
    #[serde(default)]
    pub primary: bool,
}

impl Mapping {
    pub fn new(project_id: i32, internal_id: i32, external_key: impl Into<String>) -> Self {
        Self { project_id, internal_id, external_key: external_key.into(), primary: true }
    }

    /// A non-primary alias row (secondary external keys for the same value).
    pub fn secondary(project_id: i32, internal_id: i32, external_key: impl Into<String>) -> Self {
        Self { project_id, internal_id, external_key: external_key.into(), primary: false }
    }
}

/// Find the row for an internal id within a project.
pub fn find_by_internal_id(project_id: i32, internal_id: i32, list: &[Mapping]) -> Option<&Mapping> {
    list.iter().find(|m| m.project_id == project_id && m.internal_id == internal_id)
}

/// Find the row for an internal id in an already project-scoped list.
pub fn find_internal(internal_id: i32, list: &[Mapping]) -> Option<&Mapping> {
    list.iter().find(|m| m.internal_id == internal_id)
}

/// Find the row for an external key within a project.
///
/// With `only_primary`, alias rows are skipped so the resolution is
/// deterministic when several external keys map to one internal value.
pub fn find_by_external_key<'a>(
    project_id: i32,
    external_key: &str,
    list: &'a [Mapping],
    only_primary: bool,
) -> Option<&'a Mapping> {
    list.iter().find(|m| {
        m.project_id == project_id
            && m.external_key == external_key
            && (!only_primary || m.primary)
    })
}

/// Find the row for an external key in an already project-scoped list.
pub fn find_external<'a>(
    external_key: &str,
    list: &'a [Mapping],
    only_primary: bool,
) -> Option<&'a Mapping> {
    list.iter().find(|m| m.external_key == external_key && (!only_primary || m.primary))
}

/// A composite `<state>+<reason>` external key from the incident status
/// mapping table. The external side keeps state and reason in two fields
/// that must be written together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateReason {
    pub state: String,
    pub reason: String,
}

impl StateReason {
    /// Split a composite key on the first `+`. A key without a separator
    /// yields an empty reason.
    pub fn parse(key: &str) -> Self {
        match key.split_once('+') {
            Some((state, reason)) => {
                Self { state: state.to_string(), reason: reason.to_string() }
            }
            None => Self { state: key.to_string(), reason: String::new() },
        }
    }

    /// Reassemble the composite key form.
    pub fn to_key(&self) -> String {
        if self.reason.is_empty() {
            self.state.clone()
        } else {
            format!("{}+{}", self.state, self.reason)
        }
    }
}

#[cfg(test)]
#[path = "mapping_tests.rs"]
mod tests;
