// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact kinds and work-item classification.

use serde::{Deserialize, Serialize};

/// The closed set of synchronized record kinds.
///
/// `Incident`, `Task` and `Requirement` all map to the work-item shape on
/// the external side, distinguished by work-item-type name. `Release` maps
/// to an iteration node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Incident,
    Task,
    Requirement,
    Release,
}

crate::display_names! {
    ArtifactKind {
        Incident => "incident",
        Task => "task",
        Requirement => "requirement",
        Release => "release",
    }
}

impl ArtifactKind {
    /// Two-letter prefix used when writing an internal id into the external
    /// artifact-id field (`IN123`). Releases are never written there.
    pub fn id_prefix(&self) -> Option<&'static str> {
        match self {
            ArtifactKind::Incident => Some("IN"),
            ArtifactKind::Requirement => Some("RQ"),
            ArtifactKind::Task => Some("TK"),
            ArtifactKind::Release => None,
        }
    }

    /// Format an internal id with this kind's prefix (`IN42`).
    pub fn prefixed_id(&self, internal_id: i32) -> Option<String> {
        self.id_prefix().map(|p| format!("{p}{internal_id}"))
    }
}

/// Classification of an external work-item-type name.
///
/// Types listed in the configured task or requirement lists dispatch to
/// those kinds; anything else is treated as an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkItemClass {
    Task,
    Requirement,
    Incident,
}

impl WorkItemClass {
    /// Classify a work-item-type name against the configured type lists.
    ///
    /// Matching is exact after trimming; the incident bucket is the
    /// catch-all.
    pub fn classify(type_name: &str, task_types: &[String], requirement_types: &[String]) -> Self {
        let name = type_name.trim();
        if task_types.iter().any(|t| t.trim() == name) {
            WorkItemClass::Task
        } else if requirement_types.iter().any(|t| t.trim() == name) {
            WorkItemClass::Requirement
        } else {
            WorkItemClass::Incident
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        match self {
            WorkItemClass::Task => ArtifactKind::Task,
            WorkItemClass::Requirement => ArtifactKind::Requirement,
            WorkItemClass::Incident => ArtifactKind::Incident,
        }
    }
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
