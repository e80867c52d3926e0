// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    incident = { ArtifactKind::Incident, "incident" },
    task = { ArtifactKind::Task, "task" },
    requirement = { ArtifactKind::Requirement, "requirement" },
    release = { ArtifactKind::Release, "release" },
)]
fn kind_display(kind: ArtifactKind, expected: &str) {
    assert_eq!(kind.to_string(), expected);
}

#[test]
fn prefixed_ids() {
    assert_eq!(ArtifactKind::Incident.prefixed_id(123).as_deref(), Some("IN123"));
    assert_eq!(ArtifactKind::Requirement.prefixed_id(7).as_deref(), Some("RQ7"));
    assert_eq!(ArtifactKind::Task.prefixed_id(9).as_deref(), Some("TK9"));
    assert_eq!(ArtifactKind::Release.prefixed_id(5), None);
}

#[test]
fn kind_serde_round_trip() {
    let json = serde_json::to_string(&ArtifactKind::Requirement).unwrap();
    assert_eq!(json, "\"requirement\"");
    let parsed: ArtifactKind = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, ArtifactKind::Requirement);
}

fn types(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn classify_matches_task_list() {
    let class =
        WorkItemClass::classify("Task", &types(&["Task", "Issue"]), &types(&["User Story"]));
    assert_eq!(class, WorkItemClass::Task);
    assert_eq!(class.kind(), ArtifactKind::Task);
}

#[test]
fn classify_matches_requirement_list() {
    let class = WorkItemClass::classify("User Story", &types(&["Task"]), &types(&["User Story"]));
    assert_eq!(class, WorkItemClass::Requirement);
}

#[test]
fn classify_trims_whitespace() {
    let class = WorkItemClass::classify(" Task ", &types(&["Task"]), &[]);
    assert_eq!(class, WorkItemClass::Task);
}

#[test]
fn unlisted_type_falls_back_to_incident() {
    let class = WorkItemClass::classify("Bug", &types(&["Task"]), &types(&["User Story"]));
    assert_eq!(class, WorkItemClass::Incident);
    assert_eq!(class.kind(), ArtifactKind::Incident);
}
