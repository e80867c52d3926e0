// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-cycle invariant specs
//!
//! Properties that must hold for every cycle, regardless of scenario.

use crate::prelude::*;

#[tokio::test]
async fn existing_mappings_survive_cycles_unchanged() {
    let world = World::seeded();
    let mut incident = incident_42();
    incident.creation_date = utc(2024, 6, 1, 0, 0, 0);
    incident.last_update_date = utc(2024, 6, 1, 0, 0, 0);
    world.pms.seed_incident(incident);
    let mut wi = work_item(101, "Bug");
    wi.set_field(fields::STATE, FieldValue::Text("Active".into()));
    wi.set_field(fields::REASON, FieldValue::Text("New".into()));
    world.wits.seed_work_item(wi);
    world
        .store
        .seed_artifact_mappings(ArtifactKind::Incident, vec![Mapping::new(PROJECT_ID, 42, "101")]);

    for _ in 0..3 {
        world.run(Some(utc(2024, 6, 14, 0, 0, 0))).await;
        let rows =
            world.store.list_artifact_mappings(PROJECT_ID, ArtifactKind::Incident).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].internal_id, 42);
        assert_eq!(rows[0].external_key, "101");
    }
}

#[tokio::test]
async fn every_created_artifact_gets_exactly_one_mapping() {
    let world = World::seeded();
    for id in 1..=3 {
        let mut incident = incident_42();
        incident.id = id;
        world.pms.seed_incident(incident);
    }
    world.wits.seed_work_item(work_item(201, "Task"));
    world.wits.seed_work_item(work_item(202, "User Story"));

    let status = world.run(Some(utc(2024, 6, 15, 8, 0, 0))).await;
    assert_eq!(status, RunStatus::Success);

    let incident_rows =
        world.store.list_artifact_mappings(PROJECT_ID, ArtifactKind::Incident).await.unwrap();
    assert_eq!(incident_rows.len(), 3);
    for id in 1..=3 {
        assert_eq!(incident_rows.iter().filter(|m| m.internal_id == id).count(), 1);
    }

    let task_rows =
        world.store.list_artifact_mappings(PROJECT_ID, ArtifactKind::Task).await.unwrap();
    assert_eq!(task_rows.len(), 1);
    assert_eq!(task_rows[0].external_key, "201");

    let requirement_rows =
        world.store.list_artifact_mappings(PROJECT_ID, ArtifactKind::Requirement).await.unwrap();
    assert_eq!(requirement_rows.len(), 1);
    assert_eq!(requirement_rows[0].external_key, "202");
}

#[tokio::test]
async fn timestamp_ties_break_toward_the_external_side() {
    let world = World::seeded();
    let mut incident = incident_42();
    incident.name = "Internal title".into();
    incident.creation_date = utc(2024, 6, 1, 0, 0, 0);
    incident.last_update_date = utc(2024, 6, 15, 8, 0, 0);
    world.pms.seed_incident(incident);

    let mut wi = work_item(101, "Bug");
    wi.set_field(fields::TITLE, FieldValue::Text("External title".into()));
    wi.set_field(fields::STATE, FieldValue::Text("Active".into()));
    wi.set_field(fields::REASON, FieldValue::Text("New".into()));
    // Same instant as the internal update (offset 0)
    wi.set_field(fields::CHANGED_DATE, FieldValue::Date(local(2024, 6, 15, 8, 0, 0)));
    world.wits.seed_work_item(wi);
    world
        .store
        .seed_artifact_mappings(ArtifactKind::Incident, vec![Mapping::new(PROJECT_ID, 42, "101")]);

    world.run(Some(utc(2024, 6, 14, 12, 0, 0))).await;

    let merged = world.pms.incidents().into_iter().find(|i| i.id == 42).unwrap();
    assert_eq!(merged.name, "External title");
}

#[tokio::test]
async fn interrupted_run_does_not_duplicate_on_retry() {
    let world = World::seeded();
    world.pms.seed_incident(incident_42());
    // A previous run created the work item and its backlink, then died
    // before the mapping flush: the store has no row for it
    let mut leftover = work_item(777, "Bug");
    leftover.set_field(fields::TITLE, FieldValue::Text("Login fails".into()));
    leftover.links.push(tb_clients::wits::WorkItemLink::Hyperlink(
        "https://pms.example.com/7/Incident/42.aspx".into(),
    ));
    world.wits.seed_work_item(leftover);

    let status = world.run(Some(utc(2024, 6, 15, 8, 0, 0))).await;
    assert_eq!(status, RunStatus::Success);

    // The survivor was adopted instead of duplicated
    assert_eq!(world.wits.work_items().len(), 1);
    let rows =
        world.store.list_artifact_mappings(PROJECT_ID, ArtifactKind::Incident).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].internal_id, 42);
    assert_eq!(rows[0].external_key, "777");
}

#[tokio::test]
async fn run_without_any_reachable_service_errors() {
    let world = World::seeded();
    world.pms.fail_auth(true);
    let status = world.run(None).await;
    assert_eq!(status, RunStatus::Error);
    // Nothing was created anywhere
    assert!(world.wits.work_items().is_empty());
}

#[tokio::test]
async fn consecutive_quiet_cycles_write_nothing() {
    let world = World::seeded();
    world.pms.seed_incident(incident_42());
    world.run(Some(utc(2024, 6, 15, 8, 0, 0))).await;

    let saves = world.wits.save_count();
    let writes = world.pms.write_count();
    for _ in 0..2 {
        use tb_core::Clock as _;
        let status = world.run(Some(world.clock.now_utc())).await;
        assert_eq!(status, RunStatus::Success);
    }
    assert_eq!(world.wits.save_count(), saves);
    assert_eq!(world.pms.write_count(), writes);
}
