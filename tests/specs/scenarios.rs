// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenario specs
//!
//! Each test drives a full cycle through the public engine surface and
//! asserts the externally observable outcome on both fakes.

use crate::prelude::*;

#[tokio::test]
async fn scenario_a_new_incident_crosses_outward() {
    let world = World::seeded();
    world.pms.seed_incident(incident_42());

    let status = world.run(Some(utc(2024, 6, 15, 8, 0, 0))).await;
    assert_eq!(status, RunStatus::Success);

    let items = world.wits.work_items();
    assert_eq!(items.len(), 1);
    let item = &items[0];
    assert_eq!(item.work_item_type, "Bug");
    assert_eq!(item.title(), "Login fails");
    assert!(item.field_text(fields::DESCRIPTION).unwrap_or_default().contains("Steps"));
    assert_eq!(item.field_text(fields::PRIORITY).as_deref(), Some("2"));
    assert_eq!(item.state(), "Active");
    assert_eq!(item.reason(), "New");
    assert_eq!(item.assigned_to().as_deref(), Some("Jane Doe"));

    // Exactly one mapping row for (project 7, incident, 42)
    let rows = world.store.list_artifact_mappings(PROJECT_ID, ArtifactKind::Incident).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].internal_id, 42);
    assert_eq!(rows[0].external_key, item.id.to_string());

    // No oscillation on the next run
    let saves = world.wits.save_count();
    let writes = world.pms.write_count();
    use tb_core::Clock as _;
    let status = world.run(Some(world.clock.now_utc())).await;
    assert_eq!(status, RunStatus::Success);
    assert_eq!(world.wits.save_count(), saves);
    assert_eq!(world.pms.write_count(), writes);
}

#[tokio::test]
async fn scenario_b_external_side_wins_the_conflict() {
    let world = World::with_config(SyncConfig {
        time_offset_hours: -5,
        ..config()
    });

    let mut incident = incident_42();
    incident.creation_date = utc(2024, 6, 1, 0, 0, 0);
    incident.last_update_date = utc(2024, 6, 15, 10, 0, 0);
    world.pms.seed_incident(incident);

    let mut wi = work_item(101, "Bug");
    wi.set_field(fields::TITLE, FieldValue::Text("Login fails badly".into()));
    wi.set_field(fields::STATE, FieldValue::Text("Resolved".into()));
    wi.set_field(fields::REASON, FieldValue::Text("Fixed".into()));
    // 11:00 local at offset -5 is 16:00 UTC, later than the internal update
    wi.set_field(fields::CHANGED_DATE, FieldValue::Date(local(2024, 6, 15, 11, 0, 0)));
    world.wits.seed_work_item(wi);
    world
        .store
        .seed_artifact_mappings(ArtifactKind::Incident, vec![Mapping::new(PROJECT_ID, 42, "101")]);

    let saves_before = world.wits.save_count();
    let status = world.run(Some(utc(2024, 6, 14, 0, 0, 0))).await;
    assert_eq!(status, RunStatus::Success);

    // The internal record took the external fields
    let updated = world.pms.incidents().into_iter().find(|i| i.id == 42).unwrap();
    assert_eq!(updated.name, "Login fails badly");
    assert_eq!(updated.status_id, 2);
    // ...and nothing was written back outward
    assert_eq!(world.wits.save_count(), saves_before);
}

#[tokio::test]
async fn scenario_c_query_cap_truncates_the_window() {
    let world = World::seeded();
    world.wits.seed_work_item(work_item(201, "Task"));
    world.wits.cap_next_query();

    let status = world.run(Some(utc(2024, 6, 15, 0, 0, 0))).await;

    assert_eq!(status, RunStatus::Warning);
    assert!(world
        .log
        .messages_at(tb_core::LogSeverity::Warning)
        .iter()
        .any(|m| m.contains("result cap")));
    // The truncated result set still synced
    assert_eq!(world.pms.tasks().len(), 1);
}

#[tokio::test]
async fn scenario_d_unmapped_status_skips_only_that_incident() {
    let world = World::seeded();
    let mut broken = incident_42();
    broken.status_id = 99;
    world.pms.seed_incident(broken);
    let mut fine = incident_42();
    fine.id = 43;
    world.pms.seed_incident(fine);

    let status = world.run(Some(utc(2024, 6, 15, 8, 0, 0))).await;
    assert_eq!(status, RunStatus::Warning);

    // No work item and no mapping for the broken one; the next incident
    // in the batch still synced
    assert_eq!(world.wits.work_items().len(), 1);
    let rows = world.store.list_artifact_mappings(PROJECT_ID, ArtifactKind::Incident).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].internal_id, 43);
    assert!(world
        .log
        .messages_at(tb_core::LogSeverity::Error)
        .iter()
        .any(|m| m.contains("status mapping")));
}

#[tokio::test]
async fn scenario_e_missing_iteration_is_created_and_polled() {
    let world = World::seeded();
    world.pms.seed_release(tb_clients::pms::Release {
        id: 5,
        project_id: PROJECT_ID,
        name: "v1.2".into(),
        version_number: "1.2.0".into(),
        creator_id: 1,
        start_date: utc(2024, 6, 1, 0, 0, 0),
        end_date: utc(2024, 6, 30, 0, 0, 0),
        active: true,
        non_working_days: 0,
    });
    let mut incident = incident_42();
    incident.detected_release_id = Some(5);
    world.pms.seed_incident(incident);
    // The structure service lags one poll behind
    world.wits.set_iteration_lag(1);

    let status = world.run(Some(utc(2024, 6, 15, 8, 0, 0))).await;
    assert_eq!(status, RunStatus::Success);

    world.wits.authenticate().await.unwrap();
    let tree = world.wits.iteration_tree(PROJECT_NAME).await.unwrap();
    let node = tree.find_by_name("v1.2").cloned().unwrap();

    assert_eq!(world.wits.work_items()[0].iteration_id, Some(node.id));
    let rows = world.store.list_artifact_mappings(PROJECT_ID, ArtifactKind::Release).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].internal_id, 5);
    assert_eq!(rows[0].external_key, node.id.to_string());
}

#[tokio::test]
async fn scenario_f_identical_comments_never_duplicate() {
    let world = World::seeded();
    let mut incident = incident_42();
    incident.creation_date = utc(2024, 6, 1, 0, 0, 0);
    incident.last_update_date = utc(2024, 6, 15, 10, 0, 0);
    world.pms.seed_incident(incident);
    world.pms.seed_comment(
        ArtifactKind::Incident,
        tb_clients::pms::PmsComment {
            artifact_id: 42,
            text: "Fixed in build 14.".into(),
            creator_id: 9,
            creation_date: utc(2024, 6, 14, 0, 0, 0),
        },
    );

    let mut wi = work_item(101, "Bug");
    wi.set_field(fields::TITLE, FieldValue::Text("Login fails".into()));
    wi.set_field(fields::STATE, FieldValue::Text("Active".into()));
    wi.set_field(fields::REASON, FieldValue::Text("New".into()));
    wi.set_field(fields::CHANGED_DATE, FieldValue::Date(local(2024, 6, 15, 8, 0, 0)));
    wi.revisions.push(tb_clients::wits::Revision {
        number: 1,
        changed_by: "Jane Doe".into(),
        changed_date: local(2024, 6, 14, 8, 0, 0),
        history: "Fixed in build 14.".into(),
    });
    world.wits.seed_work_item(wi);
    world
        .store
        .seed_artifact_mappings(ArtifactKind::Incident, vec![Mapping::new(PROJECT_ID, 42, "101")]);

    world.run(Some(utc(2024, 6, 14, 12, 0, 0))).await;

    // Neither side gained a comment
    assert_eq!(world.pms.comments(ArtifactKind::Incident, 42).len(), 1);
    assert_eq!(world.wits.work_item_snapshot(101).unwrap().revisions.len(), 1);
}
