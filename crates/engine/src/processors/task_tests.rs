// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_util::{sample_work_item, Harness, PROJECT_ID};
use tb_clients::pms::{CustomPropertyDefinition, PropertyType, PropertyValue};
use tb_core::test_support::local;
use tb_store::CustomPropertyMapping;

#[tokio::test]
async fn task_work_item_becomes_a_task() {
    let h = Harness::seeded(Harness::config().build());
    h.connect().await;
    let mut wi = sample_work_item(200, "Task");
    wi.set_field(fields::COMPLETED_WORK, FieldValue::Double(1.5));
    wi.set_field(fields::ESTIMATE, FieldValue::Double(4.0));
    wi.set_field(fields::START_DATE, FieldValue::Date(local(2024, 6, 10, 9, 0, 0)));
    wi.set_field(fields::FINISH_DATE, FieldValue::Date(local(2024, 6, 20, 17, 0, 0)));
    wi.set_field(fields::ASSIGNED_TO, FieldValue::Text("Jane Doe".into()));
    h.wits.seed_work_item(wi.clone());
    let mut state = h.project_state().await;

    h.engine.create_task_inbound(&mut state, &wi).await.unwrap();

    let tasks = h.pms.tasks();
    assert_eq!(tasks.len(), 1);
    let task = &tasks[0];
    assert_eq!(task.name, "Imported item");
    assert_eq!(task.status_id, 1);
    assert_eq!(task.creator_id, 9);
    assert_eq!(task.owner_id, Some(9));
    // Hours become integer minutes
    assert_eq!(task.actual_effort_minutes, Some(90));
    assert_eq!(task.estimated_effort_minutes, Some(240));
    assert_eq!(
        state.mapping_for_external(ArtifactKind::Task, "200").map(|m| m.internal_id),
        Some(task.id)
    );
}

#[tokio::test]
async fn inbound_crash_leftover_is_adopted_through_the_written_back_id() {
    let h = Harness::seeded(Harness::config().artifact_id_field("Custom.ArtifactId").build());
    h.connect().await;
    let existing = tb_clients::pms::Task {
        id: 600,
        project_id: PROJECT_ID,
        name: "Imported item".into(),
        description: "Empty Description in TFS".into(),
        status_id: 1,
        creator_id: 9,
        owner_id: None,
        release_id: None,
        start_date: None,
        end_date: None,
        actual_effort_minutes: None,
        estimated_effort_minutes: None,
        creation_date: tb_core::test_support::utc(2024, 6, 15, 6, 0, 0),
        last_update_date: tb_core::test_support::utc(2024, 6, 15, 6, 30, 0),
        custom_properties: Default::default(),
    };
    h.pms.seed_task(existing);
    let mut wi = sample_work_item(200, "Task");
    wi.set_field("Custom.ArtifactId", FieldValue::Text("TK600".into()));
    h.wits.seed_work_item(wi.clone());
    let mut state = h.project_state().await;

    h.engine.create_task_inbound(&mut state, &wi).await.unwrap();

    // No duplicate task; the mapping points at the survivor
    assert_eq!(h.pms.tasks().len(), 1);
    assert_eq!(
        state.mapping_for_external(ArtifactKind::Task, "200").map(|m| m.internal_id),
        Some(600)
    );
}

#[tokio::test]
async fn mapped_task_work_item_is_not_recreated() {
    let h = Harness::seeded(Harness::config().build());
    h.connect().await;
    let wi = sample_work_item(200, "Task");
    h.wits.seed_work_item(wi.clone());
    let mut state = h.project_state().await;
    state
        .artifact_mappings
        .insert(ArtifactKind::Task, vec![Mapping::new(PROJECT_ID, 33, "200")]);

    h.engine.create_task_inbound(&mut state, &wi).await.unwrap();
    assert!(h.pms.tasks().is_empty());
}

#[tokio::test]
async fn task_properties_use_the_requirement_tables_by_default() {
    // The legacy lookup reads task custom-property definitions with the
    // requirement artifact type; the strict flag opts out of that.
    let h = Harness::seeded(Harness::config().build());
    h.connect().await;
    h.pms.seed_property_definitions(
        ArtifactKind::Requirement,
        vec![CustomPropertyDefinition {
            number: 1,
            name: "Team".into(),
            property_type: PropertyType::Text,
        }],
    );
    h.store.set_custom_property_mapping(
        PROJECT_ID,
        ArtifactKind::Requirement,
        CustomPropertyMapping { property_number: 1, external_field: "Custom.Team".into() },
    );
    let mut wi = sample_work_item(200, "Task");
    wi.set_field("Custom.Team", FieldValue::Text("Core".into()));
    h.wits.seed_work_item(wi.clone());
    let mut state = h.project_state().await;

    h.engine.create_task_inbound(&mut state, &wi).await.unwrap();
    let task = &h.pms.tasks()[0];
    assert_eq!(task.custom_properties.get(&1), Some(&PropertyValue::Text("Core".into())));
}

#[tokio::test]
async fn strict_flag_switches_to_task_property_tables() {
    let h = Harness::seeded(Harness::config().strict_task_properties(true).build());
    h.connect().await;
    // Only the requirement tables carry the slot; under strict lookup the
    // task kind has no mapping and nothing copies.
    h.pms.seed_property_definitions(
        ArtifactKind::Requirement,
        vec![CustomPropertyDefinition {
            number: 1,
            name: "Team".into(),
            property_type: PropertyType::Text,
        }],
    );
    h.store.set_custom_property_mapping(
        PROJECT_ID,
        ArtifactKind::Requirement,
        CustomPropertyMapping { property_number: 1, external_field: "Custom.Team".into() },
    );
    let mut wi = sample_work_item(200, "Task");
    wi.set_field("Custom.Team", FieldValue::Text("Core".into()));
    h.wits.seed_work_item(wi.clone());
    let mut state = h.project_state().await;

    h.engine.create_task_inbound(&mut state, &wi).await.unwrap();
    assert!(h.pms.tasks()[0].custom_properties.is_empty());
}

#[tokio::test]
async fn task_update_only_writes_when_something_changed() {
    let h = Harness::seeded(Harness::config().build());
    h.connect().await;
    let mut wi = sample_work_item(200, "Task");
    wi.set_field(fields::COMPLETED_WORK, FieldValue::Double(2.0));
    h.wits.seed_work_item(wi.clone());
    let mut state = h.project_state().await;

    h.engine.create_task_inbound(&mut state, &wi).await.unwrap();
    let task_id = h.pms.tasks()[0].id;
    let writes_after_create = h.pms.write_count();

    // Nothing changed externally: update is a no-op
    h.engine.update_task_inbound(&mut state, task_id, "200").await.unwrap();
    assert_eq!(h.pms.write_count(), writes_after_create);

    // Now the external side records more work
    let mut changed = h.wits.work_item_snapshot(200).unwrap();
    changed.set_field(fields::COMPLETED_WORK, FieldValue::Double(3.0));
    h.wits.seed_work_item(changed);
    h.engine.update_task_inbound(&mut state, task_id, "200").await.unwrap();
    assert_eq!(h.pms.write_count(), writes_after_create + 1);
    assert_eq!(h.pms.tasks()[0].actual_effort_minutes, Some(180));
}

#[tokio::test]
async fn task_update_imports_new_revisions_once() {
    let h = Harness::seeded(Harness::config().build());
    h.connect().await;
    let wi = sample_work_item(200, "Task");
    h.wits.seed_work_item(wi.clone());
    let mut state = h.project_state().await;
    h.engine.create_task_inbound(&mut state, &wi).await.unwrap();
    let task_id = h.pms.tasks()[0].id;

    let mut changed = h.wits.work_item_snapshot(200).unwrap();
    changed.revisions.push(tb_clients::wits::Revision {
        number: 1,
        changed_by: "Jane Doe".into(),
        changed_date: local(2024, 6, 16, 9, 0, 0),
        history: "Halfway done.".into(),
    });
    h.wits.seed_work_item(changed);

    h.engine.update_task_inbound(&mut state, task_id, "200").await.unwrap();
    h.engine.update_task_inbound(&mut state, task_id, "200").await.unwrap();
    let comments = h.pms.comments(ArtifactKind::Task, task_id);
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "Halfway done.");
}
