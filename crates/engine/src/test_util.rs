// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use crate::context::ProjectState;
use crate::cycle::SyncEngine;
use std::sync::Arc;
use tb_clients::pms::PmsClient as _;
use tb_clients::wits::WitsClient as _;
use tb_store::MappingStore as _;
use tb_clients::fake::{FakePmsClient, FakeWitsClient};
use tb_clients::pms::{Incident, PmsProject, PmsUser};
use tb_clients::wits::{
    fields, FieldDefinition, WitsFieldType, WitsUser, WorkItem, WorkItemTypeDefinition,
};
use tb_core::test_support::{local, utc};
use tb_core::{ArtifactKind, FakeClock, Mapping, RecordingLog, SyncConfig, SyncConfigBuilder};
use tb_store::{FieldKind, MemoryMappingStore};

pub(crate) const PROJECT_ID: i32 = 7;
pub(crate) const PROJECT_NAME: &str = "Alpha";

pub(crate) struct Harness {
    pub engine: SyncEngine<FakePmsClient, FakeWitsClient, MemoryMappingStore, FakeClock>,
    pub pms: FakePmsClient,
    pub wits: FakeWitsClient,
    pub store: MemoryMappingStore,
    pub clock: FakeClock,
    pub log: RecordingLog,
}

impl Harness {
    pub fn new(config: SyncConfig) -> Self {
        let pms = FakePmsClient::new();
        let wits = FakeWitsClient::new();
        let store = MemoryMappingStore::new();
        let clock = FakeClock::new(utc(2024, 6, 15, 12, 0, 0));
        let log = RecordingLog::new();
        let engine = SyncEngine::new(
            pms.clone(),
            wits.clone(),
            store.clone(),
            config,
            Arc::new(log.clone()),
            clock.clone(),
        );
        Self { engine, pms, wits, store, clock, log }
    }

    pub fn config() -> SyncConfigBuilder {
        SyncConfig::builder(1)
            .pms_base_url("https://pms.example.com")
            .pms_login("sync")
            .pms_password("secret")
            .wits_connection_string("https://wits.example.com/Collection")
            .wits_login("sync")
            .wits_password("secret")
            .task_work_item_types(vec!["Task".to_string()])
            .requirement_work_item_types(vec!["User Story".to_string()])
    }

    /// A harness with the standard project, type definitions, enum tables,
    /// and users seeded on both sides.
    pub fn seeded(config: SyncConfig) -> Self {
        let h = Self::new(config);
        h.store.set_project_mappings(vec![Mapping::new(PROJECT_ID, PROJECT_ID, PROJECT_NAME)]);
        h.pms.seed_project(PmsProject { id: PROJECT_ID, name: "Alpha Internal".into() });
        h.wits.seed_project(PROJECT_NAME);
        h.wits.set_now(local(2024, 6, 15, 7, 0, 0));

        h.wits.seed_type_definition(PROJECT_NAME, bug_type());
        h.wits.seed_type_definition(PROJECT_NAME, simple_type("Task"));
        h.wits.seed_type_definition(PROJECT_NAME, simple_type("User Story"));

        h.store.set_field_value_mappings(
            PROJECT_ID,
            ArtifactKind::Incident,
            FieldKind::Priority,
            vec![Mapping::new(PROJECT_ID, 1, "1"), Mapping::new(PROJECT_ID, 2, "2")],
        );
        h.store.set_field_value_mappings(
            PROJECT_ID,
            ArtifactKind::Incident,
            FieldKind::Severity,
            vec![Mapping::new(PROJECT_ID, 1, "1 - Critical")],
        );
        h.store.set_field_value_mappings(
            PROJECT_ID,
            ArtifactKind::Incident,
            FieldKind::Status,
            vec![
                Mapping::new(PROJECT_ID, 1, "Active+New"),
                Mapping::new(PROJECT_ID, 2, "Resolved+Fixed"),
                Mapping::new(PROJECT_ID, 3, "Closed+Fixed"),
            ],
        );
        h.store.set_field_value_mappings(
            PROJECT_ID,
            ArtifactKind::Incident,
            FieldKind::Type,
            vec![Mapping::new(PROJECT_ID, 3, "Bug")],
        );
        h.store.set_field_value_mappings(
            PROJECT_ID,
            ArtifactKind::Task,
            FieldKind::Status,
            vec![
                Mapping::new(PROJECT_ID, 1, "New"),
                Mapping::new(PROJECT_ID, 2, "Active+"),
                Mapping::new(PROJECT_ID, 3, "Closed+Completed"),
            ],
        );
        h.store.set_field_value_mappings(
            PROJECT_ID,
            ArtifactKind::Requirement,
            FieldKind::Status,
            vec![Mapping::new(PROJECT_ID, 1, "New"), Mapping::new(PROJECT_ID, 2, "Active+")],
        );
        h.store.set_field_value_mappings(
            PROJECT_ID,
            ArtifactKind::Requirement,
            FieldKind::Importance,
            vec![Mapping::new(PROJECT_ID, 1, "1"), Mapping::new(PROJECT_ID, 2, "2")],
        );

        h.store.set_user_mappings(vec![Mapping::new(0, 9, "Jane Doe")]);
        h.pms.seed_user(PmsUser {
            id: 9,
            login: "jdoe".into(),
            display_name: "Jane Doe".into(),
            active: true,
        });
        h.wits.seed_user(WitsUser {
            account_name: "CORP\\jdoe".into(),
            display_name: "Jane Doe".into(),
        });
        h
    }

    /// Authenticate both fakes and select the standard project.
    pub async fn connect(&self) {
        self.pms.authenticate().await.unwrap();
        self.pms.connect_project(PROJECT_ID).await.unwrap();
        self.wits.authenticate().await.unwrap();
    }

    /// A project state with all tables loaded, as the driver would build.
    pub async fn project_state(&self) -> ProjectState {
        let mut state = ProjectState::new(PROJECT_ID, PROJECT_NAME);
        state.user_mappings = self.store.list_user_mappings().await.unwrap();
        state.roster = self.wits.users().await.unwrap();
        self.engine.load_project_tables(&mut state).await.unwrap();
        state
    }
}

pub(crate) fn bug_type() -> WorkItemTypeDefinition {
    WorkItemTypeDefinition {
        name: "Bug".into(),
        fields: vec![
            field(fields::TITLE, "Title", WitsFieldType::String),
            field(fields::STATE, "State", WitsFieldType::String),
            field(fields::REASON, "Reason", WitsFieldType::String),
            field(fields::DESCRIPTION, "Description", WitsFieldType::PlainText),
            field(fields::PRIORITY, "Priority", WitsFieldType::Integer),
            field(fields::SEVERITY, "Severity", WitsFieldType::String),
            field(fields::ASSIGNED_TO, "Assigned To", WitsFieldType::String),
            field("Custom.ArtifactId", "Artifact Id", WitsFieldType::String),
            field("Custom.OpenedBy", "Opened By", WitsFieldType::String),
            field("Custom.Environment", "Environment", WitsFieldType::String),
            field("Custom.Build", "Build", WitsFieldType::Integer),
        ],
    }
}

pub(crate) fn simple_type(name: &str) -> WorkItemTypeDefinition {
    WorkItemTypeDefinition {
        name: name.into(),
        fields: vec![
            field(fields::TITLE, "Title", WitsFieldType::String),
            field(fields::STATE, "State", WitsFieldType::String),
            field(fields::REASON, "Reason", WitsFieldType::String),
            field(fields::DESCRIPTION, "Description", WitsFieldType::PlainText),
            field(fields::PRIORITY, "Priority", WitsFieldType::Integer),
            field(fields::ASSIGNED_TO, "Assigned To", WitsFieldType::String),
            field(fields::COMPLETED_WORK, "Completed Work", WitsFieldType::Double),
            field(fields::ESTIMATE, "Original Estimate", WitsFieldType::Double),
            field(fields::START_DATE, "Start Date", WitsFieldType::DateTime),
            field(fields::FINISH_DATE, "Finish Date", WitsFieldType::DateTime),
        ],
    }
}

fn field(reference_name: &str, name: &str, field_type: WitsFieldType) -> FieldDefinition {
    FieldDefinition {
        reference_name: reference_name.into(),
        name: name.into(),
        field_type,
    }
}

/// A plain internal incident ready for outbound creation.
pub(crate) fn sample_incident(id: i32) -> Incident {
    Incident {
        id,
        project_id: PROJECT_ID,
        name: "Login fails".into(),
        description: "<p>Steps</p>".into(),
        status_id: 1,
        type_id: 3,
        priority_id: Some(2),
        severity_id: None,
        opener_id: 9,
        owner_id: Some(9),
        detected_release_id: None,
        start_date: None,
        closed_date: None,
        creation_date: utc(2024, 6, 15, 9, 0, 0),
        last_update_date: utc(2024, 6, 15, 9, 0, 0),
        custom_properties: Default::default(),
    }
}

/// A work item of the given type as the external side would return it.
pub(crate) fn sample_work_item(id: i32, type_name: &str) -> WorkItem {
    let mut wi = WorkItem::new(PROJECT_NAME, type_name);
    wi.id = id;
    wi.set_field(fields::TITLE, tb_clients::wits::FieldValue::Text("Imported item".into()));
    wi.set_field(fields::STATE, tb_clients::wits::FieldValue::Text("New".into()));
    wi.set_field(
        fields::CREATED_BY,
        tb_clients::wits::FieldValue::Text("Jane Doe".into()),
    );
    wi.set_field(
        fields::CREATED_DATE,
        tb_clients::wits::FieldValue::Date(local(2024, 6, 15, 6, 0, 0)),
    );
    wi.set_field(
        fields::CHANGED_DATE,
        tb_clients::wits::FieldValue::Date(local(2024, 6, 15, 6, 30, 0)),
    );
    wi
}
