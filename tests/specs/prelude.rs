// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the spec suite.

pub use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
pub use std::sync::Arc;
pub use tb_clients::fake::{FakePmsClient, FakeWitsClient};
pub use tb_clients::pms::{Incident, PmsClient as _, PmsProject, PmsUser};
pub use tb_clients::wits::{
    fields, FieldDefinition, FieldValue, WitsClient as _, WitsFieldType, WitsUser, WorkItem,
    WorkItemTypeDefinition,
};
pub use tb_core::test_support::{local, utc};
pub use tb_core::{ArtifactKind, FakeClock, Mapping, RecordingLog, RunStatus, SyncConfig};
pub use tb_engine::SyncEngine;
pub use tb_store::{FieldKind, MappingStore as _, MemoryMappingStore};

pub const PROJECT_ID: i32 = 7;
pub const PROJECT_NAME: &str = "Alpha";

pub struct World {
    pub engine: SyncEngine<FakePmsClient, FakeWitsClient, MemoryMappingStore, FakeClock>,
    pub pms: FakePmsClient,
    pub wits: FakeWitsClient,
    pub store: MemoryMappingStore,
    pub clock: FakeClock,
    pub log: RecordingLog,
}

impl World {
    /// A world with the standard project, users, type definitions, and enum
    /// tables seeded on both sides.
    pub fn seeded() -> Self {
        Self::with_config(config())
    }

    pub fn with_config(config: SyncConfig) -> Self {
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
        let world = World { engine, pms, wits, store, clock, log };
        world.seed();
        world
    }

    fn seed(&self) {
        self.store
            .set_project_mappings(vec![Mapping::new(PROJECT_ID, PROJECT_ID, PROJECT_NAME)]);
        self.pms.seed_project(PmsProject { id: PROJECT_ID, name: "Alpha Internal".into() });
        self.wits.seed_project(PROJECT_NAME);
        self.wits.set_now(local(2024, 6, 15, 7, 0, 0));

        self.wits.seed_type_definition(PROJECT_NAME, work_item_type("Bug"));
        self.wits.seed_type_definition(PROJECT_NAME, work_item_type("Task"));
        self.wits.seed_type_definition(PROJECT_NAME, work_item_type("User Story"));

        self.store.set_field_value_mappings(
            PROJECT_ID,
            ArtifactKind::Incident,
            FieldKind::Priority,
            vec![Mapping::new(PROJECT_ID, 1, "1"), Mapping::new(PROJECT_ID, 2, "2")],
        );
        self.store.set_field_value_mappings(
            PROJECT_ID,
            ArtifactKind::Incident,
            FieldKind::Status,
            vec![
                Mapping::new(PROJECT_ID, 1, "Active+New"),
                Mapping::new(PROJECT_ID, 2, "Resolved+Fixed"),
            ],
        );
        self.store.set_field_value_mappings(
            PROJECT_ID,
            ArtifactKind::Incident,
            FieldKind::Type,
            vec![Mapping::new(PROJECT_ID, 3, "Bug")],
        );
        self.store.set_field_value_mappings(
            PROJECT_ID,
            ArtifactKind::Task,
            FieldKind::Status,
            vec![Mapping::new(PROJECT_ID, 1, "New"), Mapping::new(PROJECT_ID, 2, "Active+")],
        );
        self.store.set_field_value_mappings(
            PROJECT_ID,
            ArtifactKind::Requirement,
            FieldKind::Status,
            vec![Mapping::new(PROJECT_ID, 1, "New"), Mapping::new(PROJECT_ID, 2, "Active+")],
        );
        self.store.set_field_value_mappings(
            PROJECT_ID,
            ArtifactKind::Requirement,
            FieldKind::Importance,
            vec![Mapping::new(PROJECT_ID, 1, "1"), Mapping::new(PROJECT_ID, 2, "2")],
        );

        self.store.set_user_mappings(vec![Mapping::new(0, 9, "Jane Doe")]);
        self.pms.seed_user(PmsUser {
            id: 9,
            login: "jdoe".into(),
            display_name: "Jane Doe".into(),
            active: true,
        });
        self.wits.seed_user(WitsUser {
            account_name: "CORP\\jdoe".into(),
            display_name: "Jane Doe".into(),
        });
    }

    pub async fn run(&self, last_sync: Option<DateTime<Utc>>) -> RunStatus {
        use tb_core::Clock as _;
        self.engine.run(last_sync, self.clock.now_utc()).await
    }
}

pub fn config() -> SyncConfig {
    SyncConfig::builder(1)
        .pms_base_url("https://pms.example.com")
        .pms_login("sync")
        .pms_password("secret")
        .wits_connection_string("https://wits.example.com/Collection")
        .wits_login("sync")
        .wits_password("secret")
        .task_work_item_types(SyncConfig::parse_type_list("Task"))
        .requirement_work_item_types(SyncConfig::parse_type_list("User Story"))
        .build()
}

pub fn work_item_type(name: &str) -> WorkItemTypeDefinition {
    let field = |reference_name: &str, name: &str, field_type| FieldDefinition {
        reference_name: reference_name.into(),
        name: name.into(),
        field_type,
    };
    WorkItemTypeDefinition {
        name: name.into(),
        fields: vec![
            field(fields::TITLE, "Title", WitsFieldType::String),
            field(fields::STATE, "State", WitsFieldType::String),
            field(fields::REASON, "Reason", WitsFieldType::String),
            field(fields::DESCRIPTION, "Description", WitsFieldType::PlainText),
            field(fields::PRIORITY, "Priority", WitsFieldType::Integer),
            field(fields::SEVERITY, "Severity", WitsFieldType::String),
            field(fields::ASSIGNED_TO, "Assigned To", WitsFieldType::String),
            field(fields::COMPLETED_WORK, "Completed Work", WitsFieldType::Double),
        ],
    }
}

/// An internal incident matching scenario A.
pub fn incident_42() -> Incident {
    Incident {
        id: 42,
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

/// A work item as the external side would hand it back.
pub fn work_item(id: i32, type_name: &str) -> WorkItem {
    let mut wi = WorkItem::new(PROJECT_NAME, type_name);
    wi.id = id;
    wi.set_field(fields::TITLE, FieldValue::Text("Imported item".into()));
    wi.set_field(fields::STATE, FieldValue::Text("New".into()));
    wi.set_field(fields::CREATED_BY, FieldValue::Text("Jane Doe".into()));
    wi.set_field(fields::CREATED_DATE, FieldValue::Date(local(2024, 6, 15, 6, 0, 0)));
    wi.set_field(fields::CHANGED_DATE, FieldValue::Date(local(2024, 6, 15, 6, 30, 0)));
    wi
}
