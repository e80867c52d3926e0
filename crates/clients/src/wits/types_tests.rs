// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tb_core::test_support::local;

#[test]
fn field_value_text_forms() {
    assert_eq!(FieldValue::Text("abc".into()).as_text(), "abc");
    assert_eq!(FieldValue::Integer(5).as_text(), "5");
    assert_eq!(FieldValue::Bool(true).as_text(), "true");
    assert_eq!(
        FieldValue::Date(local(2024, 6, 1, 11, 0, 0)).as_text(),
        "2024-06-01T11:00:00"
    );
}

#[test]
fn field_value_numeric_coercion() {
    assert_eq!(FieldValue::Double(2.7).as_integer(), Some(2));
    assert_eq!(FieldValue::Integer(3).as_double(), Some(3.0));
    assert_eq!(FieldValue::Text(" 14 ".into()).as_integer(), Some(14));
    assert_eq!(FieldValue::Bool(true).as_integer(), None);
}

#[test]
fn work_item_accessors_read_fields() {
    let mut wi = WorkItem::new("Alpha", "Bug");
    wi.set_field(fields::TITLE, FieldValue::Text("Login fails".into()));
    wi.set_field(fields::STATE, FieldValue::Text("Active".into()));
    wi.set_field(fields::CHANGED_DATE, FieldValue::Date(local(2024, 6, 1, 11, 0, 0)));

    assert_eq!(wi.title(), "Login fails");
    assert_eq!(wi.state(), "Active");
    assert_eq!(wi.changed_date(), Some(local(2024, 6, 1, 11, 0, 0)));
    assert_eq!(wi.assigned_to(), None);
}

#[test]
fn history_revisions_filter_and_sort() {
    let mut wi = WorkItem::new("Alpha", "Bug");
    wi.revisions = vec![
        Revision {
            number: 2,
            changed_by: "Jane Doe".into(),
            changed_date: local(2024, 6, 2, 9, 0, 0),
            history: "Second".into(),
        },
        Revision {
            number: 1,
            changed_by: "Jane Doe".into(),
            changed_date: local(2024, 6, 1, 9, 0, 0),
            history: "   ".into(),
        },
        Revision {
            number: 3,
            changed_by: "Jane Doe".into(),
            changed_date: local(2024, 5, 30, 9, 0, 0),
            history: "First".into(),
        },
    ];
    let texts: Vec<&str> = wi.history_revisions().iter().map(|r| r.history.as_str()).collect();
    assert_eq!(texts, vec!["First", "Second"]);
}

#[test]
fn iteration_tree_search() {
    let tree = IterationNode {
        id: 1,
        name: "Alpha".into(),
        path: "\\Alpha\\Iteration".into(),
        children: vec![IterationNode {
            id: 5,
            name: "v1.2".into(),
            path: "\\Alpha\\Iteration\\v1.2".into(),
            children: vec![],
        }],
    };
    assert_eq!(tree.find(5).map(|n| n.name.as_str()), Some("v1.2"));
    assert_eq!(tree.find_by_name("v1.2").map(|n| n.id), Some(5));
    assert!(tree.find(9).is_none());
}

#[test]
fn type_definition_field_lookup() {
    let def = WorkItemTypeDefinition {
        name: "Bug".into(),
        fields: vec![FieldDefinition {
            reference_name: fields::TITLE.into(),
            name: "Title".into(),
            field_type: WitsFieldType::String,
        }],
    };
    assert!(def.has_field(fields::TITLE));
    assert!(!def.has_field(fields::SEVERITY));
}
