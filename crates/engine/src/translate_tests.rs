// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tb_core::Mapping;

fn table() -> Vec<Mapping> {
    vec![
        Mapping::new(7, 1, "Active+New"),
        Mapping::new(7, 2, "Resolved+Fixed"),
        Mapping::secondary(7, 2, "Resolved+Duplicate"),
    ]
}

#[test]
fn internal_lookup_returns_external_key() {
    assert_eq!(internal_to_external(&table(), 1).as_deref(), Some("Active+New"));
    assert_eq!(internal_to_external(&table(), 9), None);
}

#[test]
fn external_lookup_prefers_primary_rows() {
    assert_eq!(external_to_internal(&table(), "Resolved+Fixed"), Some(2));
    // Alias rows still resolve when no primary matches
    assert_eq!(external_to_internal(&table(), "Resolved+Duplicate"), Some(2));
    assert_eq!(external_to_internal(&table(), "Closed"), None);
}

#[test]
fn round_trip_holds_for_primary_rows() {
    let table = table();
    for m in table.iter().filter(|m| m.primary) {
        let external = internal_to_external(&table, m.internal_id).unwrap();
        assert_eq!(external_to_internal(&table, &external), Some(m.internal_id));
    }
}

#[test]
fn login_strips_domain_qualifier() {
    assert_eq!(login_from_account("CORP\\jdoe"), "jdoe");
    assert_eq!(login_from_account("jdoe"), "jdoe");
}

#[test]
fn roster_matching_is_case_insensitive() {
    let roster = vec![WitsUser { account_name: "CORP\\JDoe".into(), display_name: "Jane Doe".into() }];
    assert_eq!(roster_display_for_login(&roster, "jdoe").as_deref(), Some("Jane Doe"));
    assert_eq!(roster_account_for_display(&roster, "jane doe").as_deref(), Some("CORP\\JDoe"));
    assert_eq!(roster_display_for_login(&roster, "other"), None);
}

#[tokio::test]
async fn auto_map_resolves_users_through_the_roster() {
    let h = crate::test_util::Harness::seeded(
        crate::test_util::Harness::config().auto_map_users(true).build(),
    );
    h.connect().await;
    let mut state = h.project_state().await;
    // The stored user table is bypassed entirely under auto-map
    state.user_mappings.clear();

    assert_eq!(h.engine.user_display_for(&mut state, 9).await.as_deref(), Some("Jane Doe"));
    assert_eq!(h.engine.user_id_for(&mut state, "Jane Doe").await, Some(9));
}

#[tokio::test]
async fn auto_map_misses_mean_no_assignee() {
    let h = crate::test_util::Harness::seeded(
        crate::test_util::Harness::config().auto_map_users(true).build(),
    );
    h.connect().await;
    let mut state = h.project_state().await;

    // Unknown internal user, and a display name absent from the roster
    assert_eq!(h.engine.user_display_for(&mut state, 404).await, None);
    assert_eq!(h.engine.user_id_for(&mut state, "Nobody Known").await, None);
    assert_eq!(h.engine.user_id_for(&mut state, "").await, None);
}
