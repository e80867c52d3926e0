// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Field and user translation between the two services.
//!
//! Enum ids translate through the operator-maintained value tables. Users
//! translate either through stored rows or, under auto-map, by matching
//! logins against the external roster at runtime. Unmapped priorities,
//! severities, and users degrade to warnings; unmapped statuses and types
//! are handled by the caller as per-artifact errors.

use crate::context::ProjectState;
use crate::cycle::SyncEngine;
use tb_clients::pms::PmsClient;
use tb_clients::wits::{WitsClient, WitsUser};
use tb_core::{find_external, find_internal, Clock, LogSeverity, Mapping};
use tb_store::{FieldKind, MappingStore};

/// Internal enum id → external value.
pub(crate) fn internal_to_external(table: &[Mapping], internal_id: i32) -> Option<String> {
    find_internal(internal_id, table).map(|m| m.external_key.clone())
}

/// External value → internal enum id. Primary rows win; alias rows are a
/// fallback so one-way tables still resolve.
pub(crate) fn external_to_internal(table: &[Mapping], key: &str) -> Option<i32> {
    find_external(key, table, true)
        .or_else(|| find_external(key, table, false))
        .map(|m| m.internal_id)
}

/// Strip a `DOMAIN\` qualifier from an external account name.
pub(crate) fn login_from_account(account: &str) -> &str {
    account.rsplit('\\').next().unwrap_or(account)
}

fn roster_display_for_login(roster: &[WitsUser], login: &str) -> Option<String> {
    roster
        .iter()
        .find(|u| login_from_account(&u.account_name).eq_ignore_ascii_case(login))
        .map(|u| u.display_name.clone())
}

fn roster_account_for_display(roster: &[WitsUser], display_name: &str) -> Option<String> {
    roster
        .iter()
        .find(|u| u.display_name.eq_ignore_ascii_case(display_name))
        .map(|u| u.account_name.clone())
}

impl<P, W, S, C> SyncEngine<P, W, S, C>
where
    P: PmsClient,
    W: WitsClient,
    S: MappingStore,
    C: Clock,
{
    /// Translate an enum value outward. Logs a warning and returns `None`
    /// when unmapped; the caller leaves the destination field unchanged.
    pub(crate) fn value_to_external(
        &self,
        state: &ProjectState,
        kind: tb_core::ArtifactKind,
        field: FieldKind,
        internal_id: i32,
    ) -> Option<String> {
        let value = internal_to_external(state.field_value_table(kind, field), internal_id);
        if value.is_none() {
            self.log_event(
                LogSeverity::Warning,
                &format!("no {field} mapping for {kind} value {internal_id}"),
            );
        }
        value
    }

    /// Translate an enum value inward. Same warning semantics.
    pub(crate) fn value_to_internal(
        &self,
        state: &ProjectState,
        kind: tb_core::ArtifactKind,
        field: FieldKind,
        key: &str,
    ) -> Option<i32> {
        let value = external_to_internal(state.field_value_table(kind, field), key);
        if value.is_none() {
            self.log_event(
                LogSeverity::Warning,
                &format!("no {field} mapping for {kind} value '{key}'"),
            );
        }
        value
    }

    /// Internal user id → external display name.
    ///
    /// A miss means "no assignee", never an error.
    pub(crate) async fn user_display_for(
        &self,
        state: &mut ProjectState,
        user_id: i32,
    ) -> Option<String> {
        if !self.config.auto_map_users {
            return find_internal(user_id, &state.user_mappings).map(|m| m.external_key.clone());
        }
        let user = match state.pms_user_cache.get(&user_id) {
            Some(cached) => cached.clone(),
            None => {
                let fetched = self.pms.user(user_id).await.ok();
                state.pms_user_cache.insert(user_id, fetched.clone());
                fetched
            }
        };
        let user = user?;
        roster_display_for_login(&state.roster, &user.login)
    }

    /// External display name → internal user id.
    pub(crate) async fn user_id_for(
        &self,
        state: &mut ProjectState,
        display_name: &str,
    ) -> Option<i32> {
        if display_name.trim().is_empty() {
            return None;
        }
        if !self.config.auto_map_users {
            return find_external(display_name, &state.user_mappings, true)
                .or_else(|| find_external(display_name, &state.user_mappings, false))
                .map(|m| m.internal_id);
        }
        let account = roster_account_for_display(&state.roster, display_name)?;
        let login = login_from_account(&account).to_string();
        let user = match state.login_user_cache.get(&login) {
            Some(cached) => cached.clone(),
            None => {
                let fetched = self.pms.user_by_login(&login).await.ok();
                state.login_user_cache.insert(login, fetched.clone());
                fetched
            }
        };
        user.map(|u| u.id)
    }
}

#[cfg(test)]
#[path = "translate_tests.rs"]
mod tests;
