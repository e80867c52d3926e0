// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured query text for work-item discovery.

use chrono::NaiveDate;

/// Window used when a discovery query trips the server result cap.
pub const QUERY_CAP_FALLBACK_DAYS: i64 = 2;

const PROJECTION: &str = "[System.Id], [System.Title], [System.WorkItemType]";

/// Items created on or after `since` within one project, oldest first.
pub fn created_since(project: &str, since: NaiveDate) -> String {
    format!(
        "SELECT {PROJECTION} FROM WorkItems \
         WHERE [System.CreatedDate] >= '{}' AND [System.TeamProject] = '{}' \
         ORDER BY [System.CreatedDate]",
        since.format("%Y-%m-%d"),
        project,
    )
}

/// Items changed on or after `since` within one project, oldest first.
pub fn changed_since(project: &str, since: NaiveDate) -> String {
    format!(
        "SELECT {PROJECTION} FROM WorkItems \
         WHERE [System.ChangedDate] >= '{}' AND [System.TeamProject] = '{}' \
         ORDER BY [System.ChangedDate]",
        since.format("%Y-%m-%d"),
        project,
    )
}

/// Items whose field exactly matches a value within one project. The
/// duplicate guard probes with this before creating a counterpart.
pub fn field_equals(project: &str, field: &str, value: &str) -> String {
    format!(
        "SELECT {PROJECTION} FROM WorkItems \
         WHERE [{field}] = '{}' AND [System.TeamProject] = '{}' \
         ORDER BY [System.Id]",
        escape_literal(value),
        project,
    )
}

/// Single quotes double inside query string literals.
fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
