// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tri-valued run outcome reported back to the host.

use serde::{Deserialize, Serialize};

/// Outcome of one engine invocation.
///
/// Ordered by severity: `Success < Warning < Error`. The driver escalates
/// but never downgrades as phases and projects complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Warning,
    Error,
}

crate::display_names! {
    RunStatus {
        Success => "success",
        Warning => "warning",
        Error => "error",
    }
}

impl RunStatus {
    /// Raise this status to at least `other`.
    pub fn escalate(&mut self, other: RunStatus) {
        if other > *self {
            *self = other;
        }
    }
}

impl Default for RunStatus {
    fn default() -> Self {
        RunStatus::Success
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
