// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host-facing event-log sink.
//!
//! The host provides a single sink taking `(message, severity)`. Messages
//! longer than [`LOG_CHUNK_LEN`] characters must be split before delivery;
//! [`log_chunked`] does the splitting so callers never have to.

use serde::{Deserialize, Serialize};

/// Maximum characters the host sink accepts per entry.
pub const LOG_CHUNK_LEN: usize = 31_000;

/// Severity levels accepted by the host sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSeverity {
    Info,
    Warning,
    Error,
    SuccessAudit,
    FailureAudit,
}

crate::display_names! {
    LogSeverity {
        Info => "info",
        Warning => "warning",
        Error => "error",
        SuccessAudit => "success-audit",
        FailureAudit => "failure-audit",
    }
}

/// Sink for operator-visible sync events.
pub trait EventLog: Send + Sync {
    fn log(&self, message: &str, severity: LogSeverity);
}

/// Deliver a message through the sink, splitting it into chunks of at most
/// [`LOG_CHUNK_LEN`] characters. Splits happen on character boundaries.
pub fn log_chunked(sink: &dyn EventLog, message: &str, severity: LogSeverity) {
    if message.chars().count() <= LOG_CHUNK_LEN {
        sink.log(message, severity);
        return;
    }
    let chars: Vec<char> = message.chars().collect();
    for chunk in chars.chunks(LOG_CHUNK_LEN) {
        let part: String = chunk.iter().collect();
        sink.log(&part, severity);
    }
}

/// Default sink that forwards to `tracing` at the matching level.
#[derive(Clone, Default)]
pub struct TracingLog;

impl EventLog for TracingLog {
    fn log(&self, message: &str, severity: LogSeverity) {
        match severity {
            LogSeverity::Info | LogSeverity::SuccessAudit => tracing::info!("{message}"),
            LogSeverity::Warning => tracing::warn!("{message}"),
            LogSeverity::Error | LogSeverity::FailureAudit => tracing::error!("{message}"),
        }
    }
}

/// Recording sink for assertions in tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub message: String,
    pub severity: LogSeverity,
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct RecordingLog {
    entries: std::sync::Arc<parking_lot::Mutex<Vec<LogEntry>>>,
}

#[cfg(any(test, feature = "test-support"))]
impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn messages_at(&self, severity: LogSeverity) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.severity == severity)
            .map(|e| e.message.clone())
            .collect()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl EventLog for RecordingLog {
    fn log(&self, message: &str, severity: LogSeverity) {
        self.entries.lock().push(LogEntry { message: message.to_string(), severity });
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
