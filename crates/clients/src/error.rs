// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed error kinds for the remote client surfaces.
//!
//! Clients raise these kinds directly. For hosts wrapping untyped vendor
//! APIs whose only signal is the exception message, [`ClientError::classify`]
//! applies the known marker substrings as a last resort.

use thiserror::Error;

/// Marker the external query service embeds in its error text when a
/// result set exceeds the server-side cap.
pub const QUERY_CAP_MARKER: &str = "VS402337";

/// Marker embedded in the external save error when one or more fields
/// failed rule validation.
pub const FIELD_VALIDATION_MARKER: &str = "TF237124";

/// Errors raised by the remote clients.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication failed: {0}")]
    Auth(String),
    /// A save was rejected by field rules; `fields` names each offender.
    #[error("field validation failed: {message}")]
    Validation { message: String, fields: Vec<String> },
    #[error("query result cap exceeded: {0}")]
    QueryCap(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    /// Classify a raw error message by marker substring. Used only when the
    /// wrapped API exposes no typed error.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains(QUERY_CAP_MARKER) {
            ClientError::QueryCap(message)
        } else if message.contains(FIELD_VALIDATION_MARKER) {
            ClientError::Validation { message, fields: Vec::new() }
        } else {
            ClientError::Transport(message)
        }
    }

    pub fn is_query_cap(&self) -> bool {
        matches!(self, ClientError::QueryCap(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
