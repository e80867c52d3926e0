// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error type.

use tb_clients::ClientError;
use tb_store::StoreError;
use thiserror::Error;

/// Errors crossing the per-artifact and per-project boundaries.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("client error: {0}")]
    Client(#[from] ClientError),
    #[error("mapping store error: {0}")]
    Store(#[from] StoreError),
    /// The artifact's status has no translation row; the artifact is skipped.
    #[error("no status mapping for value '{value}'")]
    UnmappedStatus { value: String },
    /// The artifact's type has no translation row; the artifact is skipped.
    #[error("no type mapping for value '{value}'")]
    UnmappedType { value: String },
}

impl EngineError {
    /// A missing counterpart is expected when records are deleted remotely;
    /// callers log at info and move on.
    pub fn is_missing_counterpart(&self) -> bool {
        matches!(self, EngineError::Client(e) if e.is_not_found())
    }
}
