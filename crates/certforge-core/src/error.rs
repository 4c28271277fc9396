// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Certforge.

use thiserror::Error;

use crate::types::NotFoundReason;

/// Top-level error type for all Certforge operations.
#[derive(Debug, Error)]
pub enum CertError {
    // -- Submission errors --
    #[error("invalid input: {0}")]
    InputInvalid(String),

    #[error("attendee not found for event {event}: {reason}")]
    AttendeeNotFound {
        event: String,
        reason: NotFoundReason,
    },

    #[error("unknown event: {0}")]
    UnknownEvent(String),

    // -- Roster errors --
    #[error("failed to read roster: {0}")]
    RosterRead(String),

    // -- Document errors --
    #[error("template image failed: {0}")]
    Template(String),

    #[error("rendering failed: {0}")]
    Render(String),

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    // -- Delivery errors --
    #[error("delivery failed: {0}")]
    Delivery(String),

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CertError {
    /// Whether this error means the submitted name was rejected by the roster
    /// check (as opposed to the system failing).
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::AttendeeNotFound { .. })
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CertError>;
