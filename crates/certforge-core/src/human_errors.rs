// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people filling in the certificate form.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how the request surface presents it (warning banner vs.
// error banner) and which HTTP status it carries.

use serde::Serialize;

use crate::error::CertError;
use crate::types::NotFoundReason;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The user can fix it by correcting the form and submitting again.
    Warning,
    /// Something on our side failed; resubmitting the same data will not help
    /// until an operator intervenes.
    Error,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    pub severity: Severity,
}

impl HumanError {
    fn warning(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            severity: Severity::Warning,
        }
    }

    fn error(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            severity: Severity::Error,
        }
    }
}

/// Convert a `CertError` into a message the person at the form can act on.
pub fn humanize_error(err: &CertError) -> HumanError {
    match err {
        CertError::InputInvalid(detail) => HumanError::warning(
            "Please enter a valid name and email.",
            format!("Check the form and try again. ({detail})"),
        ),

        CertError::AttendeeNotFound { event, reason } => match reason {
            NotFoundReason::NoMatchingName => HumanError::warning(
                format!("Name not found in the attendance list for {event}."),
                "Enter your full name exactly as you registered it.",
            ),
            NotFoundReason::NoNameColumn | NotFoundReason::MissingQuantityColumn => {
                HumanError::warning(
                    format!("The attendance list for {event} can't be checked right now."),
                    "Please contact the event organisers.",
                )
            }
        },

        CertError::UnknownEvent(key) => HumanError::warning(
            "That event isn't available.",
            format!("Pick an event from the list. (Requested: {key})"),
        ),

        CertError::RosterRead(detail) => HumanError::error(
            "We couldn't read the attendance list.",
            format!("Please try again later or contact the organisers. ({detail})"),
        ),

        CertError::Template(_) | CertError::Render(_) | CertError::Pdf(_) => HumanError::error(
            "We couldn't create your certificate.",
            "Please try again later. If it keeps failing, contact the organisers.",
        ),

        CertError::Delivery(detail) => HumanError::error(
            "We couldn't email your certificate.",
            format!("Your certificate was created but the mail server refused it. ({detail})"),
        ),

        CertError::Config(_)
        | CertError::Database(_)
        | CertError::Io(_)
        | CertError::Serialization(_) => HumanError::error(
            "Something went wrong on our side.",
            "Please try again later.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_name_is_a_warning() {
        let err = CertError::AttendeeNotFound {
            event: "NSS Camp 2026".into(),
            reason: NotFoundReason::NoMatchingName,
        };
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Warning);
        assert!(human.message.contains("NSS Camp 2026"));
    }

    #[test]
    fn empty_input_is_a_warning() {
        let human = humanize_error(&CertError::InputInvalid("name must not be empty".into()));
        assert_eq!(human.severity, Severity::Warning);
    }

    #[test]
    fn roster_failure_is_an_error() {
        let human = humanize_error(&CertError::RosterRead("no such file".into()));
        assert_eq!(human.severity, Severity::Error);
        assert!(human.suggestion.contains("no such file"));
    }

    #[test]
    fn delivery_failure_mentions_certificate_was_created() {
        let human = humanize_error(&CertError::Delivery("535 authentication failed".into()));
        assert_eq!(human.severity, Severity::Error);
        assert!(human.suggestion.contains("created"));
    }
}
