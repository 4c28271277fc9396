// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Certforge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CertError, Result};

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// The three inputs of a certificate request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Full name as typed by the user.
    pub name: String,
    /// Address the certificate should be mailed to.
    pub email: String,
    /// Event key as listed by the template registry.
    pub event: String,
}

impl Submission {
    pub fn new(name: impl Into<String>, email: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            event: event.into(),
        }
    }

    /// Reject empty names and malformed addresses before any roster I/O.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CertError::InputInvalid("name must not be empty".into()));
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err(CertError::InputInvalid("email must not be empty".into()));
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => {
                return Err(CertError::InputInvalid(format!(
                    "'{email}' is not an email address"
                )));
            }
        }
        if self.event.trim().is_empty() {
            return Err(CertError::InputInvalid("no event selected".into()));
        }
        Ok(())
    }

    /// The name as it is printed on the certificate.
    pub fn display_name(&self) -> String {
        title_case(self.name.trim())
    }
}

/// Capitalise the first letter of every alphabetic run and lower-case the rest.
///
/// `"jane o'neil"` becomes `"Jane O'Neil"`.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_alpha = false;
    for ch in input.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

/// Normalise a name for roster comparison: trimmed and lower-cased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

/// Numeric allotment attached to a roster row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity(pub f64);

impl Quantity {
    /// Parse a roster cell. Empty, `NaN`, and non-numeric cells carry no
    /// quantity.
    pub fn parse_cell(cell: &str) -> Option<Self> {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(Self(value)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// One matched roster row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Name exactly as it appears in the roster.
    pub name: String,
    pub quantity: Option<Quantity>,
}

/// Why a lookup did not produce a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotFoundReason {
    /// The roster has no header that reads `name`.
    NoNameColumn,
    /// No row matches the submitted name.
    NoMatchingName,
    /// The event tracks quantities but the roster has no quantity column.
    MissingQuantityColumn,
}

impl std::fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NoNameColumn => "roster has no name column",
            Self::NoMatchingName => "name is not on the roster",
            Self::MissingQuantityColumn => "roster has no quantity column",
        };
        f.write_str(text)
    }
}

/// Outcome of an attendance lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchResult {
    NotFound(NotFoundReason),
    Found(AttendanceRecord),
    FoundWithQuantity(AttendanceRecord, Quantity),
}

impl MatchResult {
    pub fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound(_))
    }

    pub fn quantity(&self) -> Option<Quantity> {
        match self {
            Self::FoundWithQuantity(_, quantity) => Some(*quantity),
            _ => None,
        }
    }

    pub fn record(&self) -> Option<&AttendanceRecord> {
        match self {
            Self::NotFound(_) => None,
            Self::Found(record) | Self::FoundWithQuantity(record, _) => Some(record),
        }
    }
}

// ---------------------------------------------------------------------------
// Anchors
// ---------------------------------------------------------------------------

/// Relative position on a template image, both axes in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

impl Anchor {
    /// The image centre, used when an event configures no anchor.
    pub const CENTER: Anchor = Anchor { x: 0.5, y: 0.5 };

    pub fn new(x: f32, y: f32) -> Result<Self> {
        let in_range = |v: f32| (0.0..=1.0).contains(&v);
        if !in_range(x) || !in_range(y) {
            return Err(CertError::Config(format!(
                "anchor ({x}, {y}) lies outside [0, 1]"
            )));
        }
        Ok(Self { x, y })
    }

    /// Absolute pixel point on a `width` x `height` image.
    ///
    /// Each axis is rounded independently: `(round(x * w), round(y * h))`.
    pub fn resolve(&self, width: u32, height: u32) -> (i32, i32) {
        let px = (f64::from(self.x) * f64::from(width)).round() as i32;
        let py = (f64::from(self.y) * f64::from(height)).round() as i32;
        (px, py)
    }
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

/// Stages of a single issuance pass. There are no retries and no resumption
/// from a terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    Idle,
    Validating,
    Rendering,
    Packaging,
    Delivering,
    Done,
    /// The roster check rejected the name.
    Rejected,
    /// A step failed.
    ErrorReported,
}

impl PipelineStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Rejected | Self::ErrorReported)
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(&self, next: PipelineStage) -> bool {
        use PipelineStage::*;
        match (self, next) {
            (Idle, Validating) => true,
            (Validating, Rendering | Rejected) => true,
            (Rendering, Packaging) => true,
            (Packaging, Delivering | Done) => true,
            (Delivering, Done) => true,
            (from, ErrorReported) => !from.is_terminal() && *from != Idle,
            _ => false,
        }
    }

    /// Move to `next` if the transition is legal. Returns whether it moved.
    pub fn advance(&mut self, next: PipelineStage) -> bool {
        if self.can_advance_to(next) {
            *self = next;
            true
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// Unique identifier for a queued email delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryId(pub Uuid);

impl DeliveryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DeliveryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DeliveryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle of an email delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    /// Queued, waiting for the worker.
    Pending,
    /// Handed to the mail relay.
    Sending,
    /// Accepted by the relay.
    Delivered,
    /// Transport, authentication, or timeout failure. Not retried.
    Failed,
}

impl DeliveryStatus {
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Delivered | Self::Failed)
    }
}

/// Metadata of one delivery. The PDF bytes are never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub id: DeliveryId,
    pub recipient: String,
    pub event: String,
    pub file_name: String,
    /// SHA-256 of the packaged image content.
    pub document_digest: String,
    pub status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub error_message: Option<String>,
}

impl DeliveryRecord {
    pub fn new(
        recipient: String,
        event: String,
        file_name: String,
        document_digest: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DeliveryId::new(),
            recipient,
            event,
            file_name,
            document_digest,
            status: DeliveryStatus::Pending,
            created_at: now,
            updated_at: now,
            error_message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_are_rejected() {
        let err = Submission::new("  ", "a@b.c", "camp").validate().unwrap_err();
        assert!(matches!(err, CertError::InputInvalid(_)));
        let err = Submission::new("Jane", "", "camp").validate().unwrap_err();
        assert!(matches!(err, CertError::InputInvalid(_)));
        let err = Submission::new("Jane", "not-an-address", "camp")
            .validate()
            .unwrap_err();
        assert!(matches!(err, CertError::InputInvalid(_)));
        assert!(Submission::new("Jane", " jane@example.org ", "camp").validate().is_ok());
    }

    #[test]
    fn display_name_is_trimmed_and_title_cased() {
        let sub = Submission::new("  jane doe ", "jane@example.org", "camp");
        assert_eq!(sub.display_name(), "Jane Doe");
        assert_eq!(title_case("MARY o'neil-smith"), "Mary O'Neil-Smith");
    }

    #[test]
    fn normalisation_ignores_case_and_padding() {
        assert_eq!(normalize_name("  Jane DOE\t"), normalize_name("jane doe"));
    }

    #[test]
    fn quantity_cells() {
        assert_eq!(Quantity::parse_cell(" 5 "), Some(Quantity(5.0)));
        assert_eq!(Quantity::parse_cell(""), None);
        assert_eq!(Quantity::parse_cell("NaN"), None);
        assert_eq!(Quantity::parse_cell("n/a"), None);
        assert_eq!(Quantity(5.0).to_string(), "5");
        assert_eq!(Quantity(2.5).to_string(), "2.5");
    }

    #[test]
    fn anchor_resolution_rounds_each_axis() {
        let anchor = Anchor::new(0.5, 0.38).unwrap();
        assert_eq!(anchor.resolve(2000, 1414), (1000, 537));
        let anchor = Anchor::new(0.333, 0.667).unwrap();
        assert_eq!(anchor.resolve(101, 7), (34, 5));
        assert_eq!(Anchor::CENTER.resolve(3, 3), (2, 2));
    }

    #[test]
    fn anchor_outside_unit_square_is_rejected() {
        assert!(Anchor::new(1.2, 0.5).is_err());
        assert!(Anchor::new(0.5, -0.1).is_err());
        assert!(Anchor::new(0.0, 1.0).is_ok());
    }

    #[test]
    fn stage_transitions() {
        use PipelineStage::*;
        assert!(Idle.can_advance_to(Validating));
        assert!(Validating.can_advance_to(Rejected));
        assert!(!Rendering.can_advance_to(Rejected));
        assert!(Packaging.can_advance_to(Done));
        assert!(Delivering.can_advance_to(ErrorReported));
        assert!(!Done.can_advance_to(ErrorReported));
        assert!(!ErrorReported.can_advance_to(Validating));

        let mut stage = Idle;
        assert!(stage.advance(Validating));
        assert!(!stage.advance(Done));
        assert_eq!(stage, Validating);
    }

    #[test]
    fn delivery_id_round_trips_through_display() {
        let id = DeliveryId::new();
        let parsed: DeliveryId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
