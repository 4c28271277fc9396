// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Attendance store: reads `{roster_dir}/{event_key}.csv` on every lookup and
// reports whether a submitted name is on it.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use certforge_core::error::{CertError, Result};
use certforge_core::types::{normalize_name, AttendanceRecord, MatchResult, NotFoundReason, Quantity};
use certforge_core::EventDescriptor;
use tracing::{debug, info, instrument, warn};

use crate::schema::{ColumnMatch, RosterSchema};

/// Read-only access to the per-event rosters.
///
/// Nothing is cached: every lookup re-reads the file, so roster edits take
/// effect on the next submission.
#[derive(Debug, Clone)]
pub struct AttendanceStore {
    roster_dir: PathBuf,
}

impl AttendanceStore {
    pub fn new(roster_dir: impl Into<PathBuf>) -> Self {
        Self {
            roster_dir: roster_dir.into(),
        }
    }

    /// Location of the roster for `event`.
    pub fn roster_path(&self, event: &EventDescriptor) -> PathBuf {
        self.roster_dir.join(format!("{}.csv", event.key))
    }

    /// Look `name` up in the event's roster.
    ///
    /// Matching is trimmed and case-insensitive on both sides; the first
    /// matching row wins. I/O and parse failures are `RosterRead` errors.
    #[instrument(skip(self, name, event), fields(event = %event.key))]
    pub fn lookup(&self, name: &str, event: &EventDescriptor) -> Result<MatchResult> {
        let path = self.roster_path(event);
        let file = File::open(&path).map_err(|err| roster_error(&path, err))?;
        let result = lookup_in(BufReader::new(file), name, RosterSchema::for_event(event))
            .map_err(|err| match err {
                CertError::RosterRead(detail) => {
                    CertError::RosterRead(format!("{}: {detail}", path.display()))
                }
                other => other,
            })?;

        match &result {
            MatchResult::NotFound(reason) => info!(%reason, "attendee not found"),
            MatchResult::Found(_) => info!("attendee found"),
            MatchResult::FoundWithQuantity(_, quantity) => {
                info!(%quantity, "attendee found with quantity")
            }
        }
        Ok(result)
    }
}

/// Run a lookup against any CSV source.
pub fn lookup_in<R: Read>(reader: R, name: &str, schema: RosterSchema) -> Result<MatchResult> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|err| CertError::RosterRead(err.to_string()))?
        .clone();
    let resolved = schema.resolve(headers.iter());
    debug!(?resolved, "roster schema resolved");

    let name_idx = match resolved.name {
        ColumnMatch::Found(idx) => idx,
        ColumnMatch::Missing => return Ok(MatchResult::NotFound(NotFoundReason::NoNameColumn)),
    };
    let quantity_idx = match resolved.quantity {
        None => None,
        Some(ColumnMatch::Found(idx)) => Some(idx),
        Some(ColumnMatch::Missing) => {
            return Ok(MatchResult::NotFound(NotFoundReason::MissingQuantityColumn));
        }
    };

    let wanted = normalize_name(name);
    for row in csv_reader.records() {
        let row = row.map_err(|err| CertError::RosterRead(err.to_string()))?;
        let cell = row.get(name_idx).unwrap_or("");
        if normalize_name(cell) != wanted {
            continue;
        }

        let quantity = quantity_idx.and_then(|idx| {
            let raw = row.get(idx).unwrap_or("");
            let parsed = Quantity::parse_cell(raw);
            if parsed.is_none() && !is_blank_cell(raw) {
                warn!(cell = raw, "non-numeric quantity ignored");
            }
            parsed
        });

        let record = AttendanceRecord {
            name: cell.trim().to_string(),
            quantity,
        };
        return Ok(match quantity {
            Some(q) => MatchResult::FoundWithQuantity(record, q),
            None => MatchResult::Found(record),
        });
    }

    Ok(MatchResult::NotFound(NotFoundReason::NoMatchingName))
}

/// Empty and `NaN` cells are the normal spelling of "no quantity".
fn is_blank_cell(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan")
}

fn roster_error(path: &Path, err: std::io::Error) -> CertError {
    CertError::RosterRead(format!("{}: {err}", path.display()))
}
