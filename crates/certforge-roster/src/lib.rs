// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// certforge-roster: Attendance checks against per-event CSV rosters.
//
// Rosters are read fresh on every lookup. Column discovery is a separate,
// declarative schema step so the lookup itself only deals with typed column
// positions.

pub mod schema;
pub mod store;

pub use schema::{ColumnMatch, ResolvedSchema, RosterSchema};
pub use store::AttendanceStore;
