// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Roster schema resolution: locate the name and quantity columns in a header
// row.

use certforge_core::EventDescriptor;

/// Header text of the name column, compared trimmed and case-insensitively.
pub const NAME_HEADER: &str = "name";

/// Accepted quantity headers, in priority order. Compared trimmed but
/// case-sensitively.
pub const QUANTITY_HEADERS: [&str; 4] = ["Quantity", "quantity", "Qty", "qty"];

/// Position of a field in the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnMatch {
    Found(usize),
    Missing,
}

impl ColumnMatch {
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Found(idx) => Some(*idx),
            Self::Missing => None,
        }
    }
}

/// Column positions for one roster file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSchema {
    pub name: ColumnMatch,
    /// `None` when the event does not track quantities.
    pub quantity: Option<ColumnMatch>,
}

/// What an event needs from its roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterSchema {
    wants_quantity: bool,
}

impl RosterSchema {
    pub fn new(wants_quantity: bool) -> Self {
        Self { wants_quantity }
    }

    pub fn for_event(event: &EventDescriptor) -> Self {
        Self::new(event.tracks_quantity)
    }

    /// Match a header row against the schema.
    pub fn resolve<'a>(&self, headers: impl IntoIterator<Item = &'a str>) -> ResolvedSchema {
        let headers: Vec<&str> = headers.into_iter().map(clean_header).collect();

        let name = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(NAME_HEADER))
            .map_or(ColumnMatch::Missing, ColumnMatch::Found);

        let quantity = self.wants_quantity.then(|| {
            QUANTITY_HEADERS
                .iter()
                .find_map(|wanted| headers.iter().position(|h| h == wanted))
                .map_or(ColumnMatch::Missing, ColumnMatch::Found)
        });

        ResolvedSchema { name, quantity }
    }
}

/// Strip padding and a leading byte-order mark.
fn clean_header(header: &str) -> &str {
    header.trim_start_matches('\u{feff}').trim()
}
