// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font loading for the overlay text. A configured font file is preferred;
// otherwise a face is picked from the fonts installed on the system.

use std::path::Path;

use ab_glyph::{FontArc, FontVec};
use certforge_core::config::FontConfig;
use certforge_core::error::{CertError, Result};
use tracing::{debug, info, instrument, warn};

/// Load the overlay font described by `config`.
///
/// An unreadable or unparsable `config.path` is logged and the system
/// fallback is used instead.
#[instrument(skip_all)]
pub fn load_font(config: &FontConfig) -> Result<FontArc> {
    if let Some(path) = &config.path {
        match read_font(path) {
            Ok(font) => {
                info!(path = %path.display(), "overlay font loaded");
                return Ok(font);
            }
            Err(err) => warn!(error = %err, "configured font unusable"),
        }
    }
    system_font(&config.fallback_family)
}

/// Parse a TrueType/OpenType file.
pub fn read_font(path: &Path) -> Result<FontArc> {
    let bytes = std::fs::read(path).map_err(|err| {
        CertError::Render(format!("font file {} unreadable: {err}", path.display()))
    })?;
    FontArc::try_from_vec(bytes).map_err(|err| {
        CertError::Render(format!("font file {} unparsable: {err}", path.display()))
    })
}

/// Find a system font, preferring `family`, then any serif, then any
/// sans-serif, then whatever face is installed first.
pub fn system_font(family: &str) -> Result<FontArc> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    debug!(faces = db.len(), "system fonts scanned");

    let query = fontdb::Query {
        families: &[
            fontdb::Family::Name(family),
            fontdb::Family::Serif,
            fontdb::Family::SansSerif,
        ],
        ..Default::default()
    };

    let id = db
        .query(&query)
        .or_else(|| db.faces().next().map(|face| face.id))
        .ok_or_else(|| CertError::Render("no usable font installed".into()))?;

    let font = db
        .with_face_data(id, |data, index| {
            FontVec::try_from_vec_and_index(data.to_vec(), index).ok()
        })
        .flatten()
        .ok_or_else(|| CertError::Render("system font could not be parsed".into()))?;

    info!(family, "overlay font loaded from system");
    Ok(FontArc::new(font))
}
