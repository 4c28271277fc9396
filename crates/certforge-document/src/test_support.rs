// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared test helpers: the font checked in under `fixtures/fonts`.

use std::path::PathBuf;

use certforge_core::config::FontConfig;

pub const FIXTURE_FONT: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../fixtures/fonts/DejaVuSansMono.ttf"
);

/// Font config pointing at the checked-in font.
pub fn fixture_fonts(name_px: f32, quantity_px: f32) -> FontConfig {
    FontConfig {
        path: Some(PathBuf::from(FIXTURE_FONT)),
        name_px,
        quantity_px,
        ..FontConfig::default()
    }
}
