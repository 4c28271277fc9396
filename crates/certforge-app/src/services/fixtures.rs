// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// On-disk test fixture: two events with rosters and 400x300 templates in a
// temporary directory.

use std::path::PathBuf;
use std::sync::Arc;

use certforge_core::config::{AppConfig, EventConfig, FontConfig};
use certforge_core::types::Anchor;
use certforge_core::TemplateRegistry;
use certforge_document::CertificateRenderer;
use certforge_roster::AttendanceStore;
use image::{Rgba, RgbaImage};
use tempfile::TempDir;

use super::pipeline::IssuancePipeline;

/// Font checked in under `fixtures/fonts`.
pub const FIXTURE_FONT: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../fixtures/fonts/DejaVuSansMono.ttf"
);

pub struct Fixture {
    _dir: TempDir,
    pub config: AppConfig,
    pub renderer: CertificateRenderer,
}

impl Fixture {
    pub fn new() -> Self {
        let fonts = FontConfig {
            path: Some(PathBuf::from(FIXTURE_FONT)),
            name_px: 32.0,
            quantity_px: 20.0,
            ..FontConfig::default()
        };
        let renderer = CertificateRenderer::from_config(&fonts).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            roster_dir: dir.path().join("attendance"),
            template_dir: dir.path().join("templates"),
            fonts,
            events: vec![
                EventConfig {
                    key: "nss_camp_2026".into(),
                    display_name: "NSS Camp 2026".into(),
                    template: Some("nss_camp_2026.png".into()),
                    name_anchor: Some(Anchor { x: 0.5, y: 0.38 }),
                    quantity_anchor: None,
                    tracks_quantity: false,
                },
                EventConfig {
                    key: "food_drive".into(),
                    display_name: "Food Drive".into(),
                    template: Some("food_drive.png".into()),
                    name_anchor: Some(Anchor { x: 0.5, y: 0.4 }),
                    quantity_anchor: Some(Anchor { x: 0.5, y: 0.7 }),
                    tracks_quantity: true,
                },
            ],
            ..AppConfig::default()
        };

        std::fs::create_dir_all(&config.roster_dir).unwrap();
        std::fs::create_dir_all(&config.template_dir).unwrap();

        let fixture = Self {
            _dir: dir,
            config,
            renderer,
        };
        std::fs::write(
            fixture.roster_path("nss_camp_2026"),
            "Name,Email\nJane Doe,jane@example.org\nJohn Appleseed,john@example.org\n",
        )
        .unwrap();
        std::fs::write(
            fixture.roster_path("food_drive"),
            "name,Quantity\nJane Doe,5\nBob Stone,\n",
        )
        .unwrap();
        for key in ["nss_camp_2026", "food_drive"] {
            RgbaImage::from_pixel(400, 300, Rgba([250, 248, 240, 255]))
                .save(fixture.template_path(key))
                .unwrap();
        }
        fixture
    }

    pub fn roster_path(&self, key: &str) -> PathBuf {
        self.config.roster_dir.join(format!("{key}.csv"))
    }

    pub fn template_path(&self, key: &str) -> PathBuf {
        self.config.template_dir.join(format!("{key}.png"))
    }

    pub fn pipeline(&self) -> IssuancePipeline {
        IssuancePipeline::new(
            Arc::new(TemplateRegistry::from_config(&self.config).unwrap()),
            AttendanceStore::new(&self.config.roster_dir),
            self.renderer.clone(),
        )
    }
}
