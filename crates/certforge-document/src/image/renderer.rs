// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Certificate renderer: overlays the attendee name (and optional quantity)
// onto a private copy of an event's template image using `imageproc` text
// drawing. The template file on disk is only ever read.

use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use certforge_core::config::FontConfig;
use certforge_core::error::{CertError, Result};
use certforge_core::EventDescriptor;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::{debug, info, instrument};

use super::fonts;

/// Overlay text colour: opaque black.
const TEXT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Which field a placement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Name,
    Quantity,
}

/// One piece of text centred on an absolute pixel point.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPlacement {
    pub field: TextField,
    pub text: String,
    /// Absolute centre point, `(round(fx * w), round(fy * h))`.
    pub center: (i32, i32),
    pub px: f32,
}

/// Font sizes for the overlay fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub name_px: f32,
    pub quantity_px: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            name_px: 120.0,
            quantity_px: 60.0,
        }
    }
}

impl TextStyle {
    /// Decide what text goes where on a `width` x `height` template.
    ///
    /// The quantity is placed only when the event has a quantity anchor and
    /// the value is non-empty after trimming.
    pub fn layout(
        &self,
        event: &EventDescriptor,
        width: u32,
        height: u32,
        name: &str,
        quantity: Option<&str>,
    ) -> Vec<TextPlacement> {
        let mut placements = vec![TextPlacement {
            field: TextField::Name,
            text: name.to_string(),
            center: event.anchors.name.resolve(width, height),
            px: self.name_px,
        }];

        let quantity = quantity.map(str::trim).filter(|q| !q.is_empty());
        match (quantity, event.anchors.quantity) {
            (Some(text), Some(anchor)) => placements.push(TextPlacement {
                field: TextField::Quantity,
                text: text.to_string(),
                center: anchor.resolve(width, height),
                px: self.quantity_px,
            }),
            (Some(_), None) => debug!(event = %event.key, "event has no quantity anchor"),
            _ => {}
        }
        placements
    }
}

/// The template with text drawn on it. Lives only for one request.
#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    image: RgbaImage,
    placements: Vec<TextPlacement>,
}

impl RenderedArtifact {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the pixels.
    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    /// Text drawn on the artifact, in drawing order.
    pub fn placements(&self) -> &[TextPlacement] {
        &self.placements
    }

    /// Encode losslessly as PNG.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| CertError::Render(format!("PNG encoding failed: {err}")))?;
        Ok(buffer)
    }
}

/// Draws certificate text onto event templates.
///
/// Holds the parsed font so it is loaded once per process, not per request.
#[derive(Clone)]
pub struct CertificateRenderer {
    font: FontArc,
    style: TextStyle,
}

impl CertificateRenderer {
    pub fn new(font: FontArc, style: TextStyle) -> Self {
        Self { font, style }
    }

    /// Load the font and sizes from config.
    pub fn from_config(config: &FontConfig) -> Result<Self> {
        let font = fonts::load_font(config)?;
        Ok(Self::new(
            font,
            TextStyle {
                name_px: config.name_px,
                quantity_px: config.quantity_px,
            },
        ))
    }

    /// Open the event's template and draw `name` (and `quantity`) on a copy.
    #[instrument(skip(self, event, name, quantity), fields(event = %event.key))]
    pub fn render(
        &self,
        event: &EventDescriptor,
        name: &str,
        quantity: Option<&str>,
    ) -> Result<RenderedArtifact> {
        let template = open_template(&event.template_path)?;
        Ok(self.render_onto(&template, event, name, quantity))
    }

    /// Draw onto a copy of an already-decoded template.
    pub fn render_onto(
        &self,
        template: &DynamicImage,
        event: &EventDescriptor,
        name: &str,
        quantity: Option<&str>,
    ) -> RenderedArtifact {
        let mut canvas = template.to_rgba8();
        let (width, height) = canvas.dimensions();
        let placements = self.style.layout(event, width, height, name, quantity);

        for placement in &placements {
            draw_centered(&mut canvas, &self.font, placement);
        }

        info!(width, height, fields = placements.len(), "certificate rendered");
        RenderedArtifact {
            image: canvas,
            placements,
        }
    }
}

/// Load a template image read-only.
pub fn open_template(path: &Path) -> Result<DynamicImage> {
    let img = image::open(path).map_err(|err| {
        CertError::Template(format!("failed to open {}: {}", path.display(), err))
    })?;
    debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        "template loaded"
    );
    Ok(img)
}

/// Draw `placement.text` centred on `placement.center`: horizontally on its
/// measured width, vertically on the middle of the line between ascender and
/// descender. The vertical position does not depend on which letters the
/// text holds.
fn draw_centered(canvas: &mut RgbaImage, font: &FontArc, placement: &TextPlacement) {
    let scale = PxScale::from(placement.px);
    let scaled = font.as_scaled(scale);
    let (text_w, _) = text_size(scale, font, &placement.text);

    // draw_text_mut puts the baseline at `y + ascent`; descent is negative.
    let baseline = placement.center.1 as f32 + (scaled.ascent() + scaled.descent()) / 2.0;
    let x = placement.center.0 - (text_w as i32) / 2;
    let y = (baseline - scaled.ascent()).round() as i32;
    draw_text_mut(canvas, TEXT_COLOR, x, y, scale, font, &placement.text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use certforge_core::config::EventConfig;
    use certforge_core::types::Anchor;
    use certforge_core::TemplateRegistry;
    use crate::test_support::fixture_fonts;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn event(dir: &Path, tracks_quantity: bool) -> EventDescriptor {
        let config = EventConfig {
            key: "drive".into(),
            display_name: "Food Drive".into(),
            template: Some("drive.png".into()),
            name_anchor: Some(Anchor { x: 0.5, y: 0.3 }),
            quantity_anchor: Some(Anchor { x: 0.5, y: 0.8 }),
            tracks_quantity,
        };
        TemplateRegistry::from_events(&[config], dir)
            .unwrap()
            .resolve("drive")
            .unwrap()
            .clone()
    }

    fn write_template(dir: &Path, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join("drive.png");
        RgbaImage::from_pixel(width, height, WHITE).save(&path).unwrap();
        path
    }

    fn renderer() -> CertificateRenderer {
        CertificateRenderer::from_config(&fixture_fonts(40.0, 30.0)).unwrap()
    }

    /// Vertical midpoint of the drawn ink, or `None` on a blank canvas.
    fn ink_center_y(img: &RgbaImage) -> Option<f32> {
        let rows: Vec<u32> = (0..img.height())
            .filter(|&y| (0..img.width()).any(|x| img.get_pixel(x, y)[0] < 128))
            .collect();
        Some((*rows.first()? + *rows.last()?) as f32 / 2.0)
    }

    fn dark_pixels_near(img: &RgbaImage, center: (i32, i32), radius: i32) -> usize {
        let mut count = 0;
        for y in (center.1 - radius).max(0)..(center.1 + radius).min(img.height() as i32) {
            for x in (center.0 - radius).max(0)..(center.0 + radius).min(img.width() as i32) {
                if img.get_pixel(x as u32, y as u32)[0] < 128 {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn layout_resolves_anchors_against_template_size() {
        let dir = tempfile::tempdir().unwrap();
        let event = event(dir.path(), true);
        let placements = TextStyle::default().layout(&event, 2000, 1414, "Jane Doe", Some("5"));

        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].field, TextField::Name);
        assert_eq!(placements[0].center, (1000, 424));
        assert_eq!(placements[1].text, "5");
        assert_eq!(placements[1].center, (1000, 1131));
        assert!(placements[1].px < placements[0].px);
    }

    #[test]
    fn layout_skips_blank_quantity() {
        let dir = tempfile::tempdir().unwrap();
        let event = event(dir.path(), true);
        let style = TextStyle::default();
        assert_eq!(style.layout(&event, 100, 100, "Jane", Some("   ")).len(), 1);
        assert_eq!(style.layout(&event, 100, 100, "Jane", None).len(), 1);
    }

    #[test]
    fn layout_skips_quantity_without_anchor() {
        let dir = tempfile::tempdir().unwrap();
        let event = event(dir.path(), false);
        let placements = TextStyle::default().layout(&event, 100, 100, "Jane", Some("5"));
        assert_eq!(placements.len(), 1);
    }

    #[test]
    fn missing_template_is_a_template_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_template(&dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, CertError::Template(_)));
    }

    #[test]
    fn render_draws_name_and_quantity() {
        let renderer = renderer();
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path(), 400, 200);
        let event = event(dir.path(), true);

        let artifact = renderer.render(&event, "Jane Doe", Some("5")).unwrap();
        assert_eq!((artifact.width(), artifact.height()), (400, 200));
        assert!(dark_pixels_near(artifact.as_rgba(), (200, 60), 30) > 0);
        assert!(dark_pixels_near(artifact.as_rgba(), (200, 160), 20) > 0);
    }

    #[test]
    fn name_is_vertically_centred_on_its_anchor() {
        let renderer = CertificateRenderer::from_config(&fixture_fonts(80.0, 40.0)).unwrap();
        let template = DynamicImage::ImageRgba8(RgbaImage::from_pixel(600, 300, WHITE));
        let dir = tempfile::tempdir().unwrap();
        let event = event(dir.path(), false);

        // Name anchor is (0.5, 0.3) -> y = 90.
        let artifact = renderer.render_onto(&template, &event, "DOE", None);
        let center = ink_center_y(artifact.as_rgba()).expect("text was drawn");
        assert!((center - 90.0).abs() <= 4.0, "ink centred at y={center}");
    }

    #[test]
    fn empty_quantity_leaves_quantity_area_blank() {
        let renderer = renderer();
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path(), 400, 200);
        let event = event(dir.path(), true);

        let artifact = renderer.render(&event, "Jane Doe", Some("")).unwrap();
        assert_eq!(dark_pixels_near(artifact.as_rgba(), (200, 160), 20), 0);
    }

    #[test]
    fn template_file_is_not_modified() {
        let renderer = renderer();
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(dir.path(), 300, 150);
        let before = std::fs::read(&path).unwrap();

        let event = event(dir.path(), false);
        renderer.render(&event, "Jane Doe", None).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn rendering_is_idempotent() {
        let renderer = renderer();
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path(), 320, 240);
        let event = event(dir.path(), true);

        let first = renderer.render(&event, "Jane Doe", Some("5")).unwrap();
        let second = renderer.render(&event, "Jane Doe", Some("5")).unwrap();
        assert_eq!(first.placements(), second.placements());
        assert_eq!(first.as_rgba().as_raw(), second.as_rgba().as_raw());
    }

    #[test]
    fn png_encoding_is_lossless() {
        let renderer = renderer();
        let template = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 32, WHITE));
        let dir = tempfile::tempdir().unwrap();
        let event = event(dir.path(), false);

        let artifact = renderer.render_onto(&template, &event, "Jo", None);
        let png = artifact.to_png_bytes().unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.as_raw(), artifact.as_rgba().as_raw());
    }
}
