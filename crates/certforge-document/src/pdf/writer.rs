// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: package a rendered certificate as a single-page PDF using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use certforge_core::error::{CertError, Result};
use ::image::{DynamicImage, Rgb, RgbImage};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

use crate::image::renderer::RenderedArtifact;
use crate::integrity::hash_bytes;

/// Points per millimetre.
const PT_PER_MM: f32 = 72.0 / 25.4;

/// At 72 DPI one image pixel occupies exactly one PDF point.
const ONE_TO_ONE_DPI: f32 = 72.0;

/// /Title in the document info dictionary.
const DOCUMENT_TITLE: &str = "Certificate";

/// A packaged certificate, ready for download or attachment.
#[derive(Debug, Clone)]
pub struct CertificateDocument {
    /// Suggested file name, `{name}_{event}.pdf`.
    pub file_name: String,
    /// Serialised PDF.
    pub bytes: Vec<u8>,
    /// SHA-256 of the lossless PNG the page image was built from.
    pub image_digest: String,
    /// Page width in points (= artifact width in pixels).
    pub width: u32,
    /// Page height in points (= artifact height in pixels).
    pub height: u32,
}

/// Build the attachment/download file name for a certificate.
pub fn certificate_file_name(display_name: &str, event_display_name: &str) -> String {
    let sanitize = |s: &str| -> String {
        s.chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect()
    };
    format!("{}_{}.pdf", sanitize(display_name), sanitize(event_display_name))
}

/// Wraps rendered artifacts into image-sized single-page PDFs.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfWriter;

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Package a rendered artifact.
    ///
    /// The artifact is encoded losslessly as PNG first; that PNG is what ends
    /// up on the page and what `image_digest` fingerprints.
    #[instrument(skip(self, artifact, file_name), fields(width = artifact.width(), height = artifact.height()))]
    pub fn package(
        &self,
        artifact: &RenderedArtifact,
        file_name: impl Into<String>,
    ) -> Result<CertificateDocument> {
        let png = artifact.to_png_bytes()?;
        let bytes = self.create_from_png(&png)?;
        let document = CertificateDocument {
            file_name: file_name.into(),
            bytes,
            image_digest: hash_bytes(&png),
            width: artifact.width(),
            height: artifact.height(),
        };
        info!(
            file_name = %document.file_name,
            pdf_bytes = document.bytes.len(),
            "certificate packaged"
        );
        Ok(document)
    }

    /// Create a single-page PDF whose page is exactly the image's pixel size,
    /// with the image placed at the origin, unscaled.
    #[instrument(skip(self, png_bytes), fields(bytes_len = png_bytes.len()))]
    pub fn create_from_png(&self, png_bytes: &[u8]) -> Result<Vec<u8>> {
        let dynamic_image = ::image::load_from_memory(png_bytes).map_err(|err| {
            CertError::Pdf(format!("failed to decode image for PDF: {}", err))
        })?;
        let img_width = dynamic_image.width();
        let img_height = dynamic_image.height();

        let rgb_image = flatten_onto_white(&dynamic_image);
        let raw = RawImage {
            pixels: RawImageData::U8(rgb_image.into_raw()),
            width: img_width as usize,
            height: img_height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new(DOCUMENT_TITLE);
        let xobject_id = doc.add_image(&raw);

        let page_w = Mm(img_width as f32 / PT_PER_MM);
        let page_h = Mm(img_height as f32 / PT_PER_MM);

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: None,
                scale_y: None,
                dpi: Some(ONE_TO_ONE_DPI),
                rotate: None,
            },
        }];

        doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);
        debug!(img_width, img_height, "Image placed on page");

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(warnings = warnings.len(), "printpdf reported warnings");
        }

        Ok(output)
    }
}

/// Composite the image over opaque white and drop the alpha channel.
///
/// Transparent template regions come out white rather than whatever colour
/// the encoder left under them.
fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| -> u8 {
            let (c, a) = (u16::from(c), u16::from(a));
            ((c * a + 255 * (255 - a) + 127) / 255) as u8
        };
        Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::PdfReader;
    use ::image::{ImageFormat, Rgba, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        let mut buffer = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn page_matches_image_size() {
        let pdf = PdfWriter::new().create_from_png(&png(300, 200)).unwrap();
        let reader = PdfReader::from_bytes(&pdf).unwrap();

        assert_eq!(reader.page_count(), 1);
        let (w, h) = reader.page_size(1).unwrap();
        assert!((w - 300.0).abs() < 0.5, "width {w}");
        assert!((h - 200.0).abs() < 0.5, "height {h}");
    }

    #[test]
    fn exactly_one_image_is_embedded() {
        let pdf = PdfWriter::new().create_from_png(&png(40, 30)).unwrap();
        let images = PdfReader::from_bytes(&pdf).unwrap().embedded_images();
        assert_eq!(images.len(), 1);
        assert_eq!((images[0].width, images[0].height), (40, 30));
    }

    #[test]
    fn packaging_twice_embeds_identical_image_bytes() {
        let writer = PdfWriter::new();
        let source = png(64, 48);
        let first = writer.create_from_png(&source).unwrap();
        let second = writer.create_from_png(&source).unwrap();

        let a = PdfReader::from_bytes(&first).unwrap().embedded_images();
        let b = PdfReader::from_bytes(&second).unwrap().embedded_images();
        assert_eq!(a[0].data, b[0].data);
    }

    #[test]
    fn package_names_and_fingerprints_the_document() {
        use crate::image::renderer::CertificateRenderer;
        use crate::test_support::fixture_fonts;
        use certforge_core::config::EventConfig;
        use certforge_core::TemplateRegistry;

        let events = [EventConfig {
            key: "camp".into(),
            display_name: "Camp".into(),
            template: None,
            name_anchor: None,
            quantity_anchor: None,
            tracks_quantity: false,
        }];
        let registry = TemplateRegistry::from_events(&events, "templates").unwrap();
        let event = registry.resolve("camp").unwrap();
        let renderer = CertificateRenderer::from_config(&fixture_fonts(24.0, 12.0)).unwrap();
        let template = ::image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            120,
            80,
            Rgba([255, 255, 255, 255]),
        ));
        let artifact = renderer.render_onto(&template, event, "Jane Doe", None);

        let document = PdfWriter::new()
            .package(&artifact, certificate_file_name("Jane Doe", "Camp"))
            .unwrap();
        assert_eq!(document.file_name, "Jane Doe_Camp.pdf");
        assert_eq!((document.width, document.height), (120, 80));
        assert_eq!(document.image_digest, hash_bytes(&artifact.to_png_bytes().unwrap()));
        assert!(document.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn transparent_pixels_flatten_to_white() {
        let mut img = RgbaImage::from_pixel(3, 1, Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 0, Rgba([200, 10, 10, 255]));
        img.put_pixel(2, 0, Rgba([0, 0, 0, 128]));

        let flat = flatten_onto_white(&DynamicImage::ImageRgba8(img));
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(flat.get_pixel(1, 0).0, [200, 10, 10]);
        assert_eq!(flat.get_pixel(2, 0).0, [127, 127, 127]);
    }

    #[test]
    fn undecodable_input_is_a_pdf_error() {
        let err = PdfWriter::new().create_from_png(b"not an image").unwrap_err();
        assert!(matches!(err, CertError::Pdf(_)));
    }

    #[test]
    fn file_name_combines_name_and_event() {
        assert_eq!(
            certificate_file_name("Jane Doe", "NSS Camp 2026"),
            "Jane Doe_NSS Camp 2026.pdf"
        );
        assert_eq!(certificate_file_name("A/B", "C:D"), "A_B_C_D.pdf");
    }
}
