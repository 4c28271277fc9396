// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: inspect packaged certificates using the `lopdf` crate: page
// count, page size, and the embedded image streams.

use certforge_core::error::{CertError, Result};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, instrument};

/// An image XObject found in a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub width: i64,
    pub height: i64,
    /// Stream content as stored (possibly compressed).
    pub data: Vec<u8>,
}

/// Read-only view of a PDF.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            CertError::Pdf(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Width and height in points of page `page_number` (1-indexed), taken
    /// from its MediaBox, following the page tree for inherited boxes.
    pub fn page_size(&self, page_number: u32) -> Result<(f32, f32)> {
        let pages = self.document.get_pages();
        let mut current: ObjectId = *pages.get(&page_number).ok_or_else(|| {
            CertError::Pdf(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })?;

        loop {
            let dict = self
                .document
                .get_object(current)
                .and_then(Object::as_dict)
                .map_err(|err| CertError::Pdf(format!("page object unreadable: {err}")))?;

            if let Ok(media_box) = dict.get(b"MediaBox").and_then(Object::as_array) {
                let coords: Vec<f32> = media_box.iter().filter_map(number).collect();
                if coords.len() != 4 {
                    return Err(CertError::Pdf("malformed MediaBox".into()));
                }
                return Ok((coords[2] - coords[0], coords[3] - coords[1]));
            }

            current = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .map_err(|_| CertError::Pdf("page has no MediaBox".into()))?;
        }
    }

    /// All image XObject streams, in object order.
    pub fn embedded_images(&self) -> Vec<EmbeddedImage> {
        self.document
            .objects
            .values()
            .filter_map(|object| match object {
                Object::Stream(stream) => Some(stream),
                _ => None,
            })
            .filter(|stream| {
                stream
                    .dict
                    .get(b"Subtype")
                    .and_then(Object::as_name)
                    .map(|name| name == b"Image")
                    .unwrap_or(false)
            })
            .map(|stream| EmbeddedImage {
                width: stream.dict.get(b"Width").and_then(Object::as_i64).unwrap_or(0),
                height: stream.dict.get(b"Height").and_then(Object::as_i64).unwrap_or(0),
                data: stream.content.clone(),
            })
            .collect()
    }
}

/// Numeric PDF object as `f32`.
fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}
