// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// certforge-document: Certificate artifact generation.
//
// Draws the verified name (and optional quantity) onto a copy of the event's
// template image, then wraps the result in a single-page PDF sized to the
// image. A small lopdf-based reader inspects the output.

pub mod image;
pub mod integrity;
pub mod pdf;

#[cfg(test)]
mod test_support;

// Re-export the primary structs so callers can use `certforge_document::PdfWriter` etc.
pub use crate::image::renderer::{CertificateRenderer, RenderedArtifact, TextPlacement};
pub use integrity::hash_bytes;
pub use pdf::reader::PdfReader;
pub use pdf::writer::{CertificateDocument, PdfWriter, certificate_file_name};
