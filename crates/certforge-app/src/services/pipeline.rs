// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Issuance pipeline: validate -> roster check -> render -> package.
//
// Everything here is blocking (file reads, glyph rasterisation, PNG/PDF
// encoding); callers run it on the blocking pool. The stage the pass ended in
// is written back through a `PipelineStage` the caller owns, so the email step
// can continue the same state machine.

use std::sync::Arc;

use certforge_core::error::{CertError, Result};
use certforge_core::types::{MatchResult, PipelineStage, Quantity, Submission};
use certforge_core::{EventDescriptor, TemplateRegistry};
use certforge_document::{
    CertificateDocument, CertificateRenderer, PdfWriter, RenderedArtifact, certificate_file_name,
};
use certforge_roster::AttendanceStore;
use tracing::{info, instrument, warn};

/// A packaged certificate and what went into it.
#[derive(Debug, Clone)]
pub struct Certificate {
    pub display_name: String,
    pub event: EventDescriptor,
    pub quantity: Option<Quantity>,
    pub document: CertificateDocument,
}

/// A submission that passed the roster check.
struct Verified {
    event: EventDescriptor,
    display_name: String,
    quantity: Option<Quantity>,
}

pub struct IssuancePipeline {
    registry: Arc<TemplateRegistry>,
    store: AttendanceStore,
    renderer: CertificateRenderer,
    writer: PdfWriter,
}

impl IssuancePipeline {
    pub fn new(
        registry: Arc<TemplateRegistry>,
        store: AttendanceStore,
        renderer: CertificateRenderer,
    ) -> Self {
        Self {
            registry,
            store,
            renderer,
            writer: PdfWriter::new(),
        }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Run a full pass up to a packaged PDF.
    ///
    /// On success `stage` is left at `Packaging`; the caller finishes with
    /// `Delivering`/`Done`. A roster miss ends in `Rejected` and nothing is
    /// rendered; any other failure ends in `ErrorReported`.
    #[instrument(skip_all, fields(event = %submission.event))]
    pub fn issue(&self, submission: &Submission, stage: &mut PipelineStage) -> Result<Certificate> {
        let verified = self.verify(submission, stage)?;

        stage.advance(PipelineStage::Rendering);
        let artifact = self.render(&verified).map_err(|e| fail(stage, e))?;

        stage.advance(PipelineStage::Packaging);
        let file_name = certificate_file_name(&verified.display_name, &verified.event.display_name);
        let document = self
            .writer
            .package(&artifact, file_name)
            .map_err(|e| fail(stage, e))?;

        info!(file_name = %document.file_name, "certificate issued");
        Ok(Certificate {
            display_name: verified.display_name,
            event: verified.event,
            quantity: verified.quantity,
            document,
        })
    }

    /// Same checks as `issue`, but stop at the rendered image.
    #[instrument(skip_all, fields(event = %submission.event))]
    pub fn preview(&self, submission: &Submission) -> Result<RenderedArtifact> {
        let mut stage = PipelineStage::Idle;
        let verified = self.verify(submission, &mut stage)?;
        self.render(&verified)
    }

    fn verify(&self, submission: &Submission, stage: &mut PipelineStage) -> Result<Verified> {
        stage.advance(PipelineStage::Validating);
        submission.validate().map_err(|e| fail(stage, e))?;
        let event = self
            .registry
            .resolve(submission.event.trim())
            .map_err(|e| fail(stage, e))?
            .clone();

        let result = self
            .store
            .lookup(&submission.name, &event)
            .map_err(|e| fail(stage, e))?;

        let quantity = match result {
            MatchResult::NotFound(reason) => {
                warn!(%reason, "submission rejected");
                return Err(fail(
                    stage,
                    CertError::AttendeeNotFound {
                        event: event.display_name.clone(),
                        reason,
                    },
                ));
            }
            found => found.quantity(),
        };

        Ok(Verified {
            display_name: submission.display_name(),
            event,
            quantity,
        })
    }

    fn render(&self, verified: &Verified) -> Result<RenderedArtifact> {
        let quantity = verified.quantity.map(|q| q.to_string());
        self.renderer
            .render(&verified.event, &verified.display_name, quantity.as_deref())
    }
}

/// Record the terminal stage for `err` and hand the error back.
fn fail(stage: &mut PipelineStage, err: CertError) -> CertError {
    let terminal = if err.is_rejection() {
        PipelineStage::Rejected
    } else {
        PipelineStage::ErrorReported
    };
    stage.advance(terminal);
    err
}
