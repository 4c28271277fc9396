// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: initialises the backend subsystems once at startup
// and gives the HTTP handlers async entry points.
//
// The pipeline does blocking work, so each submission runs on Tokio's blocking
// pool. The registry and pipeline are immutable and shared behind `Arc`; the
// delivery queue handle is cheap to clone.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use certforge_core::config::{AppConfig, DeliveryMode};
use certforge_core::error::{CertError, Result};
use certforge_core::types::{DeliveryId, DeliveryRecord, PipelineStage, Submission};
use certforge_core::{EventDescriptor, TemplateRegistry};
use certforge_document::{CertificateDocument, CertificateRenderer};
use certforge_mail::{
    Composer, DeliveryLedger, DeliveryQueue, DeliveryRequest, DeliveryTicket, Mailer, SmtpMailer,
};
use certforge_roster::AttendanceStore;
use tracing::{debug, info, instrument};

use super::pipeline::{Certificate, IssuancePipeline};

/// What a successful submission produced.
#[derive(Debug)]
pub enum Issued {
    /// Hand the PDF straight back to the caller.
    Download(CertificateDocument),
    /// The PDF was built and handed to the delivery worker; `ticket.id`
    /// is what the caller polls.
    Queued {
        document: CertificateDocument,
        ticket: DeliveryTicket,
    },
}

/// What email mode needs on top of the pipeline.
pub struct EmailBackend {
    pub mailer: Arc<dyn Mailer>,
    pub ledger: DeliveryLedger,
}

/// Shared services handed to every request handler.
#[derive(Clone)]
pub struct AppServices {
    pipeline: Arc<IssuancePipeline>,
    delivery: Option<DeliveryQueue>,
    config: Arc<AppConfig>,
}

impl AppServices {
    /// Initialise everything from config. Call once, inside the runtime.
    ///
    /// In email mode the SMTP credentials must be present; the server refuses
    /// to start rather than accept submissions it cannot deliver. Download
    /// mode never touches the delivery ledger.
    #[instrument(skip_all, fields(mode = ?config.delivery_mode))]
    pub fn init(config: AppConfig, data_dir: &Path) -> Result<Self> {
        let renderer = CertificateRenderer::from_config(&config.fonts)?;

        let email = match config.delivery_mode {
            DeliveryMode::Download => None,
            DeliveryMode::Email => Some(EmailBackend {
                mailer: Arc::new(SmtpMailer::from_config(&config.smtp)?),
                ledger: open_ledger(&config, data_dir)?,
            }),
        };

        Self::assemble(config, renderer, email)
    }

    /// Wire the services from already-built parts. `email` is required in
    /// email mode and ignored otherwise.
    pub fn assemble(
        config: AppConfig,
        renderer: CertificateRenderer,
        email: Option<EmailBackend>,
    ) -> Result<Self> {
        let registry = Arc::new(TemplateRegistry::from_config(&config)?);
        if registry.is_empty() {
            return Err(CertError::Config("no events configured".into()));
        }
        let store = AttendanceStore::new(config.roster_dir.clone());

        let delivery = match config.delivery_mode {
            DeliveryMode::Download => None,
            DeliveryMode::Email => {
                let email = email.ok_or_else(|| {
                    CertError::Config("email delivery selected but no mailer configured".into())
                })?;
                Some(DeliveryQueue::start(
                    Composer::from_config(&config.smtp)?,
                    email.mailer,
                    email.ledger,
                    Duration::from_secs(config.smtp.timeout_secs),
                ))
            }
        };

        info!(events = registry.len(), "app services initialised");
        Ok(Self {
            pipeline: Arc::new(IssuancePipeline::new(registry, store, renderer)),
            delivery,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn events(&self) -> &[EventDescriptor] {
        self.pipeline.registry().events()
    }

    // -- Issuance ------------------------------------------------------------

    /// Run one submission through the pipeline and, in email mode, queue the
    /// result for delivery.
    ///
    /// A delivery failure never undoes the PDF: the response is already
    /// `Queued` by then and the outcome lands in the ledger.
    #[instrument(skip_all, fields(event = %submission.event))]
    pub async fn issue(&self, submission: Submission) -> Result<Issued> {
        let pipeline = Arc::clone(&self.pipeline);
        let (stage, result) = tokio::task::spawn_blocking(move || {
            let mut stage = PipelineStage::Idle;
            let result = pipeline
                .issue(&submission, &mut stage)
                .map(|cert| (cert, submission));
            (stage, result)
        })
        .await
        .map_err(|e| CertError::Render(format!("issuance task failed: {e}")))?;

        let (certificate, submission) = match result {
            Ok(done) => done,
            Err(err) => {
                info!(?stage, "issuance stopped");
                return Err(err);
            }
        };

        debug!(quantity = ?certificate.quantity, "certificate ready");

        let mut stage = stage;
        let issued = match &self.delivery {
            None => {
                stage.advance(PipelineStage::Done);
                Issued::Download(certificate.document)
            }
            Some(queue) => {
                stage.advance(PipelineStage::Delivering);
                let issued = enqueue(queue, &submission, certificate);
                stage.advance(if issued.is_ok() {
                    PipelineStage::Done
                } else {
                    PipelineStage::ErrorReported
                });
                issued?
            }
        };

        info!(?stage, "issuance finished");
        Ok(issued)
    }

    /// Render without packaging; returns PNG bytes.
    pub async fn preview(&self, submission: Submission) -> Result<Vec<u8>> {
        let pipeline = Arc::clone(&self.pipeline);
        tokio::task::spawn_blocking(move || pipeline.preview(&submission)?.to_png_bytes())
            .await
            .map_err(|e| CertError::Render(format!("preview task failed: {e}")))?
    }

    // -- Delivery status ------------------------------------------------------

    /// `Ok(None)` for unknown ids and in download mode.
    pub fn delivery_status(&self, id: &DeliveryId) -> Result<Option<DeliveryRecord>> {
        match &self.delivery {
            Some(queue) => queue.status(id),
            None => Ok(None),
        }
    }
}

fn enqueue(queue: &DeliveryQueue, submission: &Submission, certificate: Certificate) -> Result<Issued> {
    let document = certificate.document;
    let ticket = queue.notify(
        DeliveryRequest {
            recipient: submission.email.clone(),
            display_name: certificate.display_name,
            event_display_name: certificate.event.display_name.clone(),
            document: document.clone(),
        },
        &certificate.event.key,
    )?;
    Ok(Issued::Queued { document, ticket })
}

/// File-backed when `ledger_path` is set, in-memory otherwise.
fn open_ledger(config: &AppConfig, data_dir: &Path) -> Result<DeliveryLedger> {
    match &config.ledger_path {
        Some(path) => DeliveryLedger::open(resolve(data_dir, path)),
        None => DeliveryLedger::open_in_memory(),
    }
}

/// Relative ledger paths live under the data directory.
fn resolve(data_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        data_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::Fixture;
    use certforge_core::types::DeliveryStatus;
    use certforge_mail::OutboxMailer;

    fn services(fixture: &Fixture, mode: DeliveryMode, mailer: Option<OutboxMailer>) -> AppServices {
        let config = AppConfig {
            delivery_mode: mode,
            smtp: certforge_core::config::SmtpConfig {
                username: "certs@example.org".into(),
                timeout_secs: 5,
                ..Default::default()
            },
            ..fixture.config.clone()
        };
        let email = mailer.map(|m| EmailBackend {
            mailer: Arc::new(m),
            ledger: DeliveryLedger::open_in_memory().unwrap(),
        });
        AppServices::assemble(config, fixture.renderer.clone(), email).unwrap()
    }

    #[tokio::test]
    async fn download_mode_returns_the_pdf() {
        let fixture = Fixture::new();
        let services = services(&fixture, DeliveryMode::Download, None);

        let issued = services
            .issue(Submission::new("jane doe", "jane@example.org", "nss_camp_2026"))
            .await
            .unwrap();
        let Issued::Download(document) = issued else {
            panic!("expected a download");
        };
        assert!(document.bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn email_mode_queues_and_delivers() {
        let fixture = Fixture::new();
        let outbox = OutboxMailer::new();
        let services = services(&fixture, DeliveryMode::Email, Some(outbox.clone()));

        let issued = services
            .issue(Submission::new("Jane Doe", "jane@example.org", "nss_camp_2026"))
            .await
            .unwrap();
        let Issued::Queued { ticket, .. } = issued else {
            panic!("expected a queued delivery");
        };
        let delivery_id = ticket.id;
        ticket.outcome().await.unwrap();

        assert_eq!(outbox.sent_count(), 1);
        let record = services.delivery_status(&delivery_id).unwrap().unwrap();
        assert_eq!(record.status, DeliveryStatus::Delivered);
        assert_eq!(record.file_name, "Jane Doe_NSS Camp 2026.pdf");
    }

    #[tokio::test]
    async fn auth_failure_still_produces_the_pdf() {
        let fixture = Fixture::new();
        let outbox = OutboxMailer::failing("535 5.7.8 Username and Password not accepted");
        let services = services(&fixture, DeliveryMode::Email, Some(outbox));

        let issued = services
            .issue(Submission::new("Jane Doe", "jane@example.org", "nss_camp_2026"))
            .await
            .unwrap();
        let Issued::Queued { document, ticket } = issued else {
            panic!("expected a queued delivery");
        };
        let delivery_id = ticket.id;
        assert!(document.bytes.starts_with(b"%PDF"));
        assert!(ticket.outcome().await.is_err());

        let record = services.delivery_status(&delivery_id).unwrap().unwrap();
        assert_eq!(record.status, DeliveryStatus::Failed);
    }

    #[tokio::test]
    async fn rejected_name_sends_nothing() {
        let fixture = Fixture::new();
        // Without a template any attempt to render would fail differently.
        std::fs::remove_file(fixture.template_path("nss_camp_2026")).unwrap();
        let outbox = OutboxMailer::new();
        let services = services(&fixture, DeliveryMode::Email, Some(outbox.clone()));

        let err = services
            .issue(Submission::new("John Smith", "john@example.org", "nss_camp_2026"))
            .await
            .unwrap_err();
        assert!(err.is_rejection());
        tokio::task::yield_now().await;
        assert_eq!(outbox.sent_count(), 0);
    }

    #[tokio::test]
    async fn email_mode_without_mailer_is_a_config_error() {
        let fixture = Fixture::new();
        let config = AppConfig {
            delivery_mode: DeliveryMode::Email,
            ..fixture.config.clone()
        };
        let result = AppServices::assemble(config, fixture.renderer.clone(), None);
        assert!(matches!(result, Err(CertError::Config(_))));
    }

    #[test]
    fn download_mode_never_creates_a_ledger_file() {
        let fixture = Fixture::new();
        let data = tempfile::tempdir().unwrap();
        let config = AppConfig {
            delivery_mode: DeliveryMode::Download,
            ledger_path: Some(PathBuf::from("deliveries.db")),
            ..fixture.config.clone()
        };

        AppServices::init(config.clone(), data.path()).unwrap();
        assert!(!data.path().join("deliveries.db").exists());

        open_ledger(&config, data.path()).unwrap();
        assert!(data.path().join("deliveries.db").exists());
    }

    #[test]
    fn relative_ledger_paths_resolve_under_data_dir() {
        let data = Path::new("/var/lib/certforge");
        assert_eq!(
            resolve(data, Path::new("deliveries.db")),
            data.join("deliveries.db")
        );
        assert_eq!(
            resolve(data, Path::new("/tmp/d.db")),
            PathBuf::from("/tmp/d.db")
        );
    }
}
