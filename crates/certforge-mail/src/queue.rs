// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background delivery queue.
//
// `notify` composes the message, records it as Pending in the ledger and hands
// it to a single worker task over an unbounded channel. The caller gets a
// ticket back straight away. The worker walks each delivery through
// Sending -> Delivered | Failed, bounding every send by a timeout. Failed
// deliveries are final.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use certforge_core::error::{CertError, Result};
use certforge_core::types::{DeliveryId, DeliveryRecord, DeliveryStatus};
use lettre::Message;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, instrument, warn};

use crate::ledger::DeliveryLedger;
use crate::mailer::Mailer;
use crate::message::{Composer, DeliveryRequest};

/// Handle to one queued delivery.
#[derive(Debug)]
pub struct DeliveryTicket {
    pub id: DeliveryId,
    completion: oneshot::Receiver<Result<()>>,
}

impl DeliveryTicket {
    /// Wait for the worker's final verdict on this delivery.
    pub async fn outcome(self) -> Result<()> {
        self.completion
            .await
            .map_err(|_| CertError::Delivery("delivery worker stopped".into()))?
    }
}

struct Job {
    id: DeliveryId,
    message: Message,
    reply: oneshot::Sender<Result<()>>,
}

/// Cheap to clone; all clones feed the same worker.
#[derive(Clone)]
pub struct DeliveryQueue {
    sender: mpsc::UnboundedSender<Job>,
    composer: Arc<Composer>,
    ledger: Arc<Mutex<DeliveryLedger>>,
}

impl DeliveryQueue {
    /// Spawn the worker on the current Tokio runtime.
    pub fn start(
        composer: Composer,
        mailer: Arc<dyn Mailer>,
        ledger: DeliveryLedger,
        send_timeout: Duration,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let ledger = Arc::new(Mutex::new(ledger));

        tokio::spawn(run_worker(receiver, mailer, Arc::clone(&ledger), send_timeout));
        info!(timeout_secs = send_timeout.as_secs(), "delivery worker started");

        Self {
            sender,
            composer: Arc::new(composer),
            ledger,
        }
    }

    /// Queue a certificate for delivery.
    ///
    /// Composition problems (an undeliverable recipient, say) fail here and
    /// nothing is queued. Everything after that is reported through the
    /// ticket and the ledger.
    #[instrument(skip_all, fields(recipient = %request.recipient))]
    pub fn notify(&self, request: DeliveryRequest, event_key: &str) -> Result<DeliveryTicket> {
        let message = self.composer.compose(&request)?;

        let record = DeliveryRecord::new(
            request.recipient.trim().to_string(),
            event_key.to_string(),
            request.document.file_name.clone(),
            request.document.image_digest.clone(),
        );
        let id = record.id;
        with_ledger(&self.ledger, |ledger| ledger.insert(&record))?;

        let (reply, completion) = oneshot::channel();
        if self.sender.send(Job { id, message, reply }).is_err() {
            let reason = "delivery worker stopped";
            with_ledger(&self.ledger, |ledger| {
                ledger.update_status(&id, DeliveryStatus::Failed, Some(reason))
            })?;
            return Err(CertError::Delivery(reason.into()));
        }

        info!(delivery_id = %id, "delivery queued");
        Ok(DeliveryTicket { id, completion })
    }

    /// Current ledger entry for `id`.
    pub fn status(&self, id: &DeliveryId) -> Result<Option<DeliveryRecord>> {
        with_ledger(&self.ledger, |ledger| ledger.get(id))
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<DeliveryRecord>> {
        with_ledger(&self.ledger, |ledger| ledger.recent(limit))
    }
}

fn with_ledger<T>(
    ledger: &Mutex<DeliveryLedger>,
    f: impl FnOnce(&DeliveryLedger) -> Result<T>,
) -> Result<T> {
    let guard = ledger
        .lock()
        .map_err(|_| CertError::Database("delivery ledger lock poisoned".into()))?;
    f(&guard)
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<Job>,
    mailer: Arc<dyn Mailer>,
    ledger: Arc<Mutex<DeliveryLedger>>,
    send_timeout: Duration,
) {
    while let Some(job) = receiver.recv().await {
        let outcome = deliver(&job, mailer.as_ref(), &ledger, send_timeout).await;
        // The submitter may have stopped listening; the ledger still has it.
        let _ = job.reply.send(outcome);
    }
    info!("delivery worker stopped");
}

#[instrument(skip_all, fields(delivery_id = %job.id))]
async fn deliver(
    job: &Job,
    mailer: &dyn Mailer,
    ledger: &Mutex<DeliveryLedger>,
    send_timeout: Duration,
) -> Result<()> {
    if let Err(e) = with_ledger(ledger, |l| l.update_status(&job.id, DeliveryStatus::Sending, None)) {
        warn!(error = %e, "could not mark delivery as sending");
    }

    let outcome = match tokio::time::timeout(send_timeout, mailer.send(job.message.clone())).await {
        Ok(result) => result,
        Err(_) => Err(CertError::Delivery(format!(
            "timed out after {}s",
            send_timeout.as_secs_f32()
        ))),
    };

    let update = match &outcome {
        Ok(()) => {
            info!("certificate delivered");
            with_ledger(ledger, |l| l.update_status(&job.id, DeliveryStatus::Delivered, None))
        }
        Err(e) => {
            error!(error = %e, "certificate delivery failed");
            let reason = e.to_string();
            with_ledger(ledger, |l| {
                l.update_status(&job.id, DeliveryStatus::Failed, Some(&reason))
            })
        }
    };
    if let Err(e) = update {
        warn!(error = %e, "could not record delivery outcome");
    }

    outcome
}
