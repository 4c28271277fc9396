// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mail transports. `SmtpMailer` talks to a real relay over implicit TLS;
// `OutboxMailer` keeps messages in memory.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use certforge_core::config::SmtpConfig;
use certforge_core::error::{CertError, Result};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info, instrument};

/// Sends a fully composed message.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: Message) -> Result<()>;
}

// ---------------------------------------------------------------------------
// SMTP
// ---------------------------------------------------------------------------

/// Authenticated SMTP over TLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build a transport from config. The password is read from the
    /// environment variable the config names.
    #[instrument(skip_all, fields(relay = %config.relay, port = config.port))]
    pub fn from_config(config: &SmtpConfig) -> Result<Self> {
        let password = config.password().ok_or_else(|| {
            CertError::Config(format!("SMTP password not set in ${}", config.password_env))
        })?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.relay)
            .map_err(|e| CertError::Config(format!("SMTP relay '{}': {e}", config.relay)))?
            .port(config.port)
            .credentials(Credentials::new(config.username.clone(), password))
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        info!("SMTP transport configured");
        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: Message) -> Result<()> {
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| CertError::Delivery(e.to_string()))?;
        debug!(code = %response.code(), "relay accepted message");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Collects messages instead of sending them. Optionally fails every send
/// with a fixed reason, which is how relay rejections are simulated.
#[derive(Clone, Default)]
pub struct OutboxMailer {
    sent: Arc<Mutex<Vec<Message>>>,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Sleep this long before completing each send.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Raw RFC 5322 form of everything sent so far.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        match self.sent.lock() {
            Ok(sent) => sent.iter().map(Message::formatted).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, message: Message) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = &self.failure {
            return Err(CertError::Delivery(reason.clone()));
        }
        self.sent
            .lock()
            .map_err(|_| CertError::Delivery("outbox lock poisoned".into()))?
            .push(message);
        Ok(())
    }
}
