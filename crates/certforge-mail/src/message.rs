// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Message composition: plain-text body plus one PDF attachment.

use certforge_core::config::SmtpConfig;
use certforge_core::error::{CertError, Result};
use certforge_document::CertificateDocument;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::{Address, Message};

/// Everything needed to mail one certificate.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    pub recipient: String,
    /// Name as printed on the certificate.
    pub display_name: String,
    pub event_display_name: String,
    pub document: CertificateDocument,
}

/// Builds outgoing messages with a fixed sender.
#[derive(Debug, Clone)]
pub struct Composer {
    from: Mailbox,
    sender_name: String,
}

impl Composer {
    pub fn new(sender_name: impl Into<String>, sender_address: &str) -> Result<Self> {
        let sender_name = sender_name.into();
        let address: Address = sender_address.trim().parse().map_err(|err| {
            CertError::Config(format!("sender address '{sender_address}' is invalid: {err}"))
        })?;
        Ok(Self {
            from: Mailbox::new(Some(sender_name.clone()), address),
            sender_name,
        })
    }

    /// Sender is the relay login, as relays generally require.
    pub fn from_config(config: &SmtpConfig) -> Result<Self> {
        Self::new(config.sender_name.clone(), &config.username)
    }

    /// Build the MIME message for `request`.
    pub fn compose(&self, request: &DeliveryRequest) -> Result<Message> {
        let to: Mailbox = request.recipient.trim().parse().map_err(|err| {
            CertError::InputInvalid(format!("'{}' is not deliverable: {err}", request.recipient))
        })?;

        let pdf = ContentType::parse("application/pdf")
            .map_err(|err| CertError::Delivery(format!("content type: {err}")))?;
        let attachment = Attachment::new(request.document.file_name.clone())
            .body(request.document.bytes.clone(), pdf);

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject(&request.event_display_name))
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(body_text(
                        &request.display_name,
                        &request.event_display_name,
                        &self.sender_name,
                    )))
                    .singlepart(attachment),
            )
            .map_err(|err| CertError::Delivery(format!("message build failed: {err}")))
    }
}

/// Subject line.
pub fn subject(event_display_name: &str) -> String {
    format!("Certificate for {event_display_name}")
}

/// Plain-text body.
pub fn body_text(display_name: &str, event_display_name: &str, sender_name: &str) -> String {
    format!(
        "Dear {display_name},\n\n\
         Thank you for participating in {event_display_name}.\n\
         Please find your certificate attached to this email.\n\n\
         Best regards,\n\
         {sender_name}\n"
    )
}
