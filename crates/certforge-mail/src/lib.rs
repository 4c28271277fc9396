// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// certforge-mail: Email delivery of packaged certificates.
//
// Requests are composed into MIME messages, handed to a background worker over
// a channel, and sent through a `Mailer` (SMTP in production). Every delivery
// is tracked in a SQLite ledger; callers get a ticket they can await or poll.
// Deliveries are attempted once: there is no retry.

pub mod ledger;
pub mod mailer;
pub mod message;
pub mod queue;

pub use ledger::DeliveryLedger;
pub use mailer::{Mailer, OutboxMailer, SmtpMailer};
pub use message::{Composer, DeliveryRequest};
pub use queue::{DeliveryQueue, DeliveryTicket};
