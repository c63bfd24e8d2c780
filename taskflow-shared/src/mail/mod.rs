//! Outbound email
//!
//! Services talk to a [`Mailer`] trait object so the transport can be chosen
//! at startup:
//!
//! - [`smtp::SmtpMailer`]: real delivery through lettre's async SMTP transport
//! - [`logging::LogMailer`]: writes each message to the tracing log, used when no
//!   SMTP host is configured
//! - [`memory::MemoryMailer`]: records messages in memory for tests
//!
//! Sends are awaited inline by the caller. There is no queue and no retry.

pub mod logging;
pub mod memory;
pub mod smtp;
pub mod templates;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A plain-text email ready to send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Recipient address
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Email delivery backend
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers one message. Errors are returned to the caller unchanged.
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}
