//! In-memory mailer for tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{EmailMessage, MailError, Mailer};

/// Records sent messages. Clones share the same outbox.
///
/// ```
/// use taskflow_shared::mail::{memory::MemoryMailer, EmailMessage, Mailer};
///
/// # async fn example() {
/// let mailer = MemoryMailer::new();
/// mailer
///     .send(EmailMessage::new("ana@example.com", "Task Deleted", "Hello ana"))
///     .await
///     .unwrap();
/// assert_eq!(mailer.sent().len(), 1);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryMailer {
    outbox: Arc<Mutex<Vec<EmailMessage>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent send fail with a transport error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of the messages sent so far
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }

    /// Messages addressed to `to`
    pub fn sent_to(&self, to: &str) -> Vec<EmailMessage> {
        self.sent().into_iter().filter(|m| m.to == to).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.clear();
        }
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Transport(format!(
                "Delivery to {} refused",
                message.to
            )));
        }

        self.outbox
            .lock()
            .map_err(|_| MailError::Transport("Outbox poisoned".to_string()))?
            .push(message);

        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
