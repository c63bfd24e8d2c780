//! Mailer that only logs

use async_trait::async_trait;

use super::{EmailMessage, MailError, Mailer};

/// Logs every message at info level instead of delivering it
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body_len = message.body.len(),
            "Email not delivered (no SMTP host configured)"
        );
        tracing::debug!(body = %message.body, "Email body");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let mailer = LogMailer::new();
        let result = mailer
            .send(EmailMessage::new("ana@example.com", "Task Updated", "Hello ana"))
            .await;
        assert!(result.is_ok());
        assert_eq!(mailer.name(), "log");
    }
}
