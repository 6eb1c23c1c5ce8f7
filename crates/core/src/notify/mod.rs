pub mod sendgrid;

use crate::error::CheckerError;

/// One outbound message to the fixed recipient list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub sender: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

/// Outbound notification channel.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    fn channel_name(&self) -> &'static str;

    async fn send(&self, notification: &Notification) -> Result<(), CheckerError>;
}

/// Writes the message envelope to the log instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    fn channel_name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, notification: &Notification) -> Result<(), CheckerError> {
        tracing::info!(
            sender = %notification.sender,
            recipients = ?notification.recipients,
            subject = %notification.subject,
            body_len = notification.html_body.len(),
            "notification (log only)"
        );
        Ok(())
    }
}
