use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

/// Outgoing mail used by the account flows
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, name: &str, url: &str) -> Result<(), MailerError>;
}

/// Writes mails to the log instead of sending them
#[derive(Debug, Clone, Copy)]
pub struct LogMailer {
    reset_ttl: Duration,
}

impl LogMailer {
    /// `reset_ttl` is how long a reset link stays valid
    pub fn new(reset_ttl: Duration) -> Self {
        Self { reset_ttl }
    }

    fn reset_message(&self, name: &str, url: &str) -> String {
        let minutes = self.reset_ttl.as_secs() / 60;
        let validity = if minutes == 1 { "1 minute".to_string() } else { format!("{} minutes", minutes) };
        format!(
            "Password reset for {}: submit a PATCH request with your new password and passwordConfirm to {} (valid for {})",
            name, url, validity
        )
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, to: &str, name: &str, url: &str) -> Result<(), MailerError> {
        tracing::info!(to = %to, "{}", self.reset_message(name, url));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_message_uses_configured_ttl() {
        let message = LogMailer::new(Duration::from_secs(30 * 60)).reset_message("Leo", "http://x/reset/abc");
        assert!(message.contains("http://x/reset/abc"));
        assert!(message.ends_with("(valid for 30 minutes)"));

        let message = LogMailer::new(Duration::from_secs(60)).reset_message("Leo", "u");
        assert!(message.ends_with("(valid for 1 minute)"));
    }
}
