//! # Notification System
//!
//! Delivers onboarding verification codes to newly created users. The default
//! [`LogNotifier`] emits a structured event instead of sending mail.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("failed to deliver notification to {recipient}: {reason}")]
    Delivery { recipient: String, reason: String },
}

/// Outbound channel for user notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends the 8-digit verification code a new user must confirm.
    async fn send_verification_code(&self, email: &str, code: &str) -> Result<(), NotifierError>;
}

/// Notifier that only logs the delivery.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_verification_code(&self, email: &str, code: &str) -> Result<(), NotifierError> {
        info!(
            recipient = %redacted_recipient(email),
            code_len = code.len(),
            "verification code issued"
        );
        Ok(())
    }
}

/// Keeps the first character of the local part and the domain: `m***@example.com`.
pub fn redacted_recipient(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{first}***@{domain}")
        }
        None => "***".to_string(),
    }
}
