//! Summary email delivery

pub mod email;
pub mod smtp;

use async_trait::async_trait;
use summerlog_core::Transient;

pub use email::{EmailMessage, compose_summary_email};
pub use smtp::SmtpMailer;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {message}")]
    Smtp { message: String, permanent: bool },
}

impl Transient for MailError {
    fn is_transient(&self) -> bool {
        matches!(self, MailError::Smtp { permanent: false, .. })
    }
}

impl From<MailError> for summerlog_core::Error {
    fn from(err: MailError) -> Self {
        match err {
            MailError::Config(msg) => summerlog_core::Error::Config(msg),
            other => summerlog_core::Error::EmailDelivery(other.to_string()),
        }
    }
}

/// Outbound mail boundary
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}
