//! SMTP delivery via `lettre`.
//!
//! Port 465 uses implicit TLS. Other ports use STARTTLS when credentials are
//! configured and plain SMTP otherwise, e.g. for a local relay on port 25.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use summerlog_config::MailConfig;

use crate::email::EmailMessage;
use crate::{MailError, Mailer};

const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Debug)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

fn parse_mailbox(addr: &str) -> Result<Mailbox, MailError> {
    addr.trim()
        .parse()
        .map_err(|e: lettre::address::AddressError| {
            MailError::Config(format!("invalid address {:?}: {}", addr, e))
        })
}

impl SmtpMailer {
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        if config.host.trim().is_empty() {
            return Err(MailError::Config("SMTP host is required".to_string()));
        }

        let from = parse_mailbox(&config.from)?;
        let to = config
            .to
            .iter()
            .map(|addr| parse_mailbox(addr))
            .collect::<Result<Vec<_>, _>>()?;

        if to.is_empty() {
            return Err(MailError::Config(
                "at least one recipient is required".to_string(),
            ));
        }

        let authenticated = !config.username.is_empty() && !config.password.is_empty();

        let builder = if config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::Config(e.to_string()))?
        } else if authenticated {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| MailError::Config(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let mut builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if authenticated {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }

    pub fn recipients(&self) -> Vec<String> {
        self.to.iter().map(|m| m.email.to_string()).collect()
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let mut builder = Message::builder().from(self.from.clone());
        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }

        let email = builder
            .subject(&message.subject)
            .multipart(MultiPart::alternative_plain_html(
                message.text.clone(),
                message.html.clone(),
            ))
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Smtp {
                message: e.to_string(),
                permanent: e.is_permanent(),
            })?;

        tracing::info!(
            subject = %message.subject,
            recipients = self.to.len(),
            "summary email delivered"
        );

        Ok(())
    }
}
