//! Outbound email
//!
//! The [`Mailer`] trait is the delivery seam: the server wires in an SMTP
//! transport, tests record messages, and [`LogMailer`] writes them to the log
//! for local development. [`EmailFactory`] renders the two transactional
//! messages (confirmation and password reset) with links pointing at the
//! client application.

use async_trait::async_trait;

use crate::{account::Email, error::MailError, token::Token};

/// A rendered outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}

/// Mailer that logs messages instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "outbound email (log transport)"
        );
        Ok(())
    }
}

/// Builds the transactional messages sent by the account flows.
#[derive(Debug, Clone)]
pub struct EmailFactory {
    client_url: String,
}

impl EmailFactory {
    pub fn new(client_url: impl Into<String>) -> Self {
        let mut client_url = client_url.into();
        while client_url.ends_with('/') {
            client_url.pop();
        }
        Self { client_url }
    }

    pub fn confirmation(&self, email: &Email, token: &Token) -> EmailMessage {
        let link = format!("{}/confirm-email?token={}", self.client_url, token.nonce);
        EmailMessage {
            to: email.to_string(),
            subject: "Confirm your email address".to_string(),
            body: format!(
                "Welcome!\n\n\
                 Please confirm your email address by following this link:\n\n\
                 {link}\n\n\
                 If you did not create an account, you can ignore this message."
            ),
        }
    }

    pub fn password_reset(&self, email: &Email, token: &Token) -> EmailMessage {
        let link = format!("{}/reset-password?token={}", self.client_url, token.nonce);
        EmailMessage {
            to: email.to_string(),
            subject: "Reset your password".to_string(),
            body: format!(
                "A password reset was requested for your account.\n\n\
                 You can choose a new password by following this link:\n\n\
                 {link}\n\n\
                 The link is valid for a short time and can be used once.\n\
                 If you did not request a reset, you can ignore this message."
            ),
        }
    }
}
