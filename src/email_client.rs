use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;

use crate::{
    config::{EmailConfig, SmtpTls},
    web::types::ValidEmail,
};

/// Sends plain text emails from a configured sender.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send_plain(&self, recipients: &[ValidEmail], subject: &str, body: &str)
        -> Result<()>;
}

/// SMTP backed `Mailer`. Cheap to clone, the transport keeps a connection pool.
#[derive(Clone)]
pub struct EmailClient {
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    sender: Mailbox,
}

impl EmailClient {
    pub fn new(sender: ValidEmail, email_config: &EmailConfig) -> Result<Self> {
        let sender = to_mailbox(&sender)?;
        let host = email_config.smtp_host.as_str();

        let mut builder = match email_config.smtp_tls {
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host)?,
            SmtpTls::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?,
        }
        .port(email_config.smtp_port)
        .timeout(Some(email_config.timeout()));

        if let Some(password) = &email_config.password {
            builder = builder.credentials(Credentials::new(
                email_config.sender_addr.clone(),
                password.expose_secret().to_string(),
            ));
        }

        Ok(EmailClient {
            transport: Arc::new(builder.build()),
            sender,
        })
    }

    /// Builds a single message addressed to all of the `recipients`.
    pub fn build_message(
        &self,
        recipients: &[ValidEmail],
        subject: &str,
        body: &str,
    ) -> Result<Message> {
        if recipients.is_empty() {
            return Err(Error::NoRecipients);
        }

        let mut builder = Message::builder().from(self.sender.clone());
        for recipient in recipients {
            builder = builder.to(to_mailbox(recipient)?);
        }

        let message = builder
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        Ok(message)
    }
}

#[async_trait]
impl Mailer for EmailClient {
    async fn send_plain(
        &self,
        recipients: &[ValidEmail],
        subject: &str,
        body: &str,
    ) -> Result<()> {
        let message = self.build_message(recipients, subject, body)?;
        self.transport.send(message).await?;

        Ok(())
    }
}

fn to_mailbox(email: &ValidEmail) -> Result<Mailbox> {
    email
        .as_ref()
        .parse()
        .map_err(|_| Error::InvalidAddress(email.to_string()))
}

// ###################################
// ->   ERROR & RESULT
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
    #[error("no recipients to send the email to")]
    NoRecipients,
    #[error("failed to build the email: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}
