//! Outbound mail transports.
//!
//! The contact relay talks to a `Mailer`. Production uses SMTP through
//! `lettre`; without an SMTP relay configured, mails are only logged.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info};

/// Env var holding the SMTP user (also the default sender).
pub const EMAIL_USER_ENV: &str = "EMAIL_USER";

/// Env var holding the SMTP password.
pub const EMAIL_PASS_ENV: &str = "EMAIL_PASS";

/// Mail transport errors.
#[derive(Debug, Error)]
pub enum MailerError {
    /// An address could not be parsed
    #[error("Invalid address {address}: {reason}")]
    Address {
        /// The offending address
        address: String,
        /// Parser message
        reason: String,
    },

    /// The message could not be built
    #[error("Failed to build message: {0}")]
    Build(String),

    /// The transport rejected or failed to deliver the message
    #[error("Transport error: {0}")]
    Transport(String),

    /// Credentials missing from the environment
    #[error("Missing credentials: {0} is not set")]
    MissingCredentials(&'static str),
}

/// Boxed future returned by `Mailer` methods.
pub type MailFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, MailerError>> + Send + 'a>>;

/// One HTML email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Reply-To address, if any
    pub reply_to: Option<String>,
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html: String,
}

/// Something that can deliver mail.
pub trait Mailer: Send + Sync {
    /// Sends one message.
    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> MailFuture<'a, ()>;

    /// Checks that the transport is reachable.
    fn verify(&self) -> MailFuture<'_, ()>;

    /// Short transport name for logs.
    fn name(&self) -> &'static str;
}

/// SMTP transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Connects to `relay` over STARTTLS/TLS with the given credentials.
    pub fn new(
        relay: &str,
        port: u16,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, MailerError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(relay)
            .map_err(|e| MailerError::Transport(e.to_string()))?
            .port(port)
            .credentials(credentials)
            .timeout(Some(timeout))
            .build();
        info!("SMTP mailer configured for {relay}:{port}");
        Ok(Self { transport })
    }

    /// Like [`SmtpMailer::new`], reading credentials from `EMAIL_USER` and
    /// `EMAIL_PASS`.
    pub fn from_env(relay: &str, port: u16, timeout: Duration) -> Result<Self, MailerError> {
        let user = std::env::var(EMAIL_USER_ENV)
            .map_err(|_| MailerError::MissingCredentials(EMAIL_USER_ENV))?;
        let pass = std::env::var(EMAIL_PASS_ENV)
            .map_err(|_| MailerError::MissingCredentials(EMAIL_PASS_ENV))?;
        Self::new(relay, port, Credentials::new(user, pass), timeout)
    }
}

impl Mailer for SmtpMailer {
    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> MailFuture<'a, ()> {
        Box::pin(async move {
            let message = build_message(mail)?;
            self.transport
                .send(message)
                .await
                .map_err(|e| MailerError::Transport(e.to_string()))?;
            debug!("Sent \"{}\" to {}", mail.subject, mail.to);
            Ok(())
        })
    }

    fn verify(&self) -> MailFuture<'_, ()> {
        Box::pin(async move {
            match self.transport.test_connection().await {
                Ok(true) => Ok(()),
                Ok(false) => Err(MailerError::Transport("SMTP server not ready".to_string())),
                Err(e) => Err(MailerError::Transport(e.to_string())),
            }
        })
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

/// Builds a `lettre` message from an `OutgoingMail`.
pub fn build_message(mail: &OutgoingMail) -> Result<Message, MailerError> {
    let mut builder = Message::builder()
        .from(parse_mailbox(&mail.from)?)
        .to(parse_mailbox(&mail.to)?)
        .subject(mail.subject.clone())
        .header(ContentType::TEXT_HTML);
    if let Some(reply_to) = &mail.reply_to {
        builder = builder.reply_to(parse_mailbox(reply_to)?);
    }
    builder
        .body(mail.html.clone())
        .map_err(|e| MailerError::Build(e.to_string()))
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailerError> {
    address.parse().map_err(|e: lettre::address::AddressError| MailerError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Mailer that only logs. Used when no SMTP relay is configured.
#[derive(Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> MailFuture<'a, ()> {
        Box::pin(async move {
            info!(
                to = %mail.to,
                reply_to = mail.reply_to.as_deref().unwrap_or("-"),
                "Mail not sent (no SMTP relay): {}",
                mail.subject
            );
            Ok(())
        })
    }

    fn verify(&self) -> MailFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Mailer that keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    fail_after: Option<usize>,
}

impl RecordingMailer {
    /// Creates a mailer that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mailer that accepts `count` messages, then fails.
    #[must_use]
    pub fn failing_after(count: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_after: Some(count),
        }
    }

    /// Messages accepted so far.
    #[must_use]
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().clone()
    }

    /// Number of messages accepted so far.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

impl Mailer for RecordingMailer {
    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> MailFuture<'a, ()> {
        Box::pin(async move {
            build_message(mail)?;
            let mut sent = self.sent.lock();
            if self.fail_after.is_some_and(|limit| sent.len() >= limit) {
                return Err(MailerError::Transport("connection refused".to_string()));
            }
            sent.push(mail.clone());
            Ok(())
        })
    }

    fn verify(&self) -> MailFuture<'_, ()> {
        Box::pin(async move {
            match self.fail_after {
                Some(0) => Err(MailerError::Transport("connection refused".to_string())),
                _ => Ok(()),
            }
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
