//! Mail delivery for alerts.
//!
//! Alerts go out through a plain SMTP submission towards the configured
//! relay: PLAIN authentication as the sender, TLS upgrade when the relay
//! offers it. Recipient addresses are parsed only here, so a malformed
//! entry in the receiver list surfaces as a send failure, not earlier.

use std::fmt;

use async_trait::async_trait;
use lettre::address::{AddressError, Envelope};
use lettre::transport::smtp;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::debug;

use crate::config::{Sender, SmtpServer};

/// Result type alias for mail delivery
pub type MailResult<T> = Result<T, MailError>;

/// Errors that can occur while delivering an alert
#[derive(Debug)]
pub enum MailError {
    /// The configured SMTP port is not a valid port number
    InvalidPort(String),

    /// The sender or a recipient address could not be parsed
    Address(AddressError),

    /// The mail envelope could not be built
    Envelope(lettre::error::Error),

    /// TLS setup or the SMTP transaction itself failed
    Transport(smtp::Error),
}

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailError::InvalidPort(port) => write!(f, "invalid SMTP port {:?}", port),
            MailError::Address(err) => write!(f, "invalid mail address: {}", err),
            MailError::Envelope(err) => write!(f, "failed to build mail envelope: {}", err),
            MailError::Transport(err) => write!(f, "SMTP transaction failed: {}", err),
        }
    }
}

impl std::error::Error for MailError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MailError::InvalidPort(_) => None,
            MailError::Address(err) => Some(err),
            MailError::Envelope(err) => Some(err),
            MailError::Transport(err) => Some(err),
        }
    }
}

impl From<AddressError> for MailError {
    fn from(err: AddressError) -> Self {
        MailError::Address(err)
    }
}

impl From<lettre::error::Error> for MailError {
    fn from(err: lettre::error::Error) -> Self {
        MailError::Envelope(err)
    }
}

impl From<smtp::Error> for MailError {
    fn from(err: smtp::Error) -> Self {
        MailError::Transport(err)
    }
}

/// Transmits alert messages.
///
/// The orchestrator only talks to this trait; tests substitute a double
/// that records messages instead of delivering them.
#[async_trait]
pub trait Mailer {
    async fn send(
        &self,
        server: &SmtpServer,
        sender: &Sender,
        receivers: &[String],
        message: &[u8],
    ) -> MailResult<()>;
}

/// Mailer backed by an SMTP relay.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmtpMailer;

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(
        &self,
        server: &SmtpServer,
        sender: &Sender,
        receivers: &[String],
        message: &[u8],
    ) -> MailResult<()> {
        let port: u16 = server
            .port
            .parse()
            .map_err(|_| MailError::InvalidPort(server.port.clone()))?;

        let from: Address = sender.email.parse()?;
        let to = receivers
            .iter()
            .map(|address| address.parse())
            .collect::<Result<Vec<Address>, _>>()?;
        let envelope = Envelope::new(Some(from), to)?;

        let tls = TlsParameters::new(server.host.clone())?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&server.host)
            .port(port)
            .tls(Tls::Opportunistic(tls))
            .credentials(Credentials::new(
                sender.email.clone(),
                sender.password.clone(),
            ))
            .authentication(vec![Mechanism::Plain])
            .build();

        debug!(
            "submitting alert to {} receivers via {}",
            receivers.len(),
            server.address()
        );
        transport.send_raw(&envelope, message).await?;

        Ok(())
    }
}
