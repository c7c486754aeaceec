//! SMTP mail transport.
//!
//! Sends one HTML message per call from the configured account over an
//! implicit-TLS relay. The recipient is passed to the server untouched in
//! `RCPT TO`, so an empty or malformed address is judged by the server's
//! reply, not by a local parser. Every fault comes back as
//! [`SendOutcome::Rejected`] with its text.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::SinglePart;
use lettre::message::header::{Date, HeaderName, HeaderValue, Headers, MIME_VERSION_1_0, Subject};
use lettre::transport::smtp::Error as SmtpError;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{AsyncSmtpConnection, TlsParameters};
use lettre::transport::smtp::extension::ClientId;

use courier_common::config::AppConfig;
use courier_common::error::AppError;
use courier_common::traits::MailTransport;
use courier_common::types::SendOutcome;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);
const AUTH_MECHANISMS: &[Mechanism] = &[Mechanism::Plain, Mechanism::Login];

pub struct SmtpTransport {
    sender: String,
    host: String,
    port: u16,
    credentials: Credentials,
    /// `None` only for plaintext test servers.
    tls: Option<TlsParameters>,
}

impl SmtpTransport {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let tls = TlsParameters::new(config.smtp_host.clone())
            .map_err(|e| AppError::Config(format!("SMTP TLS: {}", e)))?;

        tracing::info!(
            host = %config.smtp_host,
            port = config.smtp_port,
            sender = %config.email_address,
            "SMTP transport configured"
        );

        Ok(Self {
            sender: config.email_address.clone(),
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            credentials: Credentials::new(
                config.email_address.clone(),
                config.email_password.clone(),
            ),
            tls: Some(tls),
        })
    }

    /// One SMTP session: connect, authenticate, one envelope, quit.
    async fn send_raw(&self, to: &str, message: &[u8]) -> Result<(), SmtpError> {
        let mut conn = AsyncSmtpConnection::connect_tokio1(
            (self.host.as_str(), self.port),
            Some(SMTP_TIMEOUT),
            &ClientId::default(),
            self.tls.clone(),
            None,
        )
        .await?;

        conn.auth(AUTH_MECHANISMS, &self.credentials).await?;
        conn.command(format!("MAIL FROM:<{}>\r\n", self.sender)).await?;
        conn.command(format!("RCPT TO:<{}>\r\n", to)).await?;
        conn.command("DATA\r\n").await?;
        conn.message(message).await?;

        if let Err(e) = conn.quit().await {
            tracing::debug!(error = %e, "SMTP QUIT failed after delivery");
        }
        Ok(())
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    fn sender(&self) -> &str {
        &self.sender
    }

    async fn deliver(&self, to: &str, subject: &str, body: &str) -> SendOutcome {
        tracing::info!(to = %to, "Sending email");

        if to.contains(['\r', '\n']) {
            tracing::warn!(to = %to.escape_debug(), "Recipient contains a line break");
            return SendOutcome::Rejected("Recipient contains a line break".to_string());
        }

        let message = compose(&self.sender, to, subject, body);
        match self.send_raw(to, &message).await {
            Ok(()) => {
                tracing::info!(to = %to, "Email sent");
                SendOutcome::Delivered
            }
            Err(e) => {
                tracing::warn!(to = %to, error = %e, "Email send failed");
                SendOutcome::Rejected(e.to_string())
            }
        }
    }
}

/// Format the HTML message. Addresses go into the headers verbatim; subject
/// and body may be empty.
pub fn compose(from: &str, to: &str, subject: &str, body: &str) -> Vec<u8> {
    let mut headers = Headers::new();
    headers.insert_raw(HeaderValue::new(
        HeaderName::new_from_ascii_str("From"),
        from.to_string(),
    ));
    headers.insert_raw(HeaderValue::new(
        HeaderName::new_from_ascii_str("To"),
        to.to_string(),
    ));
    headers.set(Subject::from(subject.to_string()));
    headers.set(Date::now());
    headers.set(MIME_VERSION_1_0);

    let mut message = headers.to_string().into_bytes();
    message.extend(SinglePart::html(body.to_string()).formatted());
    message
}
