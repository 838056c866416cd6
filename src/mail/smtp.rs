// src/mail/smtp.rs
// =============================================================================
// SMTP delivery over one lettre connection.
//
// connect() opens a session with the relay, upgrades it with STARTTLS and
// logs in. Every message after that goes over the same session, so a bulk
// send to N recipients costs one login rather than N. Bad credentials show
// up here, before anything is sent.
//
// lettre aborts a session on any error reply (a rejected recipient, say).
// When that happens the next send opens a fresh session and logs in again.
// =============================================================================

use super::{MailError, MailSender};
use crate::config::MailConfig;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::{Credentials, DEFAULT_MECHANISMS};
use lettre::transport::smtp::client::{AsyncSmtpConnection, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use lettre::Message;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const SMTP_TIMEOUT: Duration = Duration::from_secs(60);

// Where and how to log in; kept so a dropped session can be reopened
struct Relay {
    host: String,
    port: u16,
    starttls: bool,
    credentials: Credentials,
}

impl Relay {
    async fn login(&self) -> Result<AsyncSmtpConnection, MailError> {
        let hello = ClientId::default();
        let mut connection = AsyncSmtpConnection::connect_tokio1(
            (self.host.as_str(), self.port),
            Some(SMTP_TIMEOUT),
            &hello,
            None,
            None,
        )
        .await?;

        // Fails when the relay doesn't offer STARTTLS, before credentials are sent
        if self.starttls {
            connection
                .starttls(TlsParameters::new(self.host.clone())?, &hello)
                .await?;
        }

        connection.auth(DEFAULT_MECHANISMS, &self.credentials).await?;
        Ok(connection)
    }
}

pub struct SmtpMailer {
    relay: Relay,
    from: Mailbox,
    session: Mutex<Option<AsyncSmtpConnection>>,
}

impl SmtpMailer {
    pub async fn connect(config: &MailConfig) -> Result<Self, MailError> {
        Self::login(config, true).await
    }

    async fn login(config: &MailConfig, starttls: bool) -> Result<Self, MailError> {
        let from = parse_mailbox(&config.username)?;
        let relay = Relay {
            host: config.relay.clone(),
            port: config.port,
            starttls,
            credentials: Credentials::new(config.username.clone(), config.password.clone()),
        };

        let connection = relay.login().await?;
        info!("Logged in to {}:{} as {}", config.relay, config.port, config.username);

        Ok(Self {
            relay,
            from,
            session: Mutex::new(Some(connection)),
        })
    }

    /// Says goodbye to the relay. Dropping the mailer without this just
    /// closes the socket.
    pub async fn close(self) {
        if let Some(mut connection) = self.session.into_inner() {
            if let Err(e) = connection.quit().await {
                debug!("QUIT failed: {}", e);
            }
        }
    }
}

impl MailSender for SmtpMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(recipient)?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        let mut session = self.session.lock().await;
        let connection = match session.take() {
            Some(connection) if !connection.has_broken() => connection,
            _ => {
                warn!("Session with {}:{} was closed, logging in again", self.relay.host, self.relay.port);
                self.relay.login().await?
            }
        };

        session
            .insert(connection)
            .send(message.envelope(), &message.formatted())
            .await?;
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse()
        .map_err(|_| MailError::Address(address.to_string()))
}
