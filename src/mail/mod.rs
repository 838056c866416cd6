// src/mail/mod.rs
// =============================================================================
// This module sends a message to every harvested address.
//
// The sending itself is hidden behind MailSender ("deliver one message to
// one recipient"). send_bulk walks the recipient list, keeps going when a
// single address fails and reports what happened to each one.
//
// Submodules:
// - smtp: the lettre-backed MailSender that keeps one logged-in session
// =============================================================================

mod smtp;

pub use smtp::SmtpMailer;

use serde::Serialize;
use std::future::Future;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum MailError {
    #[error("invalid email address '{0}'")]
    Address(String),

    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Delivers a single message to a single recipient.
pub trait MailSender {
    fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), MailError>> + Send;
}

/// Outcome for one recipient of a bulk send.
#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    pub recipient: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        self.error.is_none()
    }
}

// Sends the same subject/body to each recipient, one after another
//
// Returns one Delivery per recipient, in the order given.
pub async fn send_bulk<'a, S, I>(sender: &S, recipients: I, subject: &str, body: &str) -> Vec<Delivery>
where
    S: MailSender,
    I: IntoIterator<Item = &'a String>,
{
    let mut deliveries = Vec::new();

    for recipient in recipients {
        let error = match sender.send(recipient, subject, body).await {
            Ok(()) => {
                info!("Sent to {}", recipient);
                None
            }
            Err(e) => {
                warn!("Failed to send to {}: {}", recipient, e);
                Some(e.to_string())
            }
        };

        deliveries.push(Delivery {
            recipient: recipient.clone(),
            error,
        });
    }

    deliveries
}
