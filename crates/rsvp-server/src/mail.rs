//! Notification channels for ticket emails.

use std::time::Duration;

use reqwest::Client;
use rsvp_core::provider::{DispatchError, NotificationChannel, OutgoingEmail};
use serde::Serialize;
use tracing::{debug, info};

use crate::{Error, Result};

// ─── Resend ───────────────────────────────────────────────────────────────────

/// Sends email through the Resend HTTP API.
pub struct ResendChannel {
  client:  Client,
  api_url: String,
  api_key: String,
  from:    String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
  from:    &'a str,
  to:      [&'a str; 1],
  subject: &'a str,
  html:    &'a str,
}

impl ResendChannel {
  pub fn new(
    api_url: impl Into<String>,
    api_key: impl Into<String>,
    from: impl Into<String>,
  ) -> Result<Self> {
    let (api_key, from) = (api_key.into(), from.into());
    if api_key.is_empty() {
      return Err(Error::MissingSetting("mail_api_key"));
    }
    if from.is_empty() {
      return Err(Error::MissingSetting("mail_from"));
    }
    let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
    Ok(Self { client, api_url: api_url.into(), api_key, from })
  }
}

impl NotificationChannel for ResendChannel {
  async fn send(&self, email: &OutgoingEmail) -> Result<(), DispatchError> {
    let resp = self
      .client
      .post(&self.api_url)
      .bearer_auth(&self.api_key)
      .json(&SendRequest {
        from:    &self.from,
        to:      [email.to.as_str()],
        subject: &email.subject,
        html:    &email.html_body,
      })
      .send()
      .await
      .map_err(|e| DispatchError::Transport(Box::new(e)))?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(DispatchError::Rejected(format!("{status}: {body}")));
    }
    debug!(to = %email.to, "email accepted by resend");
    Ok(())
  }
}

// ─── Log ──────────────────────────────────────────────────────────────────────

/// Writes emails to the log instead of sending them.
#[derive(Debug, Default)]
pub struct LogChannel;

impl NotificationChannel for LogChannel {
  async fn send(&self, email: &OutgoingEmail) -> Result<(), DispatchError> {
    info!(to = %email.to, subject = %email.subject, bytes = email.html_body.len(), "email not sent (log channel)");
    debug!(html = %email.html_body);
    Ok(())
  }
}

// ─── Selected channel ─────────────────────────────────────────────────────────

/// The channel chosen by configuration.
pub enum Mailer {
  Log(LogChannel),
  Resend(ResendChannel),
}

impl NotificationChannel for Mailer {
  async fn send(&self, email: &OutgoingEmail) -> Result<(), DispatchError> {
    match self {
      Mailer::Log(ch) => ch.send(email).await,
      Mailer::Resend(ch) => ch.send(email).await,
    }
  }
}
