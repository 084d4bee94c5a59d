//! Runtime server settings, deserialised from `config.toml` and
//! `RSVP_`-prefixed environment variables.

use std::path::PathBuf;

use axum::http::HeaderName;
use chrono::FixedOffset;
use rsvp_api::{ApiConfig, AuthConfig};
use rsvp_ticket::IssuerConfig;
use serde::Deserialize;

use crate::{Error, Result};

/// Where ticket emails go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailChannel {
  /// Write emails to the log. For development.
  #[default]
  Log,
  Resend,
}

#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                      String,
  #[serde(default = "default_port")]
  pub port:                      u16,
  #[serde(default = "default_store_path")]
  pub store_path:                PathBuf,
  pub auth_username:             String,
  pub auth_password_hash:        String,
  #[serde(default = "default_identity_header")]
  pub identity_header:           String,
  #[serde(default = "default_identity_base_url")]
  pub identity_base_url:         String,
  #[serde(default)]
  pub identity_secret_key:       String,
  #[serde(default)]
  pub mail_channel:              MailChannel,
  #[serde(default)]
  pub mail_api_key:              String,
  #[serde(default = "default_mail_api_url")]
  pub mail_api_url:              String,
  #[serde(default)]
  pub mail_from:                 String,
  #[serde(default)]
  pub ticket_utc_offset_minutes: i32,
  #[serde(default = "default_sender_name")]
  pub ticket_sender_name:        String,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("rsvp.sqlite") }
fn default_identity_header() -> String { "x-identity".to_string() }
fn default_identity_base_url() -> String { "https://api.clerk.com".to_string() }
fn default_mail_api_url() -> String { "https://api.resend.com/emails".to_string() }
fn default_sender_name() -> String { "RSVP".to_string() }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn utc_offset(&self) -> Result<FixedOffset> {
    self
      .ticket_utc_offset_minutes
      .checked_mul(60)
      .and_then(FixedOffset::east_opt)
      .ok_or(Error::InvalidOffset(self.ticket_utc_offset_minutes))
  }

  /// Everything the router needs that is not a collaborator.
  pub fn api_config(&self) -> Result<ApiConfig> {
    let identity_header = HeaderName::try_from(self.identity_header.to_ascii_lowercase())
      .map_err(|_| Error::InvalidHeader(self.identity_header.clone()))?;

    Ok(ApiConfig {
      auth: AuthConfig {
        username:      self.auth_username.clone(),
        password_hash: self.auth_password_hash.clone(),
      },
      identity_header,
      issuer: IssuerConfig {
        utc_offset:  self.utc_offset()?,
        sender_name: self.ticket_sender_name.clone(),
      },
    })
  }
}
