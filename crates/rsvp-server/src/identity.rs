//! [`HttpIdentityProvider`]: profile lookups against a Clerk-compatible user
//! API (`GET {base}/v1/users/{id}` with a bearer secret).

use std::time::Duration;

use reqwest::{Client, StatusCode};
use rsvp_core::provider::{IdentityProvider, Profile};
use serde::Deserialize;
use tracing::debug;

use crate::{Error, Result};

pub struct HttpIdentityProvider {
  client:     Client,
  base_url:   String,
  secret_key: String,
}

impl HttpIdentityProvider {
  pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
    let secret_key = secret_key.into();
    if secret_key.is_empty() {
      return Err(Error::MissingSetting("identity_secret_key"));
    }
    let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
    Ok(Self { client, base_url: base_url.into(), secret_key })
  }
}

/// Identity keys are opaque ids such as `user_2abc`. Anything else cannot
/// name a user and is not sent upstream.
fn is_plain_id(key: &str) -> bool {
  !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

// ─── Wire shape ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RemoteUser {
  #[serde(default)]
  email_addresses: Vec<RemoteEmail>,
  #[serde(default)]
  phone_numbers:   Vec<RemotePhone>,
  username:        Option<String>,
  first_name:      Option<String>,
  last_name:       Option<String>,
  image_url:       Option<String>,
}

#[derive(Deserialize)]
struct RemoteEmail {
  email_address: String,
}

#[derive(Deserialize)]
struct RemotePhone {
  phone_number: String,
}

impl From<RemoteUser> for Profile {
  fn from(user: RemoteUser) -> Self {
    Profile {
      emails:        user.email_addresses.into_iter().map(|e| e.email_address).collect(),
      username:      user.username,
      first_name:    user.first_name,
      last_name:     user.last_name,
      photo_url:     user.image_url,
      phone_numbers: user.phone_numbers.into_iter().map(|p| p.phone_number).collect(),
    }
  }
}

// ─── IdentityProvider impl ───────────────────────────────────────────────────

impl IdentityProvider for HttpIdentityProvider {
  type Error = Error;

  async fn get_profile(&self, identity_key: &str) -> Result<Option<Profile>> {
    if !is_plain_id(identity_key) {
      debug!(identity_key, "identity key not looked up");
      return Ok(None);
    }

    let url = format!("{}/v1/users/{identity_key}", self.base_url.trim_end_matches('/'));
    let resp = self
      .client
      .get(url)
      .bearer_auth(&self.secret_key)
      .send()
      .await?;

    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Upstream { status: status.as_u16(), body });
    }

    let user: RemoteUser = resp.json().await?;
    Ok(Some(user.into()))
  }
}
