//! HTTP client for the admission endpoint.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use rsvp_core::{claim::ScanClaim, reservation::AdmissionReceipt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Connection settings for the RSVP server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// The server's answer to a scanned ticket.
#[derive(Debug)]
pub enum Verdict {
  Admitted(AdmissionReceipt),
  Rejected { kind: String, error: String },
}

#[derive(Serialize)]
struct AdmitRequest<'a> {
  claim:    &'a ScanClaim,
  #[serde(skip_serializing_if = "Option::is_none")]
  event_id: Option<Uuid>,
}

#[derive(Deserialize)]
struct ErrorBody {
  kind:  String,
  error: String,
}

pub struct AdmissionClient {
  client: Client,
  config: ClientConfig,
}

impl AdmissionClient {
  pub fn new(config: ClientConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// `POST /api/admissions`
  ///
  /// A rejection by the server is a [`Verdict`], not an error. Transport
  /// failures and auth failures are errors.
  pub async fn admit(&self, claim: &ScanClaim, event_id: Option<Uuid>) -> Result<Verdict> {
    let resp = self
      .client
      .post(self.url("/admissions"))
      .basic_auth(&self.config.username, Some(&self.config.password))
      .json(&AdmitRequest { claim, event_id })
      .send()
      .await
      .context("POST /admissions failed")?;

    let status = resp.status();
    if status.is_success() {
      let receipt = resp.json().await.context("deserialising admission receipt")?;
      return Ok(Verdict::Admitted(receipt));
    }
    if status == reqwest::StatusCode::UNAUTHORIZED {
      return Err(anyhow!("POST /admissions → {status}: check the organizer credentials"));
    }

    let body: ErrorBody = resp
      .json()
      .await
      .with_context(|| format!("POST /admissions → {status}"))?;
    Ok(Verdict::Rejected { kind: body.kind, error: body.error })
  }
}
