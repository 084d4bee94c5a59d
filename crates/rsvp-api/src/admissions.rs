//! `POST /api/admissions`: validate a scanned ticket and let its holder in.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use rsvp_core::claim::ScanClaim;
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, Backend, auth::Authenticated, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct AdmitBody {
  pub claim:    ScanClaim,
  /// When set, only tickets for this event are admitted.
  #[serde(default)]
  pub event_id: Option<Uuid>,
}

/// `POST /api/admissions`, body: `{"claim": {...}, "event_id": "..."}`
pub async fn admit<B: Backend>(
  _: Authenticated,
  State(state): State<AppState<B>>,
  Json(body): Json<AdmitBody>,
) -> Result<impl IntoResponse, ApiError> {
  let receipt = state.ledger.admit(&body.claim, body.event_id).await?;
  Ok((StatusCode::CREATED, Json(receipt)))
}
