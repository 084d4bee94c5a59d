//! Checkout: the attendee-facing reservation flow.
//!
//! Check the event, resolve the caller to a local user, reserve the seat, then
//! send the ticket, all within the request. A ticket that cannot be sent does
//! not undo the reservation; the caller gets the reservation id with the error.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use rsvp_core::{claim::ScanClaim, reservation::ReservationView};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{AppState, Backend, auth::Attendee, error::ApiError};

/// Body of a successful checkout.
#[derive(Debug, Serialize)]
pub struct CheckoutReceipt {
  pub reservation: ReservationView,
  /// What the emailed QR code says.
  pub ticket:      ScanClaim,
}

/// `POST /api/events/{id}/reservations`
pub async fn checkout<B: Backend>(
  State(state): State<AppState<B>>,
  Attendee(external_id): Attendee,
  Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  state.ledger.event(event_id).await?;
  let user = state.resolver.resolve(&external_id).await?;
  let reservation = state.ledger.reserve(event_id, user.user_id).await?;

  match state.issuer.issue(&reservation).await {
    Ok(artifact) => {
      info!(reservation_id = %reservation.reservation_id, %external_id, "checkout complete");
      Ok((
        StatusCode::CREATED,
        Json(CheckoutReceipt { reservation, ticket: artifact.claim }),
      ))
    }
    Err(e) => Err(ApiError::TicketNotSent {
      reservation_id: reservation.reservation_id,
      source:         e.into(),
    }),
  }
}
