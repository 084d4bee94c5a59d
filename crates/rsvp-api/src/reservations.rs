//! Reservation listings, lookup, ticket regeneration, and cancellation.

use axum::{
  Json,
  extract::{Path, State},
  http::header,
  response::IntoResponse,
};
use rsvp_core::reservation::ReservationView;
use uuid::Uuid;

use crate::{
  AppState, Backend,
  auth::{Attendee, Authenticated},
  error::ApiError,
};

/// `GET /api/events/{id}/reservations`
pub async fn list_for_event<B: Backend>(
  _: Authenticated,
  State(state): State<AppState<B>>,
  Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<ReservationView>>, ApiError> {
  Ok(Json(state.ledger.list_by_event(event_id).await?))
}

/// `GET /api/me/reservations`
///
/// An identity we have never seen simply has no reservations yet.
pub async fn list_mine<B: Backend>(
  State(state): State<AppState<B>>,
  Attendee(external_id): Attendee,
) -> Result<Json<Vec<ReservationView>>, ApiError> {
  match state.ledger.list_by_external_id(&external_id).await {
    Ok(list) => Ok(Json(list)),
    Err(rsvp_core::Error::IdentityNotFound(_)) => Ok(Json(Vec::new())),
    Err(e) => Err(e.into()),
  }
}

/// `GET /api/reservations/{id}`
pub async fn get_one<B: Backend>(
  _: Authenticated,
  State(state): State<AppState<B>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ReservationView>, ApiError> {
  Ok(Json(state.ledger.get(id).await?))
}

/// `GET /api/reservations/{id}/ticket.png`: the ticket's QR code, rebuilt
/// from the reservation.
pub async fn ticket_png<B: Backend>(
  _: Authenticated,
  State(state): State<AppState<B>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  let reservation = state.ledger.get(id).await?;
  let artifact = state
    .issuer
    .artifact(&reservation)
    .map_err(|e| ApiError::Core(e.into()))?;
  Ok(([(header::CONTENT_TYPE, "image/png")], artifact.png))
}

/// `DELETE /api/reservations/{id}`: returns the deleted reservation.
pub async fn cancel<B: Backend>(
  _: Authenticated,
  State(state): State<AppState<B>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ReservationView>, ApiError> {
  Ok(Json(state.ledger.cancel(id).await?))
}
