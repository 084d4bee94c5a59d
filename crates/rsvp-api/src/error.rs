//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body has the shape `{"kind": "...", "error": "..."}`, where
//! `kind` is a stable machine-readable code.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use rsvp_core::ErrorKind;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Organizer credentials missing or wrong.
  #[error("unauthorized")]
  Unauthorized,

  /// The upstream proxy did not supply the attendee identity header.
  #[error("missing {0} header")]
  MissingIdentity(String),

  #[error(transparent)]
  Core(#[from] rsvp_core::Error),

  /// The reservation was committed but its ticket could not be delivered.
  #[error("your seat is reserved (reservation {reservation_id}) but the ticket could not be sent: {source}")]
  TicketNotSent {
    reservation_id: Uuid,
    #[source]
    source:         rsvp_core::Error,
  },
}

/// HTTP status for a core error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::IdentityNotFound | ErrorKind::EventNotFound | ErrorKind::ReservationNotFound => {
      StatusCode::NOT_FOUND
    }
    ErrorKind::IdentityConflict | ErrorKind::DuplicateReservation | ErrorKind::AlreadyAdmitted => {
      StatusCode::CONFLICT
    }
    ErrorKind::ClaimMismatch => StatusCode::UNPROCESSABLE_ENTITY,
    ErrorKind::DispatchFailed => StatusCode::BAD_GATEWAY,
    ErrorKind::UnknownError => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let message = self.to_string();
    match self {
      ApiError::Unauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "kind": "UNAUTHORIZED", "error": message })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"rsvp\""),
        );
        res
      }
      ApiError::MissingIdentity(_) => (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "kind": "UNAUTHORIZED", "error": message })),
      )
        .into_response(),
      ApiError::Core(e) => {
        let status = status_for(e.kind());
        if status.is_server_error() {
          error!(error = %e, "request failed");
        }
        (status, Json(json!({ "kind": e.kind(), "error": message }))).into_response()
      }
      ApiError::TicketNotSent { reservation_id, source } => {
        error!(%reservation_id, error = %source, "reservation held without a ticket");
        (
          status_for(source.kind()),
          Json(json!({
            "kind": source.kind(),
            "error": message,
            "reservation_id": reservation_id,
          })),
        )
          .into_response()
      }
    }
  }
}
