//! Error types for `rsvp-core`.
//!
//! Every failure the reservation services can produce carries a stable
//! [`ErrorKind`] so that outer layers can report `kind + message` without
//! matching on variants.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{provider::DispatchError, store::UniqueKey};

/// Stable, serialisable classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
  IdentityNotFound,
  IdentityConflict,
  EventNotFound,
  DuplicateReservation,
  ReservationNotFound,
  ClaimMismatch,
  AlreadyAdmitted,
  DispatchFailed,
  UnknownError,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("no identity found for {0:?}")]
  IdentityNotFound(String),

  #[error("identity {external_id:?} clashes with an existing user on {key}")]
  IdentityConflict {
    external_id: String,
    key:         UniqueKey,
  },

  #[error("event not found: {0}")]
  EventNotFound(Uuid),

  #[error("you have already reserved a seat for this event")]
  DuplicateReservation {
    event_id: Uuid,
    user_id:  Uuid,
  },

  /// Carries the identifier as given, since ticket ids arrive from scanned
  /// payloads and may not be valid UUIDs at all.
  #[error("reservation not found: {0}")]
  ReservationNotFound(String),

  #[error("ticket {ticket_id} does not match: {reason}")]
  ClaimMismatch {
    ticket_id: Uuid,
    reason:    String,
  },

  #[error("ticket {0} has already been used for entry")]
  AlreadyAdmitted(Uuid),

  #[error("ticket dispatch failed: {0}")]
  DispatchFailed(#[from] DispatchError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("identity provider error: {0}")]
  Provider(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("ticket rendering failed: {0}")]
  Render(String),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::IdentityNotFound(_) => ErrorKind::IdentityNotFound,
      Self::IdentityConflict { .. } => ErrorKind::IdentityConflict,
      Self::EventNotFound(_) => ErrorKind::EventNotFound,
      Self::DuplicateReservation { .. } => ErrorKind::DuplicateReservation,
      Self::ReservationNotFound(_) => ErrorKind::ReservationNotFound,
      Self::ClaimMismatch { .. } => ErrorKind::ClaimMismatch,
      Self::AlreadyAdmitted(_) => ErrorKind::AlreadyAdmitted,
      Self::DispatchFailed(_) => ErrorKind::DispatchFailed,
      Self::Store(_) | Self::Provider(_) | Self::Render(_) => {
        ErrorKind::UnknownError
      }
    }
  }

  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub(crate) fn provider<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Provider(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
