//! Storage traits.
//!
//! The traits are implemented by storage backends (e.g. `rsvp-store-sqlite`).
//! The services in this crate and the HTTP layer depend on these abstractions,
//! not on any concrete backend.
//!
//! Uniqueness is the backend's job: inserts that would violate a unique key
//! come back as [`Insert::Conflict`] rather than as an opaque error, and they
//! must be detected atomically by the insert itself so that concurrent callers
//! cannot both succeed.

use std::{fmt, future::Future};

use serde::Serialize;
use uuid::Uuid;

use crate::{
  event::Event,
  reservation::{Admission, ReservationView},
  user::{NewUser, User},
};

// ─── Insert outcome ──────────────────────────────────────────────────────────

/// The unique keys a backend must enforce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueKey {
  ExternalId,
  Email,
  Username,
  /// Sentinel phone numbers are exempt.
  PhoneNumber,
  /// One reservation per (event, user).
  EventUser,
  /// One admission per reservation.
  Admission,
}

impl fmt::Display for UniqueKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::ExternalId => "external id",
      Self::Email => "email",
      Self::Username => "username",
      Self::PhoneNumber => "phone number",
      Self::EventUser => "event and user",
      Self::Admission => "admission",
    };
    f.write_str(s)
  }
}

/// Result of an insert guarded by a unique key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insert<T> {
  Created(T),
  Conflict(UniqueKey),
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Local user records.
///
/// All methods return `Send` futures so the traits can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait UserStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn find_user_by_external_id<'a>(
    &'a self,
    external_id: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Persist a new user; `user_id` and `created_at` are assigned here.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<Insert<User>, Self::Error>> + Send + '_;
}

/// Read-only access to events owned by the event-management collaborator.
pub trait EventStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn find_event_by_id(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;
}

/// Reservations and admissions. Shares its error type with [`UserStore`],
/// since reservations reference users in the same backend.
pub trait ReservationStore: UserStore {
  /// Insert a reservation for `(event_id, user_id)` and return it populated.
  /// An existing reservation for the pair yields
  /// `Insert::Conflict(UniqueKey::EventUser)`.
  fn insert_reservation(
    &self,
    event_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Insert<ReservationView>, Self::Error>> + Send + '_;

  fn get_reservation(
    &self,
    reservation_id: Uuid,
  ) -> impl Future<Output = Result<Option<ReservationView>, Self::Error>> + Send + '_;

  /// Ordered by creation time, oldest first.
  fn list_reservations_by_event(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ReservationView>, Self::Error>> + Send + '_;

  /// Ordered by creation time, oldest first.
  fn list_reservations_by_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ReservationView>, Self::Error>> + Send + '_;

  /// Hard-delete a reservation (and its admission, if any). Returns the
  /// deleted reservation, or `None` if it did not exist.
  fn delete_reservation(
    &self,
    reservation_id: Uuid,
  ) -> impl Future<Output = Result<Option<ReservationView>, Self::Error>> + Send + '_;

  /// Record that a reservation was admitted. A second admission for the same
  /// reservation yields `Insert::Conflict(UniqueKey::Admission)`.
  fn record_admission(
    &self,
    reservation_id: Uuid,
  ) -> impl Future<Output = Result<Insert<Admission>, Self::Error>> + Send + '_;
}
