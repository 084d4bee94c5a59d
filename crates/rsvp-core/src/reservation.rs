//! Reservations (RSVPs), admissions, and their read models.
//!
//! A reservation binds one user to one event and moves through
//! `Nonexistent → Active → Cancelled`. Cancellation deletes the row, so an
//! existing reservation is always active and there is no stored status.
//!
//! An admission records that a reservation's ticket was accepted at the door.
//! A reservation can be admitted at most once (enforced by a UNIQUE
//! constraint).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{event::EventSummary, user::UserSummary};

/// The bare reservation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
  pub reservation_id: Uuid,
  pub event_id:       Uuid,
  pub user_id:        Uuid,
  pub created_at:     DateTime<Utc>,
}

/// A reservation joined with the event and user projections that downstream
/// consumers (ticket issuance, listings, admission) need, so they never make a
/// second round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationView {
  pub reservation_id: Uuid,
  pub created_at:     DateTime<Utc>,
  pub event:          EventSummary,
  pub user:           UserSummary,
}

impl ReservationView {
  pub fn reservation(&self) -> Reservation {
    Reservation {
      reservation_id: self.reservation_id,
      event_id:       self.event.event_id,
      user_id:        self.user.user_id,
      created_at:     self.created_at,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
  pub admission_id:   Uuid,
  pub reservation_id: Uuid,
  pub admitted_at:    DateTime<Utc>,
}

/// Returned by [`crate::ReservationLedger::admit`]: the recorded admission
/// together with who and what it admits, for display at the door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionReceipt {
  pub admission:   Admission,
  pub reservation: ReservationView,
}
