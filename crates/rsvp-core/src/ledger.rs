//! Reservation Ledger: creation, lookup, cancellation, and admission of
//! reservations.
//!
//! The one hard concurrency rule lives below this type: a reservation for an
//! (event, user) pair is created by a single insert that the store guards with
//! a unique key. There is no read-then-write window here, so of N concurrent
//! `reserve` calls for the same pair exactly one succeeds.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  claim::ScanClaim,
  event::Event,
  reservation::{AdmissionReceipt, ReservationView},
  store::{EventStore, Insert, ReservationStore},
};

pub struct ReservationLedger<R, E> {
  reservations: Arc<R>,
  events:       Arc<E>,
}

impl<R, E> Clone for ReservationLedger<R, E> {
  fn clone(&self) -> Self {
    Self {
      reservations: Arc::clone(&self.reservations),
      events:       Arc::clone(&self.events),
    }
  }
}

impl<R, E> ReservationLedger<R, E>
where
  R: ReservationStore,
  E: EventStore,
{
  pub fn new(reservations: Arc<R>, events: Arc<E>) -> Self { Self { reservations, events } }

  /// Look up an event through the event collaborator.
  pub async fn event(&self, event_id: Uuid) -> Result<Event> {
    self
      .events
      .find_event_by_id(event_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::EventNotFound(event_id))
  }

  /// Reserve a seat for `user_id` at `event_id`.
  ///
  /// Not idempotent: a second call for the same pair fails with
  /// [`Error::DuplicateReservation`] rather than returning the earlier
  /// reservation.
  pub async fn reserve(&self, event_id: Uuid, user_id: Uuid) -> Result<ReservationView> {
    self.event(event_id).await?;

    let outcome = self
      .reservations
      .insert_reservation(event_id, user_id)
      .await
      .map_err(Error::store)?;

    match outcome {
      Insert::Created(view) => {
        info!(reservation_id = %view.reservation_id, %event_id, %user_id, "reservation created");
        Ok(view)
      }
      Insert::Conflict(key) => {
        debug!(%event_id, %user_id, %key, "duplicate reservation rejected");
        Err(Error::DuplicateReservation { event_id, user_id })
      }
    }
  }

  pub async fn get(&self, reservation_id: Uuid) -> Result<ReservationView> {
    self
      .reservations
      .get_reservation(reservation_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::ReservationNotFound(reservation_id.to_string()))
  }

  /// All reservations for an event, oldest first. An unknown event simply has
  /// no reservations.
  pub async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<ReservationView>> {
    self
      .reservations
      .list_reservations_by_event(event_id)
      .await
      .map_err(Error::store)
  }

  /// All reservations held by a local user, oldest first.
  pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<ReservationView>> {
    self
      .reservations
      .list_reservations_by_user(user_id)
      .await
      .map_err(Error::store)
  }

  /// All reservations held by an external identity. Unlike checkout, this
  /// does not create the local user.
  pub async fn list_by_external_id(&self, external_id: &str) -> Result<Vec<ReservationView>> {
    let user = self
      .reservations
      .find_user_by_external_id(external_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::IdentityNotFound(external_id.to_string()))?;
    self.list_by_user(user.user_id).await
  }

  /// Delete a reservation, freeing the (event, user) slot. Tickets already
  /// sent are not recalled. Returns the deleted reservation.
  pub async fn cancel(&self, reservation_id: Uuid) -> Result<ReservationView> {
    let deleted = self
      .reservations
      .delete_reservation(reservation_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::ReservationNotFound(reservation_id.to_string()))?;

    info!(%reservation_id, event_id = %deleted.event.event_id, "reservation cancelled");
    Ok(deleted)
  }

  /// Validate a scanned claim and record the admission.
  ///
  /// The claim is untrusted: its ticket id must name an existing reservation,
  /// its event title must match that reservation's event, and, when the door
  /// is scoped to `expected_event`, the reservation must be for that event.
  /// Each reservation is admitted at most once.
  pub async fn admit(
    &self,
    claim: &ScanClaim,
    expected_event: Option<Uuid>,
  ) -> Result<AdmissionReceipt> {
    let ticket_id = Uuid::parse_str(claim.ticket_id.trim())
      .map_err(|_| Error::ReservationNotFound(claim.ticket_id.clone()))?;

    let reservation = self.get(ticket_id).await?;

    if let Some(event_id) = expected_event
      && reservation.event.event_id != event_id
    {
      return Err(Error::ClaimMismatch {
        ticket_id,
        reason: format!("ticket is for {:?}, not this event", reservation.event.title),
      });
    }

    if reservation.event.title != claim.event_title {
      return Err(Error::ClaimMismatch {
        ticket_id,
        reason: format!(
          "ticket is for {:?} but claims {:?}",
          reservation.event.title, claim.event_title
        ),
      });
    }

    let outcome = self
      .reservations
      .record_admission(ticket_id)
      .await
      .map_err(Error::store)?;

    match outcome {
      Insert::Created(admission) => {
        info!(
          reservation_id = %ticket_id,
          event_id = %reservation.event.event_id,
          "ticket admitted"
        );
        Ok(AdmissionReceipt { admission, reservation })
      }
      Insert::Conflict(_) => Err(Error::AlreadyAdmitted(ticket_id)),
    }
  }
}
