//! Ticket Issuer: builds the ticket artifact for a reservation and sends it
//! to the attendee.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{FixedOffset, Offset as _, Utc};
use rsvp_core::{
  claim::ScanClaim,
  provider::NotificationChannel,
  reservation::ReservationView,
};
use tracing::{info, warn};

use crate::{Result, date::format_event_date, email::TicketEmail, payload, qr};

#[derive(Debug, Clone)]
pub struct IssuerConfig {
  /// Offset used when printing the event start time.
  pub utc_offset:  FixedOffset,
  /// Organisation name in the email footer.
  pub sender_name: String,
}

impl Default for IssuerConfig {
  fn default() -> Self {
    Self {
      utc_offset:  Utc.fix(),
      sender_name: "RSVP".to_string(),
    }
  }
}

/// A ticket, derived on demand from a reservation. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketArtifact {
  pub claim:   ScanClaim,
  /// The JSON text inside the QR code.
  pub payload: String,
  pub png:     Vec<u8>,
}

impl TicketArtifact {
  pub fn data_url(&self) -> String { format!("data:image/png;base64,{}", B64.encode(&self.png)) }
}

pub struct TicketIssuer<N> {
  channel: Arc<N>,
  config:  IssuerConfig,
}

impl<N> Clone for TicketIssuer<N> {
  fn clone(&self) -> Self {
    Self { channel: Arc::clone(&self.channel), config: self.config.clone() }
  }
}

impl<N: NotificationChannel> TicketIssuer<N> {
  pub fn new(channel: Arc<N>, config: IssuerConfig) -> Self { Self { channel, config } }

  pub fn claim(&self, reservation: &ReservationView) -> ScanClaim {
    ScanClaim {
      ticket_id:   reservation.reservation_id.to_string(),
      event_title: reservation.event.title.clone(),
      user_name:   reservation.user.display_name(),
      event_date:  format_event_date(reservation.event.start_date_time, self.config.utc_offset),
    }
  }

  /// Build the artifact without sending anything.
  pub fn artifact(&self, reservation: &ReservationView) -> Result<TicketArtifact> {
    let claim = self.claim(reservation);
    let payload = payload::encode(&claim)?;
    let png = qr::render_png(&payload)?;
    Ok(TicketArtifact { claim, payload, png })
  }

  /// Build the artifact and email it to the reservation's user.
  ///
  /// A delivery failure is returned as [`crate::Error::Dispatch`]; the
  /// reservation itself is untouched either way.
  pub async fn issue(&self, reservation: &ReservationView) -> Result<TicketArtifact> {
    let artifact = self.artifact(reservation)?;
    let data_url = artifact.data_url();

    let email = TicketEmail {
      to:             &reservation.user.email,
      user_name:      &artifact.claim.user_name,
      event_title:    &artifact.claim.event_title,
      event_date:     &artifact.claim.event_date,
      event_location: &reservation.event.location,
      ticket_id:      &artifact.claim.ticket_id,
      qr_data_url:    &data_url,
      sender_name:    &self.config.sender_name,
    }
    .render();

    if let Err(e) = self.channel.send(&email).await {
      warn!(
        reservation_id = %reservation.reservation_id,
        to = %email.to,
        error = %e,
        "ticket dispatch failed"
      );
      return Err(e.into());
    }

    info!(reservation_id = %reservation.reservation_id, to = %email.to, "ticket sent");
    Ok(artifact)
  }
}
