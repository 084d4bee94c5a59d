//! The Scan Claim: the payload embedded in a ticket's QR code.
//!
//! The wire form is a JSON object with exactly the keys `ticketId`,
//! `eventTitle`, `userName` and `eventDate`, all strings. There is no version
//! field; any change to the shape is a breaking change for tickets already in
//! attendees' inboxes.
//!
//! A decoded claim is untrusted input. Only
//! [`crate::ReservationLedger::admit`] turns it into an admission decision.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScanClaim {
  /// The reservation id, as a string.
  pub ticket_id:   String,
  pub event_title: String,
  pub user_name:   String,
  /// Human-readable start time; never parsed back.
  pub event_date:  String,
}
