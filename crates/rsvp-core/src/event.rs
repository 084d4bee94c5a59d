//! Events, as far as reservations and tickets need to see them.
//!
//! Events are owned by an external event-management collaborator; nothing in
//! this workspace creates or edits them through the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  pub event_id:        Uuid,
  pub title:           String,
  pub description:     String,
  pub location:        String,
  pub start_date_time: DateTime<Utc>,
  pub end_date_time:   DateTime<Utc>,
  /// Free events and paid events reserve a seat the same way; payment is not
  /// captured by this system.
  pub is_free:         bool,
  /// Display price for paid events, e.g. `"25.00"`.
  #[serde(default)]
  pub price:           Option<String>,
  #[serde(default)]
  pub url:             Option<String>,
}

impl Event {
  pub fn summary(&self) -> EventSummary {
    EventSummary {
      event_id:        self.event_id,
      title:           self.title.clone(),
      description:     self.description.clone(),
      location:        self.location.clone(),
      start_date_time: self.start_date_time,
    }
  }
}

/// The event projection attached to reservation read models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
  pub event_id:        Uuid,
  pub title:           String,
  pub description:     String,
  pub location:        String,
  pub start_date_time: DateTime<Utc>,
}
