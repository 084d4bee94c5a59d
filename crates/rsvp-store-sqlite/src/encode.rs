//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that lexicographic order in `ORDER BY` matches chronological order.
//! UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use rsvp_core::{
  event::{Event, EventSummary},
  reservation::ReservationView,
  user::{User, UserSummary},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawUser::from_row`].
pub const USER_COLUMNS: &str = "user_id, external_id, email, username, first_name, last_name,
   phone_number, photo_url, created_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:      String,
  pub external_id:  String,
  pub email:        String,
  pub username:     String,
  pub first_name:   String,
  pub last_name:    String,
  pub phone_number: String,
  pub photo_url:    String,
  pub created_at:   String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:      row.get(0)?,
      external_id:  row.get(1)?,
      email:        row.get(2)?,
      username:     row.get(3)?,
      first_name:   row.get(4)?,
      last_name:    row.get(5)?,
      phone_number: row.get(6)?,
      photo_url:    row.get(7)?,
      created_at:   row.get(8)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:      decode_uuid(&self.user_id)?,
      external_id:  self.external_id,
      email:        self.email,
      username:     self.username,
      first_name:   self.first_name,
      last_name:    self.last_name,
      phone_number: self.phone_number,
      photo_url:    self.photo_url,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawEvent::from_row`].
pub const EVENT_COLUMNS: &str = "event_id, title, description, location, start_date_time,
   end_date_time, is_free, price, url";

/// Raw values read directly from an `events` row.
pub struct RawEvent {
  pub event_id:        String,
  pub title:           String,
  pub description:     String,
  pub location:        String,
  pub start_date_time: String,
  pub end_date_time:   String,
  pub is_free:         bool,
  pub price:           Option<String>,
  pub url:             Option<String>,
}

impl RawEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:        row.get(0)?,
      title:           row.get(1)?,
      description:     row.get(2)?,
      location:        row.get(3)?,
      start_date_time: row.get(4)?,
      end_date_time:   row.get(5)?,
      is_free:         row.get(6)?,
      price:           row.get(7)?,
      url:             row.get(8)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:        decode_uuid(&self.event_id)?,
      title:           self.title,
      description:     self.description,
      location:        self.location,
      start_date_time: decode_dt(&self.start_date_time)?,
      end_date_time:   decode_dt(&self.end_date_time)?,
      is_free:         self.is_free,
      price:           self.price,
      url:             self.url,
    })
  }
}

/// Reservation joined with its event and user projections. Callers append
/// their own `WHERE` / `ORDER BY`.
pub const VIEW_SELECT: &str = "SELECT
     r.reservation_id, r.created_at,
     e.event_id, e.title, e.description, e.location, e.start_date_time,
     u.user_id, u.username, u.email, u.first_name, u.last_name
   FROM reservations r
   JOIN events e ON e.event_id = r.event_id
   JOIN users  u ON u.user_id  = r.user_id";

/// Raw strings read from a [`VIEW_SELECT`] row.
pub struct RawReservationView {
  // reservations columns
  pub reservation_id:  String,
  pub created_at:      String,
  // events join
  pub event_id:        String,
  pub title:           String,
  pub description:     String,
  pub location:        String,
  pub start_date_time: String,
  // users join
  pub user_id:         String,
  pub username:        String,
  pub email:           String,
  pub first_name:      String,
  pub last_name:       String,
}

impl RawReservationView {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      reservation_id:  row.get(0)?,
      created_at:      row.get(1)?,
      event_id:        row.get(2)?,
      title:           row.get(3)?,
      description:     row.get(4)?,
      location:        row.get(5)?,
      start_date_time: row.get(6)?,
      user_id:         row.get(7)?,
      username:        row.get(8)?,
      email:           row.get(9)?,
      first_name:      row.get(10)?,
      last_name:       row.get(11)?,
    })
  }

  pub fn into_view(self) -> Result<ReservationView> {
    Ok(ReservationView {
      reservation_id: decode_uuid(&self.reservation_id)?,
      created_at:     decode_dt(&self.created_at)?,
      event:          EventSummary {
        event_id:        decode_uuid(&self.event_id)?,
        title:           self.title,
        description:     self.description,
        location:        self.location,
        start_date_time: decode_dt(&self.start_date_time)?,
      },
      user:           UserSummary {
        user_id:    decode_uuid(&self.user_id)?,
        username:   self.username,
        email:      self.email,
        first_name: self.first_name,
        last_name:  self.last_name,
      },
    })
  }
}
