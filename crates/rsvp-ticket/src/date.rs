//! Human-readable event dates printed on tickets.
//!
//! The format is the US English long form, e.g.
//! `Friday, March 15, 2024 at 07:30 PM`. It is for people only and is never
//! parsed back.

use chrono::{DateTime, FixedOffset, Utc};

const FORMAT: &str = "%A, %B %-d, %Y at %I:%M %p";

/// Format `start` in the given UTC offset.
pub fn format_event_date(start: DateTime<Utc>, offset: FixedOffset) -> String {
  start.with_timezone(&offset).format(FORMAT).to_string()
}
