//! Loading events into the store.
//!
//! Events belong to the event-management side; this server only reads them.
//! An import file is a JSON array of events in the same shape the API returns
//! them. Importing is an upsert keyed on `event_id`, so re-running an import
//! updates events in place.

use std::path::Path;

use rsvp_core::event::Event;
use rsvp_store_sqlite::SqliteStore;
use tracing::info;

use crate::Result;

/// Import every event in the JSON file at `path`. Returns how many were
/// written.
pub async fn import_events(store: &SqliteStore, path: &Path) -> Result<usize> {
  let raw = tokio::fs::read(path).await?;
  let events: Vec<Event> = serde_json::from_slice(&raw)?;

  for event in &events {
    store.put_event(event).await?;
    info!(event_id = %event.event_id, title = %event.title, "event imported");
  }
  Ok(events.len())
}
