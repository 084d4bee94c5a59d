//! [`SqliteStore`]: the SQLite implementation of the `rsvp-core` storage
//! traits.

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use rsvp_core::{
  event::Event,
  reservation::{Admission, ReservationView},
  store::{EventStore, Insert, ReservationStore, UniqueKey, UserStore},
  user::{NewUser, User},
};

use crate::{
  Error, Result,
  encode::{
    EVENT_COLUMNS, RawEvent, RawReservationView, RawUser, USER_COLUMNS, VIEW_SELECT, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An RSVP store backed by a single SQLite file.
///
/// Cloning shares the inner connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert or replace an event. Events are owned by the event-management
  /// side; this is how they are loaded into the store.
  pub async fn put_event(&self, event: &Event) -> Result<()> {
    let id_str    = encode_uuid(event.event_id);
    let title     = event.title.clone();
    let desc      = event.description.clone();
    let location  = event.location.clone();
    let start_str = encode_dt(event.start_date_time);
    let end_str   = encode_dt(event.end_date_time);
    let is_free   = event.is_free;
    let price     = event.price.clone();
    let url       = event.url.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO events (
             event_id, title, description, location, start_date_time,
             end_date_time, is_free, price, url
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
           ON CONFLICT (event_id) DO UPDATE SET
             title = excluded.title,
             description = excluded.description,
             location = excluded.location,
             start_date_time = excluded.start_date_time,
             end_date_time = excluded.end_date_time,
             is_free = excluded.is_free,
             price = excluded.price,
             url = excluded.url",
          rusqlite::params![
            id_str, title, desc, location, start_str, end_str, is_free, price, url,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Unique violations ───────────────────────────────────────────────────────

/// If `err` is a UNIQUE constraint violation, the `table.column[, ...]` list
/// SQLite names in the message.
fn unique_violation(err: &rusqlite::Error) -> Option<&str> {
  match err {
    rusqlite::Error::SqliteFailure(e, Some(msg))
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
    {
      msg.strip_prefix("UNIQUE constraint failed: ")
    }
    _ => None,
  }
}

fn unique_key(columns: &str) -> Option<UniqueKey> {
  match columns {
    "users.external_id" => Some(UniqueKey::ExternalId),
    "users.email" => Some(UniqueKey::Email),
    "users.username" => Some(UniqueKey::Username),
    "users.phone_number" => Some(UniqueKey::PhoneNumber),
    "reservations.event_id, reservations.user_id" => Some(UniqueKey::EventUser),
    "admissions.reservation_id" => Some(UniqueKey::Admission),
    _ => None,
  }
}

/// Run an insert, turning a violation of a known unique key into
/// `Ok(Some(key))`. Any other error propagates.
fn guarded<F>(insert: F) -> rusqlite::Result<Option<UniqueKey>>
where
  F: FnOnce() -> rusqlite::Result<usize>,
{
  match insert() {
    Ok(_) => Ok(None),
    Err(e) => match unique_violation(&e).and_then(unique_key) {
      Some(key) => Ok(Some(key)),
      None => Err(e),
    },
  }
}

// ─── UserStore impl ──────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
  type Error = Error;

  async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
    let external_id = external_id.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE external_id = ?1"),
              rusqlite::params![external_id],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn create_user(&self, input: NewUser) -> Result<Insert<User>> {
    let user = User {
      user_id:      Uuid::new_v4(),
      external_id:  input.external_id,
      email:        input.email,
      username:     input.username,
      first_name:   input.first_name,
      last_name:    input.last_name,
      phone_number: input.phone_number,
      photo_url:    input.photo_url,
      created_at:   Utc::now(),
    };

    let id_str      = encode_uuid(user.user_id);
    let external_id = user.external_id.clone();
    let email       = user.email.clone();
    let username    = user.username.clone();
    let first_name  = user.first_name.clone();
    let last_name   = user.last_name.clone();
    let phone       = user.phone_number.clone();
    let photo_url   = user.photo_url.clone();
    let at_str      = encode_dt(user.created_at);

    let conflict = self
      .conn
      .call(move |conn| {
        Ok(guarded(|| {
          conn.execute(
            "INSERT INTO users (
               user_id, external_id, email, username, first_name, last_name,
               phone_number, photo_url, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
              id_str, external_id, email, username, first_name, last_name, phone, photo_url,
              at_str,
            ],
          )
        })?)
      })
      .await?;

    Ok(match conflict {
      Some(key) => Insert::Conflict(key),
      None => Insert::Created(user),
    })
  }
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

impl EventStore for SqliteStore {
  type Error = Error;

  async fn find_event_by_id(&self, event_id: Uuid) -> Result<Option<Event>> {
    let id_str = encode_uuid(event_id);

    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?1"),
              rusqlite::params![id_str],
              RawEvent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }
}

// ─── ReservationStore impl ───────────────────────────────────────────────────

impl ReservationStore for SqliteStore {
  async fn insert_reservation(
    &self,
    event_id: Uuid,
    user_id: Uuid,
  ) -> Result<Insert<ReservationView>> {
    let reservation_id = Uuid::new_v4();
    let id_str         = encode_uuid(reservation_id);
    let event_str      = encode_uuid(event_id);
    let user_str       = encode_uuid(user_id);
    let at_str         = encode_dt(Utc::now());

    let outcome: Result<RawReservationView, UniqueKey> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let conflict = guarded(|| {
          tx.execute(
            "INSERT INTO reservations (reservation_id, event_id, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![id_str, event_str, user_str, at_str],
          )
        })?;
        if let Some(key) = conflict {
          return Ok(Err(key));
        }

        let raw = tx.query_row(
          &format!("{VIEW_SELECT} WHERE r.reservation_id = ?1"),
          rusqlite::params![id_str],
          RawReservationView::from_row,
        )?;
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await?;

    match outcome {
      Ok(raw) => Ok(Insert::Created(raw.into_view()?)),
      Err(key) => Ok(Insert::Conflict(key)),
    }
  }

  async fn get_reservation(&self, reservation_id: Uuid) -> Result<Option<ReservationView>> {
    let id_str = encode_uuid(reservation_id);

    let raw: Option<RawReservationView> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{VIEW_SELECT} WHERE r.reservation_id = ?1"),
              rusqlite::params![id_str],
              RawReservationView::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawReservationView::into_view).transpose()
  }

  async fn list_reservations_by_event(&self, event_id: Uuid) -> Result<Vec<ReservationView>> {
    self.list_views("r.event_id", event_id).await
  }

  async fn list_reservations_by_user(&self, user_id: Uuid) -> Result<Vec<ReservationView>> {
    self.list_views("r.user_id", user_id).await
  }

  async fn delete_reservation(&self, reservation_id: Uuid) -> Result<Option<ReservationView>> {
    let id_str = encode_uuid(reservation_id);

    let raw: Option<RawReservationView> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let raw = tx
          .query_row(
            &format!("{VIEW_SELECT} WHERE r.reservation_id = ?1"),
            rusqlite::params![id_str],
            RawReservationView::from_row,
          )
          .optional()?;
        if raw.is_some() {
          tx.execute(
            "DELETE FROM admissions WHERE reservation_id = ?1",
            rusqlite::params![id_str],
          )?;
          tx.execute(
            "DELETE FROM reservations WHERE reservation_id = ?1",
            rusqlite::params![id_str],
          )?;
        }
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawReservationView::into_view).transpose()
  }

  async fn record_admission(&self, reservation_id: Uuid) -> Result<Insert<Admission>> {
    let admission = Admission {
      admission_id: Uuid::new_v4(),
      reservation_id,
      admitted_at: Utc::now(),
    };

    let id_str  = encode_uuid(admission.admission_id);
    let res_str = encode_uuid(reservation_id);
    let at_str  = encode_dt(admission.admitted_at);

    let conflict = self
      .conn
      .call(move |conn| {
        Ok(guarded(|| {
          conn.execute(
            "INSERT INTO admissions (admission_id, reservation_id, admitted_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![id_str, res_str, at_str],
          )
        })?)
      })
      .await?;

    Ok(match conflict {
      Some(key) => Insert::Conflict(key),
      None => Insert::Created(admission),
    })
  }
}

impl SqliteStore {
  /// Reservation views where `column` equals `id`, oldest first.
  async fn list_views(&self, column: &'static str, id: Uuid) -> Result<Vec<ReservationView>> {
    let id_str = encode_uuid(id);

    let raws: Vec<RawReservationView> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "{VIEW_SELECT} WHERE {column} = ?1 ORDER BY r.created_at, r.reservation_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawReservationView::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReservationView::into_view).collect()
  }
}
