//! In-memory collaborators for unit tests.
//!
//! `MemoryStore` applies every unique key under a single mutex, which gives
//! the same all-or-nothing insert semantics a real backend gets from its
//! constraints.

use std::{
  collections::HashMap,
  convert::Infallible,
  sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use chrono::Utc;
use uuid::Uuid;

use crate::{
  event::Event,
  provider::{IdentityProvider, Profile},
  reservation::{Admission, Reservation, ReservationView},
  store::{EventStore, Insert, ReservationStore, UniqueKey, UserStore},
  user::{NewUser, PHONE_SENTINEL, User},
};

#[derive(Default)]
struct Tables {
  users:        Vec<User>,
  events:       Vec<Event>,
  reservations: Vec<Reservation>,
  admissions:   Vec<Admission>,
}

#[derive(Default)]
pub struct MemoryStore {
  tables:           Mutex<Tables>,
  fail_next_lookup: AtomicBool,
}

impl MemoryStore {
  pub fn add_event(&self, event: Event) {
    self.tables.lock().unwrap().events.push(event);
  }

  /// Make the next `find_user_by_external_id` miss, simulating a concurrent
  /// writer that lands between a lookup and an insert.
  pub fn fail_next_lookup(&self) { self.fail_next_lookup.store(true, Ordering::SeqCst); }

  pub fn user_count(&self) -> usize { self.tables.lock().unwrap().users.len() }

  fn view(tables: &Tables, r: &Reservation) -> Option<ReservationView> {
    let event = tables.events.iter().find(|e| e.event_id == r.event_id)?;
    let user = tables.users.iter().find(|u| u.user_id == r.user_id)?;
    Some(ReservationView {
      reservation_id: r.reservation_id,
      created_at:     r.created_at,
      event:          event.summary(),
      user:           user.summary(),
    })
  }

  fn views<F>(&self, keep: F) -> Vec<ReservationView>
  where
    F: Fn(&Reservation) -> bool,
  {
    let tables = self.tables.lock().unwrap();
    let mut rows: Vec<_> = tables.reservations.iter().filter(|r| keep(r)).collect();
    rows.sort_by_key(|r| (r.created_at, r.reservation_id));
    rows.into_iter().filter_map(|r| Self::view(&tables, r)).collect()
  }
}

impl UserStore for MemoryStore {
  type Error = Infallible;

  async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>, Infallible> {
    if self.fail_next_lookup.swap(false, Ordering::SeqCst) {
      return Ok(None);
    }
    let tables = self.tables.lock().unwrap();
    Ok(tables.users.iter().find(|u| u.external_id == external_id).cloned())
  }

  /// Keys are checked in the order SQLite reports them for the `users`
  /// table, so a duplicate identity surfaces as a username clash first.
  async fn create_user(&self, input: NewUser) -> Result<Insert<User>, Infallible> {
    let mut tables = self.tables.lock().unwrap();
    let users = &tables.users;
    let clash = if users.iter().any(|u| u.username == input.username) {
      Some(UniqueKey::Username)
    } else if users.iter().any(|u| u.email == input.email) {
      Some(UniqueKey::Email)
    } else if input.phone_number != PHONE_SENTINEL
      && users.iter().any(|u| u.phone_number == input.phone_number)
    {
      Some(UniqueKey::PhoneNumber)
    } else if users.iter().any(|u| u.external_id == input.external_id) {
      Some(UniqueKey::ExternalId)
    } else {
      None
    };
    if let Some(key) = clash {
      return Ok(Insert::Conflict(key));
    }
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
    tables.users.push(user.clone());
    Ok(Insert::Created(user))
  }
}

impl EventStore for MemoryStore {
  type Error = Infallible;

  async fn find_event_by_id(&self, event_id: Uuid) -> Result<Option<Event>, Infallible> {
    let tables = self.tables.lock().unwrap();
    Ok(tables.events.iter().find(|e| e.event_id == event_id).cloned())
  }
}

impl ReservationStore for MemoryStore {
  async fn insert_reservation(
    &self,
    event_id: Uuid,
    user_id: Uuid,
  ) -> Result<Insert<ReservationView>, Infallible> {
    let mut tables = self.tables.lock().unwrap();
    if tables.reservations.iter().any(|r| r.event_id == event_id && r.user_id == user_id) {
      return Ok(Insert::Conflict(UniqueKey::EventUser));
    }
    let row = Reservation {
      reservation_id: Uuid::new_v4(),
      event_id,
      user_id,
      created_at: Utc::now(),
    };
    tables.reservations.push(row.clone());
    let view = Self::view(&tables, &row).expect("fake store: dangling reference");
    Ok(Insert::Created(view))
  }

  async fn get_reservation(&self, reservation_id: Uuid) -> Result<Option<ReservationView>, Infallible> {
    let tables = self.tables.lock().unwrap();
    Ok(
      tables
        .reservations
        .iter()
        .find(|r| r.reservation_id == reservation_id)
        .and_then(|r| Self::view(&tables, r)),
    )
  }

  async fn list_reservations_by_event(&self, event_id: Uuid) -> Result<Vec<ReservationView>, Infallible> {
    Ok(self.views(|r| r.event_id == event_id))
  }

  async fn list_reservations_by_user(&self, user_id: Uuid) -> Result<Vec<ReservationView>, Infallible> {
    Ok(self.views(|r| r.user_id == user_id))
  }

  async fn delete_reservation(&self, reservation_id: Uuid) -> Result<Option<ReservationView>, Infallible> {
    let mut tables = self.tables.lock().unwrap();
    let Some(pos) = tables.reservations.iter().position(|r| r.reservation_id == reservation_id) else {
      return Ok(None);
    };
    let view = Self::view(&tables, &tables.reservations[pos]);
    tables.reservations.remove(pos);
    tables.admissions.retain(|a| a.reservation_id != reservation_id);
    Ok(view)
  }

  async fn record_admission(&self, reservation_id: Uuid) -> Result<Insert<Admission>, Infallible> {
    let mut tables = self.tables.lock().unwrap();
    if tables.admissions.iter().any(|a| a.reservation_id == reservation_id) {
      return Ok(Insert::Conflict(UniqueKey::Admission));
    }
    let admission = Admission {
      admission_id: Uuid::new_v4(),
      reservation_id,
      admitted_at: Utc::now(),
    };
    tables.admissions.push(admission.clone());
    Ok(Insert::Created(admission))
  }
}

/// Identity provider backed by a fixed map, counting lookups.
#[derive(Default)]
pub struct StaticProvider {
  profiles: HashMap<String, Profile>,
  calls:    AtomicUsize,
}

impl StaticProvider {
  pub fn with(key: &str, profile: Profile) -> Self { Self::default().and(key, profile) }

  pub fn and(mut self, key: &str, profile: Profile) -> Self {
    self.profiles.insert(key.to_string(), profile);
    self
  }

  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl IdentityProvider for StaticProvider {
  type Error = Infallible;

  async fn get_profile(&self, identity_key: &str) -> Result<Option<Profile>, Infallible> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.profiles.get(identity_key).cloned())
  }
}
