//! Server wiring for the RSVP system: settings, the production collaborators,
//! and event import.

pub mod error;
pub mod identity;
pub mod import;
pub mod mail;
pub mod settings;

pub use error::{Error, Result};

use rsvp_api::Backend;
use rsvp_store_sqlite::SqliteStore;

/// The collaborators a deployed server runs with.
pub struct Live;

impl Backend for Live {
  type Store = SqliteStore;
  type Identity = identity::HttpIdentityProvider;
  type Mailer = mail::Mailer;
}
