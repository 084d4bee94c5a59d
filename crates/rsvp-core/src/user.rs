//! Local user records mirrored from the external identity provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored in place of a phone number when the identity provider has none.
/// Exempt from the phone-number uniqueness constraint.
pub const PHONE_SENTINEL: &str = "0000000000";

/// A user known to this system. Created lazily on the first reservation
/// attempt for an external identity; never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:      Uuid,
  /// Key assigned by the upstream identity provider.
  pub external_id:  String,
  pub email:        String,
  pub username:     String,
  pub first_name:   String,
  pub last_name:    String,
  pub phone_number: String,
  pub photo_url:    String,
  pub created_at:   DateTime<Utc>,
}

impl User {
  /// The name printed on tickets: "first last", falling back to the username
  /// when both name parts are empty.
  pub fn display_name(&self) -> String {
    display_name(&self.first_name, &self.last_name, &self.username)
  }

  pub fn summary(&self) -> UserSummary {
    UserSummary {
      user_id:    self.user_id,
      username:   self.username.clone(),
      email:      self.email.clone(),
      first_name: self.first_name.clone(),
      last_name:  self.last_name.clone(),
    }
  }
}

/// Input to [`crate::store::UserStore::create_user`]. `user_id` and
/// `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
  pub external_id:  String,
  pub email:        String,
  pub username:     String,
  pub first_name:   String,
  pub last_name:    String,
  pub phone_number: String,
  pub photo_url:    String,
}

/// The user projection attached to reservation read models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
  pub user_id:    Uuid,
  pub username:   String,
  pub email:      String,
  pub first_name: String,
  pub last_name:  String,
}

impl UserSummary {
  /// Same rule as [`User::display_name`].
  pub fn display_name(&self) -> String {
    display_name(&self.first_name, &self.last_name, &self.username)
  }
}

fn display_name(first: &str, last: &str, username: &str) -> String {
  let full = format!("{first} {last}");
  let full = full.trim();
  if full.is_empty() {
    username.to_string()
  } else {
    full.to_string()
  }
}
