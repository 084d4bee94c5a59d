//! Outbound collaborators: the external identity provider and the
//! notification channel that delivers tickets.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Identity provider ───────────────────────────────────────────────────────

/// Profile attributes held by the identity provider for one identity.
/// Everything except the email list is optional on the provider side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub emails:        Vec<String>,
  pub username:      Option<String>,
  pub first_name:    Option<String>,
  pub last_name:     Option<String>,
  pub photo_url:     Option<String>,
  pub phone_numbers: Vec<String>,
}

/// Source of truth for who an authenticated caller is.
pub trait IdentityProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the profile for `identity_key`. Returns `None` if the provider has
  /// no such identity.
  fn get_profile<'a>(
    &'a self,
    identity_key: &'a str,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;
}

// ─── Notification channel ────────────────────────────────────────────────────

/// A rendered email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
  pub to:        String,
  pub subject:   String,
  pub html_body: String,
}

#[derive(Debug, Error)]
pub enum DispatchError {
  /// The channel answered and refused the message.
  #[error("rejected by delivery channel: {0}")]
  Rejected(String),

  /// The channel could not be reached.
  #[error("delivery channel unreachable: {0}")]
  Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub trait NotificationChannel: Send + Sync {
  fn send<'a>(
    &'a self,
    email: &'a OutgoingEmail,
  ) -> impl Future<Output = Result<(), DispatchError>> + Send + 'a;
}
