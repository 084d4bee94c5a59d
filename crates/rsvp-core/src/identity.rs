//! Identity Resolver: maps an external identity to a local [`User`], creating
//! the user on first contact.

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
  Error, Result,
  provider::{IdentityProvider, Profile},
  store::{Insert, UniqueKey, UserStore},
  user::{NewUser, PHONE_SENTINEL, User},
};

/// Resolves upstream-authenticated identities to local users.
///
/// Cloning is cheap; both collaborators are reference-counted.
pub struct IdentityResolver<U, P> {
  users:    Arc<U>,
  provider: Arc<P>,
}

impl<U, P> Clone for IdentityResolver<U, P> {
  fn clone(&self) -> Self {
    Self { users: Arc::clone(&self.users), provider: Arc::clone(&self.provider) }
  }
}

impl<U, P> IdentityResolver<U, P>
where
  U: UserStore,
  P: IdentityProvider,
{
  pub fn new(users: Arc<U>, provider: Arc<P>) -> Self { Self { users, provider } }

  /// Return the local user for `external_id`, creating it from the identity
  /// provider's profile if this is the first time we see it.
  ///
  /// Idempotent, including under concurrent first calls: the loser of an
  /// insert race re-reads and returns the winner's record.
  pub async fn resolve(&self, external_id: &str) -> Result<User> {
    if let Some(user) = self.find(external_id).await? {
      return Ok(user);
    }

    let profile = self
      .provider
      .get_profile(external_id)
      .await
      .map_err(Error::provider)?
      .ok_or_else(|| Error::IdentityNotFound(external_id.to_string()))?;

    let (mut candidate, mut may_rename) = new_user_from_profile(external_id, profile)?;

    loop {
      let outcome = self
        .users
        .create_user(candidate.clone())
        .await
        .map_err(Error::store)?;

      let key = match outcome {
        Insert::Created(user) => {
          info!(user_id = %user.user_id, external_id, username = %user.username, "created local user");
          return Ok(user);
        }
        Insert::Conflict(key) => key,
      };

      // A concurrent resolve for the same identity collides on whichever
      // unique column the backend checks first, not necessarily external_id.
      if let Some(winner) = self.find(external_id).await? {
        debug!(external_id, %key, "lost user creation race; returning winner");
        return Ok(winner);
      }

      match key {
        UniqueKey::Username if may_rename => {
          candidate.username = format!("{}-{}", candidate.username, id_suffix(external_id));
          may_rename = false;
        }
        UniqueKey::ExternalId => {
          return Err(Error::IdentityNotFound(external_id.to_string()));
        }
        key => {
          return Err(Error::IdentityConflict { external_id: external_id.to_string(), key });
        }
      }
    }
  }

  async fn find(&self, external_id: &str) -> Result<Option<User>> {
    self
      .users
      .find_user_by_external_id(external_id)
      .await
      .map_err(Error::store)
  }
}

/// Build the local record from a provider profile. The boolean is `true` when
/// the username was synthesised rather than supplied by the provider.
fn new_user_from_profile(external_id: &str, profile: Profile) -> Result<(NewUser, bool)> {
  let email = profile
    .emails
    .into_iter()
    .map(|e| e.trim().to_string())
    .find(|e| !e.is_empty())
    .ok_or_else(|| Error::IdentityNotFound(external_id.to_string()))?;

  let first_name = non_empty(profile.first_name).unwrap_or_default();
  let last_name = non_empty(profile.last_name).unwrap_or_default();

  let (username, synthesized) = match non_empty(profile.username) {
    Some(u) => (u, false),
    None => {
      let joined = format!("{first_name}{last_name}");
      if joined.is_empty() {
        let local = email.split('@').next().unwrap_or(&email).to_string();
        (local, true)
      } else {
        (joined, true)
      }
    }
  };

  let phone_number = profile
    .phone_numbers
    .into_iter()
    .map(|p| p.trim().to_string())
    .find(|p| !p.is_empty())
    .unwrap_or_else(|| PHONE_SENTINEL.to_string());

  let user = NewUser {
    external_id: external_id.to_string(),
    email,
    username,
    first_name,
    last_name,
    phone_number,
    photo_url: non_empty(profile.photo_url).unwrap_or_default(),
  };
  Ok((user, synthesized))
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// The last six characters of an external id.
fn id_suffix(external_id: &str) -> &str {
  let start = external_id.char_indices().rev().nth(5).map_or(0, |(i, _)| i);
  &external_id[start..]
}
