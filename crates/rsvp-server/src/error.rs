//! Error type for `rsvp-server`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("identity provider returned {status}: {body}")]
  Upstream {
    status: u16,
    body:   String,
  },

  #[error("invalid ticket UTC offset: {0} minutes")]
  InvalidOffset(i32),

  #[error("invalid identity header name: {0:?}")]
  InvalidHeader(String),

  #[error("setting {0} is required")]
  MissingSetting(&'static str),

  #[error("store error: {0}")]
  Store(#[from] rsvp_store_sqlite::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
