//! Error type for `rsvp-ticket`.

use rsvp_core::provider::DispatchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("qr encoding error: {0}")]
  Qr(#[from] qrcode::types::QrError),

  #[error("image error: {0}")]
  Image(#[from] image::ImageError),

  #[error("ticket dispatch failed: {0}")]
  Dispatch(#[from] DispatchError),
}

impl From<Error> for rsvp_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Dispatch(d) => rsvp_core::Error::DispatchFailed(d),
      other => rsvp_core::Error::Render(other.to_string()),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
