//! Error types for `rsvp-scanner`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScannerError {
  /// Another session already holds the camera.
  #[error("the camera is already in use by another scan session")]
  Busy,
}

/// A failure of the frame source itself. Ends the session.
#[derive(Debug, Error)]
pub enum DeviceError {
  #[error("failed to read {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to decode image {path}: {source}")]
  Image {
    path:   PathBuf,
    #[source]
    source: image::ImageError,
  },

  #[error("camera disconnected: {0}")]
  Disconnected(String),

  #[error("frame decoder task failed: {0}")]
  Decoder(#[from] tokio::task::JoinError),
}
