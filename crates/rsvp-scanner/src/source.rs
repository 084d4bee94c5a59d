//! Frame sources: where a scan session gets its greyscale frames.

use std::{collections::VecDeque, future::Future, path::PathBuf};

use image::GrayImage;
use tokio::sync::mpsc;
use tracing::debug;

use crate::DeviceError;

/// A camera, or anything that behaves like one.
pub trait FrameSource: Send {
  /// The next frame. `Ok(None)` means the source is exhausted.
  fn next_frame(
    &mut self,
  ) -> impl Future<Output = Result<Option<GrayImage>, DeviceError>> + Send + '_;

  /// Stop capturing and give the device back. Called once per session.
  fn release(&mut self) {}
}

// ─── Image files ─────────────────────────────────────────────────────────────

/// Frames read from image files, in order. Useful for scanning screenshots of
/// tickets and for tests.
#[derive(Debug, Clone)]
pub struct ImageFileSource {
  paths: VecDeque<PathBuf>,
}

impl ImageFileSource {
  pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
    Self { paths: paths.into_iter().collect() }
  }
}

impl FrameSource for ImageFileSource {
  async fn next_frame(&mut self) -> Result<Option<GrayImage>, DeviceError> {
    let Some(path) = self.paths.pop_front() else {
      return Ok(None);
    };

    let bytes = tokio::fs::read(&path)
      .await
      .map_err(|source| DeviceError::Io { path: path.clone(), source })?;
    let decoded = tokio::task::spawn_blocking(move || {
      image::load_from_memory(&bytes).map(|img| img.to_luma8())
    })
    .await?;
    let frame = decoded.map_err(|source| DeviceError::Image { path: path.clone(), source })?;

    debug!(path = %path.display(), width = frame.width(), height = frame.height(), "frame loaded");
    Ok(Some(frame))
  }

  fn release(&mut self) { self.paths.clear(); }
}

// ─── Channel ─────────────────────────────────────────────────────────────────

/// What a capture thread pushes into a [`ChannelSource`].
pub type Frame = Result<GrayImage, DeviceError>;

/// Frames pushed by a capture thread over a bounded channel.
///
/// The source is exhausted once every sender is dropped. Releasing it closes
/// the channel, which the capture side observes as a failed send and should
/// take as the signal to stop the camera.
#[derive(Debug)]
pub struct ChannelSource {
  rx: mpsc::Receiver<Frame>,
}

impl ChannelSource {
  pub fn new(rx: mpsc::Receiver<Frame>) -> Self { Self { rx } }

  /// A connected sender/source pair holding at most `capacity` frames.
  pub fn channel(capacity: usize) -> (mpsc::Sender<Frame>, Self) {
    let (tx, rx) = mpsc::channel(capacity);
    (tx, Self::new(rx))
  }
}

impl FrameSource for ChannelSource {
  async fn next_frame(&mut self) -> Result<Option<GrayImage>, DeviceError> {
    self.rx.recv().await.transpose()
  }

  fn release(&mut self) { self.rx.close(); }
}

#[cfg(test)]
mod tests {
  use image::Luma;

  use super::*;

  #[tokio::test]
  async fn channel_source_yields_then_exhausts() {
    let (tx, mut source) = ChannelSource::channel(4);
    tx.send(Ok(GrayImage::from_pixel(8, 8, Luma([0])))).await.unwrap();
    drop(tx);

    assert!(source.next_frame().await.unwrap().is_some());
    assert!(source.next_frame().await.unwrap().is_none());
  }

  #[tokio::test]
  async fn released_channel_refuses_frames() {
    let (tx, mut source) = ChannelSource::channel(4);
    source.release();
    assert!(tx.send(Ok(GrayImage::new(1, 1))).await.is_err());
  }

  #[tokio::test]
  async fn missing_file_is_a_device_error() {
    let mut source = ImageFileSource::new([PathBuf::from("/nonexistent/ticket.png")]);
    assert!(matches!(source.next_frame().await, Err(DeviceError::Io { .. })));
  }

  #[tokio::test]
  async fn image_files_are_read_in_order() {
    let dir = std::env::temp_dir().join(format!("rsvp-scan-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let small = dir.join("small.png");
    let large = dir.join("large.png");
    GrayImage::new(4, 4).save(&small).unwrap();
    GrayImage::new(16, 16).save(&large).unwrap();

    let mut source = ImageFileSource::new([small, large]);
    assert_eq!(source.next_frame().await.unwrap().unwrap().width(), 4);
    assert_eq!(source.next_frame().await.unwrap().unwrap().width(), 16);
    assert!(source.next_frame().await.unwrap().is_none());

    std::fs::remove_dir_all(dir).unwrap();
  }
}
