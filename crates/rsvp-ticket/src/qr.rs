//! QR encoding of ticket payloads and QR detection in camera frames.
//!
//! Payloads are encoded in byte mode as UTF-8 text. Decoding works on
//! greyscale frames and may find several codes in one frame.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};

use crate::Result;

/// Smallest edge, in pixels, of a rendered ticket code including the quiet
/// zone.
const MIN_EDGE: u32 = 240;

/// Render `text` as a QR code image.
pub fn render(text: &str) -> Result<GrayImage> {
  let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::M)?;
  Ok(
    code
      .render::<Luma<u8>>()
      .quiet_zone(true)
      .min_dimensions(MIN_EDGE, MIN_EDGE)
      .build(),
  )
}

/// Render `text` as a QR code and encode it as PNG bytes.
pub fn render_png(text: &str) -> Result<Vec<u8>> {
  let image = render(text)?;
  let mut png = Vec::new();
  DynamicImage::ImageLuma8(image).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
  Ok(png)
}

/// What a single detected code yielded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
  /// The code decoded to this text.
  Text(String),
  /// A code was located but could not be read (damaged, blurred, partial).
  Unreadable(String),
}

/// Locate and decode every QR code in `frame`. An empty result means no code
/// was seen at all.
pub fn decode(frame: &GrayImage) -> Vec<Detection> {
  let (width, height) = frame.dimensions();
  let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
    width as usize,
    height as usize,
    |x, y| frame.get_pixel(x as u32, y as u32).0[0],
  );

  prepared
    .detect_grids()
    .into_iter()
    .map(|grid| match grid.decode() {
      Ok((_meta, text)) => Detection::Text(text),
      Err(e) => Detection::Unreadable(e.to_string()),
    })
    .collect()
}
