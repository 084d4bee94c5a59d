//! Admission scanner for the RSVP system.
//!
//! A [`Scanner`] guards exclusive access to a camera. Each [`ScanSession`]
//! pulls frames from a [`FrameSource`], looks for ticket QR codes, and stops
//! at the first valid [`ScanClaim`](rsvp_core::claim::ScanClaim). Unreadable
//! or foreign codes are reported and scanning continues.
//!
//! A claim is only what the ticket says about itself. Admission is decided by
//! the server.

pub mod error;
pub mod session;
pub mod source;

pub use error::{DeviceError, ScannerError};
pub use session::{ScanHandler, ScanSession, ScanState, Scanner, StopReason};
pub use source::{ChannelSource, FrameSource, ImageFileSource};
