//! The scan session state machine.
//!
//! ```text
//! Idle ─run─▶ Scanning ─valid claim─▶ Decoded ─▶ Stopped
//!                │  ▲
//!     soft error │  │ keep scanning
//!                ▼  │
//!            DecodeError
//! ```
//!
//! Any state moves to `Stopped` on cancellation, a device error, or an
//! exhausted source. Stopping always releases the device.

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use image::GrayImage;
use rsvp_core::claim::ScanClaim;
use rsvp_ticket::{
  payload::{self, INVALID_FORMAT},
  qr::{self, Detection},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{DeviceError, FrameSource, ScannerError};

/// Message reported for a code that was seen but could not be read.
pub const UNREADABLE: &str = "Failed to scan QR code";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
  Idle,
  Scanning,
  Decoded,
  DecodeError,
  Stopped,
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
  /// A valid claim was delivered to [`ScanHandler::on_scan`].
  Scanned,
  Cancelled,
  /// The source ran out of frames.
  Exhausted,
  /// The source failed; see [`ScanHandler::on_device_error`].
  DeviceFailed,
}

/// Receives the results of a session.
pub trait ScanHandler: Send {
  fn on_scan(&mut self, claim: ScanClaim);

  /// A code was seen but is not a usable ticket. Scanning continues.
  fn on_decode_error(&mut self, _message: &str) {}

  fn on_device_error(&mut self, _error: &DeviceError) {}

  fn on_state(&mut self, _state: ScanState) {}
}

// ─── Scanner ─────────────────────────────────────────────────────────────────

/// Owner of a single camera. At most one session may hold it at a time.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
  busy: Arc<AtomicBool>,
}

impl Scanner {
  pub fn new() -> Self { Self::default() }

  pub fn is_busy(&self) -> bool { self.busy.load(Ordering::Acquire) }

  /// Claim the camera for a new session reading from `source`.
  pub fn session<S: FrameSource>(&self, source: S) -> Result<ScanSession<S>, ScannerError> {
    self
      .busy
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .map_err(|_| ScannerError::Busy)?;

    Ok(ScanSession {
      source,
      busy: Arc::clone(&self.busy),
      state: ScanState::Idle,
      released: false,
      examine,
    })
  }
}

// ─── Session ─────────────────────────────────────────────────────────────────

pub struct ScanSession<S: FrameSource> {
  source:   S,
  busy:     Arc<AtomicBool>,
  state:    ScanState,
  released: bool,
  /// Runs on the blocking pool, off the async workers.
  examine:  fn(&GrayImage) -> Verdict,
}

impl<S: FrameSource> ScanSession<S> {
  pub fn state(&self) -> ScanState { self.state }

  /// Scan until a valid claim, cancellation, a device error, or the end of
  /// the source. The device is released before this returns.
  ///
  /// Cancellation also interrupts a frame that is still being decoded; its
  /// result is discarded.
  pub async fn run<H: ScanHandler>(
    mut self,
    handler: &mut H,
    cancel: CancellationToken,
  ) -> StopReason {
    self.enter(ScanState::Scanning, handler);

    let reason = loop {
      let next = tokio::select! {
        biased;
        () = cancel.cancelled() => break StopReason::Cancelled,
        next = self.source.next_frame() => next,
      };

      let frame = match next {
        Ok(Some(frame)) => frame,
        Ok(None) => break StopReason::Exhausted,
        Err(e) => {
          warn!(error = %e, "scanner device error");
          handler.on_device_error(&e);
          break StopReason::DeviceFailed;
        }
      };

      let examine = self.examine;
      let verdict = tokio::select! {
        biased;
        () = cancel.cancelled() => break StopReason::Cancelled,
        verdict = tokio::task::spawn_blocking(move || examine(&frame)) => verdict,
      };
      let verdict = match verdict {
        Ok(verdict) => verdict,
        Err(e) => {
          let e = DeviceError::from(e);
          warn!(error = %e, "scanner device error");
          handler.on_device_error(&e);
          break StopReason::DeviceFailed;
        }
      };

      match verdict {
        Verdict::Nothing => debug!("no code in frame"),
        Verdict::Soft(message) => {
          warn!(error = message, "unusable code in frame");
          self.enter(ScanState::DecodeError, handler);
          handler.on_decode_error(message);
          self.enter(ScanState::Scanning, handler);
        }
        Verdict::Claim(claim) => {
          info!(ticket_id = %claim.ticket_id, "ticket scanned");
          self.enter(ScanState::Decoded, handler);
          handler.on_scan(claim);
          break StopReason::Scanned;
        }
      }
    };

    self.release();
    self.enter(ScanState::Stopped, handler);
    debug!(?reason, "scan session stopped");
    reason
  }

  /// Give the device back. Safe to call more than once.
  pub fn release(&mut self) {
    if self.released {
      return;
    }
    self.released = true;
    self.source.release();
    self.busy.store(false, Ordering::Release);
  }

  fn enter<H: ScanHandler>(&mut self, state: ScanState, handler: &mut H) {
    self.state = state;
    handler.on_state(state);
  }
}

impl<S: FrameSource> Drop for ScanSession<S> {
  fn drop(&mut self) { self.release(); }
}

// ─── Frame examination ───────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum Verdict {
  Nothing,
  Soft(&'static str),
  Claim(ScanClaim),
}

fn examine(frame: &GrayImage) -> Verdict { judge(qr::decode(frame)) }

/// A valid claim anywhere in the frame wins. Otherwise a foreign code is
/// reported ahead of an unreadable one.
fn judge(detections: Vec<Detection>) -> Verdict {
  let mut verdict = Verdict::Nothing;
  for detection in detections {
    match detection {
      Detection::Text(text) => match payload::decode(&text) {
        Ok(claim) => return Verdict::Claim(claim),
        Err(_) => verdict = Verdict::Soft(INVALID_FORMAT),
      },
      Detection::Unreadable(reason) => {
        debug!(%reason, "code located but not decoded");
        if verdict == Verdict::Nothing {
          verdict = Verdict::Soft(UNREADABLE);
        }
      }
    }
  }
  verdict
}
