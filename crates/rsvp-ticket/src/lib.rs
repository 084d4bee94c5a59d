//! Ticket artifacts for the RSVP system.
//!
//! A ticket is a [`ScanClaim`] serialised as JSON and encoded as a QR code.
//! This crate owns that encoding in both directions, the human-readable event
//! date printed on tickets, the ticket email, and the [`TicketIssuer`] that
//! sends it.
//!
//! # Example
//!
//! ```rust,ignore
//! let artifact = issuer.issue(&reservation).await?;
//! let claims = rsvp_ticket::qr::decode(&image::load_from_memory(&artifact.png)?.to_luma8());
//! ```

pub mod date;
pub mod email;
pub mod error;
pub mod issuer;
pub mod payload;
pub mod qr;

pub use error::{Error, Result};
pub use issuer::{IssuerConfig, TicketArtifact, TicketIssuer};
pub use rsvp_core::claim::ScanClaim;
