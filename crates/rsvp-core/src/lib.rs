//! Core types, trait definitions, and reservation services for the RSVP
//! ticketing system.
//!
//! This crate has no HTTP or database dependencies. Storage
//! backends implement the traits in [`store`]; outbound integrations implement
//! the traits in [`provider`].

pub mod claim;
pub mod error;
pub mod event;
pub mod identity;
pub mod ledger;
pub mod provider;
pub mod reservation;
pub mod store;
pub mod user;

pub use error::{Error, ErrorKind, Result};
pub use identity::IdentityResolver;
pub use ledger::ReservationLedger;

#[cfg(test)]
mod fakes;
