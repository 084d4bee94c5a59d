//! The JSON text embedded in a ticket's QR code.

use rsvp_core::claim::ScanClaim;

use crate::Result;

/// Message reported for scanned text that is not a ticket payload.
pub const INVALID_FORMAT: &str = "Invalid QR code format";

/// Serialise a claim to the compact JSON embedded in the QR code.
pub fn encode(claim: &ScanClaim) -> Result<String> { Ok(serde_json::to_string(claim)?) }

/// Parse scanned text back into a claim. Anything other than a JSON object
/// with exactly the four string keys is rejected.
pub fn decode(text: &str) -> Result<ScanClaim> { Ok(serde_json::from_str(text.trim())?) }
