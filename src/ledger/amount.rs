//! Drop and XRP amount conversions.
//!
//! The ledger denominates everything in drops; one XRP is a million
//! drops. Drop counts up to 10^15 (a billion XRP) survive a round-trip
//! through `f64` exactly; above that only double precision holds, so
//! the final drop can wobble.

/// Drops per XRP.
pub const DROPS_PER_XRP: u64 = 1_000_000;

/// Convert an XRP amount to drops, rounding to the nearest drop.
///
/// Negative inputs saturate to zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn xrp_to_drops(xrp: f64) -> u64 {
    (xrp * 1_000_000.0).round() as u64
}

/// Convert a drop count to XRP.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn drops_to_xrp(drops: u64) -> f64 {
    drops as f64 / 1_000_000.0
}

/// Render a drop count as a two-decimal XRP display string.
#[must_use]
pub fn format_xrp(drops: u64) -> String {
    format!("{:.2} XRP", drops_to_xrp(drops))
}
