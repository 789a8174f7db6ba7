//! On-chain price feed oracle.
//!
//! Exchange rates come from an FTSO-style oracle on the attesting
//! chain, which publishes one feed per currency pair each voting
//! round. This module turns those raw observations into prices the
//! booking flow can use:
//!
//! ```text
//! FtsoV2.getFeedById(bytes21)
//!        │
//!        ▼
//! ┌─────────────────────┐
//! │ FeedSource (trait)  │   raw (round, mantissa, decimals)
//! └─────────┬───────────┘
//!           ▼
//! ┌─────────────────────┐
//! │ PriceOracle         │   scaling, staleness, USD routing
//! └─────────────────────┘
//! ```
//!
//! Pricing is advisory: an unavailable feed degrades to "absent" and
//! conversions through it evaluate to zero.

pub mod adapter;
pub mod feed;

pub use adapter::{FeedObservation, FeedSource, PriceOracle};
pub use feed::{feed_id, scale_value, PriceFeed, DEFAULT_MAX_FEED_AGE_MS, FEED_ID_LEN};
