//! Price feed types and scaling rules.

use serde::{Deserialize, Serialize};

/// Feed category byte for crypto pairs.
pub const FEED_CATEGORY_CRYPTO: u8 = 0x01;

/// Length of an oracle feed identifier in bytes.
pub const FEED_ID_LEN: usize = 21;

/// Default staleness window in milliseconds.
///
/// Feeds older than this are not trusted for pricing. Sized to fit
/// inside one oracle voting round.
pub const DEFAULT_MAX_FEED_AGE_MS: u64 = 60_000;

/// Build the 21-byte oracle feed identifier for a symbol.
///
/// Layout: category byte, then the ASCII symbol, zero-padded.
///
/// # Errors
///
/// Returns `Error::Validation` if the symbol is empty or longer than
/// 20 bytes.
pub fn feed_id(symbol: &str) -> crate::Result<[u8; FEED_ID_LEN]> {
    let bytes = symbol.as_bytes();
    if bytes.is_empty() {
        return Err(crate::Error::Validation("empty feed symbol".to_string()));
    }
    if bytes.len() > FEED_ID_LEN - 1 {
        return Err(crate::Error::Validation(format!(
            "feed symbol too long: {symbol}"
        )));
    }
    let mut id = [0u8; FEED_ID_LEN];
    id[0] = FEED_CATEGORY_CRYPTO;
    id[1..=bytes.len()].copy_from_slice(bytes);
    Ok(id)
}

/// Scale a raw oracle mantissa into a price.
///
/// The oracle reports `value × 10^decimals`; the exponent's sign is
/// ignored and treated as a negative power of ten, so `(150000, 5)`
/// and `(150000, -5)` both scale to `1.5`.
#[must_use]
pub fn scale_value(mantissa: i32, decimals: i8) -> f64 {
    f64::from(mantissa) * 10f64.powi(-i32::from(decimals).abs())
}

/// A single observed price feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceFeed {
    /// Oracle feed identifier.
    pub id: [u8; FEED_ID_LEN],
    /// Symbol in "BASE/QUOTE" form, e.g. "XRP/USD".
    pub symbol: String,
    /// Scaled price.
    pub value: f64,
    /// Unix timestamp in milliseconds of the last fresh observation.
    pub updated_ms: i64,
    /// Oracle voting round the value was produced in.
    pub voting_round: u32,
}

impl PriceFeed {
    /// Age of the observation at `now_ms`.
    #[must_use]
    pub const fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.updated_ms
    }

    /// Whether the observation is within `max_age_ms` at `now_ms`.
    #[must_use]
    pub fn is_fresh_at(&self, now_ms: i64, max_age_ms: u64) -> bool {
        let age = self.age_ms(now_ms);
        age >= 0 && age < i64::try_from(max_age_ms).unwrap_or(i64::MAX)
    }

    /// Whether the observation is within `max_age_ms` of the wall
    /// clock.
    #[must_use]
    pub fn is_fresh(&self, max_age_ms: u64) -> bool {
        self.is_fresh_at(chrono::Utc::now().timestamp_millis(), max_age_ms)
    }
}
