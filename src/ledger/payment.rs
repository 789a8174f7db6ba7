//! Payment construction and matching.
//!
//! A `PaymentIntent` is what the platform expects to see settle on the
//! ledger; an `ObservedPayment` is what the ledger actually reports.
//! `validate_payment` decides whether the observation satisfies the
//! intent.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};
use crate::ledger::address::validate_address;
use crate::ledger::amount::xrp_to_drops;

/// Memo type tag carried on platform payments.
pub const MEMO_TYPE: &str = "booking_ref";

/// Encode a memo field as uppercase hex.
#[must_use]
pub fn encode_memo(text: &str) -> String {
    hex::encode_upper(text.as_bytes())
}

/// Decode a hex memo field back to text.
///
/// # Errors
///
/// Returns `Error::Validation` if the field is not hex or not UTF-8.
pub fn decode_memo(field: &str) -> Result<String> {
    let bytes =
        hex::decode(field).map_err(|e| Error::Validation(format!("memo is not valid hex: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| Error::Validation(format!("memo is not valid UTF-8: {e}")))
}

/// A payment the platform intends to observe on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Paying account.
    pub source: String,
    /// Receiving account.
    pub destination: String,
    /// Amount in drops.
    pub amount_drops: u64,
    /// Reference token tying the payment to a booking.
    pub reference_token: String,
}

impl PaymentIntent {
    /// Build a payment intent, validating every field first.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a malformed address, a
    /// non-positive amount, or an empty reference token.
    pub fn build(
        source: &str,
        destination: &str,
        amount_xrp: f64,
        reference_token: &str,
    ) -> Result<Self> {
        validate_address(source)?;
        validate_address(destination)?;
        if reference_token.is_empty() {
            return Err(Error::Validation(
                "reference token must not be empty".to_string(),
            ));
        }
        let amount_drops = xrp_to_drops(amount_xrp);
        if amount_drops == 0 {
            return Err(Error::Validation(format!(
                "payment amount must be positive, got {amount_xrp} XRP"
            )));
        }
        Ok(Self {
            source: source.to_string(),
            destination: destination.to_string(),
            amount_drops,
            reference_token: reference_token.to_string(),
        })
    }

    /// Render the typed ledger submission object.
    #[must_use]
    pub fn to_submit_json(&self) -> serde_json::Value {
        json!({
            "TransactionType": "Payment",
            "Account": self.source,
            "Destination": self.destination,
            "Amount": self.amount_drops.to_string(),
            "Memos": [{
                "Memo": {
                    "MemoType": encode_memo(MEMO_TYPE),
                    "MemoData": encode_memo(&self.reference_token),
                }
            }]
        })
    }
}

/// A payment as the ledger reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedPayment {
    /// Transaction hash.
    pub hash: String,
    /// Whether the ledger has validated the transaction.
    pub validated: bool,
    /// Ledger index the transaction was included in.
    pub ledger_index: Option<u64>,
    /// Delivered amount in drops.
    pub delivered_drops: u64,
    /// Sending account.
    pub account: String,
    /// Receiving account.
    pub destination: String,
    /// Decoded memo payloads.
    pub memos: Vec<String>,
}

/// Match an observed payment against the expected terms.
///
/// Overpayment is accepted and underpayment rejected; the destination
/// must match byte for byte; and some decoded memo must contain the
/// reference token. Containment rather than equality tolerates
/// decorated memo payloads.
#[must_use]
pub fn validate_payment(
    observed: &ObservedPayment,
    expected_drops: u64,
    expected_destination: &str,
    reference_token: &str,
) -> bool {
    if observed.delivered_drops < expected_drops {
        debug!(
            hash = %observed.hash,
            delivered = observed.delivered_drops,
            expected = expected_drops,
            "payment rejected: underpaid"
        );
        return false;
    }
    if observed.destination != expected_destination {
        debug!(hash = %observed.hash, "payment rejected: wrong destination");
        return false;
    }
    let matched = observed
        .memos
        .iter()
        .any(|memo| memo.contains(reference_token));
    if !matched {
        debug!(hash = %observed.hash, "payment rejected: reference token not found in memos");
    }
    matched
}
