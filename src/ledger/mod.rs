//! Settlement-ledger (XRPL) payment client.
//!
//! Bookings are priced in USD but settle in XRP on the XRPL. This
//! module owns everything on the ledger side of that: address and
//! amount hygiene, building the payment a guest must submit, matching
//! what the ledger later reports against what was expected, and the
//! JSON-RPC plumbing underneath.

pub mod address;
pub mod amount;
pub mod payment;
pub mod rpc;

pub use address::{is_valid_address, validate_address};
pub use amount::{drops_to_xrp, format_xrp, xrp_to_drops, DROPS_PER_XRP};
pub use payment::{
    decode_memo, encode_memo, validate_payment, ObservedPayment, PaymentIntent, MEMO_TYPE,
};
pub use rpc::{AccountBalance, LedgerQuery, XrplRpcClient};
