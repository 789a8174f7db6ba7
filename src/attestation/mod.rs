//! Payment attestation: from ledger confirmation to on-chain proof.
//!
//! ```text
//!   submit_attestation_request(tx_hash)
//!        │
//!        ▼
//!   ┌─────────┐   ledger poll     ┌──────────┐
//!   │ Pending │ ────validated───▶ │ Attested │──▶ PaymentAttested event
//!   └─────────┘                   └──────────┘
//!        │
//!        │ poll budget / TTL / chain unreachable
//!        ▼
//!   ┌─────────┐
//!   │ Failed  │──▶ AttestationFailed event
//!   └─────────┘
//! ```
//!
//! Terminal states absorb further transitions. Resubmitting a hash
//! replaces its record and supersedes the old resolution task.

mod pipeline;
mod record;

pub use pipeline::AttestationPipeline;
pub use record::{AttestationRecord, AttestationStatus};
