//! Attestation records and their lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a payment attestation.
///
/// `Pending` is the only state that can transition; `Attested` and
/// `Failed` are terminal and absorb all further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationStatus {
    /// Submitted, awaiting ledger confirmation.
    Pending,
    /// Confirmed on the ledger and stamped with an attesting-chain
    /// block.
    Attested,
    /// Confirmation could not be obtained.
    Failed,
}

impl AttestationStatus {
    /// Whether the status can never change again.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Attested | Self::Failed)
    }
}

impl fmt::Display for AttestationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Attested => "attested",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Record of one payment attestation, keyed by transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationRecord {
    /// Ledger transaction hash.
    pub tx_hash: String,
    /// Paying ledger account.
    pub source: String,
    /// Receiving ledger account.
    pub destination: String,
    /// Amount in drops.
    pub amount_drops: u64,
    /// Unix timestamp in milliseconds of the submission.
    pub submitted_ms: i64,
    /// Attesting-chain block stamped when the record was attested.
    pub chain_block: Option<u64>,
    /// Lifecycle status.
    pub status: AttestationStatus,
    /// Submission sequence for this hash; a resubmission bumps it.
    pub sequence: u64,
}

impl AttestationRecord {
    /// Create a fresh pending record.
    #[must_use]
    pub fn pending(
        tx_hash: String,
        source: String,
        destination: String,
        amount_drops: u64,
        submitted_ms: i64,
        sequence: u64,
    ) -> Self {
        Self {
            tx_hash,
            source,
            destination,
            amount_drops,
            submitted_ms,
            chain_block: None,
            status: AttestationStatus::Pending,
            sequence,
        }
    }
}
