//! Error types for lodgewire.

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lodgewire.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Input failed validation before any network call was made.
    #[error("validation error: {0}")]
    Validation(String),

    /// Settlement-ledger (XRPL) RPC error.
    #[error("ledger error: {0}")]
    Ledger(String),

    /// Balance lookup exhausted every configured endpoint.
    #[error("balance lookup failed after trying {attempted} endpoint(s)")]
    BalanceLookup {
        /// Number of endpoints that were attempted.
        attempted: usize,
    },

    /// Attesting-chain (EVM) RPC error.
    #[error("chain error: {0}")]
    Chain(String),

    /// Attestation pipeline error.
    #[error("attestation error: {0}")]
    Attestation(String),

    /// Wallet-intelligence collaborator error.
    #[error("wallet intel error: {0}")]
    Intel(String),

    /// The payment was not confirmed within the bounded wait.
    ///
    /// Surfaced to operators as "not yet confirmed" so it cannot be
    /// mistaken for fund loss.
    #[error("payment not yet confirmed for transaction {0}")]
    PaymentNotConfirmed(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_lookup_reports_attempt_count() {
        let err = Error::BalanceLookup { attempted: 3 };
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_payment_not_confirmed_wording() {
        let err = Error::PaymentNotConfirmed("ABC123".to_string());
        let msg = err.to_string();
        assert!(msg.contains("not yet confirmed"));
        assert!(msg.contains("ABC123"));
        assert!(!msg.to_lowercase().contains("lost"));
    }
}
