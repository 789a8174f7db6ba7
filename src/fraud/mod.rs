//! Fraud and risk scoring.
//!
//! ```text
//!   WalletIntel (age / history / device / IP)
//!        │
//!        ▼
//!   FraudEngine ──▶ WalletVerification ──▶ RiskLevel band
//!        │
//!        ├─▶ BookingFraudCheck   (per attempt, ephemeral)
//!        ├─▶ review-fraud flag
//!        └─▶ raffle eligibility
//! ```
//!
//! Scoring formulas are the engine's contract; facts come from the
//! [`WalletIntel`] collaborator and ban/flag lists from config. A
//! risky verdict is a value the caller acts on, never an error.

mod cache;
mod engine;
mod fingerprint;

pub use cache::{CacheStats, VerificationCache};
pub use engine::{
    assess, BookingFraudCheck, FraudEngine, RiskAssessment, RiskLevel, SessionContext,
    WalletIntel, WalletVerification,
};
pub use fingerprint::ClientSignals;
