//! # lodgewire
//!
//! Cross-chain payment verification and fraud-risk pipeline for a
//! travel-booking platform settling in XRP.
//!
//! The crate ties four components together:
//! - Price feeds from the Flare FTSO, cached with staleness tracking
//! - XRPL payment construction, validation, and balance lookup
//! - A cross-chain attestation pipeline confirming XRPL payments on
//!   the attesting chain
//! - A fraud engine scoring wallets and booking attempts
//!
//! ## Example
//!
//! ```rust,no_run
//! use lodgewire::{ChainClient, PlatformConfig, PriceOracle};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PlatformConfig::default();
//!     let chain = ChainClient::connect(&config.chain).await?;
//!     let oracle = PriceOracle::new(Arc::new(chain), config.oracle);
//!     oracle.refresh().await;
//!     let xrp = oracle.convert(200.0, "USD", "XRP");
//!     println!("200 USD ≈ {xrp:.2} XRP");
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod attestation;
pub mod chain;
pub mod config;
pub mod error;
pub mod event;
pub mod fraud;
pub mod ledger;
pub mod oracle;
pub mod settlement;

pub use attestation::{AttestationPipeline, AttestationRecord, AttestationStatus};
pub use chain::{AttestingChain, ChainClient};
pub use config::{ChainNetwork, PlatformConfig};
pub use error::{Error, Result};
pub use event::{PipelineEvent, PipelineEventsChannel};
pub use fraud::{FraudEngine, RiskLevel, SessionContext, WalletVerification};
pub use ledger::{PaymentIntent, XrplRpcClient};
pub use oracle::{PriceFeed, PriceOracle};
pub use settlement::{BookingDecision, BookingRequest, SettlementFlow};
