//! End-to-end booking settlement.
//!
//! One flow ties the components together: the fraud engine gates the
//! attempt, the oracle prices the USD amount in XRP, the ledger
//! module shapes the payment, and the attestation pipeline confirms
//! it cross-chain. A risky guest gets a structured denial; only
//! infrastructure problems surface as errors.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::attestation::{AttestationPipeline, AttestationRecord};
use crate::event::PipelineEvent;
use crate::fraud::{BookingFraudCheck, FraudEngine, RiskLevel, SessionContext};
use crate::ledger::PaymentIntent;
use crate::oracle::PriceOracle;
use crate::{Error, Result};

/// A booking attempt to settle.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    /// Guest wallet on the booking chain.
    pub guest_wallet: String,
    /// Host wallet on the booking chain.
    pub host_wallet: String,
    /// Property the booking targets.
    pub property_id: u64,
    /// Quoted price in USD.
    pub price_usd: f64,
    /// XRPL address the guest pays from.
    pub source_address: String,
    /// XRPL address the platform collects at.
    pub destination_address: String,
    /// Reference token tying the payment to the booking.
    pub reference_token: String,
    /// Session facts for fraud scoring.
    pub session: SessionContext,
}

/// Outcome of the pre-payment stage of a booking.
#[derive(Debug, Clone)]
pub enum BookingDecision {
    /// The guest failed the risk gate; no payment was prepared.
    Denied {
        /// The check that produced the denial.
        check: BookingFraudCheck,
    },
    /// Payment intent ready to sign and submit.
    Approved {
        /// The passing fraud check.
        check: BookingFraudCheck,
        /// Price converted into XRP.
        amount_xrp: f64,
        /// The payment to make.
        intent: PaymentIntent,
    },
}

impl BookingDecision {
    /// Whether a payment was prepared.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }
}

/// Booking settlement flow over the verification components.
pub struct SettlementFlow {
    oracle: Arc<PriceOracle>,
    fraud: Arc<FraudEngine>,
    pipeline: AttestationPipeline,
}

impl SettlementFlow {
    /// Assemble the flow.
    #[must_use]
    pub fn new(
        oracle: Arc<PriceOracle>,
        fraud: Arc<FraudEngine>,
        pipeline: AttestationPipeline,
    ) -> Self {
        Self {
            oracle,
            fraud,
            pipeline,
        }
    }

    /// Risk-gate a booking attempt and price it in XRP.
    ///
    /// A guest whose wallet fails verification, or whose attempt
    /// bands High Risk, gets [`BookingDecision::Denied`]; nothing is
    /// charged or submitted.
    ///
    /// # Errors
    ///
    /// Returns `Error::Chain` when the XRP leg cannot be priced and
    /// propagates fraud-check and payment-construction failures.
    pub async fn prepare_booking(&self, request: &BookingRequest) -> Result<BookingDecision> {
        let check = self
            .fraud
            .check_booking_fraud(
                &request.guest_wallet,
                &request.host_wallet,
                request.property_id,
                &request.session,
            )
            .await?;
        if !check.verification.is_verified {
            info!(
                guest = %request.guest_wallet,
                score = check.verification.risk_score,
                banned = check.verification.is_banned,
                "booking denied by risk gate"
            );
            return Ok(BookingDecision::Denied { check });
        }
        // The High band is blocked from automated settlement even
        // when the wallet alone passes verification.
        if check.assessment().level == RiskLevel::High {
            info!(
                guest = %request.guest_wallet,
                booking_score = check.risk_score,
                self_booking = check.self_booking,
                "booking denied: attempt banded high risk"
            );
            return Ok(BookingDecision::Denied { check });
        }

        let amount_xrp = self.oracle.convert(request.price_usd, "USD", "XRP");
        if amount_xrp <= 0.0 {
            return Err(Error::Chain(
                "booking cannot be priced: XRP conversion unavailable".to_string(),
            ));
        }
        let intent = PaymentIntent::build(
            &request.source_address,
            &request.destination_address,
            amount_xrp,
            &request.reference_token,
        )?;
        debug!(
            property_id = request.property_id,
            price_usd = request.price_usd,
            amount_xrp,
            "booking approved and priced"
        );
        Ok(BookingDecision::Approved {
            check,
            amount_xrp,
            intent,
        })
    }

    /// Submit a landed payment for attestation and wait for the
    /// verdict.
    ///
    /// The wait is bounded by the pipeline's pending ceiling.
    ///
    /// # Errors
    ///
    /// Returns `Error::PaymentNotConfirmed` when the verdict does not
    /// arrive in time and `Error::Attestation` when the pipeline
    /// reports the attestation failed.
    pub async fn confirm_payment(
        &self,
        tx_hash: &str,
        intent: &PaymentIntent,
    ) -> Result<AttestationRecord> {
        // Subscribe before submitting so the verdict cannot slip past.
        let events = self.pipeline.subscribe_events();
        self.pipeline.submit_attestation_request(
            tx_hash,
            &intent.source,
            &intent.destination,
            intent.amount_drops,
        )?;

        let wait = self.pipeline.pending_ttl();
        match tokio::time::timeout(wait, Self::await_verdict(events, tx_hash)).await {
            Ok(Ok(())) => self.pipeline.get_attestation(tx_hash).ok_or_else(|| {
                Error::Attestation(format!("no record for attested transaction {tx_hash}"))
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                warn!(%tx_hash, wait_secs = wait.as_secs(), "confirmation wait expired");
                Err(Error::PaymentNotConfirmed(tx_hash.to_string()))
            }
        }
    }

    /// Consume pipeline events until this transaction's verdict.
    async fn await_verdict(
        mut events: crate::event::PipelineEventsChannel,
        tx_hash: &str,
    ) -> Result<()> {
        loop {
            match events.recv().await {
                Ok(PipelineEvent::PaymentAttested { tx_hash: hash, block }) if hash == tx_hash => {
                    info!(%tx_hash, block, "payment confirmed and attested");
                    return Ok(());
                }
                Ok(PipelineEvent::AttestationFailed { tx_hash: hash }) if hash == tx_hash => {
                    return Err(Error::Attestation(format!(
                        "attestation failed for transaction {tx_hash}"
                    )));
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "pipeline event receiver lagged");
                }
                Err(RecvError::Closed) => {
                    return Err(Error::Attestation(
                        "pipeline event channel closed".to_string(),
                    ));
                }
            }
        }
    }

    /// How long [`Self::confirm_payment`] waits for a verdict.
    #[must_use]
    pub fn confirmation_wait(&self) -> Duration {
        self.pipeline.pending_ttl()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::attestation::AttestationStatus;
    use crate::chain::{AttestingChain, PaymentProof};
    use crate::config::{AttestationConfig, FraudConfig, OracleConfig};
    use crate::fraud::WalletIntel;
    use crate::ledger::{LedgerQuery, ObservedPayment};
    use crate::oracle::{FeedObservation, FeedSource};
    use async_trait::async_trait;

    const GUEST: &str = "0x1111111111111111111111111111111111111111";
    const HOST: &str = "0x2222222222222222222222222222222222222222";
    const SOURCE: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
    const DESTINATION: &str = "rN7n7otQDd6FczFgLdSqtcsAUxDkw6fzRH";
    const HASH: &str = "A1B2C3D4E5F6A7B8";

    struct StubFeed {
        priced: bool,
    }

    #[async_trait]
    impl FeedSource for StubFeed {
        async fn fetch(&self, symbol: &str) -> Result<FeedObservation> {
            if self.priced && symbol == "XRP/USD" {
                // 0.50 USD per XRP.
                Ok(FeedObservation {
                    voting_round: 1,
                    mantissa: 50,
                    decimals: 2,
                })
            } else {
                Err(Error::Chain(format!("no feed for {symbol}")))
            }
        }

        async fn current_round(&self) -> Result<u32> {
            Ok(1)
        }
    }

    struct StubIntel {
        age_days: u32,
        bookings: u32,
    }

    #[async_trait]
    impl WalletIntel for StubIntel {
        async fn wallet_age_days(&self, _address: &str) -> Result<u32> {
            Ok(self.age_days)
        }

        async fn completed_bookings(&self, _address: &str) -> Result<u32> {
            Ok(self.bookings)
        }

        async fn device_hash(&self, _address: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn last_ip(&self, _address: &str) -> Result<Option<String>> {
            Ok(None)
        }
    }

    struct StubLedger {
        validated: bool,
    }

    #[async_trait]
    impl LedgerQuery for StubLedger {
        async fn transaction(&self, tx_hash: &str) -> Result<ObservedPayment> {
            Ok(ObservedPayment {
                hash: tx_hash.to_string(),
                validated: self.validated,
                ledger_index: self.validated.then_some(80_000_000),
                delivered_drops: 400_000_000,
                account: SOURCE.to_string(),
                destination: DESTINATION.to_string(),
                memos: vec!["BK-7".to_string()],
            })
        }
    }

    struct StubChain {
        healthy: bool,
    }

    #[async_trait]
    impl AttestingChain for StubChain {
        async fn block_number(&self) -> Result<u64> {
            if self.healthy {
                Ok(1_234)
            } else {
                Err(Error::Chain("unreachable".to_string()))
            }
        }

        async fn voting_round(&self) -> Result<u32> {
            Ok(1)
        }

        async fn verify_payment_proof(&self, _proof: PaymentProof) -> Result<bool> {
            Ok(self.healthy)
        }
    }

    async fn priced_oracle(priced: bool) -> Arc<PriceOracle> {
        let config = OracleConfig {
            symbols: vec!["XRP/USD".to_string()],
            ..OracleConfig::default()
        };
        let oracle = PriceOracle::new(Arc::new(StubFeed { priced }), config);
        oracle.refresh().await;
        Arc::new(oracle)
    }

    fn fraud_engine(age_days: u32, bookings: u32, config: FraudConfig) -> Arc<FraudEngine> {
        Arc::new(FraudEngine::new(
            Arc::new(StubIntel { age_days, bookings }),
            config,
        ))
    }

    fn pipeline(validated: bool, healthy: bool, config: AttestationConfig) -> AttestationPipeline {
        AttestationPipeline::new(Arc::new(StubLedger { validated }), config)
            .with_chain(Arc::new(StubChain { healthy }))
    }

    fn request() -> BookingRequest {
        BookingRequest {
            guest_wallet: GUEST.to_string(),
            host_wallet: HOST.to_string(),
            property_id: 7,
            price_usd: 200.0,
            source_address: SOURCE.to_string(),
            destination_address: DESTINATION.to_string(),
            reference_token: "BK-7".to_string(),
            session: SessionContext::default(),
        }
    }

    #[tokio::test]
    async fn test_risk_gate_denies_unverified_guests() {
        // Day-old wallet scores 80: denied without a ban.
        let flow = SettlementFlow::new(
            priced_oracle(true).await,
            fraud_engine(0, 1, FraudConfig::default()),
            pipeline(true, true, AttestationConfig::default()),
        );
        let decision = flow.prepare_booking(&request()).await.expect("decision");
        let BookingDecision::Denied { check } = decision else {
            panic!("expected a denial");
        };
        assert_eq!(check.verification.risk_score, 80);
        assert!(!check.verification.is_banned);

        // Banned wallet: denied regardless of history.
        let config = FraudConfig {
            banned_wallets: vec![GUEST.to_string()],
            ..FraudConfig::default()
        };
        let flow = SettlementFlow::new(
            priced_oracle(true).await,
            fraud_engine(400, 10, config),
            pipeline(true, true, AttestationConfig::default()),
        );
        let decision = flow.prepare_booking(&request()).await.expect("decision");
        let BookingDecision::Denied { check } = decision else {
            panic!("expected a denial");
        };
        assert!(check.verification.is_banned);
        assert_eq!(check.verification.risk_score, 100);
    }

    #[tokio::test]
    async fn test_self_booking_is_denied_despite_verified_wallet() {
        // Established wallet, score 0 on its own; guest and host are
        // the same wallet, so the attempt bands High Risk.
        let flow = SettlementFlow::new(
            priced_oracle(true).await,
            fraud_engine(120, 5, FraudConfig::default()),
            pipeline(true, true, AttestationConfig::default()),
        );
        let mut request = request();
        request.host_wallet = GUEST.to_uppercase();
        let decision = flow.prepare_booking(&request).await.expect("decision");
        let BookingDecision::Denied { check } = decision else {
            panic!("expected a denial");
        };
        assert!(check.verification.is_verified, "the wallet alone is clean");
        assert!(check.self_booking);
        assert_eq!(check.risk_score, 90);
        assert_eq!(check.assessment().level, RiskLevel::High);
    }

    #[tokio::test]
    async fn test_medium_band_attempt_is_still_approved() {
        // A 3-day-old wallet scores 50 and passes verification; the
        // rapid second attempt adds the cooldown weight, landing the
        // attempt at 50. Medium Risk is flagged, not blocked.
        let flow = SettlementFlow::new(
            priced_oracle(true).await,
            fraud_engine(3, 0, FraudConfig::default()),
            pipeline(true, true, AttestationConfig::default()),
        );
        let first = flow.prepare_booking(&request()).await.expect("decision");
        assert!(first.is_approved());

        let second = flow.prepare_booking(&request()).await.expect("decision");
        let BookingDecision::Approved { check, .. } = second else {
            panic!("expected an approval");
        };
        assert!(check.cooldown_violation);
        assert_eq!(check.risk_score, 50);
        assert_eq!(check.assessment().level, RiskLevel::Medium);
    }

    #[tokio::test]
    async fn test_approved_booking_prices_usd_in_xrp() {
        let flow = SettlementFlow::new(
            priced_oracle(true).await,
            fraud_engine(120, 5, FraudConfig::default()),
            pipeline(true, true, AttestationConfig::default()),
        );
        let decision = flow.prepare_booking(&request()).await.expect("decision");
        assert!(decision.is_approved());
        let BookingDecision::Approved {
            check,
            amount_xrp,
            intent,
        } = decision
        else {
            panic!("expected an approval");
        };
        assert!(check.verification.is_verified);
        // 200 USD at 0.50 USD per XRP.
        assert!((amount_xrp - 400.0).abs() < 1e-9);
        assert_eq!(intent.amount_drops, 400_000_000);
        assert_eq!(intent.destination, DESTINATION);
        assert_eq!(intent.reference_token, "BK-7");
    }

    #[tokio::test]
    async fn test_unpriced_xrp_leg_is_an_error_not_a_zero_payment() {
        let flow = SettlementFlow::new(
            priced_oracle(false).await,
            fraud_engine(120, 5, FraudConfig::default()),
            pipeline(true, true, AttestationConfig::default()),
        );
        let err = flow
            .prepare_booking(&request())
            .await
            .expect_err("unpriceable booking must not build a payment");
        assert!(matches!(err, Error::Chain(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmed_payment_yields_attested_record() {
        let flow = SettlementFlow::new(
            priced_oracle(true).await,
            fraud_engine(120, 5, FraudConfig::default()),
            pipeline(true, true, AttestationConfig::default()),
        );
        let intent = PaymentIntent::build(SOURCE, DESTINATION, 400.0, "BK-7").expect("intent");
        let record = flow.confirm_payment(HASH, &intent).await.expect("record");
        assert_eq!(record.status, AttestationStatus::Attested);
        assert_eq!(record.chain_block, Some(1_234));
        assert_eq!(record.amount_drops, 400_000_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfirmed_payment_reports_not_confirmed() {
        let config = AttestationConfig {
            pending_ttl_secs: 1,
            poll_interval_secs: 5,
            max_poll_attempts: 1_000,
            ..AttestationConfig::default()
        };
        let flow = SettlementFlow::new(
            priced_oracle(true).await,
            fraud_engine(120, 5, FraudConfig::default()),
            pipeline(false, true, config),
        );
        let intent = PaymentIntent::build(SOURCE, DESTINATION, 400.0, "BK-7").expect("intent");
        let err = flow
            .confirm_payment(HASH, &intent)
            .await
            .expect_err("must time out");
        assert!(matches!(err, Error::PaymentNotConfirmed(_)));
        assert!(err.to_string().contains("payment not yet confirmed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_attestation_is_reported_as_attestation_error() {
        let flow = SettlementFlow::new(
            priced_oracle(true).await,
            fraud_engine(120, 5, FraudConfig::default()),
            pipeline(true, false, AttestationConfig::default()),
        );
        let intent = PaymentIntent::build(SOURCE, DESTINATION, 400.0, "BK-7").expect("intent");
        let err = flow
            .confirm_payment(HASH, &intent)
            .await
            .expect_err("must fail");
        assert!(matches!(err, Error::Attestation(_)));
        assert!(err.to_string().contains("attestation failed"));
    }
}
