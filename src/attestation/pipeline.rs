//! Cross-chain attestation pipeline.
//!
//! Each submitted ledger transaction gets one record keyed by its
//! hash and one resolution task that polls the ledger until the
//! transaction validates. Confirmation is observed, never assumed: a
//! record leaves `Pending` only when the ledger answers or the
//! configured deadline passes.
//!
//! Resolution is keyed, not captured: a task re-reads the live record
//! by hash before acting, so a resubmission that replaced the record
//! is never clobbered by a stale clone.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::FixedBytes;
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::attestation::record::{AttestationRecord, AttestationStatus};
use crate::chain::{AttestingChain, PaymentProof, PaymentResponse};
use crate::config::AttestationConfig;
use crate::event::{create_event_channel, PipelineEvent, PipelineEventsChannel, PipelineEventsSender};
use crate::ledger::LedgerQuery;
use crate::{Error, Result};

/// Payment attestation pipeline.
///
/// Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct AttestationPipeline {
    chain: Option<Arc<dyn AttestingChain>>,
    ledger: Arc<dyn LedgerQuery>,
    config: AttestationConfig,
    records: Arc<RwLock<HashMap<String, AttestationRecord>>>,
    events_tx: PipelineEventsSender,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl AttestationPipeline {
    /// Create a pipeline without an attesting-chain connection.
    ///
    /// Submissions are rejected until a chain is attached with
    /// [`Self::with_chain`]; queries and ledger polling still work.
    #[must_use]
    pub fn new(ledger: Arc<dyn LedgerQuery>, config: AttestationConfig) -> Self {
        let (events_tx, _events_rx) = create_event_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            chain: None,
            ledger,
            config,
            records: Arc::new(RwLock::new(HashMap::new())),
            events_tx,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }

    /// Attach an attesting-chain client.
    #[must_use]
    pub fn with_chain(mut self, chain: Arc<dyn AttestingChain>) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Subscribe to pipeline events.
    #[must_use]
    pub fn subscribe_events(&self) -> PipelineEventsChannel {
        self.events_tx.subscribe()
    }

    /// Configured ceiling on how long a record may stay pending.
    #[must_use]
    pub fn pending_ttl(&self) -> Duration {
        Duration::from_secs(self.config.pending_ttl_secs)
    }

    /// Submit an attestation request for a ledger transaction.
    ///
    /// Upserts a pending record for the hash (replacing any earlier
    /// record, terminal or not) and spawns a resolution task that
    /// polls the ledger until the transaction validates or the poll
    /// budget runs out.
    ///
    /// # Errors
    ///
    /// Returns `Error::Attestation` when no attesting chain is
    /// attached and `Error::Validation` for an empty transaction
    /// hash.
    pub fn submit_attestation_request(
        &self,
        tx_hash: &str,
        source: &str,
        destination: &str,
        amount_drops: u64,
    ) -> Result<()> {
        if self.chain.is_none() {
            return Err(Error::Attestation(
                "no attesting-chain connection".to_string(),
            ));
        }
        if tx_hash.is_empty() {
            return Err(Error::Validation(
                "transaction hash must not be empty".to_string(),
            ));
        }

        let sequence = {
            let mut records = self.records.write();
            let sequence = records.get(tx_hash).map_or(1, |prev| prev.sequence + 1);
            records.insert(
                tx_hash.to_string(),
                AttestationRecord::pending(
                    tx_hash.to_string(),
                    source.to_string(),
                    destination.to_string(),
                    amount_drops,
                    now_ms(),
                    sequence,
                ),
            );
            sequence
        };
        info!(%tx_hash, sequence, amount_drops, "attestation request submitted");

        let pipeline = self.clone();
        let hash = tx_hash.to_string();
        tokio::spawn(async move {
            pipeline.resolve(&hash, sequence).await;
        });
        Ok(())
    }

    /// Poll the ledger until the transaction validates, then process
    /// the attestation. Exits early when superseded or shut down.
    async fn resolve(&self, tx_hash: &str, sequence: u64) {
        let mut shutdown_rx = self.shutdown_rx.clone();
        let poll_interval = Duration::from_secs(self.config.poll_interval_secs);
        let mut attempts = 0u32;

        loop {
            if !self.owns(tx_hash, sequence) {
                debug!(%tx_hash, sequence, "resolution superseded, exiting");
                return;
            }
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        debug!(%tx_hash, "resolution stopped by shutdown");
                        return;
                    }
                }
                outcome = self.ledger.transaction(tx_hash) => {
                    match outcome {
                        Ok(payment) if payment.validated => {
                            debug!(%tx_hash, ledger_index = ?payment.ledger_index, "transaction validated");
                            self.process_attestation(tx_hash).await;
                            return;
                        }
                        Ok(_) => debug!(%tx_hash, "transaction not yet validated"),
                        Err(e) => debug!(%tx_hash, error = %e, "ledger poll failed"),
                    }
                    attempts += 1;
                    if attempts >= self.config.max_poll_attempts {
                        warn!(%tx_hash, attempts, "confirmation polling exhausted");
                        self.mark_failed(tx_hash, Some(sequence));
                        return;
                    }
                    tokio::time::sleep(poll_interval).await;
                }
            }
        }
    }

    /// Whether `sequence` still owns the live pending record for the
    /// hash.
    fn owns(&self, tx_hash: &str, sequence: u64) -> bool {
        self.records.read().get(tx_hash).is_some_and(|record| {
            record.sequence == sequence && record.status == AttestationStatus::Pending
        })
    }

    /// Transition the live record for a confirmed transaction.
    ///
    /// No-op unless the live record is pending. Reads the attesting
    /// chain's block number and stamps it; any failure marks the
    /// record failed instead of leaving it pending.
    async fn process_attestation(&self, tx_hash: &str) {
        {
            let records = self.records.read();
            let Some(record) = records.get(tx_hash) else {
                debug!(%tx_hash, "no record for confirmed transaction");
                return;
            };
            if record.status.is_terminal() {
                debug!(%tx_hash, status = %record.status, "record already terminal, skipping");
                return;
            }
        }

        let outcome = match &self.chain {
            Some(chain) => chain.block_number().await,
            None => Err(Error::Attestation(
                "no attesting-chain connection".to_string(),
            )),
        };

        match outcome {
            Ok(block) => {
                let attested = {
                    let mut records = self.records.write();
                    match records.get_mut(tx_hash) {
                        Some(record) if !record.status.is_terminal() => {
                            record.status = AttestationStatus::Attested;
                            record.chain_block = Some(block);
                            true
                        }
                        _ => false,
                    }
                };
                if attested {
                    info!(%tx_hash, block, "payment attested");
                    if self
                        .events_tx
                        .send(PipelineEvent::PaymentAttested {
                            tx_hash: tx_hash.to_string(),
                            block,
                        })
                        .is_err()
                    {
                        debug!("no event receivers");
                    }
                }
            }
            Err(e) => {
                warn!(%tx_hash, error = %e, "attestation processing failed");
                self.mark_failed(tx_hash, None);
            }
        }
    }

    /// Mark the live record failed. With a sequence, only that
    /// submission's record is touched; terminal records never are.
    fn mark_failed(&self, tx_hash: &str, sequence: Option<u64>) {
        let failed = {
            let mut records = self.records.write();
            match records.get_mut(tx_hash) {
                Some(record)
                    if !record.status.is_terminal()
                        && sequence.is_none_or(|seq| record.sequence == seq) =>
                {
                    record.status = AttestationStatus::Failed;
                    true
                }
                _ => false,
            }
        };
        if failed {
            warn!(%tx_hash, "attestation failed");
            if self
                .events_tx
                .send(PipelineEvent::AttestationFailed {
                    tx_hash: tx_hash.to_string(),
                })
                .is_err()
            {
                debug!("no event receivers");
            }
        }
    }

    /// Verify a payment proof against the attesting contract.
    ///
    /// Returns the contract's verdict, degraded to `false` when the
    /// chain cannot be reached. Never an error.
    pub async fn verify_attestation(
        &self,
        response: PaymentResponse,
        merkle_proof: Vec<FixedBytes<32>>,
    ) -> bool {
        let Some(chain) = &self.chain else {
            warn!("no attesting-chain connection, proof unverifiable");
            return false;
        };
        let proof = PaymentProof {
            merkleProof: merkle_proof,
            data: response,
        };
        match chain.verify_payment_proof(proof).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(error = %e, "proof verification unavailable");
                false
            }
        }
    }

    /// Current attestation voting round, or 0 when it cannot be read.
    pub async fn current_voting_round(&self) -> u32 {
        let Some(chain) = &self.chain else {
            return 0;
        };
        match chain.voting_round().await {
            Ok(round) => round,
            Err(e) => {
                warn!(error = %e, "voting round unavailable");
                0
            }
        }
    }

    /// Whether the transaction's live record is attested.
    #[must_use]
    pub fn is_payment_attested(&self, tx_hash: &str) -> bool {
        self.records
            .read()
            .get(tx_hash)
            .is_some_and(|record| record.status == AttestationStatus::Attested)
    }

    /// The live record for a transaction, if any.
    #[must_use]
    pub fn get_attestation(&self, tx_hash: &str) -> Option<AttestationRecord> {
        self.records.read().get(tx_hash).cloned()
    }

    /// All records still pending.
    #[must_use]
    pub fn pending_attestations(&self) -> Vec<AttestationRecord> {
        self.collect(AttestationStatus::Pending)
    }

    /// All records attested so far.
    #[must_use]
    pub fn attested_payments(&self) -> Vec<AttestationRecord> {
        self.collect(AttestationStatus::Attested)
    }

    fn collect(&self, status: AttestationStatus) -> Vec<AttestationRecord> {
        self.records
            .read()
            .values()
            .filter(|record| record.status == status)
            .cloned()
            .collect()
    }

    /// Mark records pending longer than the configured ceiling as
    /// failed. Returns how many were swept.
    pub fn sweep_expired(&self) -> usize {
        let ttl_ms = i64::try_from(self.config.pending_ttl_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        let now = now_ms();
        let expired: Vec<String> = self
            .records
            .read()
            .values()
            .filter(|record| {
                record.status == AttestationStatus::Pending
                    && now.saturating_sub(record.submitted_ms) > ttl_ms
            })
            .map(|record| record.tx_hash.clone())
            .collect();
        for tx_hash in &expired {
            self.mark_failed(tx_hash, None);
        }
        expired.len()
    }

    /// Periodic maintenance until shutdown: refresh the voting round
    /// and sweep expired pending records each round.
    pub async fn run(&self) {
        let mut shutdown_rx = self.shutdown_rx.clone();
        let interval = Duration::from_secs(self.config.round_duration_secs);
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("attestation pipeline stopping");
                        break;
                    }
                }
                round = self.current_voting_round() => {
                    debug!(round, "voting round refreshed");
                    let swept = self.sweep_expired();
                    if swept > 0 {
                        warn!(swept, "expired pending attestations marked failed");
                    }
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }

    /// Signal every pipeline task to stop.
    pub fn shutdown(&self) {
        self.shutdown_tx.send(true).ok();
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
