//! Pipeline event channel.
//!
//! Events let callers await attestation outcomes instead of polling
//! the record store. A dropped receiver is never an error for the
//! sender side.

use tokio::sync::broadcast;

/// Capacity of the event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Events published by the attestation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A ledger payment was attested on the attesting chain.
    PaymentAttested {
        /// Ledger transaction hash.
        tx_hash: String,
        /// Attesting-chain block number stamped on the record.
        block: u64,
    },
    /// An attestation could not be completed.
    AttestationFailed {
        /// Ledger transaction hash.
        tx_hash: String,
    },
}

/// Sender half of the pipeline event channel.
pub type PipelineEventsSender = broadcast::Sender<PipelineEvent>;

/// Receiver half of the pipeline event channel.
pub type PipelineEventsChannel = broadcast::Receiver<PipelineEvent>;

/// Create a pipeline event channel.
#[must_use]
pub fn create_event_channel() -> (PipelineEventsSender, PipelineEventsChannel) {
    broadcast::channel(EVENT_CHANNEL_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_roundtrip() {
        let (tx, mut rx) = create_event_channel();
        tx.send(PipelineEvent::PaymentAttested {
            tx_hash: "ABCD".to_string(),
            block: 42,
        })
        .ok();
        let event = rx.recv().await.ok();
        assert_eq!(
            event,
            Some(PipelineEvent::PaymentAttested {
                tx_hash: "ABCD".to_string(),
                block: 42,
            })
        );
    }

    #[test]
    fn test_send_without_receivers_is_not_fatal() {
        let (tx, rx) = create_event_channel();
        drop(rx);
        // send returns Err when nobody listens; callers must tolerate it.
        assert!(tx
            .send(PipelineEvent::AttestationFailed {
                tx_hash: "EF01".to_string(),
            })
            .is_err());
    }
}
