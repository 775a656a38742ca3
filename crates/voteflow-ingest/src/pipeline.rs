//! The vote ingestion pipeline.
//!
//! Consumes the raw message sequence produced by a subscription and,
//! for each message, runs deserialize → map → persist → observe,
//! strictly one message at a time. The persist of message N is ordered
//! before message N+1 is considered, so records land in arrival order
//! within one process instance.
//!
//! Failure policy per message:
//!
//! - deserialization failure: the message is dropped and logged; the
//!   sequence continues (a malformed message never halts ingestion)
//! - storage failure: logged, the vote is lost for that attempt, the
//!   sequence continues (no retry, no dead-letter)
//!
//! On shutdown the in-flight message's persist completes (or fails)
//! cleanly before the loop exits: the shutdown signal is only checked
//! between messages.

use std::sync::Arc;

use tokio::sync::{mpsc, Notify};
use tracing::{debug, error, info, warn};

use crate::metrics::IngestMetrics;
use crate::store::VoteStore;
use crate::subscriber::RawMessage;
use crate::vote::{Vote, VoteRecord};

/// Why a pipeline run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The inbound sequence ended because the broker connection
    /// dropped. The process should exit and be restarted externally.
    SubscriptionDropped,
    /// Graceful shutdown was requested.
    ShutdownRequested,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SubscriptionDropped => write!(f, "subscription dropped"),
            Self::ShutdownRequested => write!(f, "shutdown requested"),
        }
    }
}

/// Converts each raw channel message into a durable vote record.
pub struct VoteIngestionPipeline {
    /// Storage collaborator for the write path.
    store: Arc<dyn VoteStore>,
    /// Shared counters.
    metrics: Arc<IngestMetrics>,
    /// Graceful shutdown signal; checked between messages only.
    shutdown: Arc<Notify>,
}

impl VoteIngestionPipeline {
    /// Creates a pipeline writing to `store`.
    #[must_use]
    pub fn new(store: Arc<dyn VoteStore>) -> Self {
        Self {
            store,
            metrics: Arc::new(IngestMetrics::new()),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Returns the shared metrics handle.
    #[must_use]
    pub fn metrics(&self) -> Arc<IngestMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Returns the shutdown handle; `notify_one()` on it stops the run
    /// loop after the in-flight message finishes.
    #[must_use]
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Runs the pipeline until the sequence ends or shutdown is
    /// requested.
    ///
    /// Messages are processed sequentially; there is no per-message
    /// state retained across iterations and no concurrency between the
    /// steps of a single message.
    pub async fn run(&self, messages: &mut mpsc::Receiver<RawMessage>) -> StopReason {
        debug!("vote ingestion pipeline started");
        let reason = loop {
            tokio::select! {
                biased;

                () = self.shutdown.notified() => {
                    break StopReason::ShutdownRequested;
                }

                msg = messages.recv() => match msg {
                    Some(raw) => self.process(&raw).await,
                    None => break StopReason::SubscriptionDropped,
                }
            }
        };

        let snap = self.metrics.snapshot();
        info!(
            reason = %reason,
            received = snap.received,
            persisted = snap.persisted,
            decode_errors = snap.decode_errors,
            storage_errors = snap.storage_errors,
            "vote ingestion pipeline stopped"
        );
        reason
    }

    /// Processes one raw message: deserialize, map, persist, observe.
    async fn process(&self, raw: &RawMessage) {
        self.metrics.record_received();

        let vote = match Vote::from_json(&raw.payload) {
            Ok(vote) => vote,
            Err(e) => {
                warn!(channel = %raw.channel, error = %e, "dropping malformed vote message");
                self.metrics.record_decode_error();
                return;
            }
        };

        let record = VoteRecord::from_vote(vote);
        match self.store.insert(&record).await {
            Ok(persisted) => {
                info!(
                    id = ?persisted.id,
                    option_id = %persisted.option_id,
                    user_id = %persisted.user_id,
                    "vote persisted"
                );
                self.metrics.record_persisted();
            }
            Err(e) => {
                error!(channel = %raw.channel, error = %e, "vote write failed, message lost");
                self.metrics.record_storage_error();
            }
        }
    }
}

impl std::fmt::Debug for VoteIngestionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoteIngestionPipeline")
            .field("metrics", &self.metrics.snapshot())
            .finish_non_exhaustive()
    }
}
