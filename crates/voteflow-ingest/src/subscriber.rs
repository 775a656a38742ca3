//! Channel subscription over Redis pub/sub.
//!
//! [`ChannelSubscriber`] maintains a live subscription to one named
//! channel and exposes inbound messages as a lazy, unbounded,
//! non-restartable sequence. A background reader task owns the pub/sub
//! connection exclusively and forwards each payload into a bounded
//! `mpsc` channel; the sequence ends when the broker connection drops
//! or the subscription is closed.
//!
//! There is deliberately no auto-resubscribe: a dropped subscription
//! ends the sequence, and the owning process is expected to exit and
//! be restarted under external supervision.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{IngestError, IngestResult};

/// How long `Subscription::close` waits for the reader task to finish.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// A raw message as delivered by the broker, before deserialization.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Channel the message arrived on.
    pub channel: String,
    /// Undecoded message payload.
    pub payload: Vec<u8>,
}

/// Lifecycle state of a [`ChannelSubscriber`].
///
/// `Running` is re-entered implicitly for each message; no per-message
/// state is retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    /// No subscription has been started.
    Stopped,
    /// A subscription attempt is in progress.
    Subscribing,
    /// A subscription is live and delivering messages.
    Running,
    /// The last subscription attempt failed.
    Failed,
}

/// A live subscription handed to the pipeline.
///
/// Owns the inbound message sequence and the reader task. Consumed
/// exactly once; the sequence cannot be restarted.
pub struct Subscription {
    /// Name of the subscribed channel.
    pub channel: String,
    /// Inbound message sequence. `recv()` returns `None` when the
    /// broker connection drops or the subscription is closed.
    pub messages: mpsc::Receiver<RawMessage>,
    /// Shutdown signal for the reader task.
    pub shutdown: Arc<Notify>,
    /// Background reader task handle.
    pub reader: JoinHandle<()>,
}

impl Subscription {
    /// Signals the reader task to stop and waits for it to finish,
    /// releasing the broker connection.
    pub async fn close(self) {
        self.shutdown.notify_one();
        let _ = tokio::time::timeout(CLOSE_TIMEOUT, self.reader).await;
        debug!(channel = %self.channel, "subscription closed");
    }
}

/// Subscribes to one named pub/sub channel on the broker.
pub struct ChannelSubscriber {
    /// Redis client (URL parsed, no connection until `subscribe`).
    client: redis::Client,
    /// Capacity of the reader-to-pipeline message channel.
    buffer: usize,
    /// Subscription lifecycle state.
    state: SubscriberState,
}

impl ChannelSubscriber {
    /// Creates a subscriber for the broker at `redis_url`.
    ///
    /// No network I/O happens here; the connection is opened by
    /// [`subscribe`](Self::subscribe).
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Connection`] if the URL does not parse.
    pub fn new(redis_url: &str, buffer: usize) -> IngestResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| IngestError::Connection(format!("invalid redis url: {e}")))?;
        Ok(Self {
            client,
            buffer,
            state: SubscriberState::Stopped,
        })
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SubscriberState {
        self.state
    }

    /// Opens the pub/sub connection, subscribes to `channel`, and
    /// spawns the background reader task.
    ///
    /// The returned [`Subscription`] carries the message sequence;
    /// only one subscription may be active per subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Connection`] if the broker is
    /// unreachable, the subscribe command fails, or a subscription is
    /// already active.
    pub async fn subscribe(&mut self, channel: &str) -> IngestResult<Subscription> {
        if self.state == SubscriberState::Running {
            return Err(IngestError::Connection(
                "a subscription is already active".into(),
            ));
        }
        self.state = SubscriberState::Subscribing;

        let mut pubsub = self.client.get_async_pubsub().await.map_err(|e| {
            self.state = SubscriberState::Failed;
            IngestError::Connection(format!("broker unreachable: {e}"))
        })?;
        pubsub.subscribe(channel).await.map_err(|e| {
            self.state = SubscriberState::Failed;
            IngestError::Connection(format!("subscribe to '{channel}' failed: {e}"))
        })?;

        info!(channel, "subscribed to vote channel");

        let (tx, rx) = mpsc::channel(self.buffer);
        let shutdown = Arc::new(Notify::new());
        let shutdown_rx = Arc::clone(&shutdown);
        let name = channel.to_string();

        // The reader task owns the pub/sub connection exclusively.
        // Dropping `tx` on exit closes the message sequence.
        let reader = tokio::spawn(async move {
            let mut stream = pubsub.into_on_message();
            loop {
                tokio::select! {
                    biased;

                    () = shutdown_rx.notified() => {
                        debug!(channel = %name, "subscription reader shutdown");
                        break;
                    }

                    msg = stream.next() => match msg {
                        Some(msg) => {
                            let raw = RawMessage {
                                channel: msg.get_channel_name().to_string(),
                                payload: msg.get_payload_bytes().to_vec(),
                            };
                            if tx.send(raw).await.is_err() {
                                debug!(channel = %name, "pipeline dropped, stopping reader");
                                break;
                            }
                        }
                        None => {
                            warn!(channel = %name, "broker connection dropped, subscription ended");
                            break;
                        }
                    }
                }
            }
        });

        self.state = SubscriberState::Running;
        Ok(Subscription {
            channel: channel.to_string(),
            messages: rx,
            shutdown,
            reader,
        })
    }
}

impl std::fmt::Debug for ChannelSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSubscriber")
            .field("state", &self.state)
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let sub = ChannelSubscriber::new("redis://127.0.0.1/", 16).unwrap();
        assert_eq!(sub.state(), SubscriberState::Stopped);
    }

    #[test]
    fn test_new_invalid_url() {
        let err = ChannelSubscriber::new("not-a-url", 16).unwrap_err();
        assert!(matches!(err, IngestError::Connection(_)));
    }

    #[test]
    fn test_debug_output() {
        let sub = ChannelSubscriber::new("redis://127.0.0.1/", 16).unwrap();
        let debug = format!("{sub:?}");
        assert!(debug.contains("ChannelSubscriber"));
        assert!(debug.contains("Stopped"));
    }

    #[tokio::test]
    async fn test_subscription_close_joins_reader() {
        // A hand-built subscription over a plain channel pair; close()
        // must signal the reader and join it.
        let (tx, rx) = mpsc::channel(4);
        let shutdown = Arc::new(Notify::new());
        let shutdown_rx = Arc::clone(&shutdown);
        let reader = tokio::spawn(async move {
            let _tx = tx;
            shutdown_rx.notified().await;
        });

        let sub = Subscription {
            channel: "votes".into(),
            messages: rx,
            shutdown,
            reader,
        };
        sub.close().await;
    }

    #[tokio::test]
    async fn test_sequence_ends_when_reader_exits() {
        let (tx, mut rx) = mpsc::channel::<RawMessage>(4);
        drop(tx);
        assert!(rx.recv().await.is_none());
    }
}
