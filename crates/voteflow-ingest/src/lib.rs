//! # Voteflow Ingest
//!
//! Ingestion bridge from a vote pub/sub channel to a relational store.
//!
//! One process instance subscribes to a named Redis channel, and for
//! each inbound message runs deserialize → map → persist → observe,
//! strictly in arrival order:
//!
//! ```text
//! Redis channel ──► ChannelSubscriber ──► VoteIngestionPipeline ──► votes table
//!                    (reader task +        (decode, map,
//!                     bounded mpsc)         single-row insert)
//! ```
//!
//! Delivery is at-least-once with no deduplication: publishing the
//! same vote twice yields two rows. A dropped broker connection ends
//! the message sequence without reconnecting; process supervision is
//! expected to restart the consumer.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

/// Configuration surface (environment-driven)
pub mod config;
/// Error taxonomy for the ingestion pipeline
pub mod error;
/// Lock-free ingestion counters
pub mod metrics;
/// The deserialize-map-persist pipeline
pub mod pipeline;
/// Durable vote storage (trait seam + Postgres implementation)
pub mod store;
/// Pub/sub channel subscription
pub mod subscriber;
/// Test doubles for the store seam
pub mod testing;
/// Vote wire event and persisted record types
pub mod vote;

pub use config::IngestConfig;
pub use error::{IngestError, IngestResult};
pub use metrics::{IngestMetrics, IngestMetricsSnapshot};
pub use pipeline::{StopReason, VoteIngestionPipeline};
pub use store::{PostgresVoteStore, VoteStore};
pub use subscriber::{ChannelSubscriber, RawMessage, SubscriberState, Subscription};
pub use vote::{Vote, VoteRecord};
