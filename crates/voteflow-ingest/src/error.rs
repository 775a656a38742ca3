//! Error types for the ingestion bridge.
//!
//! Provides [`IngestError`] covering the four failure domains of the
//! pipeline, plus a convenience [`IngestResult`] alias.
//!
//! Recovery policy per variant:
//!
//! - [`Connection`](IngestError::Connection) — fatal at startup
//! - [`SubscriptionDropped`](IngestError::SubscriptionDropped) — the
//!   inbound sequence ends; the process is expected to exit and be
//!   restarted by external supervision (no in-process reconnect)
//! - [`Deserialization`](IngestError::Deserialization) — recovered
//!   locally: the message is dropped and processing continues
//! - [`Storage`](IngestError::Storage) — not retried; the vote is lost
//!   for that attempt and processing continues

use thiserror::Error;

/// Result alias for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that can occur while ingesting votes.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The broker or database could not be reached at connect time.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A live subscription ended because the broker connection dropped.
    #[error("subscription to channel '{channel}' dropped")]
    SubscriptionDropped {
        /// Name of the channel whose subscription ended.
        channel: String,
    },

    /// An inbound payload was not a well-formed vote event.
    #[error("malformed vote payload: {0}")]
    Deserialization(String),

    /// A durable write to the vote store failed.
    #[error("storage write failed: {0}")]
    Storage(String),

    /// A required configuration value is missing or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        Self::Deserialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_display() {
        let err = IngestError::Connection("refused".into());
        assert_eq!(err.to_string(), "connection failed: refused");
    }

    #[test]
    fn test_subscription_dropped_display() {
        let err = IngestError::SubscriptionDropped {
            channel: "votes".into(),
        };
        assert_eq!(err.to_string(), "subscription to channel 'votes' dropped");
    }

    #[test]
    fn test_deserialization_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: IngestError = serde_err.into();
        assert!(matches!(err, IngestError::Deserialization(_)));
        assert!(err.to_string().starts_with("malformed vote payload:"));
    }

    #[test]
    fn test_storage_display() {
        let err = IngestError::Storage("timeout".into());
        assert_eq!(err.to_string(), "storage write failed: timeout");
    }
}
