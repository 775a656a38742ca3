//! Vote wire event and persisted record types.
//!
//! [`Vote`] is the transient wire shape received on the channel;
//! [`VoteRecord`] is the row written to the `votes` table. The mapping
//! between them is pure and total: once a payload deserializes, record
//! construction cannot fail.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::IngestResult;

/// A vote-cast event as published on the channel.
///
/// Wire format is a JSON object with camelCase keys:
/// `{"id": "<voter>", "optionId": "<option>"}`. Both fields are
/// required; unknown extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    /// Voter/ballot identifier.
    pub id: String,
    /// Chosen option identifier.
    pub option_id: String,
}

impl Vote {
    /// Parses a raw channel payload into a vote event.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Deserialization`](crate::IngestError::Deserialization)
    /// if the payload is not valid JSON or a required field is absent.
    pub fn from_json(payload: &[u8]) -> IngestResult<Self> {
        Ok(serde_json::from_slice(payload)?)
    }
}

/// A processed vote as persisted in the `votes` table.
///
/// Created exactly once per successfully deserialized message, never
/// mutated afterwards. The surrogate key is assigned by the storage
/// engine; `id` is `None` until the insert succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRecord {
    /// Storage-assigned surrogate key (`None` before the insert).
    pub id: Option<i64>,
    /// Chosen option identifier (`option_id` column).
    pub option_id: String,
    /// Voter identifier, copied from [`Vote::id`] (`user_id` column).
    pub user_id: String,
    /// Processing timestamp, assigned when the record is constructed —
    /// not a cast-time field from the event (`created_at` column).
    pub created_at: DateTime<Utc>,
}

impl VoteRecord {
    /// Maps a deserialized vote event to its persisted shape, stamping
    /// the current wall-clock time.
    #[must_use]
    pub fn from_vote(vote: Vote) -> Self {
        Self {
            id: None,
            option_id: vote.option_id,
            user_id: vote.id,
            created_at: Utc::now(),
        }
    }

    /// Returns a copy of this record with the storage-assigned key set.
    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_well_formed() {
        let vote = Vote::from_json(br#"{"id":"u1","optionId":"A"}"#).unwrap();
        assert_eq!(vote.id, "u1");
        assert_eq!(vote.option_id, "A");
    }

    #[test]
    fn test_from_json_ignores_unknown_fields() {
        let vote =
            Vote::from_json(br#"{"id":"u1","optionId":"A","castAt":"2026-01-01"}"#).unwrap();
        assert_eq!(vote.option_id, "A");
    }

    #[test]
    fn test_from_json_missing_option_id() {
        let err = Vote::from_json(br#"{"id":"u1"}"#).unwrap_err();
        assert!(err.to_string().contains("optionId"));
    }

    #[test]
    fn test_from_json_missing_id() {
        assert!(Vote::from_json(br#"{"optionId":"A"}"#).is_err());
    }

    #[test]
    fn test_from_json_invalid_json() {
        assert!(Vote::from_json(b"not json").is_err());
    }

    #[test]
    fn test_from_json_snake_case_rejected() {
        // The wire contract is camelCase; `option_id` is not the wire key.
        assert!(Vote::from_json(br#"{"id":"u1","option_id":"A"}"#).is_err());
    }

    #[test]
    fn test_mapping_copies_fields() {
        let vote = Vote {
            id: "u1".into(),
            option_id: "A".into(),
        };
        let record = VoteRecord::from_vote(vote);
        assert_eq!(record.id, None);
        assert_eq!(record.option_id, "A");
        assert_eq!(record.user_id, "u1");
    }

    #[test]
    fn test_mapping_stamps_processing_time() {
        let before = Utc::now();
        let record = VoteRecord::from_vote(Vote {
            id: "u1".into(),
            option_id: "A".into(),
        });
        let after = Utc::now();
        assert!(record.created_at >= before);
        assert!(record.created_at <= after);
    }

    #[test]
    fn test_with_id() {
        let record = VoteRecord::from_vote(Vote {
            id: "u1".into(),
            option_id: "A".into(),
        })
        .with_id(42);
        assert_eq!(record.id, Some(42));
    }
}
