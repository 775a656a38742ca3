//! Vote storage collaborator.
//!
//! [`VoteStore`] is the seam between the pipeline and the relational
//! store; [`PostgresVoteStore`] is the production implementation with
//! connection pooling via `deadpool-postgres`. A single-row insert per
//! record, surrogate key assigned by the database. No retry and no
//! statement timeout are imposed here: the store's own timeout, if
//! any, governs an individual write.

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;
use tracing::info;

use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult};
use crate::vote::VoteRecord;

/// Insert statement for the `votes` table. The surrogate key comes
/// back so the persisted record can be reported fully populated.
const INSERT_VOTE: &str =
    "INSERT INTO votes (option_id, user_id, created_at) VALUES ($1, $2, $3) RETURNING id";

/// Durable storage for processed votes.
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Persists one record and returns it with the storage-assigned
    /// surrogate key filled in.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Storage`] on connectivity loss,
    /// constraint violation, or timeout.
    async fn insert(&self, record: &VoteRecord) -> IngestResult<VoteRecord>;
}

/// `PostgreSQL`-backed vote store.
pub struct PostgresVoteStore {
    /// Connection pool; sized from [`IngestConfig::max_pool_size`].
    pool: Pool,
}

impl PostgresVoteStore {
    /// Builds the store and its connection pool from configuration.
    ///
    /// Connections are established lazily on first use, so this does
    /// not verify the database is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if the connection string does
    /// not parse, or [`IngestError::Connection`] if the pool cannot be
    /// built.
    pub fn connect(config: &IngestConfig) -> IngestResult<Self> {
        let pg_config: tokio_postgres::Config = config
            .postgres_conn
            .parse()
            .map_err(|e| IngestError::Config(format!("invalid postgres connection string: {e}")))?;

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(config.max_pool_size)
            .build()
            .map_err(|e| IngestError::Connection(format!("failed to build pool: {e}")))?;

        info!(
            max_pool_size = config.max_pool_size,
            "postgres vote store ready"
        );
        Ok(Self { pool })
    }
}

#[async_trait]
impl VoteStore for PostgresVoteStore {
    async fn insert(&self, record: &VoteRecord) -> IngestResult<VoteRecord> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| IngestError::Storage(format!("pool get failed: {e}")))?;

        let row = client
            .query_one(
                INSERT_VOTE,
                &[&record.option_id, &record.user_id, &record.created_at],
            )
            .await
            .map_err(|e| IngestError::Storage(format!("insert failed: {e}")))?;

        let id: i64 = row.get(0);
        Ok(record.clone().with_id(id))
    }
}

impl std::fmt::Debug for PostgresVoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresVoteStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_conn(conn: &str) -> IngestConfig {
        IngestConfig {
            postgres_conn: conn.into(),
            ..IngestConfig::default()
        }
    }

    #[test]
    fn test_connect_key_value_format() {
        let store = PostgresVoteStore::connect(&config_with_conn(
            "host=localhost dbname=votes user=voteflow",
        ));
        assert!(store.is_ok());
    }

    #[test]
    fn test_connect_uri_format() {
        let store = PostgresVoteStore::connect(&config_with_conn(
            "postgresql://voteflow@localhost/votes",
        ));
        assert!(store.is_ok());
    }

    #[test]
    fn test_connect_invalid_conn_string() {
        let err = PostgresVoteStore::connect(&config_with_conn("::garbage::")).unwrap_err();
        assert!(matches!(err, IngestError::Config(_)));
    }
}
