// crates/db/src/lib.rs
// Data-access layer for the marketlens dashboard: connection adapter,
// request parsing, SQL building, pagination and aggregation.

pub mod aggregation;
pub mod builder;
pub mod catalog;
pub mod config;
pub mod connection;
mod migrations;
pub mod pagination;
mod queries;
pub mod request;
pub mod seed;
pub mod value;

pub use aggregation::{AggregationBucket, AggregationService, MetricBucket, UNKNOWN_BUCKET};
pub use builder::{BuiltQuery, QueryBuilder, WhereClause};
pub use catalog::TableSpec;
pub use config::{BackendKind, ConnectionConfig};
pub use connection::{Connection, ConnectionState, ExecuteResult, JsonRow};
pub use pagination::{paginate, PagedStatements, PaginatedResult, Pagination, Statement};
pub use queries::ads::{AdCampaign, AdMetrics, NewAdCampaign, PlatformMetrics};
pub use queries::insight::InsightSearch;
pub use queries::kol::{Kol2024, KolDataset, KolRecord, KolStatistics, KolTotal, KolVideo};
pub use queries::system::TableStat;
pub use queries::testing::{TestIdea, TestingStatistics};
pub use request::{QueryRequest, SortDirection, ValidationError};
pub use value::SqlValue;

use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database not ready (state: {state})")]
    NotReady { state: ConnectionState },

    #[error("Connection to {endpoint} failed: {message}")]
    Connection { endpoint: String, message: String },

    /// The statement text is kept for server-side logging only.
    #[error("Query failed: {message}")]
    Query { message: String, sql: String },

    #[error("Failed to decode row: {0}")]
    Decode(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to create database directory: {0}")]
    CreateDir(#[from] std::io::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Service handle over a shared connection adapter.
///
/// Every dashboard query lives in an `impl Database` block under `queries/`.
#[derive(Debug, Clone)]
pub struct Database {
    conn: Arc<Connection>,
}

impl Database {
    pub fn new(conn: Arc<Connection>) -> Self {
        Self { conn }
    }

    /// Create an empty in-memory database (for testing).
    pub async fn new_in_memory() -> DbResult<Self> {
        let conn = Connection::open(ConnectionConfig::memory()).await?;
        Ok(Self::new(conn))
    }

    /// Create an in-memory database populated with the demo dataset.
    pub async fn new_in_memory_seeded() -> DbResult<Self> {
        let conn = Connection::open(ConnectionConfig::memory_seeded()).await?;
        Ok(Self::new(conn))
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.conn
    }

    pub fn aggregation(&self) -> AggregationService<'_> {
        AggregationService::new(&self.conn)
    }
}
