// crates/db/src/connection/mod.rs
//! Uniform `query / query_one / execute` contract over the local SQLite pool
//! and the hosted libSQL replica.
//!
//! The adapter is constructed explicitly (no global instance), connected
//! once, and shared behind an `Arc`. Its backend is fixed by the
//! [`ConnectionConfig`] passed at construction.

mod local;
mod remote;

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{BackendKind, ConnectionConfig};
use crate::value::SqlValue;
use crate::{migrations, seed, DbError, DbResult};

use local::LocalBackend;
use remote::RemoteBackend;

/// One result row, keyed by column name.
pub type JsonRow = serde_json::Map<String, serde_json::Value>;

/// Outcome of an INSERT/UPDATE/DELETE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResult {
    pub changes: u64,
    /// Rowid of the last inserted row, when the backend reports one.
    pub inserted_id: Option<i64>,
}

/// Lifecycle of the adapter.
///
/// `Uninitialized -> Initializing -> Ready` on success, `-> Failed` on a
/// construction error. `Failed` is terminal; `close()` moves `Ready -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
enum Backend {
    Local(LocalBackend),
    Remote(RemoteBackend),
}

impl Backend {
    async fn query(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<JsonRow>> {
        match self {
            Self::Local(b) => b.query(sql, params).await,
            Self::Remote(b) => b.query(sql, params).await,
        }
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<ExecuteResult> {
        match self {
            Self::Local(b) => b.execute(sql, params).await,
            Self::Remote(b) => b.execute(sql, params).await,
        }
    }

    async fn close(&self) {
        match self {
            Self::Local(b) => b.close().await,
            Self::Remote(_) => {}
        }
    }
}

#[derive(Debug)]
enum Slot {
    Uninitialized,
    Initializing,
    Ready(Backend),
    Failed(String),
    Closed,
}

impl Slot {
    fn state(&self) -> ConnectionState {
        match self {
            Self::Uninitialized => ConnectionState::Uninitialized,
            Self::Initializing => ConnectionState::Initializing,
            Self::Ready(_) => ConnectionState::Ready,
            Self::Failed(_) => ConnectionState::Failed,
            Self::Closed => ConnectionState::Closed,
        }
    }
}

#[derive(Debug)]
pub struct Connection {
    config: ConnectionConfig,
    slot: RwLock<Slot>,
}

impl Connection {
    /// Build an adapter in the `Uninitialized` state. Nothing is opened until
    /// [`Connection::connect`] runs.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            slot: RwLock::new(Slot::Uninitialized),
        }
    }

    /// Construct and connect in one step.
    pub async fn open(config: ConnectionConfig) -> DbResult<Arc<Self>> {
        let conn = Arc::new(Self::new(config));
        conn.connect().await?;
        Ok(conn)
    }

    pub fn state(&self) -> ConnectionState {
        self.read_slot().state()
    }

    /// Reason for the terminal `Failed` state, if any.
    pub fn failure(&self) -> Option<String> {
        match &*self.read_slot() {
            Slot::Failed(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    pub fn backend_kind(&self) -> &BackendKind {
        &self.config.backend
    }

    /// Endpoint identity safe for logs and health output.
    pub fn endpoint(&self) -> String {
        self.config.endpoint()
    }

    /// Open the backend, apply the schema, and load demo rows when asked.
    ///
    /// Only valid from `Uninitialized`; any other state returns `NotReady`.
    pub async fn connect(&self) -> DbResult<()> {
        {
            let mut slot = self.write_slot();
            if !matches!(*slot, Slot::Uninitialized) {
                return Err(DbError::NotReady {
                    state: slot.state(),
                });
            }
            *slot = Slot::Initializing;
        }

        let endpoint = self.endpoint();
        let backend_name = self.config.backend.name();
        info!(backend = backend_name, endpoint = %endpoint, "Connecting to database");

        let start = Instant::now();
        match self.initialize().await {
            Ok(backend) => {
                *self.write_slot() = Slot::Ready(backend);
                info!(
                    backend = backend_name,
                    endpoint = %endpoint,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Database ready"
                );
                Ok(())
            }
            Err(e) => {
                error!(backend = backend_name, endpoint = %endpoint, error = %e, "Database initialization failed");
                *self.write_slot() = Slot::Failed(e.to_string());
                Err(e)
            }
        }
    }

    async fn initialize(&self) -> DbResult<Backend> {
        let backend = match &self.config.backend {
            BackendKind::Local { path } => Backend::Local(LocalBackend::open_file(path).await?),
            BackendKind::Memory { .. } => Backend::Local(LocalBackend::open_memory().await?),
            BackendKind::Remote { url, auth_token } => {
                let remote =
                    RemoteBackend::new(url, auth_token.clone(), self.config.remote_timeout)?;
                remote.probe().await?;
                Backend::Remote(remote)
            }
        };

        if self.config.should_apply_schema() {
            for statement in migrations::SCHEMA {
                backend.execute(statement, &[]).await?;
            }
        }

        if let BackendKind::Memory { seed_demo: true } = self.config.backend {
            let statements = seed::demo_statements();
            for statement in &statements {
                backend.execute(&statement.sql, &statement.params).await?;
            }
            info!(rows = statements.len(), "Loaded demo dataset");
        }

        Ok(backend)
    }

    /// Release the backend. Queries issued afterwards fail with `NotReady`.
    pub async fn close(&self) {
        let backend = {
            let mut slot = self.write_slot();
            if matches!(*slot, Slot::Ready(_)) {
                match std::mem::replace(&mut *slot, Slot::Closed) {
                    Slot::Ready(backend) => Some(backend),
                    _ => None,
                }
            } else {
                None
            }
        };
        if let Some(backend) = backend {
            backend.close().await;
            info!(endpoint = %self.endpoint(), "Database connection closed");
        }
    }

    /// Run a read statement and decode every row into `T`.
    pub async fn query<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> DbResult<Vec<T>> {
        self.query_rows(sql, params)
            .await?
            .into_iter()
            .map(decode_row)
            .collect()
    }

    /// Run a read statement and decode the first row, if any.
    pub async fn query_one<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> DbResult<Option<T>> {
        self.query_rows(sql, params)
            .await?
            .into_iter()
            .next()
            .map(decode_row)
            .transpose()
    }

    /// Run a read statement and return untyped rows.
    pub async fn query_rows(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<JsonRow>> {
        let backend = self.ready_backend()?;
        let start = Instant::now();
        let result = backend.query(sql, params).await;
        self.observe("query", sql, params, start, result.as_ref().err());
        result
    }

    pub async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<ExecuteResult> {
        let backend = self.ready_backend()?;
        let start = Instant::now();
        let result = backend.execute(sql, params).await;
        self.observe("execute", sql, params, start, result.as_ref().err());
        result
    }

    pub async fn table_exists(&self, name: &str) -> DbResult<bool> {
        #[derive(serde::Deserialize)]
        struct Count {
            total: i64,
        }
        let row: Option<Count> = self
            .query_one(
                "SELECT COUNT(*) AS total FROM sqlite_master WHERE type = 'table' AND name = ?",
                &[SqlValue::from(name)],
            )
            .await?;
        Ok(row.map(|r| r.total > 0).unwrap_or(false))
    }

    fn ready_backend(&self) -> DbResult<Backend> {
        match &*self.read_slot() {
            Slot::Ready(backend) => Ok(backend.clone()),
            other => Err(DbError::NotReady {
                state: other.state(),
            }),
        }
    }

    fn observe(
        &self,
        op: &'static str,
        sql: &str,
        params: &[SqlValue],
        start: Instant,
        err: Option<&DbError>,
    ) {
        let elapsed = start.elapsed();
        let backend = self.config.backend.name();
        metrics::histogram!("db_query_duration_seconds", "backend" => backend, "op" => op)
            .record(elapsed.as_secs_f64());
        if err.is_some() {
            metrics::counter!("db_query_errors_total", "backend" => backend).increment(1);
        }

        match err {
            None => debug!(
                backend,
                op,
                elapsed_ms = elapsed.as_millis() as u64,
                sql = %sql,
                "Statement complete"
            ),
            Some(DbError::Connection { endpoint, message }) => warn!(
                backend,
                op,
                endpoint = %endpoint,
                error = %message,
                "Backend unreachable"
            ),
            Some(e) => error!(
                backend,
                op,
                sql = %sql,
                params = ?params,
                error = %e,
                "Statement failed"
            ),
        }
    }

    fn read_slot(&self) -> RwLockReadGuard<'_, Slot> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_slot(&self) -> RwLockWriteGuard<'_, Slot> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn decode_row<T: DeserializeOwned>(row: JsonRow) -> DbResult<T> {
    serde_json::from_value(serde_json::Value::Object(row)).map_err(|e| DbError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pair {
        id: i64,
        label: Option<String>,
        score: f64,
    }

    async fn ready_memory() -> Arc<Connection> {
        Connection::open(ConnectionConfig::memory())
            .await
            .expect("memory connection")
    }

    #[tokio::test]
    async fn test_query_before_connect_is_not_ready() {
        let conn = Connection::new(ConnectionConfig::memory());
        assert_eq!(conn.state(), ConnectionState::Uninitialized);

        let err = conn.query_rows("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::NotReady {
                state: ConnectionState::Uninitialized
            }
        ));
    }

    #[tokio::test]
    async fn test_connect_transitions_to_ready() {
        let conn = Connection::new(ConnectionConfig::memory());
        conn.connect().await.unwrap();
        assert_eq!(conn.state(), ConnectionState::Ready);
        assert!(conn.failure().is_none());
    }

    #[tokio::test]
    async fn test_connect_twice_is_rejected() {
        let conn = ready_memory().await;
        let err = conn.connect().await.unwrap_err();
        assert!(matches!(
            err,
            DbError::NotReady {
                state: ConnectionState::Ready
            }
        ));
        assert_eq!(conn.state(), ConnectionState::Ready);
    }

    #[tokio::test]
    async fn test_failed_connect_is_terminal() {
        // A directory cannot be opened as a database file.
        let tmp = tempfile::tempdir().unwrap();
        let conn = Connection::new(ConnectionConfig::local(tmp.path()));

        assert!(conn.connect().await.is_err());
        assert_eq!(conn.state(), ConnectionState::Failed);
        assert!(conn.failure().is_some());

        let err = conn.query_rows("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::NotReady {
                state: ConnectionState::Failed
            }
        ));
        assert!(conn.connect().await.is_err());
    }

    #[tokio::test]
    async fn test_query_decodes_typed_rows() {
        let conn = ready_memory().await;
        conn.execute(
            "CREATE TABLE pairs (id INTEGER PRIMARY KEY, label TEXT, score REAL)",
            &[],
        )
        .await
        .unwrap();
        let inserted = conn
            .execute(
                "INSERT INTO pairs (id, label, score) VALUES (?, ?, ?)",
                &[SqlValue::Integer(1), SqlValue::from("a"), SqlValue::Real(2.5)],
            )
            .await
            .unwrap();
        assert_eq!(inserted.changes, 1);
        assert_eq!(inserted.inserted_id, Some(1));
        conn.execute(
            "INSERT INTO pairs (id, label, score) VALUES (?, ?, ?)",
            &[SqlValue::Integer(2), SqlValue::Null, SqlValue::Integer(3)],
        )
        .await
        .unwrap();

        let rows: Vec<Pair> = conn
            .query("SELECT id, label, score FROM pairs ORDER BY id", &[])
            .await
            .unwrap();
        assert_eq!(
            rows,
            vec![
                Pair {
                    id: 1,
                    label: Some("a".into()),
                    score: 2.5
                },
                Pair {
                    id: 2,
                    label: None,
                    score: 3.0
                },
            ]
        );

        let one: Option<Pair> = conn
            .query_one("SELECT id, label, score FROM pairs WHERE id = ?", &[SqlValue::Integer(9)])
            .await
            .unwrap();
        assert!(one.is_none());
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_decode_error() {
        let conn = ready_memory().await;
        let err = conn
            .query::<Pair>("SELECT 'x' AS id, NULL AS label, 1.0 AS score", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Decode(_)));
    }

    #[tokio::test]
    async fn test_bad_sql_is_query_error() {
        let conn = ready_memory().await;
        let err = conn
            .query_rows("SELECT nope FROM missing_table", &[])
            .await
            .unwrap_err();
        match err {
            DbError::Query { sql, .. } => assert!(sql.contains("missing_table")),
            other => panic!("expected query error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_close_moves_to_closed() {
        let conn = ready_memory().await;
        conn.close().await;
        assert_eq!(conn.state(), ConnectionState::Closed);
        let err = conn.execute("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::NotReady {
                state: ConnectionState::Closed
            }
        ));
    }

    #[tokio::test]
    async fn test_table_exists() {
        let conn = ready_memory().await;
        assert!(conn.table_exists("kol_tribit_total").await.unwrap());
        assert!(!conn.table_exists("no_such_table").await.unwrap());
    }
}
