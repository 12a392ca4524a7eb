// crates/db/src/connection/local.rs
//! Embedded SQLite backend (file or private in-memory database) over a sqlx pool.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde_json::{Number, Value};
use sqlx::decode::Decode;
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePool,
    SqlitePoolOptions, SqliteRow, SqliteSynchronous, SqliteValueRef,
};
use sqlx::{Column, ConnectOptions, Row, TypeInfo, ValueRef};

use super::{ExecuteResult, JsonRow};
use crate::value::SqlValue;
use crate::{DbError, DbResult};

#[derive(Debug, Clone)]
pub(super) struct LocalBackend {
    pool: SqlitePool,
    endpoint: String,
}

impl LocalBackend {
    /// Open (or create) a database file, creating its parent directory.
    pub(super) async fn open_file(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let endpoint = format!("sqlite:{}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(2));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| connect_error(&endpoint, e))?;

        Ok(Self { pool, endpoint })
    }

    /// Open a private in-memory database.
    ///
    /// `shared_cache(true)` lets every pooled connection see the same
    /// database; one connection is kept alive so the data is not dropped
    /// when the pool goes idle.
    pub(super) async fn open_memory() -> DbResult<Self> {
        let endpoint = "sqlite::memory:".to_string();
        let options = SqliteConnectOptions::from_str(&endpoint)
            .map_err(|e| connect_error(&endpoint, e))?
            .shared_cache(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| connect_error(&endpoint, e))?;

        Ok(Self { pool, endpoint })
    }

    pub(super) async fn query(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<JsonRow>> {
        let rows = bind_all(sql, params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| self.classify(e, sql))?;
        rows.iter().map(row_to_json).collect()
    }

    pub(super) async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<ExecuteResult> {
        let done = bind_all(sql, params)
            .execute(&self.pool)
            .await
            .map_err(|e| self.classify(e, sql))?;
        let changes = done.rows_affected();
        let rowid = done.last_insert_rowid();
        Ok(ExecuteResult {
            changes,
            inserted_id: (changes > 0 && rowid != 0).then_some(rowid),
        })
    }

    pub(super) async fn close(&self) {
        self.pool.close().await;
    }

    fn classify(&self, err: sqlx::Error, sql: &str) -> DbError {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => DbError::Connection {
                endpoint: self.endpoint.clone(),
                message: err.to_string(),
            },
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DbError::Decode(err.to_string())
            }
            sqlx::Error::Database(db_err) => DbError::Query {
                message: db_err.message().to_string(),
                sql: sql.to_string(),
            },
            other => DbError::Query {
                message: other.to_string(),
                sql: sql.to_string(),
            },
        }
    }
}

fn connect_error(endpoint: &str, err: sqlx::Error) -> DbError {
    DbError::Connection {
        endpoint: endpoint.to_string(),
        message: err.to_string(),
    }
}

fn bind_all<'q>(sql: &'q str, params: &'q [SqlValue]) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    params.iter().fold(sqlx::query(sql), |q, param| match param {
        SqlValue::Null => q.bind(None::<i64>),
        SqlValue::Integer(i) => q.bind(*i),
        SqlValue::Real(f) => q.bind(*f),
        SqlValue::Text(s) => q.bind(s.as_str()),
    })
}

fn row_to_json(row: &SqliteRow) -> DbResult<JsonRow> {
    let mut out = JsonRow::new();
    for column in row.columns() {
        let raw = row
            .try_get_raw(column.ordinal())
            .map_err(|e| DbError::Decode(e.to_string()))?;
        out.insert(column.name().to_string(), value_to_json(raw)?);
    }
    Ok(out)
}

/// Map by the stored value's runtime type, not the declared column type.
fn value_to_json(raw: SqliteValueRef<'_>) -> DbResult<Value> {
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();
    let decoded = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => {
            <i64 as Decode<Sqlite>>::decode(raw).map(|i| Value::Number(i.into()))
        }
        "REAL" => <f64 as Decode<Sqlite>>::decode(raw)
            .map(|f| Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)),
        "BLOB" => <Vec<u8> as Decode<Sqlite>>::decode(raw)
            .map(|b| Value::String(String::from_utf8_lossy(&b).into_owned())),
        _ => <String as Decode<Sqlite>>::decode(raw).map(Value::String),
    };
    decoded.map_err(|e| DbError::Decode(format!("{type_name} value: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_databases_are_isolated() {
        let a = LocalBackend::open_memory().await.unwrap();
        let b = LocalBackend::open_memory().await.unwrap();
        a.execute("CREATE TABLE only_in_a (x INTEGER)", &[]).await.unwrap();

        assert!(b.query("SELECT x FROM only_in_a", &[]).await.is_err());
        assert!(a.query("SELECT x FROM only_in_a", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_runtime_types_map_to_json() {
        let backend = LocalBackend::open_memory().await.unwrap();
        let rows = backend
            .query(
                "SELECT 7 AS i, 1.25 AS r, 'txt' AS t, NULL AS n, ? AS bound",
                &[SqlValue::from("p")],
            )
            .await
            .unwrap();
        assert_eq!(
            Value::Object(rows[0].clone()),
            json!({ "i": 7, "r": 1.25, "t": "txt", "n": null, "bound": "p" })
        );
    }

    #[tokio::test]
    async fn test_file_backend_creates_parent_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("dir").join("app.db");
        let backend = LocalBackend::open_file(&path).await.unwrap();
        backend.execute("CREATE TABLE t (x INTEGER)", &[]).await.unwrap();
        assert!(path.exists());
        backend.close().await;
    }

    #[tokio::test]
    async fn test_database_error_keeps_sql() {
        let backend = LocalBackend::open_memory().await.unwrap();
        let err = backend.query("SELEC 1", &[]).await.unwrap_err();
        match err {
            DbError::Query { message, sql } => {
                assert_eq!(sql, "SELEC 1");
                assert!(message.contains("syntax error"), "got: {message}");
            }
            other => panic!("expected query error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_closed_pool_is_connection_error() {
        let backend = LocalBackend::open_memory().await.unwrap();
        backend.close().await;
        let err = backend.query("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, DbError::Connection { .. }));
    }
}
