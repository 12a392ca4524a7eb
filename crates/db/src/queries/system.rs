// crates/db/src/queries/system.rs
// System-level queries backing the health endpoints.

use serde::Serialize;
use std::time::Instant;

use crate::catalog::ALL_TABLES;
use crate::pagination::CountRow;
use crate::{Database, DbResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStat {
    pub table: &'static str,
    /// `None` when the table does not exist on this backend.
    pub row_count: Option<u64>,
}

impl Database {
    /// Round-trip `SELECT 1`, returning the latency in milliseconds.
    pub async fn ping(&self) -> DbResult<u64> {
        let start = Instant::now();
        self.conn.query_rows("SELECT 1 AS ok", &[]).await?;
        Ok(start.elapsed().as_millis() as u64)
    }

    /// Row count for every catalog table.
    pub async fn table_stats(&self) -> DbResult<Vec<TableStat>> {
        let mut stats = Vec::with_capacity(ALL_TABLES.len());
        for table in ALL_TABLES {
            let row_count = if self.conn.table_exists(table.name).await? {
                let sql = format!("SELECT COUNT(*) AS total FROM {}", table.name);
                let row: Option<CountRow> = self.conn.query_one(&sql, &[]).await?;
                Some(row.map(|r| r.total.max(0) as u64).unwrap_or(0))
            } else {
                None
            };
            stats.push(TableStat {
                table: table.name,
                row_count,
            });
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ping_and_table_stats() {
        let db = Database::new_in_memory().await.unwrap();
        db.ping().await.unwrap();

        let stats = db.table_stats().await.unwrap();
        assert_eq!(stats.len(), ALL_TABLES.len());
        assert!(stats.iter().all(|s| s.row_count == Some(0)));
    }

    #[tokio::test]
    async fn test_ping_after_close_fails() {
        let db = Database::new_in_memory().await.unwrap();
        db.connection().close().await;
        assert!(matches!(
            db.ping().await.unwrap_err(),
            crate::DbError::NotReady { .. }
        ));
    }
}
