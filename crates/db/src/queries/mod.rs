// crates/db/src/queries/mod.rs
// Per-domain dashboard queries, each an `impl Database` block.

pub mod ads;
pub mod insight;
pub mod kol;
pub mod system;
pub mod testing;

use serde::de::DeserializeOwned;

use crate::builder::QueryBuilder;
use crate::catalog::TableSpec;
use crate::pagination::{paginate, PaginatedResult, Statement};
use crate::request::QueryRequest;
use crate::value::SqlValue;
use crate::{Database, DbResult, ExecuteResult};

impl Database {
    /// Filter, sort and page one catalog table.
    pub(crate) async fn fetch_page<T: DeserializeOwned>(
        &self,
        table: &'static TableSpec,
        req: &QueryRequest,
    ) -> DbResult<PaginatedResult<T>> {
        let built = QueryBuilder::new(table).build(req)?;
        paginate(&self.conn, &built, req.page, req.page_size).await
    }

    /// Single row by the table's key column.
    pub(crate) async fn fetch_by_key<T: DeserializeOwned>(
        &self,
        table: &'static TableSpec,
        key: SqlValue,
    ) -> DbResult<Option<T>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?",
            table.select, table.name, table.key_column
        );
        self.conn.query_one(&sql, &[key]).await
    }

    pub(crate) async fn run(&self, stmt: Statement) -> DbResult<ExecuteResult> {
        self.conn.execute(&stmt.sql, &stmt.params).await
    }
}
