// crates/db/src/pagination.rs
//! Count + page fetch derived from one builder output.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::builder::BuiltQuery;
use crate::connection::Connection;
use crate::request::MAX_PAGE_SIZE;
use crate::value::SqlValue;
use crate::DbResult;

/// A single SQL statement with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResult<T> {
    pub fn new(data: Vec<T>, page: u32, page_size: u32, total: u64) -> Self {
        Self {
            data,
            page,
            page_size,
            total,
            total_pages: total_pages(total, page_size),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            total_pages: self.total_pages,
        }
    }

    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

/// `ceil(total / page_size)`; zero exactly when `total` is zero.
pub fn total_pages(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(page_size))
}

/// The COUNT and page statements for one request. Both share the same
/// WHERE text and parameter prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedStatements {
    pub count: Statement,
    pub data: Statement,
    pub page: u32,
    pub page_size: u32,
}

impl PagedStatements {
    /// `page` is raised to 1 and `page_size` clamped to `1..=100` regardless
    /// of what the caller passes.
    pub fn new(query: &BuiltQuery, page: u32, page_size: u32) -> Self {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let offset = i64::from(page - 1) * i64::from(page_size);

        let table = query.table;
        let filter = query.where_clause.suffix();
        let params = query.where_clause.params().to_vec();

        let count = Statement::new(
            format!("SELECT COUNT(*) AS total FROM {}{filter}", table.name),
            params.clone(),
        );

        let mut data_params = params;
        data_params.push(SqlValue::from(page_size));
        data_params.push(SqlValue::Integer(offset));
        let data = Statement::new(
            format!(
                "SELECT {} FROM {}{filter} ORDER BY {} LIMIT ? OFFSET ?",
                table.select, table.name, query.order_by
            ),
            data_params,
        );

        Self {
            count,
            data,
            page,
            page_size,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CountRow {
    pub total: i64,
}

/// Run the count then the page query.
///
/// The two statements are not wrapped in a transaction; a concurrent write
/// between them can make `total` and `data` disagree by that write.
pub async fn paginate<T: DeserializeOwned>(
    conn: &Connection,
    query: &BuiltQuery,
    page: u32,
    page_size: u32,
) -> DbResult<PaginatedResult<T>> {
    let stmts = PagedStatements::new(query, page, page_size);

    let count: Option<CountRow> = conn.query_one(&stmts.count.sql, &stmts.count.params).await?;
    let total = count.map(|c| c.total.max(0) as u64).unwrap_or(0);

    let data: Vec<T> = conn.query(&stmts.data.sql, &stmts.data.params).await?;

    Ok(PaginatedResult::new(data, stmts.page, stmts.page_size, total))
}
