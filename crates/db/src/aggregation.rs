// crates/db/src/aggregation.rs
//! Grouped COUNT / SUM summaries over allow-listed dimensions.

use serde::{Deserialize, Serialize};

use crate::builder::WhereClause;
use crate::catalog::TableSpec;
use crate::connection::Connection;
use crate::pagination::{CountRow, Statement};
use crate::request::ValidationError;
use crate::DbResult;

/// Label for rows whose dimension value is NULL.
///
/// A stored value that is literally `"Unknown"` lands in the same bucket, so
/// bucket counts still sum to the row count.
pub const UNKNOWN_BUCKET: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationBucket {
    pub dimension_value: String,
    pub count: u64,
}

/// A bucket that also carries `SUM(measure)` for its rows, and optionally
/// the mean of a second column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricBucket {
    pub dimension_value: String,
    pub count: u64,
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct AggregationService<'a> {
    conn: &'a Connection,
}

impl<'a> AggregationService<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Statement for one table's distribution. Buckets come back ordered by
    /// count descending, then by value ascending.
    pub fn distribution_statement(
        table: &TableSpec,
        dimension: &str,
        filter: &WhereClause,
    ) -> Result<Statement, ValidationError> {
        let column = table.dimension(dimension)?;
        Ok(Statement::new(
            format!(
                "SELECT {label} AS \"dimensionValue\", COUNT(*) AS count FROM {}{} \
                 GROUP BY 1 ORDER BY count DESC, \"dimensionValue\" ASC",
                table.name,
                filter.suffix(),
                label = bucket_label(column),
            ),
            filter.params().to_vec(),
        ))
    }

    pub async fn distribution(
        &self,
        table: &TableSpec,
        dimension: &str,
        filter: &WhereClause,
    ) -> DbResult<Vec<AggregationBucket>> {
        let stmt = Self::distribution_statement(table, dimension, filter)?;
        self.conn.query(&stmt.sql, &stmt.params).await
    }

    /// One distribution over the `UNION ALL` of several tables that share
    /// `dimension`. Each table is constrained by its own WHERE clause.
    pub async fn combined_distribution(
        &self,
        parts: &[(&TableSpec, WhereClause)],
        dimension: &str,
    ) -> DbResult<Vec<AggregationBucket>> {
        if parts.is_empty() {
            return Ok(Vec::new());
        }
        let mut selects = Vec::with_capacity(parts.len());
        let mut params = Vec::new();
        for (table, filter) in parts {
            let column = table.dimension(dimension)?;
            selects.push(format!("SELECT {column} AS v FROM {}{}", table.name, filter.suffix()));
            params.extend_from_slice(filter.params());
        }
        let sql = format!(
            "SELECT {} AS \"dimensionValue\", COUNT(*) AS count FROM ({}) \
             GROUP BY 1 ORDER BY count DESC, \"dimensionValue\" ASC",
            bucket_label("v"),
            selects.join(" UNION ALL "),
        );
        self.conn.query(&sql, &params).await
    }

    /// `COUNT(DISTINCT counted)` per dimension value, largest first.
    pub async fn distinct_counts(
        &self,
        table: &TableSpec,
        dimension: &str,
        counted: &str,
        filter: &WhereClause,
    ) -> DbResult<Vec<AggregationBucket>> {
        let column = table.dimension(dimension)?;
        let counted_column = table.dimension(counted)?;
        let sql = format!(
            "SELECT {label} AS \"dimensionValue\", COUNT(DISTINCT {counted_column}) AS count \
             FROM {}{} GROUP BY 1 ORDER BY count DESC, \"dimensionValue\" ASC",
            table.name,
            filter.suffix(),
            label = bucket_label(column),
        );
        self.conn.query(&sql, filter.params()).await
    }

    /// `COUNT(*)` and `SUM(measure)` per dimension value, largest total first.
    pub async fn metric_totals(
        &self,
        table: &TableSpec,
        dimension: &str,
        measure: &str,
        filter: &WhereClause,
    ) -> DbResult<Vec<MetricBucket>> {
        self.metric_query(table, dimension, measure, None, filter).await
    }

    /// [`metric_totals`](Self::metric_totals) plus `AVG(averaged)` per bucket.
    pub async fn metric_totals_with_average(
        &self,
        table: &TableSpec,
        dimension: &str,
        measure: &str,
        averaged: &str,
        filter: &WhereClause,
    ) -> DbResult<Vec<MetricBucket>> {
        self.metric_query(table, dimension, measure, Some(averaged), filter)
            .await
    }

    async fn metric_query(
        &self,
        table: &TableSpec,
        dimension: &str,
        measure: &str,
        averaged: Option<&str>,
        filter: &WhereClause,
    ) -> DbResult<Vec<MetricBucket>> {
        let column = table.dimension(dimension)?;
        let measure_column = table.measure(measure)?;
        let average = match averaged {
            Some(name) => format!(", AVG({}) AS average", table.measure(name)?),
            None => String::new(),
        };
        let sql = format!(
            "SELECT {label} AS \"dimensionValue\", COUNT(*) AS count, \
             COALESCE(SUM({measure_column}), 0) AS total{average} FROM {}{} \
             GROUP BY 1 ORDER BY total DESC, \"dimensionValue\" ASC",
            table.name,
            filter.suffix(),
            label = bucket_label(column),
        );
        self.conn.query(&sql, filter.params()).await
    }

    pub async fn count(&self, table: &TableSpec, filter: &WhereClause) -> DbResult<u64> {
        let sql = format!("SELECT COUNT(*) AS total FROM {}{}", table.name, filter.suffix());
        let row: Option<CountRow> = self.conn.query_one(&sql, filter.params()).await?;
        Ok(row.map(|r| r.total.max(0) as u64).unwrap_or(0))
    }
}

fn bucket_label(column: &str) -> String {
    format!("COALESCE(CAST({column} AS TEXT), '{UNKNOWN_BUCKET}')")
}
