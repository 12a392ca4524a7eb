// crates/db/src/builder.rs
//! Translates a [`QueryRequest`] into parameterized WHERE / ORDER BY fragments
//! for one catalog table.

use tracing::debug;

use crate::catalog::{FilterKind, RangeKind, TableSpec};
use crate::request::{QueryRequest, ValidationError};
use crate::value::SqlValue;

/// AND-joined conditions with their positional parameters, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    conditions: Vec<String>,
    params: Vec<SqlValue>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one condition. `condition` must contain exactly as many `?`
    /// placeholders as `params` yields.
    pub fn push(&mut self, condition: impl Into<String>, params: impl IntoIterator<Item = SqlValue>) {
        self.conditions.push(condition.into());
        self.params.extend(params);
    }

    pub fn and(mut self, condition: impl Into<String>, params: impl IntoIterator<Item = SqlValue>) -> Self {
        self.push(condition, params);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// The conditions without the `WHERE` keyword.
    pub fn sql(&self) -> String {
        self.conditions.join(" AND ")
    }

    /// `" WHERE ..."`, or empty when there are no conditions.
    pub fn suffix(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.sql())
        }
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }
}

#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub table: &'static TableSpec,
    pub where_clause: WhereClause,
    /// ORDER BY body, without the keyword.
    pub order_by: String,
}

#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    table: &'static TableSpec,
}

impl QueryBuilder {
    pub fn new(table: &'static TableSpec) -> Self {
        Self { table }
    }

    pub fn build(&self, req: &QueryRequest) -> Result<BuiltQuery, ValidationError> {
        Ok(BuiltQuery {
            table: self.table,
            where_clause: self.where_clause(req)?,
            order_by: self.order_by(req),
        })
    }

    /// Conditions for every allow-listed filter present in the request, in
    /// allow-list order, followed by the free-text search group.
    pub fn where_clause(&self, req: &QueryRequest) -> Result<WhereClause, ValidationError> {
        let mut clause = WhereClause::new();

        for field in self.table.filters {
            let Some(raw) = req.filter(field.param) else {
                continue;
            };
            let column = field.column;
            match field.kind {
                FilterKind::Contains => {
                    clause.push(format!("instr({column}, ?) > 0"), [SqlValue::from(raw)])
                }
                FilterKind::Exact => clause.push(format!("{column} = ?"), [SqlValue::from(raw)]),
                FilterKind::OneOf => {
                    let items: Vec<SqlValue> = raw
                        .split(',')
                        .map(str::trim)
                        .filter(|item| !item.is_empty())
                        .map(SqlValue::from)
                        .collect();
                    if items.is_empty() {
                        continue;
                    }
                    let placeholders = vec!["?"; items.len()].join(", ");
                    clause.push(format!("{column} IN ({placeholders})"), items);
                }
                FilterKind::Min(kind) => {
                    clause.push(format!("{column} >= ?"), [bound(field.param, raw, kind)?])
                }
                FilterKind::Max(kind) => {
                    clause.push(format!("{column} <= ?"), [bound(field.param, raw, kind)?])
                }
            }
        }

        if let Some(search) = req.search.as_deref() {
            let columns = self.table.search_columns;
            if !columns.is_empty() {
                let any = columns
                    .iter()
                    .map(|c| format!("instr({c}, ?) > 0"))
                    .collect::<Vec<_>>()
                    .join(" OR ");
                clause.push(
                    format!("({any})"),
                    columns.iter().map(|_| SqlValue::from(search)),
                );
            }
        }

        Ok(clause)
    }

    /// Requested sort when allow-listed, else the table default. The key
    /// column is appended so equal sort values page deterministically.
    pub fn order_by(&self, req: &QueryRequest) -> String {
        let requested = req.sort_field.as_deref();
        let column = match requested.and_then(|f| self.table.sort_column(f)) {
            Some(column) => column,
            None => {
                if let Some(field) = requested {
                    debug!(table = self.table.name, field, "Ignoring unknown sort field");
                }
                self.table.default_sort
            }
        };

        let dir = req.sort_direction.as_sql();
        let key = self.table.key_column;
        if column == key {
            format!("{column} {dir}")
        } else {
            format!("{column} {dir}, {key} {dir}")
        }
    }
}

fn bound(param: &str, raw: &str, kind: RangeKind) -> Result<SqlValue, ValidationError> {
    match kind {
        RangeKind::Text => Ok(SqlValue::from(raw)),
        RangeKind::Numeric => SqlValue::parse_number(raw)
            .ok_or_else(|| ValidationError::new(param, format!("'{raw}' is not a number"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AD_CAMPAIGNS, INSIGHT_SEARCH, KOL_TOTAL};
    use crate::request::SortDirection;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_request_has_no_where() {
        let built = QueryBuilder::new(&KOL_TOTAL)
            .build(&QueryRequest::default())
            .unwrap();
        assert!(built.where_clause.is_empty());
        assert_eq!(built.where_clause.suffix(), "");
        assert_eq!(built.order_by, r#""No." DESC"#);
    }

    #[test]
    fn test_unknown_filter_is_ignored() {
        let builder = QueryBuilder::new(&KOL_TOTAL);
        let plain = QueryRequest::default().with_filter("platform", "YouTube");
        let noisy = plain.clone().with_filter("password", "x' OR 1=1 --");

        let a = builder.build(&plain).unwrap();
        let b = builder.build(&noisy).unwrap();
        assert_eq!(a.where_clause, b.where_clause);
        assert_eq!(a.order_by, b.order_by);
        assert_eq!(a.where_clause.sql(), "Platform = ?");
    }

    #[test]
    fn test_clause_order_follows_allow_list() {
        let req = QueryRequest::from_params([
            ("maxCpc", "2.5"),
            ("keyword", "speaker"),
            ("minVolume", "100"),
            ("region", "US"),
        ])
        .unwrap();
        let clause = QueryBuilder::new(&INSIGHT_SEARCH).where_clause(&req).unwrap();
        assert_eq!(
            clause.sql(),
            "instr(keyword, ?) > 0 AND region = ? AND search_volume >= ? AND cost_per_click <= ?"
        );
        assert_eq!(
            clause.params(),
            &[
                SqlValue::from("speaker"),
                SqlValue::from("US"),
                SqlValue::Integer(100),
                SqlValue::Real(2.5),
            ]
        );
    }

    #[test]
    fn test_user_text_never_reaches_sql() {
        let req = QueryRequest::default()
            .with_filter("account", "100%_off'; DROP TABLE x")
            .with_search("a\"b");
        let clause = QueryBuilder::new(&KOL_TOTAL).where_clause(&req).unwrap();
        let sql = clause.sql();
        assert!(!sql.contains("DROP"));
        assert!(!sql.contains('%'));
        assert_eq!(
            sql,
            "instr(kol_account, ?) > 0 AND (instr(kol_account, ?) > 0 OR instr(kol_url, ?) > 0)"
        );
        assert_eq!(clause.params().len(), 3);
    }

    #[test]
    fn test_one_of_drops_empty_items() {
        let req = QueryRequest::default().with_filter("regions", "US, ,UK,");
        let clause = QueryBuilder::new(&INSIGHT_SEARCH).where_clause(&req).unwrap();
        assert_eq!(clause.sql(), "region IN (?, ?)");
        assert_eq!(clause.params(), &[SqlValue::from("US"), SqlValue::from("UK")]);

        let req = QueryRequest::default().with_filter("regions", " , ");
        assert!(QueryBuilder::new(&INSIGHT_SEARCH)
            .where_clause(&req)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_non_numeric_bound_is_rejected() {
        let req = QueryRequest::default().with_filter("minSpent", "lots");
        let err = QueryBuilder::new(&AD_CAMPAIGNS).build(&req).unwrap_err();
        assert_eq!(err.field, "minSpent");
    }

    #[test]
    fn test_date_bounds_bind_as_text() {
        let req = QueryRequest::default()
            .with_filter("startAfter", "2024-01-01")
            .with_filter("startBefore", "2024-06-30");
        let clause = QueryBuilder::new(&AD_CAMPAIGNS).where_clause(&req).unwrap();
        assert_eq!(clause.sql(), "start_date >= ? AND start_date <= ?");
        assert_eq!(
            clause.params(),
            &[SqlValue::from("2024-01-01"), SqlValue::from("2024-06-30")]
        );
    }

    #[test]
    fn test_unknown_sort_falls_back_to_default() {
        let builder = QueryBuilder::new(&INSIGHT_SEARCH);
        let bogus = QueryRequest::default().with_sort("1; DROP TABLE x", SortDirection::Asc);
        assert_eq!(builder.order_by(&bogus), "search_volume ASC, id ASC");

        let valid = QueryRequest::default().with_sort("keyword", SortDirection::Desc);
        assert_eq!(builder.order_by(&valid), "keyword DESC, id DESC");

        let by_key = QueryRequest::default().with_sort("id", SortDirection::Asc);
        assert_eq!(builder.order_by(&by_key), "id ASC");
    }
}
