// crates/db/src/catalog.rs
//! Static allow-lists for every dashboard table.
//!
//! Identifiers in generated SQL come only from here. Request keys are matched
//! against `param` names; the matching `column` (already quoted where the
//! stored name needs it) is what reaches the statement text.

use crate::request::ValidationError;

/// How a request value constrains its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Case-sensitive substring match.
    Contains,
    Exact,
    /// Comma-separated list of accepted values.
    OneOf,
    /// Inclusive lower bound.
    Min(RangeKind),
    /// Inclusive upper bound.
    Max(RangeKind),
}

/// Value type of a range bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    Numeric,
    /// ISO-8601 dates, compared as text.
    Text,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterField {
    pub param: &'static str,
    pub column: &'static str,
    pub kind: FilterKind,
}

#[derive(Debug, Clone, Copy)]
pub struct SortField {
    pub param: &'static str,
    pub column: &'static str,
}

/// A groupable or summable column exposed to aggregation callers.
#[derive(Debug, Clone, Copy)]
pub struct NamedColumn {
    pub name: &'static str,
    pub column: &'static str,
}

#[derive(Debug)]
pub struct TableSpec {
    pub name: &'static str,
    /// Select list, aliased to the wire field names of the row struct.
    pub select: &'static str,
    pub key_column: &'static str,
    /// Filter allow-list. Clause order follows this order.
    pub filters: &'static [FilterField],
    pub search_columns: &'static [&'static str],
    pub sorts: &'static [SortField],
    pub default_sort: &'static str,
    pub dimensions: &'static [NamedColumn],
    pub measures: &'static [NamedColumn],
}

impl TableSpec {
    pub fn filter(&self, param: &str) -> Option<&'static FilterField> {
        self.filters.iter().find(|f| f.param == param)
    }

    pub fn sort_column(&self, param: &str) -> Option<&'static str> {
        self.sorts.iter().find(|s| s.param == param).map(|s| s.column)
    }

    pub fn dimension(&self, name: &str) -> Result<&'static str, ValidationError> {
        lookup(self.dimensions, name, "type")
    }

    pub fn measure(&self, name: &str) -> Result<&'static str, ValidationError> {
        lookup(self.measures, name, "measure")
    }

    pub fn has_dimension(&self, name: &str) -> bool {
        self.dimensions.iter().any(|d| d.name == name)
    }

    pub fn dimension_names(&self) -> Vec<&'static str> {
        self.dimensions.iter().map(|d| d.name).collect()
    }
}

fn lookup(
    columns: &'static [NamedColumn],
    name: &str,
    field: &str,
) -> Result<&'static str, ValidationError> {
    columns
        .iter()
        .find(|c| c.name == name)
        .map(|c| c.column)
        .ok_or_else(|| {
            let valid: Vec<&str> = columns.iter().map(|c| c.name).collect();
            ValidationError::new(
                field,
                format!("Invalid {field} '{name}'. Valid options: {}", valid.join(", ")),
            )
        })
}

const fn filter(param: &'static str, column: &'static str, kind: FilterKind) -> FilterField {
    FilterField {
        param,
        column,
        kind,
    }
}

const fn sort(param: &'static str, column: &'static str) -> SortField {
    SortField { param, column }
}

const fn named(name: &'static str, column: &'static str) -> NamedColumn {
    NamedColumn { name, column }
}

use FilterKind::{Contains, Exact, Max, Min, OneOf};
use RangeKind::{Numeric, Text};

const KOL_REGIONAL_FILTERS: &[FilterField] = &[
    filter("platform", "Platform", Exact),
    filter("platforms", "Platform", OneOf),
    filter("region", "Region", Exact),
    filter("regions", "Region", OneOf),
    filter("account", "kol_account", Contains),
];

const KOL_REGIONAL_SORTS: &[SortField] = &[
    sort("no", r#""No.""#),
    sort("region", "Region"),
    sort("platform", "Platform"),
    sort("kolAccount", "kol_account"),
];

const KOL_REGIONAL_DIMENSIONS: &[NamedColumn] =
    &[named("platform", "Platform"), named("region", "Region")];

const KOL_REGIONAL_SELECT: &str = r#""No." AS "no", Region AS region, Platform AS platform, kol_account AS "kolAccount", kol_url AS "kolUrl""#;

pub static KOL_TOTAL: TableSpec = TableSpec {
    name: "kol_tribit_total",
    select: KOL_REGIONAL_SELECT,
    key_column: r#""No.""#,
    filters: KOL_REGIONAL_FILTERS,
    search_columns: &["kol_account", "kol_url"],
    sorts: KOL_REGIONAL_SORTS,
    default_sort: r#""No.""#,
    dimensions: KOL_REGIONAL_DIMENSIONS,
    measures: &[],
};

pub static KOL_INDIA: TableSpec = TableSpec {
    name: "kol_tribit_india",
    select: KOL_REGIONAL_SELECT,
    key_column: r#""No.""#,
    filters: KOL_REGIONAL_FILTERS,
    search_columns: &["kol_account", "kol_url"],
    sorts: KOL_REGIONAL_SORTS,
    default_sort: r#""No.""#,
    dimensions: KOL_REGIONAL_DIMENSIONS,
    measures: &[],
};

pub static KOL_2024: TableSpec = TableSpec {
    name: "kol_tribit_2024",
    select: r#""No." AS "no", platform, kol_account AS "kolAccount", kol_post_url AS "kolPostUrl""#,
    key_column: r#""No.""#,
    filters: &[
        filter("platform", "platform", Exact),
        filter("platforms", "platform", OneOf),
        filter("account", "kol_account", Contains),
    ],
    search_columns: &["kol_account", "kol_post_url"],
    sorts: &[
        sort("no", r#""No.""#),
        sort("platform", "platform"),
        sort("kolAccount", "kol_account"),
    ],
    default_sort: r#""No.""#,
    dimensions: &[named("platform", "platform")],
    measures: &[],
};

pub static INSIGHT_SEARCH: TableSpec = TableSpec {
    name: "insight_search",
    select: r#"id, file_source AS "fileSource", modifier_type AS "modifierType", modifier, suggestion, language, region, keyword, search_volume AS "searchVolume", cost_per_click AS "costPerClick""#,
    key_column: "id",
    filters: &[
        filter("keyword", "keyword", Contains),
        filter("region", "region", Exact),
        filter("regions", "region", OneOf),
        filter("language", "language", Exact),
        filter("languages", "language", OneOf),
        filter("modifierType", "modifier_type", Exact),
        filter("minVolume", "search_volume", Min(Numeric)),
        filter("maxVolume", "search_volume", Max(Numeric)),
        filter("minCpc", "cost_per_click", Min(Numeric)),
        filter("maxCpc", "cost_per_click", Max(Numeric)),
    ],
    search_columns: &["keyword", "suggestion", "modifier"],
    sorts: &[
        sort("id", "id"),
        sort("keyword", "keyword"),
        sort("searchVolume", "search_volume"),
        sort("costPerClick", "cost_per_click"),
        sort("region", "region"),
        sort("language", "language"),
    ],
    default_sort: "search_volume",
    dimensions: &[
        named("region", "region"),
        named("language", "language"),
        named("modifierType", "modifier_type"),
        named("fileSource", "file_source"),
        named("keyword", "keyword"),
    ],
    measures: &[
        named("searchVolume", "search_volume"),
        named("costPerClick", "cost_per_click"),
    ],
};

pub static AD_CAMPAIGNS: TableSpec = TableSpec {
    name: "ad_campaigns",
    select: r#"id, name, platform, status, start_date AS "startDate", end_date AS "endDate", budget, spent, impressions, clicks, conversions, created_at AS "createdAt""#,
    key_column: "id",
    filters: &[
        filter("platform", "platform", Exact),
        filter("platforms", "platform", OneOf),
        filter("status", "status", Exact),
        filter("statuses", "status", OneOf),
        filter("name", "name", Contains),
        filter("startAfter", "start_date", Min(Text)),
        filter("startBefore", "start_date", Max(Text)),
        filter("minBudget", "budget", Min(Numeric)),
        filter("maxBudget", "budget", Max(Numeric)),
        filter("minSpent", "spent", Min(Numeric)),
        filter("maxSpent", "spent", Max(Numeric)),
    ],
    search_columns: &["name"],
    sorts: &[
        sort("id", "id"),
        sort("name", "name"),
        sort("platform", "platform"),
        sort("status", "status"),
        sort("startDate", "start_date"),
        sort("budget", "budget"),
        sort("spent", "spent"),
        sort("impressions", "impressions"),
        sort("clicks", "clicks"),
        sort("conversions", "conversions"),
        sort("createdAt", "created_at"),
    ],
    default_sort: "created_at",
    dimensions: &[named("platform", "platform"), named("status", "status")],
    measures: &[
        named("spent", "spent"),
        named("budget", "budget"),
        named("impressions", "impressions"),
        named("clicks", "clicks"),
        named("conversions", "conversions"),
    ],
};

pub static TESTING_IDEAS: TableSpec = TableSpec {
    name: "testing_ideas",
    select: r#"id, title, description, hypothesis, status, priority, category, expected_impact AS "expectedImpact", created_by AS "createdBy", created_at AS "createdAt", updated_at AS "updatedAt""#,
    key_column: "id",
    filters: &[
        filter("status", "status", Exact),
        filter("statuses", "status", OneOf),
        filter("priority", "priority", Exact),
        filter("priorities", "priority", OneOf),
        filter("category", "category", Exact),
        filter("createdBy", "created_by", Exact),
        filter("title", "title", Contains),
        filter("createdAfter", "created_at", Min(Text)),
        filter("createdBefore", "created_at", Max(Text)),
    ],
    search_columns: &["title", "description", "hypothesis"],
    sorts: &[
        sort("title", "title"),
        sort("status", "status"),
        sort("priority", "priority"),
        sort("category", "category"),
        sort("createdAt", "created_at"),
        sort("updatedAt", "updated_at"),
    ],
    default_sort: "created_at",
    dimensions: &[
        named("status", "status"),
        named("priority", "priority"),
        named("category", "category"),
        named("createdBy", "created_by"),
    ],
    measures: &[],
};

/// Every table reported by the database health endpoint.
pub static ALL_TABLES: &[&TableSpec] = &[
    &KOL_TOTAL,
    &KOL_2024,
    &KOL_INDIA,
    &INSIGHT_SEARCH,
    &AD_CAMPAIGNS,
    &TESTING_IDEAS,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_params_are_unique_per_table() {
        for table in ALL_TABLES {
            let mut params: Vec<_> = table.sorts.iter().map(|s| s.param).collect();
            params.sort_unstable();
            params.dedup();
            assert_eq!(params.len(), table.sorts.len(), "{}", table.name);
        }
    }

    #[test]
    fn test_default_sort_is_sortable() {
        for table in ALL_TABLES {
            assert!(
                table.sorts.iter().any(|s| s.column == table.default_sort),
                "{} default sort missing from allow-list",
                table.name
            );
        }
    }

    #[test]
    fn test_unknown_dimension_lists_options() {
        let err = KOL_TOTAL.dimension("country").unwrap_err();
        assert_eq!(err.field, "type");
        assert!(err.message.contains("platform, region"), "{}", err.message);
        assert_eq!(KOL_TOTAL.dimension("region").unwrap(), "Region");
    }

    #[test]
    fn test_2024_dataset_has_no_region() {
        assert!(!KOL_2024.has_dimension("region"));
        assert!(KOL_2024.has_dimension("platform"));
    }
}
