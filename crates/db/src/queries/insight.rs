// crates/db/src/queries/insight.rs
// Search keyword insights.

use serde::{Deserialize, Serialize};

use crate::aggregation::{AggregationBucket, MetricBucket};
use crate::builder::QueryBuilder;
use crate::catalog::INSIGHT_SEARCH;
use crate::pagination::{PaginatedResult, Statement};
use crate::request::{QueryRequest, MAX_PAGE_SIZE};
use crate::value::SqlValue;
use crate::{Database, DbResult, ExecuteResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightSearch {
    pub id: i64,
    pub file_source: Option<String>,
    pub modifier_type: Option<String>,
    pub modifier: Option<String>,
    pub suggestion: Option<String>,
    pub language: Option<String>,
    pub region: Option<String>,
    pub keyword: Option<String>,
    pub search_volume: Option<i64>,
    pub cost_per_click: Option<f64>,
}

#[derive(Deserialize)]
struct SuggestionRow {
    suggestion: String,
}

/// `id <= 0` lets SQLite assign the rowid.
pub(crate) fn insert_statement(row: &InsightSearch) -> Statement {
    Statement::new(
        "INSERT INTO insight_search (id, file_source, modifier_type, modifier, suggestion, \
         language, region, keyword, search_volume, cost_per_click) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        vec![
            (row.id > 0).then_some(row.id).into(),
            row.file_source.clone().into(),
            row.modifier_type.clone().into(),
            row.modifier.clone().into(),
            row.suggestion.clone().into(),
            row.language.clone().into(),
            row.region.clone().into(),
            row.keyword.clone().into(),
            row.search_volume.into(),
            row.cost_per_click.into(),
        ],
    )
}

impl Database {
    pub async fn list_insights(&self, req: &QueryRequest) -> DbResult<PaginatedResult<InsightSearch>> {
        self.fetch_page(&INSIGHT_SEARCH, req).await
    }

    /// Total search volume and mean CPC per region under the request's filters.
    pub async fn insight_volume_by_region(&self, req: &QueryRequest) -> DbResult<Vec<MetricBucket>> {
        let filter = QueryBuilder::new(&INSIGHT_SEARCH).where_clause(req)?;
        self.aggregation()
            .metric_totals_with_average(
                &INSIGHT_SEARCH,
                "region",
                "searchVolume",
                "costPerClick",
                &filter,
            )
            .await
    }

    /// Distinct keywords per language.
    pub async fn insight_keywords_by_language(
        &self,
        req: &QueryRequest,
    ) -> DbResult<Vec<AggregationBucket>> {
        let filter = QueryBuilder::new(&INSIGHT_SEARCH).where_clause(req)?;
        self.aggregation()
            .distinct_counts(&INSIGHT_SEARCH, "language", "keyword", &filter)
            .await
    }

    /// Distinct suggestions for keywords containing `keyword`, alphabetical.
    pub async fn insight_suggestions(&self, keyword: &str, limit: u32) -> DbResult<Vec<String>> {
        let rows: Vec<SuggestionRow> = self
            .conn
            .query(
                "SELECT DISTINCT suggestion FROM insight_search \
                 WHERE instr(keyword, ?) > 0 AND suggestion IS NOT NULL \
                 ORDER BY suggestion ASC LIMIT ?",
                &[
                    SqlValue::from(keyword),
                    SqlValue::Integer(i64::from(limit.clamp(1, MAX_PAGE_SIZE))),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.suggestion).collect())
    }

    pub async fn insight_distribution(
        &self,
        dimension: &str,
        req: &QueryRequest,
    ) -> DbResult<Vec<AggregationBucket>> {
        let filter = QueryBuilder::new(&INSIGHT_SEARCH).where_clause(req)?;
        self.aggregation()
            .distribution(&INSIGHT_SEARCH, dimension, &filter)
            .await
    }

    pub async fn insert_insight(&self, row: &InsightSearch) -> DbResult<ExecuteResult> {
        self.run(insert_statement(row)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SortDirection;

    fn keyword(keyword: &str, region: &str, volume: i64, cpc: f64) -> InsightSearch {
        InsightSearch {
            id: 0,
            file_source: Some("sheet1".into()),
            modifier_type: Some("question".into()),
            modifier: None,
            suggestion: Some(format!("best {keyword}")),
            language: Some("en".into()),
            region: Some(region.into()),
            keyword: Some(keyword.into()),
            search_volume: Some(volume),
            cost_per_click: Some(cpc),
        }
    }

    async fn fixture() -> Database {
        let db = Database::new_in_memory().await.unwrap();
        for row in [
            keyword("bluetooth speaker", "US", 9000, 1.2),
            keyword("portable speaker", "US", 4000, 0.9),
            keyword("earbuds", "UK", 7000, 1.5),
            keyword("Speaker stand", "DE", 300, 0.4),
        ] {
            let done = db.insert_insight(&row).await.unwrap();
            assert!(done.inserted_id.is_some());
        }
        db
    }

    #[tokio::test]
    async fn test_default_sort_by_volume() {
        let db = fixture().await;
        let page = db.list_insights(&QueryRequest::default()).await.unwrap();
        let volumes: Vec<_> = page.data.iter().map(|r| r.search_volume).collect();
        assert_eq!(volumes, vec![Some(9000), Some(7000), Some(4000), Some(300)]);
    }

    #[tokio::test]
    async fn test_contains_is_case_sensitive() {
        let db = fixture().await;
        let req = QueryRequest::default().with_filter("keyword", "speaker");
        let page = db.list_insights(&req).await.unwrap();
        assert_eq!(page.total, 2);
        assert!(page
            .data
            .iter()
            .all(|r| r.keyword.as_deref().is_some_and(|k| k.contains("speaker"))));
    }

    #[tokio::test]
    async fn test_range_and_list_filters() {
        let db = fixture().await;
        let req = QueryRequest::from_params([
            ("regions", "US,UK"),
            ("minVolume", "5000"),
            ("maxCpc", "1.4"),
        ])
        .unwrap()
        .with_sort("keyword", SortDirection::Asc);
        let page = db.list_insights(&req).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].keyword.as_deref(), Some("bluetooth speaker"));
    }

    #[tokio::test]
    async fn test_volume_by_region() {
        let db = fixture().await;
        let buckets = db
            .insight_volume_by_region(&QueryRequest::default())
            .await
            .unwrap();
        assert_eq!(buckets[0].dimension_value, "US");
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[0].total, 13000.0);
        let avg_cpc = buckets[0].average.unwrap();
        assert!((avg_cpc - 1.05).abs() < 1e-9, "{avg_cpc}");
        assert_eq!(buckets.len(), 3);
    }

    #[tokio::test]
    async fn test_distribution_respects_filters() {
        let db = fixture().await;
        let req = QueryRequest::default().with_filter("region", "US");
        let buckets = db.insight_distribution("language", &req).await.unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].count, 2);

        assert!(db
            .insight_distribution("color", &QueryRequest::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_suggestions_are_distinct_and_limited() {
        let db = fixture().await;
        db.insert_insight(&keyword("bluetooth speaker", "UK", 800, 1.0))
            .await
            .unwrap();

        let all = db.insight_suggestions("speaker", 10).await.unwrap();
        // "Speaker stand" does not contain lowercase "speaker".
        assert_eq!(
            all,
            vec![
                "best bluetooth speaker".to_string(),
                "best portable speaker".to_string(),
            ]
        );

        let first = db.insight_suggestions("speaker", 1).await.unwrap();
        assert_eq!(first, vec!["best bluetooth speaker".to_string()]);
        assert!(db.insight_suggestions("tv", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keywords_by_language_counts_distinct() {
        let db = fixture().await;
        db.insert_insight(&keyword("earbuds", "DE", 100, 0.2))
            .await
            .unwrap();
        let buckets = db
            .insight_keywords_by_language(&QueryRequest::default())
            .await
            .unwrap();
        assert_eq!(
            buckets,
            vec![AggregationBucket {
                dimension_value: "en".into(),
                count: 4
            }]
        );
    }
}
