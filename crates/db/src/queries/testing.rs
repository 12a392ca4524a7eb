// crates/db/src/queries/testing.rs
// A/B test ideas.

use serde::{Deserialize, Serialize};

use crate::aggregation::AggregationBucket;
use crate::builder::{QueryBuilder, WhereClause};
use crate::catalog::TESTING_IDEAS;
use crate::pagination::{PaginatedResult, Statement};
use crate::request::QueryRequest;
use crate::value::SqlValue;
use crate::{Database, DbResult, ExecuteResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestIdea {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub hypothesis: Option<String>,
    pub status: String,
    pub priority: String,
    pub category: Option<String>,
    pub expected_impact: Option<String>,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestingStatistics {
    pub total: u64,
    pub by_status: Vec<AggregationBucket>,
    pub by_priority: Vec<AggregationBucket>,
}

pub(crate) fn insert_statement(idea: &TestIdea) -> Statement {
    Statement::new(
        "INSERT INTO testing_ideas (id, title, description, hypothesis, status, priority, \
         category, expected_impact, created_by, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        vec![
            idea.id.as_str().into(),
            idea.title.as_str().into(),
            idea.description.clone().into(),
            idea.hypothesis.clone().into(),
            idea.status.as_str().into(),
            idea.priority.as_str().into(),
            idea.category.clone().into(),
            idea.expected_impact.clone().into(),
            idea.created_by.clone().into(),
            idea.created_at.as_str().into(),
            idea.updated_at.as_str().into(),
        ],
    )
}

impl Database {
    pub async fn list_test_ideas(&self, req: &QueryRequest) -> DbResult<PaginatedResult<TestIdea>> {
        self.fetch_page(&TESTING_IDEAS, req).await
    }

    pub async fn get_test_idea(&self, id: &str) -> DbResult<Option<TestIdea>> {
        self.fetch_by_key(&TESTING_IDEAS, SqlValue::from(id)).await
    }

    /// Counts by status and by priority under the request's filters.
    pub async fn testing_statistics(&self, req: &QueryRequest) -> DbResult<TestingStatistics> {
        let filter: WhereClause = QueryBuilder::new(&TESTING_IDEAS).where_clause(req)?;
        let agg = self.aggregation();
        let total = agg.count(&TESTING_IDEAS, &filter).await?;
        let by_status = agg.distribution(&TESTING_IDEAS, "status", &filter).await?;
        let by_priority = agg.distribution(&TESTING_IDEAS, "priority", &filter).await?;
        Ok(TestingStatistics {
            total,
            by_status,
            by_priority,
        })
    }

    pub async fn insert_test_idea(&self, idea: &TestIdea) -> DbResult<ExecuteResult> {
        self.run(insert_statement(idea)).await
    }
}
