// crates/db/src/queries/ads.rs
// Ad campaigns and their delivery metrics.

use serde::{Deserialize, Serialize};

use crate::builder::QueryBuilder;
use crate::catalog::AD_CAMPAIGNS;
use crate::pagination::{PaginatedResult, Statement};
use crate::request::QueryRequest;
use crate::{Database, DbResult, ExecuteResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdCampaign {
    pub id: i64,
    pub name: String,
    pub platform: String,
    pub status: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: f64,
    pub spent: f64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub created_at: String,
    /// Click-through rate, percent.
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub cpc: f64,
    #[serde(default)]
    pub cpm: f64,
}

impl AdCampaign {
    fn with_rates(mut self) -> Self {
        let rates = Rates::from_totals(self.spent, self.impressions, self.clicks);
        self.ctr = rates.ctr;
        self.cpc = rates.cpc;
        self.cpm = rates.cpm;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdCampaign {
    pub name: String,
    pub platform: String,
    pub status: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: f64,
    pub spent: f64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
}

/// Account-wide totals with rates derived from the sums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdMetrics {
    pub campaigns: u64,
    pub total_budget: f64,
    pub total_spend: f64,
    pub total_impressions: i64,
    pub total_clicks: i64,
    pub total_conversions: i64,
    #[serde(default, rename = "averageCTR")]
    pub average_ctr: f64,
    #[serde(default, rename = "averageCPC")]
    pub average_cpc: f64,
    #[serde(default, rename = "averageCPM")]
    pub average_cpm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMetrics {
    pub platform: String,
    pub campaigns: u64,
    pub spend: f64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    #[serde(default, rename = "avgCTR")]
    pub avg_ctr: f64,
    #[serde(default, rename = "avgCPC")]
    pub avg_cpc: f64,
}

struct Rates {
    ctr: f64,
    cpc: f64,
    cpm: f64,
}

impl Rates {
    /// Zero denominators yield zero rates.
    fn from_totals(spend: f64, impressions: i64, clicks: i64) -> Self {
        let ratio = |num: f64, den: i64| if den > 0 { num / den as f64 } else { 0.0 };
        Self {
            ctr: ratio(clicks as f64 * 100.0, impressions),
            cpc: ratio(spend, clicks),
            cpm: ratio(spend * 1000.0, impressions),
        }
    }
}

pub(crate) fn insert_statement(row: &NewAdCampaign) -> Statement {
    Statement::new(
        "INSERT INTO ad_campaigns (name, platform, status, start_date, end_date, budget, spent, \
         impressions, clicks, conversions) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        vec![
            row.name.as_str().into(),
            row.platform.as_str().into(),
            row.status.as_str().into(),
            row.start_date.clone().into(),
            row.end_date.clone().into(),
            row.budget.into(),
            row.spent.into(),
            row.impressions.into(),
            row.clicks.into(),
            row.conversions.into(),
        ],
    )
}

impl Database {
    pub async fn list_campaigns(&self, req: &QueryRequest) -> DbResult<PaginatedResult<AdCampaign>> {
        Ok(self
            .fetch_page::<AdCampaign>(&AD_CAMPAIGNS, req)
            .await?
            .map(AdCampaign::with_rates))
    }

    /// Totals over the campaigns matching the request's filters.
    pub async fn ad_metrics(&self, req: &QueryRequest) -> DbResult<AdMetrics> {
        let filter = QueryBuilder::new(&AD_CAMPAIGNS).where_clause(req)?;
        let sql = format!(
            r#"SELECT COUNT(*) AS campaigns,
                      COALESCE(SUM(budget), 0.0) AS "totalBudget",
                      COALESCE(SUM(spent), 0.0) AS "totalSpend",
                      COALESCE(SUM(impressions), 0) AS "totalImpressions",
                      COALESCE(SUM(clicks), 0) AS "totalClicks",
                      COALESCE(SUM(conversions), 0) AS "totalConversions"
               FROM ad_campaigns{}"#,
            filter.suffix()
        );
        let metrics: Option<AdMetrics> = self.conn.query_one(&sql, filter.params()).await?;
        let mut metrics = metrics.unwrap_or(AdMetrics {
            campaigns: 0,
            total_budget: 0.0,
            total_spend: 0.0,
            total_impressions: 0,
            total_clicks: 0,
            total_conversions: 0,
            average_ctr: 0.0,
            average_cpc: 0.0,
            average_cpm: 0.0,
        });
        let rates = Rates::from_totals(metrics.total_spend, metrics.total_impressions, metrics.total_clicks);
        metrics.average_ctr = rates.ctr;
        metrics.average_cpc = rates.cpc;
        metrics.average_cpm = rates.cpm;
        Ok(metrics)
    }

    /// Per-platform delivery, largest spend first.
    pub async fn platform_metrics(&self, req: &QueryRequest) -> DbResult<Vec<PlatformMetrics>> {
        let filter = QueryBuilder::new(&AD_CAMPAIGNS).where_clause(req)?;
        let platform = AD_CAMPAIGNS.dimension("platform")?;
        let sql = format!(
            r#"SELECT {platform} AS platform,
                      COUNT(*) AS campaigns,
                      COALESCE(SUM(spent), 0.0) AS spend,
                      COALESCE(SUM(impressions), 0) AS impressions,
                      COALESCE(SUM(clicks), 0) AS clicks,
                      COALESCE(SUM(conversions), 0) AS conversions
               FROM ad_campaigns{}
               GROUP BY 1 ORDER BY spend DESC, platform ASC"#,
            filter.suffix()
        );
        let rows: Vec<PlatformMetrics> = self.conn.query(&sql, filter.params()).await?;
        Ok(rows
            .into_iter()
            .map(|mut row| {
                let rates = Rates::from_totals(row.spend, row.impressions, row.clicks);
                row.avg_ctr = rates.ctr;
                row.avg_cpc = rates.cpc;
                row
            })
            .collect())
    }

    pub async fn insert_campaign(&self, row: &NewAdCampaign) -> DbResult<ExecuteResult> {
        self.run(insert_statement(row)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(name: &str, platform: &str, spent: f64, impressions: i64, clicks: i64) -> NewAdCampaign {
        NewAdCampaign {
            name: name.into(),
            platform: platform.into(),
            status: "active".into(),
            start_date: Some("2024-03-01".into()),
            end_date: None,
            budget: spent * 2.0,
            spent,
            impressions,
            clicks,
            conversions: clicks / 10,
        }
    }

    async fn fixture() -> Database {
        let db = Database::new_in_memory().await.unwrap();
        for row in [
            campaign("Spring Sale", "google", 1000.0, 100_000, 1000),
            campaign("Launch", "facebook", 500.0, 50_000, 250),
            campaign("Retarget", "google", 200.0, 0, 0),
        ] {
            db.insert_campaign(&row).await.unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_list_derives_rates() {
        let db = fixture().await;
        let req = QueryRequest::default().with_filter("name", "Spring");
        let page = db.list_campaigns(&req).await.unwrap();
        assert_eq!(page.total, 1);
        let row = &page.data[0];
        assert_eq!(row.ctr, 1.0);
        assert_eq!(row.cpc, 1.0);
        assert_eq!(row.cpm, 10.0);
    }

    #[tokio::test]
    async fn test_zero_impressions_have_zero_rates() {
        let db = fixture().await;
        let req = QueryRequest::default().with_filter("name", "Retarget");
        let page = db.list_campaigns(&req).await.unwrap();
        assert_eq!((page.data[0].ctr, page.data[0].cpc, page.data[0].cpm), (0.0, 0.0, 0.0));
    }

    #[tokio::test]
    async fn test_metrics_totals() {
        let db = fixture().await;
        let metrics = db.ad_metrics(&QueryRequest::default()).await.unwrap();
        assert_eq!(metrics.campaigns, 3);
        assert_eq!(metrics.total_spend, 1700.0);
        assert_eq!(metrics.total_impressions, 150_000);
        assert_eq!(metrics.total_clicks, 1250);

        let empty = db
            .ad_metrics(&QueryRequest::default().with_filter("platform", "tiktok"))
            .await
            .unwrap();
        assert_eq!(empty.campaigns, 0);
        assert_eq!(empty.average_ctr, 0.0);
    }

    #[tokio::test]
    async fn test_platform_metrics_ordered_by_spend() {
        let db = fixture().await;
        let platforms = db.platform_metrics(&QueryRequest::default()).await.unwrap();
        assert_eq!(platforms.len(), 2);
        assert_eq!(platforms[0].platform, "google");
        assert_eq!(platforms[0].campaigns, 2);
        assert_eq!(platforms[0].spend, 1200.0);
        assert_eq!(platforms[1].avg_ctr, 0.5);
    }
}
