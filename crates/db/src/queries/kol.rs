// crates/db/src/queries/kol.rs
// KOL (influencer) datasets: list, lookup, distribution, statistics.

use serde::{Deserialize, Serialize};

use crate::aggregation::AggregationBucket;
use crate::builder::QueryBuilder;
use crate::catalog::{TableSpec, KOL_2024, KOL_INDIA, KOL_TOTAL};
use crate::pagination::{PaginatedResult, Statement};
use crate::request::{QueryRequest, ValidationError, MAX_PAGE_SIZE};
use crate::value::SqlValue;
use crate::{Database, DbResult, ExecuteResult};

/// Which KOL table a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KolDataset {
    #[default]
    #[serde(rename = "total")]
    Total,
    #[serde(rename = "2024")]
    Year2024,
    #[serde(rename = "india")]
    India,
}

impl KolDataset {
    pub const ALL: [Self; 3] = [Self::Total, Self::Year2024, Self::India];

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == raw)
            .ok_or_else(|| {
                ValidationError::new(
                    "dataset",
                    format!("Invalid dataset '{raw}'. Valid options: total, 2024, india"),
                )
            })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::Year2024 => "2024",
            Self::India => "india",
        }
    }

    pub fn table(self) -> &'static TableSpec {
        match self {
            Self::Total => &KOL_TOTAL,
            Self::Year2024 => &KOL_2024,
            Self::India => &KOL_INDIA,
        }
    }
}

/// Row of `kol_tribit_total` or `kol_tribit_india`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KolTotal {
    pub no: i64,
    pub region: Option<String>,
    pub platform: Option<String>,
    pub kol_account: Option<String>,
    pub kol_url: Option<String>,
}

/// Row of `kol_tribit_2024`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kol2024 {
    pub no: i64,
    pub platform: Option<String>,
    pub kol_account: Option<String>,
    pub kol_post_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KolRecord {
    Regional(KolTotal),
    Yearly(Kol2024),
}

/// One video link, tagged with the dataset it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KolVideo {
    pub kol_account: Option<String>,
    pub url: String,
    pub platform: Option<String>,
    pub region: Option<String>,
    pub source: String,
}

const YOUTUBE_HOST: &str = "youtube.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KolStatistics {
    pub total_kols: u64,
    pub kols_2024: u64,
    pub india_kols: u64,
    /// Distinct platforms in the 2024 dataset.
    pub platforms: u64,
}

pub(crate) fn insert_regional(table: &TableSpec, row: &KolTotal) -> Statement {
    Statement::new(
        format!(
            r#"INSERT INTO {} ("No.", Region, Platform, kol_account, kol_url) VALUES (?, ?, ?, ?, ?)"#,
            table.name
        ),
        vec![
            SqlValue::Integer(row.no),
            row.region.clone().into(),
            row.platform.clone().into(),
            row.kol_account.clone().into(),
            row.kol_url.clone().into(),
        ],
    )
}

pub(crate) fn insert_yearly(row: &Kol2024) -> Statement {
    Statement::new(
        r#"INSERT INTO kol_tribit_2024 ("No.", platform, kol_account, kol_post_url) VALUES (?, ?, ?, ?)"#,
        vec![
            SqlValue::Integer(row.no),
            row.platform.clone().into(),
            row.kol_account.clone().into(),
            row.kol_post_url.clone().into(),
        ],
    )
}

impl Database {
    pub async fn list_kols(
        &self,
        dataset: KolDataset,
        req: &QueryRequest,
    ) -> DbResult<PaginatedResult<KolRecord>> {
        Ok(match dataset {
            KolDataset::Year2024 => self
                .fetch_page::<Kol2024>(dataset.table(), req)
                .await?
                .map(KolRecord::Yearly),
            KolDataset::Total | KolDataset::India => self
                .fetch_page::<KolTotal>(dataset.table(), req)
                .await?
                .map(KolRecord::Regional),
        })
    }

    pub async fn get_kol(&self, dataset: KolDataset, no: i64) -> DbResult<Option<KolRecord>> {
        let key = SqlValue::Integer(no);
        Ok(match dataset {
            KolDataset::Year2024 => self
                .fetch_by_key::<Kol2024>(dataset.table(), key)
                .await?
                .map(KolRecord::Yearly),
            KolDataset::Total | KolDataset::India => self
                .fetch_by_key::<KolTotal>(dataset.table(), key)
                .await?
                .map(KolRecord::Regional),
        })
    }

    /// Distribution across every dataset that carries `dimension`
    /// (`platform` spans all three, `region` only the regional ones).
    ///
    /// Each dataset is filtered by its own allow-list. A dataset that cannot
    /// express a filter the request carries (the 2024 table has no region)
    /// is left out rather than counted unfiltered.
    pub async fn kol_distribution(
        &self,
        dimension: &str,
        req: &QueryRequest,
    ) -> DbResult<Vec<AggregationBucket>> {
        KOL_TOTAL.dimension(dimension)?;
        let candidates: Vec<&'static TableSpec> = KolDataset::ALL
            .iter()
            .map(|d| d.table())
            .filter(|t| t.has_dimension(dimension))
            .collect();

        let mut parts = Vec::with_capacity(candidates.len());
        for table in &candidates {
            let unsupported = req.filters.keys().any(|key| {
                table.filter(key).is_none() && candidates.iter().any(|t| t.filter(key).is_some())
            });
            if unsupported {
                continue;
            }
            parts.push((*table, QueryBuilder::new(*table).where_clause(req)?));
        }
        self.aggregation()
            .combined_distribution(&parts, dimension)
            .await
    }

    /// YouTube video links for the dashboard carousel, sampled at random.
    ///
    /// Draws from the regional datasets first (channel handles containing
    /// `@` are skipped). When no region is requested and fewer than `limit`
    /// links were found, the 2024 dataset tops the list up.
    pub async fn kol_videos(&self, limit: u32, region: Option<&str>) -> DbResult<Vec<KolVideo>> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let region_clause = if region.is_some() { " AND Region = ?" } else { "" };
        let regional = |table: &TableSpec, source: &str| {
            format!(
                "SELECT kol_account AS \"kolAccount\", kol_url AS url, Platform AS platform, \
                 Region AS region, '{source}' AS source FROM {} \
                 WHERE instr(kol_url, '{YOUTUBE_HOST}') > 0 AND instr(kol_url, '@') = 0{region_clause}",
                table.name
            )
        };
        let sql = format!(
            "SELECT * FROM ({} UNION ALL {}) ORDER BY RANDOM() LIMIT ?",
            regional(&KOL_TOTAL, "kol_total"),
            regional(&KOL_INDIA, "kol_india"),
        );
        let mut params = Vec::with_capacity(3);
        if let Some(region) = region {
            params.push(SqlValue::from(region));
            params.push(SqlValue::from(region));
        }
        params.push(SqlValue::Integer(i64::from(limit)));
        let mut videos: Vec<KolVideo> = self.conn.query(&sql, &params).await?;

        let found = u32::try_from(videos.len()).unwrap_or(u32::MAX);
        if region.is_none() && found < limit {
            let top_up: Vec<KolVideo> = self
                .conn
                .query(
                    &format!(
                        "SELECT kol_account AS \"kolAccount\", kol_post_url AS url, platform, \
                         NULL AS region, 'kol_2024' AS source FROM kol_tribit_2024 \
                         WHERE instr(kol_post_url, '{YOUTUBE_HOST}') > 0 \
                         ORDER BY RANDOM() LIMIT ?"
                    ),
                    &[SqlValue::Integer(i64::from(limit - found))],
                )
                .await?;
            videos.extend(top_up);
        }
        Ok(videos)
    }

    pub async fn kol_statistics(&self) -> DbResult<KolStatistics> {
        let stats: Option<KolStatistics> = self
            .conn
            .query_one(
                r#"
                SELECT
                  (SELECT COUNT(*) FROM kol_tribit_total) AS "totalKols",
                  (SELECT COUNT(*) FROM kol_tribit_2024) AS "kols2024",
                  (SELECT COUNT(*) FROM kol_tribit_india) AS "indiaKols",
                  (SELECT COUNT(DISTINCT platform) FROM kol_tribit_2024) AS platforms
                "#,
                &[],
            )
            .await?;
        Ok(stats.unwrap_or(KolStatistics {
            total_kols: 0,
            kols_2024: 0,
            india_kols: 0,
            platforms: 0,
        }))
    }

    pub async fn insert_kol(&self, dataset: KolDataset, record: &KolRecord) -> DbResult<ExecuteResult> {
        let stmt = match (dataset, record) {
            (KolDataset::Year2024, KolRecord::Yearly(row)) => insert_yearly(row),
            (KolDataset::Total | KolDataset::India, KolRecord::Regional(row)) => {
                insert_regional(dataset.table(), row)
            }
            _ => {
                return Err(ValidationError::new(
                    "dataset",
                    format!("record shape does not match dataset '{}'", dataset.as_str()),
                )
                .into())
            }
        };
        self.run(stmt).await
    }
}
