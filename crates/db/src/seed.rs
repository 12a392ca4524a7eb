// crates/db/src/seed.rs
//! Demo dataset for the in-memory backend.
//!
//! Loaded only when the entry point asks for `Memory { seed_demo: true }`.

use crate::catalog::{KOL_INDIA, KOL_TOTAL};
use crate::pagination::Statement;
use crate::queries::ads::{self, NewAdCampaign};
use crate::queries::insight::{self, InsightSearch};
use crate::queries::kol::{self, Kol2024, KolTotal};
use crate::queries::testing::{self, TestIdea};

const KOL_TOTAL_ROWS: &[(i64, &str, &str, &str, &str)] = &[
    (1, "North America", "YouTube", "MrBeast", "https://www.youtube.com/watch?v=_7iXfXX7tIA"),
    (2, "Europe", "YouTube", "PewDiePie", "https://www.youtube.com/watch?v=PHgc8Q6qTjc"),
    (3, "Asia", "YouTube", "T-Series", "https://www.youtube.com/watch?v=BBAyRBTfsOU"),
    (4, "North America", "YouTube", "Dude Perfect", "https://www.youtube.com/watch?v=3a7cHPy04s8"),
    (5, "Europe", "YouTube", "DanTDM", "https://www.youtube.com/watch?v=jfKfPfyJRdk"),
    (6, "Asia", "YouTube", "SET India", "https://www.youtube.com/watch?v=3CNhK90D6fU"),
    (7, "North America", "TikTok", "Markiplier", "https://www.tiktok.com/@markiplier"),
    (8, "Europe", "Instagram", "Jacksepticeye", "https://www.instagram.com/jacksepticeye"),
    (9, "Asia", "YouTube", "CarryMinati", "https://www.youtube.com/watch?v=GOFQN8otiYs"),
    (10, "North America", "YouTube", "Smosh", "https://www.youtube.com/watch?v=aYrLUSBrawI"),
];

const KOL_INDIA_ROWS: &[(i64, &str, &str, &str, &str)] = &[
    (1, "India", "YouTube", "Technical Guruji", "https://www.youtube.com/@TechnicalGuruji"),
    (2, "India", "YouTube", "Trakin Tech", "https://www.youtube.com/@TrakinTech"),
    (3, "India", "Instagram", "Beebom", "https://www.instagram.com/beebomco"),
];

const KOL_2024_ROWS: &[(i64, &str, &str, &str)] = &[
    (1, "youtube", "Demo Creator 1", "https://www.youtube.com/watch?v=demo1"),
    (2, "youtube", "Demo Creator 2", "https://www.youtube.com/watch?v=demo2"),
    (3, "tiktok", "Demo Creator 3", "https://www.tiktok.com/@demo3/video/1"),
];

const INSIGHT_ROWS: &[(&str, &str, &str, i64, f64)] = &[
    ("tribit speaker", "US", "en", 1000, 0.5),
    ("bluetooth speaker", "US", "en", 5000, 1.2),
    ("waterproof speaker", "UK", "en", 2400, 0.9),
    ("altavoz bluetooth", "ES", "es", 3100, 0.4),
    ("enceinte bluetooth", "FR", "fr", 1900, 0.6),
];

fn regional(no: i64, region: &str, platform: &str, account: &str, url: &str) -> KolTotal {
    KolTotal {
        no,
        region: Some(region.to_string()),
        platform: Some(platform.to_string()),
        kol_account: Some(account.to_string()),
        kol_url: Some(url.to_string()),
    }
}

fn campaigns() -> Vec<NewAdCampaign> {
    let campaign = |name: &str, platform: &str, status: &str, start: &str, budget: f64, spent: f64, impressions: i64, clicks: i64, conversions: i64| NewAdCampaign {
        name: name.to_string(),
        platform: platform.to_string(),
        status: status.to_string(),
        start_date: Some(start.to_string()),
        end_date: None,
        budget,
        spent,
        impressions,
        clicks,
        conversions,
    };
    vec![
        campaign("Summer Sale 2024", "facebook", "active", "2024-06-01", 5000.0, 3250.0, 215_000, 1830, 142),
        campaign("Brand Awareness Q2", "google", "active", "2024-04-01", 8000.0, 6420.0, 450_000, 4000, 210),
        campaign("Product Launch - StormBox", "tiktok", "completed", "2024-03-15", 3000.0, 3000.0, 192_000, 1300, 88),
        campaign("Retargeting Campaign", "instagram", "paused", "2024-05-10", 2000.0, 1100.0, 80_300, 552, 61),
    ]
}

fn test_ideas() -> Vec<TestIdea> {
    let idea = |id: &str, title: &str, category: &str, priority: &str, status: &str, description: &str| TestIdea {
        id: id.to_string(),
        title: title.to_string(),
        description: Some(description.to_string()),
        hypothesis: None,
        status: status.to_string(),
        priority: priority.to_string(),
        category: Some(category.to_string()),
        expected_impact: None,
        created_by: Some("demo".to_string()),
        created_at: "2024-05-01T00:00:00Z".to_string(),
        updated_at: "2024-05-01T00:00:00Z".to_string(),
    };
    vec![
        idea("idea-1", "Video Length Test", "Creative", "high", "pending", "Test 15s vs 30s video formats"),
        idea("idea-2", "Age Group Targeting", "Audience", "medium", "active", "Compare 18-24 vs 25-34 demographics"),
        idea("idea-3", "Instagram vs TikTok", "Platform", "high", "completed", "Test same content across platforms"),
        idea("idea-4", "UGC vs Professional", "Content", "medium", "pending", "Test user-generated vs professional content"),
        idea("idea-5", "Post Time Optimization", "Timing", "low", "active", "Morning vs evening posting times"),
    ]
}

/// Insert statements for the full demo dataset.
pub fn demo_statements() -> Vec<Statement> {
    let mut out = Vec::new();

    out.extend(KOL_TOTAL_ROWS.iter().map(|&(no, region, platform, account, url)| {
        kol::insert_regional(&KOL_TOTAL, &regional(no, region, platform, account, url))
    }));
    out.extend(KOL_INDIA_ROWS.iter().map(|&(no, region, platform, account, url)| {
        kol::insert_regional(&KOL_INDIA, &regional(no, region, platform, account, url))
    }));
    out.extend(KOL_2024_ROWS.iter().map(|&(no, platform, account, url)| {
        kol::insert_yearly(&Kol2024 {
            no,
            platform: Some(platform.to_string()),
            kol_account: Some(account.to_string()),
            kol_post_url: Some(url.to_string()),
        })
    }));
    out.extend(INSIGHT_ROWS.iter().map(|&(keyword, region, language, volume, cpc)| {
        insight::insert_statement(&InsightSearch {
            id: 0,
            file_source: Some("demo".to_string()),
            modifier_type: None,
            modifier: None,
            suggestion: Some(keyword.to_string()),
            language: Some(language.to_string()),
            region: Some(region.to_string()),
            keyword: Some(keyword.to_string()),
            search_volume: Some(volume),
            cost_per_click: Some(cpc),
        })
    }));
    out.extend(campaigns().iter().map(ads::insert_statement));
    out.extend(test_ideas().iter().map(testing::insert_statement));

    out
}

#[cfg(test)]
mod tests {
    use crate::{Database, KolDataset, QueryRequest};

    #[tokio::test]
    async fn test_seeded_memory_database() {
        let db = Database::new_in_memory_seeded().await.unwrap();
        let stats = db.kol_statistics().await.unwrap();
        assert_eq!(stats.total_kols, 10);
        assert_eq!(stats.kols_2024, 3);
        assert_eq!(stats.india_kols, 3);

        let insights = db.list_insights(&QueryRequest::default()).await.unwrap();
        assert_eq!(insights.total, 5);
        assert_eq!(insights.data[0].keyword.as_deref(), Some("bluetooth speaker"));

        let kols = db
            .list_kols(KolDataset::Total, &QueryRequest::default().with_page(1, 4))
            .await
            .unwrap();
        assert_eq!(kols.data.len(), 4);
        assert_eq!(kols.total_pages, 3);
    }
}
