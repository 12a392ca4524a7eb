/// Inline schema for the dashboard tables.
///
/// Applied statement by statement on connect. Every statement is idempotent
/// (`IF NOT EXISTS`), so re-applying against an existing file is a no-op.
pub const SCHEMA: &[&str] = &[
    // KOL datasets
    r#"
CREATE TABLE IF NOT EXISTS kol_tribit_total (
    "No." INTEGER PRIMARY KEY,
    Region TEXT,
    Platform TEXT,
    kol_account TEXT,
    kol_url TEXT
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS kol_tribit_2024 (
    "No." INTEGER PRIMARY KEY,
    platform TEXT,
    kol_account TEXT,
    kol_post_url TEXT
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS kol_tribit_india (
    "No." INTEGER PRIMARY KEY,
    Region TEXT,
    Platform TEXT,
    kol_account TEXT,
    kol_url TEXT
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_kol_total_platform ON kol_tribit_total(Platform);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_kol_total_region   ON kol_tribit_total(Region);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_kol_2024_platform  ON kol_tribit_2024(platform);"#,
    // Keyword insights
    r#"
CREATE TABLE IF NOT EXISTS insight_search (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_source TEXT,
    modifier_type TEXT,
    modifier TEXT,
    suggestion TEXT,
    language TEXT,
    region TEXT,
    keyword TEXT,
    search_volume INTEGER,
    cost_per_click REAL
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_insight_search_region ON insight_search(region);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_insight_search_volume ON insight_search(search_volume DESC);"#,
    // Ads
    r#"
CREATE TABLE IF NOT EXISTS ad_campaigns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    platform TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'draft',
    start_date TEXT,
    end_date TEXT,
    budget REAL NOT NULL DEFAULT 0,
    spent REAL NOT NULL DEFAULT 0,
    impressions INTEGER NOT NULL DEFAULT 0,
    clicks INTEGER NOT NULL DEFAULT 0,
    conversions INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_ad_campaigns_platform ON ad_campaigns(platform);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_ad_campaigns_status   ON ad_campaigns(status);"#,
    // A/B test ideas
    r#"
CREATE TABLE IF NOT EXISTS testing_ideas (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    hypothesis TEXT,
    status TEXT NOT NULL DEFAULT 'draft',
    priority TEXT NOT NULL DEFAULT 'medium',
    category TEXT,
    expected_impact TEXT,
    created_by TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_testing_ideas_status ON testing_ideas(status);"#,
];
