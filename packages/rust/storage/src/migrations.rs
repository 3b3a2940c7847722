//! SQL migration definitions for the article database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: articles",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Historical newspaper articles
CREATE TABLE IF NOT EXISTS articles (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    publication_date TEXT NOT NULL,
    newspaper        TEXT NOT NULL,
    content          TEXT NOT NULL,
    language         TEXT NOT NULL CHECK (language IN ('nl', 'fr'))
);

CREATE INDEX IF NOT EXISTS idx_articles_date ON articles(publication_date);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
