//! Article store: the [`ArticleStore`] contract plus its two backends.
//!
//! - [`Storage`] — libSQL (Turso embedded) database file, the production store
//! - [`MemoryStore`] — in-process store for tests and demos
//!
//! The resolver only ever reads; writes happen during import.

mod memory;
mod migrations;

use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use libsql::{Connection, Database, params};
use tijdmachine_shared::{ArticleRecord, Result, TijdmachineError, calendar};

pub use memory::MemoryStore;

// ---------------------------------------------------------------------------
// Store contract
// ---------------------------------------------------------------------------

/// Keyed and range lookups over stored articles.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Persist a record and return its assigned identifier.
    async fn insert_article(&self, record: &ArticleRecord) -> Result<i64>;

    /// All articles published on exactly `date`.
    async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<ArticleRecord>>;

    /// All articles published on `day`/`month` of any year, ordered by id.
    async fn find_by_day_month(&self, day: u32, month: u32) -> Result<Vec<ArticleRecord>>;

    /// The article closest to `day`/`month` by day-of-year distance,
    /// with that distance. `(None, 0)` when the store is empty.
    async fn find_closest_by_day_month(
        &self,
        day: u32,
        month: u32,
    ) -> Result<(Option<ArticleRecord>, u32)>;

    /// Every stored article, ordered by id.
    async fn list_articles(&self) -> Result<Vec<ArticleRecord>>;

    /// Number of stored articles.
    async fn count_articles(&self) -> Result<u64>;
}

/// Pick the closest record from a full listing.
pub(crate) fn closest_of(
    records: &[ArticleRecord],
    day: u32,
    month: u32,
) -> Result<(Option<ArticleRecord>, u32)> {
    calendar::validate_day_month(day, month)?;
    Ok(match calendar::closest_by_day_month(records, day, month) {
        Some((record, distance)) => (Some(record.clone()), distance),
        None => (None, 0),
    })
}

// ---------------------------------------------------------------------------
// libSQL storage
// ---------------------------------------------------------------------------

const SELECT_COLUMNS: &str =
    "SELECT id, publication_date, newspaper, content, language FROM articles";

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TijdmachineError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| TijdmachineError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| TijdmachineError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` for reads only.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TijdmachineError::Storage(format!(
                "database not found at {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| TijdmachineError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| TijdmachineError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        TijdmachineError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(TijdmachineError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    /// Get one article by identifier.
    pub async fn get_article(&self, id: i64) -> Result<Option<ArticleRecord>> {
        let mut records = self
            .query_articles(&format!("{SELECT_COLUMNS} WHERE id = ?1"), params![id])
            .await?;
        Ok(records.pop())
    }

    /// Run an article query and map every row.
    async fn query_articles(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<ArticleRecord>> {
        let mut rows = self
            .conn
            .query(sql, params)
            .await
            .map_err(|e| TijdmachineError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| TijdmachineError::Storage(e.to_string()))?
        {
            results.push(row_to_article(&row)?);
        }
        Ok(results)
    }
}

#[async_trait]
impl ArticleStore for Storage {
    async fn insert_article(&self, record: &ArticleRecord) -> Result<i64> {
        self.check_writable()?;
        record.validate()?;
        let date = record.publication_date.format("%Y-%m-%d").to_string();
        self.conn
            .execute(
                "INSERT INTO articles (publication_date, newspaper, content, language)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    date.as_str(),
                    record.newspaper.as_str(),
                    record.content.as_str(),
                    record.language.as_str(),
                ],
            )
            .await
            .map_err(|e| TijdmachineError::Storage(e.to_string()))?;
        Ok(self.conn.last_insert_rowid())
    }

    async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<ArticleRecord>> {
        let date = date.format("%Y-%m-%d").to_string();
        self.query_articles(
            &format!("{SELECT_COLUMNS} WHERE publication_date = ?1 ORDER BY id"),
            params![date.as_str()],
        )
        .await
    }

    async fn find_by_day_month(&self, day: u32, month: u32) -> Result<Vec<ArticleRecord>> {
        calendar::validate_day_month(day, month)?;
        let month = format!("{month:02}");
        let day = format!("{day:02}");
        self.query_articles(
            &format!(
                "{SELECT_COLUMNS}
                 WHERE strftime('%m', publication_date) = ?1
                   AND strftime('%d', publication_date) = ?2
                 ORDER BY id"
            ),
            params![month.as_str(), day.as_str()],
        )
        .await
    }

    async fn find_closest_by_day_month(
        &self,
        day: u32,
        month: u32,
    ) -> Result<(Option<ArticleRecord>, u32)> {
        // The distance metric and the tie-break are easier to get right in Rust
        // than in SQL; the table is small.
        let records = self.list_articles().await?;
        closest_of(&records, day, month)
    }

    async fn list_articles(&self) -> Result<Vec<ArticleRecord>> {
        self.query_articles(&format!("{SELECT_COLUMNS} ORDER BY id"), params![])
            .await
    }

    async fn count_articles(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM articles", params![])
            .await
            .map_err(|e| TijdmachineError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => row
                .get::<i64>(0)
                .map(|n| n.max(0) as u64)
                .map_err(|e| TijdmachineError::Storage(e.to_string())),
            Ok(None) => Ok(0),
            Err(e) => Err(TijdmachineError::Storage(e.to_string())),
        }
    }
}

/// Convert a database row to an [`ArticleRecord`].
fn row_to_article(row: &libsql::Row) -> Result<ArticleRecord> {
    let id: i64 = row
        .get(0)
        .map_err(|e| TijdmachineError::Storage(e.to_string()))?;
    let date: String = row
        .get(1)
        .map_err(|e| TijdmachineError::Storage(e.to_string()))?;
    let language: String = row
        .get(4)
        .map_err(|e| TijdmachineError::Storage(e.to_string()))?;

    Ok(ArticleRecord {
        id: Some(id),
        publication_date: NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
            TijdmachineError::Storage(format!("invalid date '{date}' for article {id}: {e}"))
        })?,
        newspaper: row
            .get::<String>(2)
            .map_err(|e| TijdmachineError::Storage(e.to_string()))?,
        content: row
            .get::<String>(3)
            .map_err(|e| TijdmachineError::Storage(e.to_string()))?,
        language: language.parse()?,
    })
}
