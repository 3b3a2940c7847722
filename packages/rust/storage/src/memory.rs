//! In-process article store.

use async_trait::async_trait;
use chrono::NaiveDate;
use tijdmachine_shared::{ArticleRecord, Result, calendar};
use tokio::sync::RwLock;

use crate::{ArticleStore, closest_of};

/// Articles held in memory, with ids assigned sequentially from 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    records: Vec<ArticleRecord>,
    next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding `records`, assigning ids in order.
    pub async fn with_records(records: impl IntoIterator<Item = ArticleRecord>) -> Result<Self> {
        let store = Self::new();
        for record in records {
            store.insert_article(&record).await?;
        }
        Ok(store)
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn insert_article(&self, record: &ArticleRecord) -> Result<i64> {
        record.validate()?;
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = inner.next_id;
        inner.records.push(record.clone().with_id(id));
        Ok(id)
    }

    async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<ArticleRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .records
            .iter()
            .filter(|r| r.publication_date == date)
            .cloned()
            .collect())
    }

    async fn find_by_day_month(&self, day: u32, month: u32) -> Result<Vec<ArticleRecord>> {
        calendar::validate_day_month(day, month)?;
        let inner = self.inner.read().await;
        Ok(inner
            .records
            .iter()
            .filter(|r| r.day_month() == (day, month))
            .cloned()
            .collect())
    }

    async fn find_closest_by_day_month(
        &self,
        day: u32,
        month: u32,
    ) -> Result<(Option<ArticleRecord>, u32)> {
        let inner = self.inner.read().await;
        closest_of(&inner.records, day, month)
    }

    async fn list_articles(&self) -> Result<Vec<ArticleRecord>> {
        Ok(self.inner.read().await.records.clone())
    }

    async fn count_articles(&self) -> Result<u64> {
        Ok(self.inner.read().await.records.len() as u64)
    }
}
