//! Date-proximity article resolver.
//!
//! Given a day and month, prefer an article published on that day in any
//! year (chosen at random among several); otherwise fall back to the article
//! whose publication day-of-year is closest (`|a - b| mod 365`, no wrap at
//! the year end).

use rand::seq::SliceRandom;
use serde::Serialize;
use tijdmachine_shared::{ArticleRecord, Result, calendar};
use tijdmachine_storage::ArticleStore;
use tracing::{debug, info, instrument};

/// How a resolved article relates to the requested day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchKind {
    /// Published on the requested day/month; `candidates` articles qualified.
    Exact { candidates: usize },
    /// Nearest article, `distance` days away by day of year.
    Closest { distance: u32 },
}

/// An article picked by [`Resolver::resolve_detailed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub record: ArticleRecord,
    #[serde(rename = "match")]
    pub kind: MatchKind,
}

/// Selects one article for a day of the year from an [`ArticleStore`].
pub struct Resolver<S> {
    store: S,
}

impl<S: ArticleStore> Resolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Article for `day`/`month`, or `None` when the store is empty.
    pub async fn resolve(&self, day: u32, month: u32) -> Result<Option<ArticleRecord>> {
        Ok(self
            .resolve_detailed(day, month)
            .await?
            .map(|resolution| resolution.record))
    }

    /// Like [`resolve`](Self::resolve), also reporting how the article matched.
    ///
    /// Day and month outside `1..=31` / `1..=12` are rejected. Store failures
    /// are returned as errors and never reported as "no article".
    #[instrument(skip(self))]
    pub async fn resolve_detailed(&self, day: u32, month: u32) -> Result<Option<Resolution>> {
        calendar::validate_day_month(day, month)?;

        let exact = self.store.find_by_day_month(day, month).await?;
        let picked = exact.choose(&mut rand::thread_rng()).cloned();
        if let Some(record) = picked {
            info!(id = ?record.id, candidates = exact.len(), "exact day match");
            return Ok(Some(Resolution {
                record,
                kind: MatchKind::Exact {
                    candidates: exact.len(),
                },
            }));
        }

        let (closest, distance) = self.store.find_closest_by_day_month(day, month).await?;
        match closest {
            Some(record) => {
                info!(id = ?record.id, distance, "closest day match");
                Ok(Some(Resolution {
                    record,
                    kind: MatchKind::Closest { distance },
                }))
            }
            None => {
                debug!("store is empty");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use tijdmachine_shared::{Language, TijdmachineError};
    use tijdmachine_storage::MemoryStore;

    fn article(y: i32, m: u32, d: u32) -> ArticleRecord {
        ArticleRecord::new(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            "Oprechte Haerlemsche Courant",
            format!("Uit Amsterdam, den {d} van maand {m}, {y}."),
            Language::Dutch,
        )
        .unwrap()
    }

    async fn resolver(records: Vec<ArticleRecord>) -> Resolver<MemoryStore> {
        Resolver::new(MemoryStore::with_records(records).await.unwrap())
    }

    #[tokio::test]
    async fn exact_match_is_a_member_of_the_matching_set() {
        let r = resolver(vec![
            article(1740, 3, 14),
            article(1755, 3, 14),
            article(1780, 3, 14),
            article(1780, 3, 15),
        ])
        .await;

        for _ in 0..20 {
            let resolution = r.resolve_detailed(14, 3).await.unwrap().unwrap();
            assert_eq!(resolution.record.day_month(), (14, 3));
            assert_eq!(resolution.kind, MatchKind::Exact { candidates: 3 });
        }
    }

    #[tokio::test]
    async fn falls_back_to_closest_day() {
        let r = resolver(vec![article(1750, 6, 1), article(1750, 6, 10)]).await;
        let resolution = r.resolve_detailed(3, 6).await.unwrap().unwrap();
        assert_eq!(resolution.record.day_month(), (1, 6));
        assert_eq!(resolution.kind, MatchKind::Closest { distance: 2 });
    }

    #[tokio::test]
    async fn empty_store_resolves_to_none() {
        let r = resolver(Vec::new()).await;
        assert!(r.resolve(1, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn equal_distance_prefers_lowest_id() {
        // June 1 and June 5 are both two days from June 3.
        let r = resolver(vec![article(1760, 6, 5), article(1770, 6, 1)]).await;
        let record = r.resolve(3, 6).await.unwrap().unwrap();
        assert_eq!(record.id, Some(1));
        assert_eq!(record.day_month(), (5, 6));
    }

    #[tokio::test]
    async fn distance_does_not_wrap_around_year_end() {
        // Jan 1 is day 1, Jul 1 day 182, Dec 31 day 365.
        let r = resolver(vec![article(1750, 7, 1), article(1750, 12, 31)]).await;
        let resolution = r.resolve_detailed(1, 1).await.unwrap().unwrap();
        assert_eq!(resolution.record.day_month(), (1, 7));
        assert_eq!(resolution.kind, MatchKind::Closest { distance: 181 });

        let resolution = r.resolve_detailed(30, 12).await.unwrap().unwrap();
        assert_eq!(resolution.record.day_month(), (31, 12));
        assert_eq!(resolution.kind, MatchKind::Closest { distance: 1 });
    }

    #[tokio::test]
    async fn leap_day_records_count_as_feb_28() {
        let r = resolver(vec![article(1752, 2, 29), article(1750, 3, 5)]).await;
        let resolution = r.resolve_detailed(1, 3).await.unwrap().unwrap();
        assert_eq!(resolution.record.day_month(), (29, 2));
        assert_eq!(resolution.kind, MatchKind::Closest { distance: 1 });
    }

    #[tokio::test]
    async fn rejects_out_of_range_input() {
        let r = resolver(vec![article(1750, 1, 1)]).await;
        assert!(r.resolve(0, 1).await.is_err());
        assert!(r.resolve(32, 1).await.is_err());
        assert!(r.resolve(1, 13).await.is_err());
    }

    struct BrokenStore;

    #[async_trait]
    impl ArticleStore for BrokenStore {
        async fn insert_article(&self, _: &ArticleRecord) -> Result<i64> {
            Err(TijdmachineError::Storage("disk gone".into()))
        }
        async fn find_by_date(&self, _: NaiveDate) -> Result<Vec<ArticleRecord>> {
            Err(TijdmachineError::Storage("disk gone".into()))
        }
        async fn find_by_day_month(&self, _: u32, _: u32) -> Result<Vec<ArticleRecord>> {
            Err(TijdmachineError::Storage("disk gone".into()))
        }
        async fn find_closest_by_day_month(
            &self,
            _: u32,
            _: u32,
        ) -> Result<(Option<ArticleRecord>, u32)> {
            Err(TijdmachineError::Storage("disk gone".into()))
        }
        async fn list_articles(&self) -> Result<Vec<ArticleRecord>> {
            Err(TijdmachineError::Storage("disk gone".into()))
        }
        async fn count_articles(&self) -> Result<u64> {
            Err(TijdmachineError::Storage("disk gone".into()))
        }
    }

    #[tokio::test]
    async fn store_failure_is_not_an_empty_result() {
        let r = Resolver::new(BrokenStore);
        let err = r.resolve(1, 1).await.unwrap_err();
        assert!(matches!(err, TijdmachineError::Storage(_)));
    }
}
