//! Core domain types: stored articles and their enrichment output.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TijdmachineError};

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Source language of a stored article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "nl")]
    Dutch,
    #[serde(rename = "fr")]
    French,
}

impl Language {
    /// Tag stored in the database (`nl` / `fr`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dutch => "nl",
            Self::French => "fr",
        }
    }

    /// English language name, used in prompts.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dutch => "Dutch",
            Self::French => "French",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = TijdmachineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nl" => Ok(Self::Dutch),
            "fr" => Ok(Self::French),
            other => Err(TijdmachineError::validation(format!(
                "unknown language tag '{other}' (expected 'nl' or 'fr')"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// ArticleRecord
// ---------------------------------------------------------------------------

/// One stored historical newspaper article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Identifier assigned by the store; `None` until persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Publication date.
    pub publication_date: NaiveDate,
    /// Newspaper name.
    pub newspaper: String,
    /// Full text of the article.
    pub content: String,
    /// Source language.
    pub language: Language,
}

impl ArticleRecord {
    /// Build an unsaved record, rejecting empty newspaper names or content.
    pub fn new(
        publication_date: NaiveDate,
        newspaper: impl Into<String>,
        content: impl Into<String>,
        language: Language,
    ) -> Result<Self> {
        let record = Self {
            id: None,
            publication_date,
            newspaper: newspaper.into(),
            content: content.into(),
            language,
        };
        record.validate()?;
        Ok(record)
    }

    /// Check the non-empty invariants (used for records coming from JSON).
    pub fn validate(&self) -> Result<()> {
        if self.newspaper.trim().is_empty() {
            return Err(TijdmachineError::validation("newspaper name is empty"));
        }
        if self.content.trim().is_empty() {
            return Err(TijdmachineError::validation(format!(
                "article from {} has no content",
                self.publication_date
            )));
        }
        Ok(())
    }

    /// Same record with a store-assigned identifier.
    pub fn with_id(self, id: i64) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }

    /// `(day, month)` of the publication date.
    pub fn day_month(&self) -> (u32, u32) {
        (self.publication_date.day(), self.publication_date.month())
    }
}

// ---------------------------------------------------------------------------
// Enrichment output
// ---------------------------------------------------------------------------

/// A keyword and the historical context retained for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub keyword: String,
    pub text: String,
}

impl ContextEntry {
    pub fn new(keyword: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            text: text.into(),
        }
    }
}

/// Everything the enrichment pipeline produced for one article.
///
/// Absent or empty fields mean the corresponding stage (or one it depends on)
/// failed; they are never filled with placeholder text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    /// Short summary of the article.
    pub summary: Option<String>,
    /// Summary in the target language (the summary itself if translation failed).
    pub translated_summary: Option<String>,
    /// Extracted keywords, in ranked order.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Condensed context per keyword, in keyword order.
    #[serde(default)]
    pub contexts: Vec<ContextEntry>,
    /// Translated contexts with localized keywords, in the same order.
    #[serde(default)]
    pub translated_contexts: Vec<ContextEntry>,
}

impl EnrichmentResult {
    /// True when no stage produced anything.
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.translated_summary.is_none()
            && self.keywords.is_empty()
            && self.contexts.is_empty()
            && self.translated_contexts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn language_parse_and_display() {
        assert_eq!("nl".parse::<Language>().unwrap(), Language::Dutch);
        assert_eq!(" FR ".parse::<Language>().unwrap(), Language::French);
        assert_eq!(Language::French.to_string(), "fr");
        assert!("de".parse::<Language>().is_err());
    }

    #[test]
    fn record_rejects_empty_fields() {
        assert!(ArticleRecord::new(date(1750, 6, 1), "", "tekst", Language::Dutch).is_err());
        assert!(
            ArticleRecord::new(date(1750, 6, 1), "Rotterdamse courant", "  ", Language::Dutch)
                .is_err()
        );
    }

    #[test]
    fn record_serialization() {
        let record = ArticleRecord::new(
            date(1738, 3, 14),
            "Rotterdamse courant",
            "Men schrijft uit Londen...",
            Language::Dutch,
        )
        .unwrap()
        .with_id(7);

        let json = serde_json::to_string(&record).expect("serialize");
        assert!(json.contains(r#""language":"nl""#));
        assert!(json.contains(r#""publication_date":"1738-03-14""#));

        let parsed: ArticleRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, record);
        assert_eq!(parsed.day_month(), (14, 3));
    }

    #[test]
    fn record_without_id_deserializes() {
        let json = r#"{"publication_date":"1712-01-05","newspaper":"Gazette de Rotterdam","content":"On mande de Paris","language":"fr"}"#;
        let parsed: ArticleRecord = serde_json::from_str(json).expect("deserialize");
        assert!(parsed.id.is_none());
        assert_eq!(parsed.language, Language::French);
    }

    #[test]
    fn enrichment_result_default_is_empty() {
        let result = EnrichmentResult::default();
        assert!(result.is_empty());

        let result = EnrichmentResult {
            summary: Some("samenvatting".into()),
            ..Default::default()
        };
        assert!(!result.is_empty());
    }
}
