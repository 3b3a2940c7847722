//! Per-stage failure isolation.
//!
//! Every external call made by the pipeline goes through [`guarded`], which
//! bounds it with a timeout and turns any failure into `None` plus a `warn!`
//! event naming the stage. Nothing past this point ever sees an error.

use std::future::Future;
use std::time::Duration;

use tijdmachine_shared::{Result, TijdmachineError};
use tracing::warn;

/// One externally-backed step of enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Summarize,
    TranslateSummary,
    ExtractKeywords,
    Lookup,
    Condense,
    TranslateContext,
    LocalizeKeyword,
    TranslateArticle,
}

impl Stage {
    /// Name used in log events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::TranslateSummary => "translate_summary",
            Self::ExtractKeywords => "extract_keywords",
            Self::Lookup => "lookup",
            Self::Condense => "condense",
            Self::TranslateContext => "translate_context",
            Self::LocalizeKeyword => "localize_keyword",
            Self::TranslateArticle => "translate_article",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run `fut` under `limit`; failure and timeout both yield `None`.
pub async fn guarded<T, F>(stage: Stage, limit: Duration, fut: F) -> Option<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            warn!(stage = stage.as_str(), error = %e, "stage failed, degrading");
            None
        }
        Err(_) => {
            let e = TijdmachineError::timeout(stage.as_str(), limit.as_millis() as u64);
            warn!(stage = stage.as_str(), error = %e, "stage timed out, degrading");
            None
        }
    }
}

/// Trimmed model output, or an error when nothing is left.
pub fn non_empty(text: String) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TijdmachineError::Generation("empty response".into()));
    }
    if trimmed.len() == text.len() {
        Ok(text)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Fallback used by translation stages: the source text, unchanged.
pub fn or_original(translated: Option<String>, original: &str) -> String {
    translated.unwrap_or_else(|| original.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn success_passes_through() {
        let out = guarded(Stage::Summarize, LIMIT, async { Ok(7) }).await;
        assert_eq!(out, Some(7));
    }

    #[tokio::test]
    async fn error_degrades_to_none() {
        let out: Option<u32> = guarded(Stage::Lookup, LIMIT, async {
            Err(TijdmachineError::Lookup("offline".into()))
        })
        .await;
        assert_eq!(out, None);
    }

    #[tokio::test]
    async fn timeout_degrades_to_none() {
        let out = guarded(Stage::Condense, LIMIT, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late")
        })
        .await;
        assert_eq!(out, None);
    }

    #[test]
    fn non_empty_trims_and_rejects_blank() {
        assert_eq!(non_empty("  Amsterdam \n".into()).unwrap(), "Amsterdam");
        assert_eq!(non_empty("Leiden".into()).unwrap(), "Leiden");
        assert!(non_empty(" \n\t".into()).is_err());
        assert!(non_empty(String::new()).is_err());
    }

    #[test]
    fn or_original_prefers_translation() {
        assert_eq!(or_original(Some("nieuw".into()), "oud"), "nieuw");
        assert_eq!(or_original(None, "oud"), "oud");
    }

    #[test]
    fn stage_names() {
        assert_eq!(Stage::TranslateSummary.as_str(), "translate_summary");
        assert_eq!(Stage::LocalizeKeyword.to_string(), "localize_keyword");
    }
}
