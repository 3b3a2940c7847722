//! LLM enrichment orchestrator.
//!
//! Runs the stages for one article in order:
//!
//! 1. Summarize the article text
//! 2. Translate the summary (falls back to the summary itself)
//! 3. Extract keywords from the summary
//! 4. Look up and condense context for the first keywords (bounded fan-out)
//! 5. Translate each context and localize its keyword
//!
//! Every external call goes through [`guarded`]: a failure or timeout
//! degrades the field it feeds and never aborts the run.

use std::sync::Arc;

use tijdmachine_shared::{
    ArticleRecord, ContextEntry, EnrichmentConfig, EnrichmentResult, KnowledgeLookup,
    TextGenerator,
};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, info_span, instrument, warn};

use crate::guard::{Stage, guarded, non_empty, or_original};
use crate::keywords::parse_keyword_list;
use crate::prompts;

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Enrichment pipeline over injected text-generation and lookup clients.
pub struct EnrichmentPipeline {
    generator: Arc<dyn TextGenerator>,
    lookup: Arc<dyn KnowledgeLookup>,
    config: EnrichmentConfig,
}

impl EnrichmentPipeline {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        lookup: Arc<dyn KnowledgeLookup>,
        config: EnrichmentConfig,
    ) -> Self {
        Self {
            generator,
            lookup,
            config,
        }
    }

    pub fn config(&self) -> &EnrichmentConfig {
        &self.config
    }

    /// Enrich one article's text. Never fails; see [`EnrichmentResult`].
    pub async fn enrich(&self, content: &str) -> EnrichmentResult {
        self.enrich_with_progress(content, &SilentEnrichmentProgress)
            .await
    }

    /// [`enrich`](Self::enrich), reporting each phase to `progress`.
    #[instrument(skip_all, fields(generator = self.generator.name(), lookup = self.lookup.name(), content_len = content.len()))]
    pub async fn enrich_with_progress(
        &self,
        content: &str,
        progress: &dyn EnrichmentProgress,
    ) -> EnrichmentResult {
        let mut result = EnrichmentResult::default();

        if content.trim().is_empty() {
            warn!("article has no content, skipping enrichment");
            return result;
        }

        // --- Stage 1: summary ---
        progress.phase("Summarizing article");
        let Some(summary) = self.summarize(content).await else {
            info!("no summary, later stages skipped");
            return result;
        };

        // --- Stage 2: translated summary ---
        progress.phase("Translating summary");
        let translated_summary = self.translate(&summary, Stage::TranslateSummary).await;

        // --- Stage 3: keywords ---
        progress.phase("Extracting keywords");
        let keywords = self.extract_keywords(&summary).await;

        // --- Stage 4: context per keyword ---
        progress.phase("Looking up historical context");
        let contexts = self.lookup_contexts(&keywords, progress).await;

        // --- Stage 5: translated contexts ---
        progress.phase("Translating context");
        let mut translated_contexts = Vec::with_capacity(contexts.len());
        for (i, entry) in contexts.iter().enumerate() {
            progress.task_progress(i + 1, contexts.len(), &entry.keyword);
            let text = self.translate(&entry.text, Stage::TranslateContext).await;
            let keyword = self.localize_keyword(&entry.keyword).await;
            translated_contexts.push(ContextEntry::new(keyword, text));
        }

        info!(
            keywords = keywords.len(),
            contexts = contexts.len(),
            "enrichment complete"
        );

        result.summary = Some(summary);
        result.translated_summary = Some(translated_summary);
        result.keywords = keywords;
        result.contexts = contexts;
        result.translated_contexts = translated_contexts;
        result
    }

    /// Full article text translated from its source language.
    #[instrument(skip_all, fields(id = ?record.id, language = %record.language))]
    pub async fn translate_article(&self, record: &ArticleRecord) -> Option<String> {
        if record.content.trim().is_empty() {
            return None;
        }
        let instruction = prompts::translate(
            Some(record.language.name()),
            &self.config.target_language,
        );
        guarded(Stage::TranslateArticle, self.config.call_timeout, async {
            non_empty(
                self.generator
                    .complete(&instruction, &record.content, None)
                    .await?,
            )
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Stages
    // -----------------------------------------------------------------------

    async fn summarize(&self, content: &str) -> Option<String> {
        let content = truncate_content(content, self.config.max_content_chars);
        let instruction = prompts::summarize(self.config.summary_sentences);
        guarded(Stage::Summarize, self.config.call_timeout, async {
            non_empty(
                self.generator
                    .complete(&instruction, content, Some(self.config.summary_temperature))
                    .await?,
            )
        })
        .await
    }

    /// Translation of `text`, or `text` itself when the stage fails.
    async fn translate(&self, text: &str, stage: Stage) -> String {
        let instruction = prompts::translate(None, &self.config.target_language);
        let translated = guarded(stage, self.config.call_timeout, async {
            non_empty(self.generator.complete(&instruction, text, None).await?)
        })
        .await;
        or_original(translated, text)
    }

    async fn extract_keywords(&self, summary: &str) -> Vec<String> {
        let instruction =
            prompts::keywords(self.config.max_keywords, &self.config.target_language);
        let response = guarded(Stage::ExtractKeywords, self.config.call_timeout, async {
            self.generator.complete(&instruction, summary, None).await
        })
        .await;

        match response {
            Some(text) => parse_keyword_list(&text, self.config.max_keywords),
            None => Vec::new(),
        }
    }

    /// Lookup + condense for the first keywords, concurrently, in keyword order.
    async fn lookup_contexts(
        &self,
        keywords: &[String],
        progress: &dyn EnrichmentProgress,
    ) -> Vec<ContextEntry> {
        let semaphore = Arc::new(Semaphore::new(self.config.lookup_concurrency.max(1)));
        let condense = Arc::new(prompts::condense(
            &self.config.target_language,
            &self.config.era,
        ));

        // Dropping the set aborts every task still queued or running.
        let mut tasks = JoinSet::new();
        let mut total = 0;
        for (index, keyword) in keywords
            .iter()
            .take(self.config.max_context_items)
            .enumerate()
        {
            let keyword = keyword.clone();
            let sem = semaphore.clone();
            let generator = self.generator.clone();
            let lookup = self.lookup.clone();
            let condense = condense.clone();
            let limit = self.config.call_timeout;
            let span = info_span!("context", keyword = %keyword);
            total += 1;

            tasks.spawn(
                async move {
                    let entry = async {
                        let _permit = sem.acquire_owned().await.ok()?;

                        let raw =
                            match guarded(Stage::Lookup, limit, lookup.lookup(&keyword)).await {
                                Some(Some(raw)) if !raw.trim().is_empty() => raw,
                                Some(_) => {
                                    debug!("no encyclopedic content");
                                    return None;
                                }
                                None => return None,
                            };

                        let text = guarded(Stage::Condense, limit, async {
                            non_empty(generator.complete(&condense, &raw, None).await?)
                        })
                        .await?;

                        Some(ContextEntry::new(keyword, text))
                    }
                    .await;
                    (index, entry)
                }
                .instrument(span),
            );
        }

        let mut slots: Vec<Option<ContextEntry>> = vec![None; total];
        let mut done = 0;
        while let Some(joined) = tasks.join_next().await {
            done += 1;
            match joined {
                Ok((index, Some(entry))) => {
                    progress.task_progress(done, total, &entry.keyword);
                    slots[index] = Some(entry);
                }
                Ok((_, None)) => progress.task_progress(done, total, "no context"),
                Err(e) => warn!(error = %e, "context task failed"),
            }
        }
        slots.into_iter().flatten().collect()
    }

    async fn localize_keyword(&self, keyword: &str) -> String {
        let instruction = prompts::localize_keyword(&self.config.target_language);
        let localized = guarded(Stage::LocalizeKeyword, self.config.call_timeout, async {
            let reply = self.generator.complete(&instruction, keyword, None).await?;
            let first_line = reply.lines().map(str::trim).find(|l| !l.is_empty());
            non_empty(first_line.unwrap_or_default().trim_matches('"').to_string())
        })
        .await;
        or_original(localized, keyword)
    }
}

/// Cut `content` to at most `max_chars` characters on a char boundary.
fn truncate_content(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            debug!(max_chars, "article truncated for the model context window");
            &content[..idx]
        }
        None => content,
    }
}

// ---------------------------------------------------------------------------
// Progress trait
// ---------------------------------------------------------------------------

/// Progress callback for enrichment operations.
pub trait EnrichmentProgress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Task-level progress within the current phase.
    fn task_progress(&self, current: usize, total: usize, detail: &str);
}

/// No-op enrichment progress.
pub struct SilentEnrichmentProgress;

impl EnrichmentProgress for SilentEnrichmentProgress {
    fn phase(&self, _name: &str) {}
    fn task_progress(&self, _current: usize, _total: usize, _detail: &str) {}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
