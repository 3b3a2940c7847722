//! Knowledge lookup against the MediaWiki API of one Wikipedia edition.
//!
//! A lookup searches for the term, fetches the intro extract of the top
//! hits, strips their HTML, and returns them as one block of prose capped
//! at the configured character limit.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use serde::Deserialize;
use tijdmachine_shared::{KnowledgeLookup, Result, TijdmachineError, WikipediaConfig};
use tracing::{debug, instrument};
use url::Url;

// ---------------------------------------------------------------------------
// Wire types (formatversion=2)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: Vec<ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    title: String,
    #[serde(default)]
    extract: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Wikipedia lookup client.
#[derive(Debug, Clone)]
pub struct WikipediaClient {
    client: Client,
    api_url: Url,
    max_results: u32,
    char_limit: usize,
}

impl WikipediaClient {
    /// Build a client for the configured language edition.
    pub fn new(config: &WikipediaConfig) -> Result<Self> {
        let api_url = Url::parse(&format!(
            "https://{}.wikipedia.org/w/api.php",
            config.language
        ))
        .map_err(|e| {
            TijdmachineError::config(format!(
                "invalid wikipedia language '{}': {e}",
                config.language
            ))
        })?;

        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TijdmachineError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url,
            max_results: config.max_results.max(1),
            char_limit: config.char_limit,
        })
    }

    /// Point the client at another MediaWiki `api.php`, e.g. a mirror.
    pub fn with_api_url(mut self, api_url: Url) -> Self {
        self.api_url = api_url;
        self
    }

    /// Titles of the best search hits for `term`.
    async fn search(&self, term: &str) -> Result<Vec<String>> {
        let limit = self.max_results.to_string();
        let url = Url::parse_with_params(
            self.api_url.as_str(),
            &[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", term),
                ("srlimit", limit.as_str()),
                ("format", "json"),
                ("formatversion", "2"),
            ],
        )
        .map_err(|e| TijdmachineError::Lookup(format!("invalid search url: {e}")))?;

        let body = self.get(url).await?;
        parse_search(&body)
    }

    /// Intro extracts (as plain text) for `titles`, in the order given.
    async fn extracts(&self, titles: &[String]) -> Result<Vec<(String, String)>> {
        let joined = titles.join("|");
        let url = Url::parse_with_params(
            self.api_url.as_str(),
            &[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("titles", joined.as_str()),
                ("format", "json"),
                ("formatversion", "2"),
            ],
        )
        .map_err(|e| TijdmachineError::Lookup(format!("invalid extracts url: {e}")))?;

        let body = self.get(url).await?;
        parse_extracts(&body, titles)
    }

    async fn get(&self, url: Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TijdmachineError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TijdmachineError::Lookup(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| TijdmachineError::Network(format!("{url}: failed to read body: {e}")))
    }
}

#[async_trait]
impl KnowledgeLookup for WikipediaClient {
    fn name(&self) -> &str {
        "wikipedia"
    }

    #[instrument(skip(self), fields(api = %self.api_url))]
    async fn lookup(&self, term: &str) -> Result<Option<String>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(None);
        }

        let titles = self.search(term).await?;
        if titles.is_empty() {
            debug!("no search hits");
            return Ok(None);
        }

        let pages = self.extracts(&titles).await?;
        let content = render_pages(&pages, self.char_limit);
        debug!(pages = pages.len(), chars = content.chars().count(), "lookup complete");

        Ok((!content.is_empty()).then_some(content))
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn parse_search(body: &str) -> Result<Vec<String>> {
    let parsed: SearchResponse = serde_json::from_str(body)
        .map_err(|e| TijdmachineError::parse(format!("invalid search response: {e}")))?;
    Ok(parsed
        .query
        .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
        .unwrap_or_default())
}

/// Extracts reordered to match `titles`; pages without text are dropped.
fn parse_extracts(body: &str, titles: &[String]) -> Result<Vec<(String, String)>> {
    let parsed: ExtractResponse = serde_json::from_str(body)
        .map_err(|e| TijdmachineError::parse(format!("invalid extracts response: {e}")))?;
    let mut pages = parsed.query.map(|q| q.pages).unwrap_or_default();

    let mut ordered = Vec::with_capacity(pages.len());
    for title in titles {
        if let Some(pos) = pages.iter().position(|p| &p.title == title) {
            let page = pages.swap_remove(pos);
            let text = page.extract.as_deref().map(html_to_text).unwrap_or_default();
            if !text.is_empty() {
                ordered.push((page.title, text));
            }
        }
    }
    Ok(ordered)
}

/// Strip markup and collapse blank lines.
fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let raw: String = fragment.root_element().text().collect();
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render pages as `Page:`/`Summary:` blocks, capped at `char_limit` characters.
fn render_pages(pages: &[(String, String)], char_limit: usize) -> String {
    let rendered = pages
        .iter()
        .map(|(title, text)| format!("Page: {title}\nSummary: {text}"))
        .collect::<Vec<_>>()
        .join("\n\n");

    match rendered.char_indices().nth(char_limit) {
        Some((idx, _)) => rendered[..idx].to_string(),
        None => rendered,
    }
}
