//! Terminal and JSON presentation of a selected article.

use std::fmt::{self, Write};

use serde::Serialize;
use tijdmachine_core::MatchKind;
use tijdmachine_shared::{ArticleRecord, EnrichmentResult};

const NOT_AVAILABLE: &str = "(not available)";
const PREVIEW_CHARS: usize = 60;

/// Everything `show`/`today` print, in JSON form as-is.
#[derive(Debug, Serialize)]
pub(crate) struct ShowOutput {
    pub article: ArticleRecord,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub matched: Option<MatchKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_article: Option<String>,
}

/// Human-readable rendering. Absent fields are shown as not available.
pub(crate) fn render_text(
    output: &ShowOutput,
    show_translation: bool,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_text(&mut out, output, show_translation)?;
    Ok(out)
}

fn write_text(out: &mut impl Write, output: &ShowOutput, show_translation: bool) -> fmt::Result {
    let article = &output.article;

    writeln!(out)?;
    writeln!(
        out,
        "  {}, {} ({})",
        article.newspaper,
        article.publication_date.format("%-d %B %Y"),
        article.language.name()
    )?;
    match output.matched {
        Some(MatchKind::Exact { candidates }) => {
            writeln!(out, "  Published on this day ({candidates} candidate(s))")?;
        }
        Some(MatchKind::Closest { distance }) => {
            writeln!(out, "  Closest article, {distance} day(s) away")?;
        }
        None => {}
    }
    writeln!(out)?;
    for line in article.content.lines() {
        writeln!(out, "  {line}")?;
    }

    if show_translation {
        section(out, "Modern Dutch")?;
        writeln!(
            out,
            "  {}",
            output.translated_article.as_deref().unwrap_or(NOT_AVAILABLE)
        )?;
    }

    let Some(enrichment) = &output.enrichment else {
        return writeln!(out);
    };

    section(out, "Summary")?;
    writeln!(
        out,
        "  {}",
        enrichment.translated_summary.as_deref().unwrap_or(NOT_AVAILABLE)
    )?;

    section(out, "Keywords")?;
    if enrichment.keywords.is_empty() {
        writeln!(out, "  {NOT_AVAILABLE}")?;
    } else {
        writeln!(out, "  {}", enrichment.keywords.join(", "))?;
    }

    section(out, "Historical context")?;
    if enrichment.translated_contexts.is_empty() {
        writeln!(out, "  {NOT_AVAILABLE}")?;
    }
    for entry in &enrichment.translated_contexts {
        writeln!(out, "  • {}", entry.keyword)?;
        writeln!(out, "    {}", entry.text)?;
    }
    writeln!(out)
}

fn section(out: &mut impl Write, title: &str) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "  {title}")?;
    writeln!(out, "  {}", "-".repeat(title.chars().count()))
}

/// One row of `list` output.
pub(crate) fn list_line(article: &ArticleRecord) -> String {
    let first_line = article.content.lines().next().unwrap_or_default().trim();
    let preview: String = first_line.chars().take(PREVIEW_CHARS).collect();
    let ellipsis = if first_line.chars().count() > PREVIEW_CHARS {
        "…"
    } else {
        ""
    };
    format!(
        "{:>5}  {}  {}  {}  {preview}{ellipsis}",
        article.id.map(|id| id.to_string()).unwrap_or_default(),
        article.publication_date,
        article.language,
        article.newspaper,
    )
}
