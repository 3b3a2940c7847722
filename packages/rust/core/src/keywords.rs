//! Parsing of keyword lists returned by the text generator.

use serde_json::Value;
use tracing::{debug, warn};

/// Extract up to `max` keywords from a model response.
///
/// The response should contain a JSON array of strings, possibly wrapped in
/// prose or a fenced block. The span from the first `[` to the last `]` is
/// parsed; anything that is not an array yields an empty list. Non-string
/// and blank items are skipped, the rest are trimmed.
pub fn parse_keyword_list(response: &str, max: usize) -> Vec<String> {
    let (Some(start), Some(end)) = (response.find('['), response.rfind(']')) else {
        warn!("no JSON array in keyword response");
        return Vec::new();
    };
    if end < start {
        warn!("no JSON array in keyword response");
        return Vec::new();
    }

    let items = match serde_json::from_str::<Value>(&response[start..=end]) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!("keyword response is not a list");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "keyword response is not valid JSON");
            return Vec::new();
        }
    };

    let keywords: Vec<String> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            _ => None,
        })
        .take(max)
        .collect();

    debug!(count = keywords.len(), "parsed keywords");
    keywords
}
