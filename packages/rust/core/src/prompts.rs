//! System instructions sent to the text generator, one per stage.

pub(crate) const SUMMARIZE_LEAD: &str = "Summarize the following historical newspaper article";
pub(crate) const TRANSLATE_LEAD: &str = "Translate the following";
pub(crate) const KEYWORDS_LEAD: &str = "Analyze the following historical text";
pub(crate) const CONDENSE_LEAD: &str = "Summarize the following historical information";
pub(crate) const LOCALIZE_LEAD: &str = "Give the modern";

pub(crate) fn summarize(max_sentences: u32) -> String {
    format!(
        "{SUMMARIZE_LEAD} in {max_sentences} sentences or less. \
         Focus on the main events and historical significance."
    )
}

/// Translation into `target`; `source` names the input language when known.
pub(crate) fn translate(source: Option<&str>, target: &str) -> String {
    let from = match source {
        Some(language) => format!("{language} text"),
        None => "text".to_string(),
    };
    format!(
        "{TRANSLATE_LEAD} {from} to modern {target}. \
         Preserve the historical context and meaning. \
         Maintain the original text formatting. Reply with the translation only."
    )
}

pub(crate) fn keywords(max: usize, target: &str) -> String {
    format!(
        "{KEYWORDS_LEAD} and identify the {max} most important entities that would be \
         useful for searching historical context in an encyclopedia: historical figures, \
         significant places, historical events, organizations or institutions, and \
         important concepts of the period. Always use the {target} name if it exists, even \
         if the text is in another language, and capitalize names properly. \
         Return ONLY a JSON array of strings, for example: \
         [\"Willem van Oranje\", \"Vrede van Utrecht\", \"Amsterdam\"]"
    )
}

pub(crate) fn condense(target: &str, era: &str) -> String {
    format!(
        "{CONDENSE_LEAD} in {target} in 2-3 sentences, focusing on the historical context \
         most relevant to a newspaper article from the {era}. Use modern {target} that \
         today's readers understand."
    )
}

pub(crate) fn localize_keyword(target: &str) -> String {
    format!(
        "{LOCALIZE_LEAD} {target} name for the following term. Reply with the name only. \
         If there is no {target} name, repeat the term unchanged."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_start_with_their_lead() {
        assert!(summarize(3).starts_with(SUMMARIZE_LEAD));
        assert!(summarize(3).contains("3 sentences"));
        assert!(translate(None, "Dutch").starts_with(TRANSLATE_LEAD));
        assert!(keywords(5, "Dutch").starts_with(KEYWORDS_LEAD));
        assert!(condense("Dutch", "18th century").starts_with(CONDENSE_LEAD));
        assert!(localize_keyword("Dutch").starts_with(LOCALIZE_LEAD));
    }

    #[test]
    fn leads_are_distinguishable() {
        assert!(!condense("Dutch", "18th century").starts_with(SUMMARIZE_LEAD));
        assert!(!summarize(3).starts_with(CONDENSE_LEAD));
    }

    #[test]
    fn translate_names_source_language() {
        let prompt = translate(Some("French"), "Dutch");
        assert!(prompt.starts_with("Translate the following French text to modern Dutch."));
        assert!(translate(None, "Dutch").starts_with("Translate the following text to modern Dutch."));
    }

    #[test]
    fn condense_mentions_era() {
        assert!(condense("Dutch", "18th century").contains("from the 18th century"));
    }
}
