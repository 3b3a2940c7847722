//! Application configuration for Tijdmachine.
//!
//! User config lives at `~/.tijdmachine/tijdmachine.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TijdmachineError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "tijdmachine.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".tijdmachine";

/// Default database file name inside the config directory.
const DATABASE_FILE_NAME: &str = "articles.db";

// ---------------------------------------------------------------------------
// Config structs (matching tijdmachine.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Text generation (OpenAI-compatible) settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Wikipedia lookup settings.
    #[serde(default)]
    pub wikipedia: WikipediaConfig,

    /// Enrichment pipeline tuning.
    #[serde(default)]
    pub enrichment: EnrichmentSettings,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Article database path. Defaults to `~/.tijdmachine/articles.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// API base URL (anything speaking `/chat/completions`).
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model used for every generation call.
    #[serde(default = "default_model")]
    pub model: String,

    /// Default sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_openai_timeout")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_openai_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_openai_timeout(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_openai_timeout() -> u64 {
    30
}

/// `[wikipedia]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikipediaConfig {
    /// Wikipedia language edition.
    #[serde(default = "default_wiki_language")]
    pub language: String,

    /// Maximum number of pages combined per lookup.
    #[serde(default = "default_wiki_max_results")]
    pub max_results: u32,

    /// Maximum characters returned per lookup.
    #[serde(default = "default_wiki_char_limit")]
    pub char_limit: usize,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_wiki_timeout")]
    pub timeout_secs: u64,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            language: default_wiki_language(),
            max_results: default_wiki_max_results(),
            char_limit: default_wiki_char_limit(),
            timeout_secs: default_wiki_timeout(),
        }
    }
}

fn default_wiki_language() -> String {
    "nl".into()
}
fn default_wiki_max_results() -> u32 {
    3
}
fn default_wiki_char_limit() -> usize {
    4_000
}
fn default_wiki_timeout() -> u64 {
    15
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentSettings {
    /// Maximum sentences in the article summary.
    #[serde(default = "default_summary_sentences")]
    pub summary_sentences: u32,

    /// Temperature for the summary call.
    #[serde(default = "default_summary_temperature")]
    pub summary_temperature: f32,

    /// Maximum keywords kept from extraction.
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,

    /// Maximum keywords looked up for context.
    #[serde(default = "default_max_context_items")]
    pub max_context_items: usize,

    /// Concurrent context lookups.
    #[serde(default = "default_lookup_concurrency")]
    pub lookup_concurrency: usize,

    /// Time budget per external call, in seconds.
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Language everything is translated into.
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Period the articles come from, used to focus context summaries.
    #[serde(default = "default_era")]
    pub era: String,

    /// Article text beyond this many characters is cut before summarizing.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            summary_sentences: default_summary_sentences(),
            summary_temperature: default_summary_temperature(),
            max_keywords: default_max_keywords(),
            max_context_items: default_max_context_items(),
            lookup_concurrency: default_lookup_concurrency(),
            call_timeout_secs: default_call_timeout(),
            target_language: default_target_language(),
            era: default_era(),
            max_content_chars: default_max_content_chars(),
        }
    }
}

fn default_summary_sentences() -> u32 {
    3
}
fn default_summary_temperature() -> f32 {
    0.3
}
fn default_max_keywords() -> usize {
    5
}
fn default_max_context_items() -> usize {
    3
}
fn default_lookup_concurrency() -> usize {
    3
}
fn default_call_timeout() -> u64 {
    30
}
fn default_target_language() -> String {
    "Dutch".into()
}
fn default_era() -> String {
    "18th century".into()
}
fn default_max_content_chars() -> usize {
    12_000
}

// ---------------------------------------------------------------------------
// Enrichment config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime enrichment configuration handed to the pipeline.
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    pub summary_sentences: u32,
    pub summary_temperature: f32,
    pub max_keywords: usize,
    pub max_context_items: usize,
    /// Always at least 1.
    pub lookup_concurrency: usize,
    pub call_timeout: Duration,
    pub target_language: String,
    pub era: String,
    pub max_content_chars: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for EnrichmentConfig {
    fn from(config: &AppConfig) -> Self {
        let e = &config.enrichment;
        Self {
            summary_sentences: e.summary_sentences,
            summary_temperature: e.summary_temperature,
            max_keywords: e.max_keywords,
            max_context_items: e.max_context_items,
            lookup_concurrency: e.lookup_concurrency.max(1),
            call_timeout: Duration::from_secs(e.call_timeout_secs),
            target_language: e.target_language.clone(),
            era: e.era.clone(),
            max_content_chars: e.max_content_chars,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.tijdmachine/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TijdmachineError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.tijdmachine/tijdmachine.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolve the article database path from config, falling back to the config dir.
pub fn database_path(config: &AppConfig) -> Result<PathBuf> {
    match &config.defaults.database_path {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(config_dir()?.join(DATABASE_FILE_NAME)),
    }
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TijdmachineError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        TijdmachineError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TijdmachineError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TijdmachineError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TijdmachineError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the API key from the env var named in config.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.openai.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(TijdmachineError::config(format!(
            "API key not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("OPENAI_API_KEY"));
        assert!(toml_str.contains("gpt-4o-mini"));
        assert!(!toml_str.contains("database_path"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.wikipedia.char_limit, 4_000);
        assert_eq!(parsed.enrichment.max_keywords, 5);
        assert_eq!(parsed.openai.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
database_path = "/tmp/articles.db"

[enrichment]
max_context_items = 2
lookup_concurrency = 0
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.enrichment.max_context_items, 2);
        assert_eq!(config.enrichment.max_keywords, 5);
        assert_eq!(config.wikipedia.language, "nl");
        assert_eq!(
            database_path(&config).unwrap(),
            PathBuf::from("/tmp/articles.db")
        );

        let runtime = EnrichmentConfig::from(&config);
        assert_eq!(runtime.lookup_concurrency, 1);
        assert_eq!(runtime.call_timeout, Duration::from_secs(30));
    }

    #[test]
    fn enrichment_config_defaults() {
        let config = EnrichmentConfig::default();
        assert_eq!(config.summary_sentences, 3);
        assert_eq!(config.max_keywords, 5);
        assert_eq!(config.max_context_items, 3);
        assert_eq!(config.target_language, "Dutch");
    }

    #[test]
    fn api_key_missing() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.openai.api_key_env = "TM_TEST_NONEXISTENT_KEY_12345".into();
        let result = resolve_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
