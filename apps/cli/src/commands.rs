//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Datelike, Local};
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tijdmachine_core::{
    EnrichmentPipeline, EnrichmentProgress, MatchKind, Resolution, Resolver,
};
use tijdmachine_services::{OpenAiClient, WikipediaClient};
use tijdmachine_shared::{
    AppConfig, ArticleRecord, EnrichmentConfig, database_path, init_config, load_config,
    resolve_api_key,
};
use tijdmachine_storage::{ArticleStore, Storage};
use tracing::info;

use crate::render::{self, ShowOutput};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Tijdmachine: a historical newspaper article for every day of the year.
#[derive(Parser)]
#[command(
    name = "tijdmachine",
    version,
    about = "Show the historical newspaper article closest to a day of the year, enriched with summaries and context.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Article database (defaults to the configured path).
    #[arg(long, env = "TIJDMACHINE_DB", global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Show the article for today's date.
    Today {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Show the article for a given day and month, or by id.
    Show {
        /// Day of the month (1-31).
        #[arg(long, required_unless_present = "id")]
        day: Option<u32>,

        /// Month (1-12).
        #[arg(long, required_unless_present = "id")]
        month: Option<u32>,

        /// Show a stored article by id instead of resolving a date.
        #[arg(long, conflicts_with_all = ["day", "month"])]
        id: Option<i64>,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Import articles from a JSON array of records.
    Import {
        /// JSON file with `publication_date`, `newspaper`, `content`, `language` per record.
        file: PathBuf,
    },

    /// List stored articles.
    List,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Output options shared by `today` and `show`.
#[derive(Args, Clone, Copy, Debug)]
pub(crate) struct ViewArgs {
    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Skip the LLM enrichment pipeline.
    #[arg(long)]
    pub no_enrich: bool,

    /// Also translate the full article text to modern Dutch.
    #[arg(long)]
    pub translate_original: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "tijdmachine=warn",
        1 => "tijdmachine=info",
        2 => "tijdmachine=debug",
        _ => "tijdmachine=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let db = cli.db.as_deref();
    match cli.command {
        Command::Today { view } => {
            let today = Local::now().date_naive();
            cmd_show_date(db, today.day(), today.month(), view).await
        }
        Command::Show {
            day,
            month,
            id,
            view,
        } => match (id, day, month) {
            (Some(id), _, _) => cmd_show_id(db, id, view).await,
            (None, Some(day), Some(month)) => cmd_show_date(db, day, month, view).await,
            _ => Err(eyre!("either --id or both --day and --month are required")),
        },
        Command::Import { file } => cmd_import(db, &file).await,
        Command::List => cmd_list(db).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

/// Database path from the `--db` flag, else from config.
fn resolve_db_path(flag: Option<&Path>, config: &AppConfig) -> Result<PathBuf> {
    match flag {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(database_path(config)?),
    }
}

async fn open_for_reading(db: Option<&Path>, config: &AppConfig) -> Result<Storage> {
    let path = resolve_db_path(db, config)?;
    Storage::open_readonly(&path).await.wrap_err_with(|| {
        format!(
            "cannot open article database at {}; run `tijdmachine import` first",
            path.display()
        )
    })
}

async fn cmd_show_date(db: Option<&Path>, day: u32, month: u32, view: ViewArgs) -> Result<()> {
    let config = load_config()?;
    let storage = open_for_reading(db, &config).await?;
    let resolver = Resolver::new(storage);

    let Some(Resolution { record, kind }) = resolver.resolve_detailed(day, month).await? else {
        println!("No articles stored yet. Run `tijdmachine import <file>` to add some.");
        return Ok(());
    };

    info!(id = ?record.id, day, month, "article selected");
    present(&config, record, Some(kind), view).await
}

async fn cmd_show_id(db: Option<&Path>, id: i64, view: ViewArgs) -> Result<()> {
    let config = load_config()?;
    let storage = open_for_reading(db, &config).await?;

    let record = storage
        .get_article(id)
        .await?
        .ok_or_else(|| eyre!("no article with id {id}"))?;

    present(&config, record, None, view).await
}

/// Enrich (unless disabled) and print one article.
async fn present(
    config: &AppConfig,
    record: ArticleRecord,
    kind: Option<MatchKind>,
    view: ViewArgs,
) -> Result<()> {
    let mut output = ShowOutput {
        article: record,
        matched: kind,
        enrichment: None,
        translated_article: None,
    };

    if !view.no_enrich {
        let pipeline = build_pipeline(config)?;
        let progress = CliProgress::new(!view.json);

        output.enrichment = Some(
            pipeline
                .enrich_with_progress(&output.article.content, &progress)
                .await,
        );
        if view.translate_original {
            progress.phase("Translating article");
            output.translated_article = pipeline.translate_article(&output.article).await;
        }

        progress.finish();
    }

    if view.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", render::render_text(&output, view.translate_original)?);
    }
    Ok(())
}

fn build_pipeline(config: &AppConfig) -> Result<EnrichmentPipeline> {
    let api_key = resolve_api_key(config)?;
    let generator = OpenAiClient::new(&config.openai, api_key)?;
    let lookup = WikipediaClient::new(&config.wikipedia)?;

    Ok(EnrichmentPipeline::new(
        Arc::new(generator),
        Arc::new(lookup),
        EnrichmentConfig::from(config),
    ))
}

async fn cmd_import(db: Option<&Path>, file: &Path) -> Result<()> {
    let config = load_config()?;
    let path = resolve_db_path(db, &config)?;

    let raw = std::fs::read_to_string(file)
        .wrap_err_with(|| format!("cannot read {}", file.display()))?;
    let records: Vec<ArticleRecord> = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("{} is not a JSON array of articles", file.display()))?;

    // Validate everything before the first write.
    for (i, record) in records.iter().enumerate() {
        record
            .validate()
            .wrap_err_with(|| format!("record {i} in {}", file.display()))?;
    }

    let storage = Storage::open(&path).await?;
    for record in &records {
        storage.insert_article(record).await?;
    }

    info!(count = records.len(), db = %path.display(), "import complete");
    println!(
        "Imported {} article(s) into {} ({} total).",
        records.len(),
        path.display(),
        storage.count_articles().await?
    );
    Ok(())
}

async fn cmd_list(db: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let storage = open_for_reading(db, &config).await?;

    let articles = storage.list_articles().await?;
    if articles.is_empty() {
        println!("No articles stored.");
        return Ok(());
    }

    for article in &articles {
        println!("{}", render::list_line(article));
    }
    println!();
    println!("  {} article(s)", articles.len());
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Enrichment progress shown as an indicatif spinner on stderr.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new(visible: bool) -> Self {
        if !visible {
            return Self {
                spinner: ProgressBar::hidden(),
            };
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl EnrichmentProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn task_progress(&self, current: usize, total: usize, detail: &str) {
        self.spinner
            .set_message(format!("[{current}/{total}] {detail}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_requires_date_or_id() {
        assert!(Cli::try_parse_from(["tijdmachine", "show", "--day", "3"]).is_err());
        assert!(Cli::try_parse_from(["tijdmachine", "show", "--day", "3", "--month", "6"]).is_ok());
        assert!(Cli::try_parse_from(["tijdmachine", "show", "--id", "7"]).is_ok());
        assert!(
            Cli::try_parse_from(["tijdmachine", "show", "--id", "7", "--day", "3"]).is_err()
        );
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tijdmachine",
            "today",
            "--json",
            "--no-enrich",
            "--db",
            "/tmp/articles.db",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.db.as_deref(), Some(Path::new("/tmp/articles.db")));
        match cli.command {
            Command::Today { view } => {
                assert!(view.json);
                assert!(view.no_enrich);
                assert!(!view.translate_original);
            }
            _ => panic!("expected today"),
        }
    }

    #[test]
    fn db_flag_overrides_config() {
        let config = AppConfig::default();
        let flag = PathBuf::from("/data/kranten.db");
        assert_eq!(resolve_db_path(Some(&flag), &config).unwrap(), flag);
    }
}
