//! Tijdmachine CLI: today's historical newspaper article, enriched.
//!
//! Picks the stored article closest to a day of the year and adds a summary,
//! keywords and encyclopedic context through an LLM pipeline.

mod commands;
mod render;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
