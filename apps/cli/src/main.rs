//! tecdoc-export — TecDoc catalog export tool.
//!
//! Searches articles by supplier and number, normalizes every related
//! payload into flat records, and writes one CSV file per table.

mod commands;

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
