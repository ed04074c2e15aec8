mod cli;
mod engine;
mod logging;
mod metrics;
mod model;
mod orchestrator;
mod storage;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = args.json || args.text;

    cli::run(args).await?;
    // Blocking stdin readers can outlive the runtime; exit explicitly in scripted modes.
    if is_non_tui {
        std::process::exit(0);
    }
    Ok(())
}
