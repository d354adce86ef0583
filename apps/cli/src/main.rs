//! PromptDesk CLI: assemble and inspect procurement-assistant chat sessions.
//!
//! Resolves a buyer's latest system prompt, loads their knowledge documents,
//! and prints the combined context that a chat model would receive.

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
