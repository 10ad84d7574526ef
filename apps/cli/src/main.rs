//! chatsync CLI: save AI chat transcripts to Flomo.
//!
//! Reads a saved chat page (ChatGPT, Claude, Kimi, DeepSeek), turns the
//! conversation into Markdown and posts it to a Flomo webhook.

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
