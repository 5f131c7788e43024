//! LeadBridge CLI: lead scoring and CRM custom-field reconciliation.
//!
//! Turns website form submissions into scored contacts whose custom
//! fields match the live CRM catalog.

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