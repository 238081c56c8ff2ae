#![cfg_attr(not(feature = "tui"), allow(dead_code))]

mod cli;
mod error;
mod export;
mod geocode;
mod logging;
mod model;
mod orchestrator;
mod session;
mod store;
#[cfg(feature = "tui")]
mod tui;
mod view;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::run(args).await
}
