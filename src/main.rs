mod api;
mod auth;
mod cli;
mod commands;
mod config;
mod dashboard;
mod error;
mod lead;
mod session;
mod spreadsheet;
mod store;
mod ui;
mod upload;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "nrecupera=debug"
    } else {
        "nrecupera=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    commands::run(cli).await
}
