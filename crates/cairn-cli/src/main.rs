//! Cairn CLI
//!
//! Command-line interface for versioned plans and dependency-aware
//! execution.

mod args;
mod cli;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use cairn_core::PlannerBuilder;
use clap::Parser;
use cli::Cli;
use log::info;
use renderer::TerminalRenderer;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        no_color,
        command,
    } = Args::parse();

    let planner = PlannerBuilder::new()
        .with_database_path(database_file)
        .build()
        .await
        .context("Failed to initialize planner")?;

    let renderer = TerminalRenderer::new(!no_color);
    let cli = Cli::new(planner, renderer);

    info!("Cairn started");

    match command {
        Some(Commands::Plan { command }) => cli.handle_plan_command(command).await,
        None => cli.list_plans().await,
    }
}
