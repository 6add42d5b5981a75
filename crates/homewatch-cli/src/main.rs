mod cli;
mod commands;
mod completions;
mod config;
mod error;
mod executor;
mod logging;
mod output;
mod setup;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        completions::generate_completions(shell);
        return;
    }

    if let Err(err) = run(cli).await {
        error::handle_error(err);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let foreground = matches!(cli.command, Commands::Start(_));
    let _guard = logging::init(cli.verbose, foreground)?;
    let config = config::CliConfig::load(cli.config.as_deref());

    match cli.command {
        Commands::Start(args) => commands::start::run(cli.db_path, args, &config).await,
        Commands::Run(args) => {
            let executor = executor::create(cli.db_path, &config).await?;
            commands::run::run(executor, args, cli.format).await
        }
        Commands::Task { command } => {
            let executor = executor::create(cli.db_path, &config).await?;
            commands::task::run(executor, command, cli.format).await
        }
        Commands::Completions { .. } => Ok(()),
    }
}
