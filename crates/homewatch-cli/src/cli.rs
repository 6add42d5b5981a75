use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "homewatch")]
#[command(version, about = "Homewatch - Scheduled maintenance and reports for your smart home")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (defaults to ~/.homewatch/homewatch.db)
    #[arg(long, global = true, env = "HOMEWATCH_DB_PATH")]
    pub db_path: Option<String>,

    /// Configuration file (defaults to ~/.config/homewatch/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Run the scheduler in the foreground until interrupted
    Start(StartArgs),

    /// Run one task now, bypassing its schedule
    Run(RunArgs),

    /// Task management
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
}

#[derive(Args)]
pub struct StartArgs {
    /// Seconds between configuration checks
    #[arg(long)]
    pub poll_interval: Option<u64>,
}

#[derive(Args)]
pub struct RunArgs {
    /// Task name
    pub task: String,
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// List configured tasks
    List,

    /// Set one task field, creating the task if needed
    Set {
        /// Task name
        name: String,
        /// Field name, e.g. cronExpression or enabled
        field: String,
        /// New value; lists accept JSON arrays or comma-separated items
        value: String,
    },

    /// Remove a task and all of its fields
    Remove {
        /// Task name
        name: String,
    },
}
