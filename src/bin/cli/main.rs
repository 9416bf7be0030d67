mod app;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "revu-cli", about = "Weighted spaced-repetition review of note images", version)]
struct Cli {
    /// Data directory holding one folder per collection
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (default: ~/.config/revu/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// List collections and their item counts
    Collections,

    /// Pick items to review from a collection
    Select {
        /// Collection name (case-insensitive prefix match)
        collection: String,
        /// Number of items (defaults to the configured count)
        #[arg(long, short = 'n')]
        count: Option<usize>,
    },

    /// Record review feedback for an item
    Feedback {
        /// Item key, "collection/item"
        key: String,
        /// familiar, blur or strange (anything else decays slightly)
        label: Option<String>,
    },

    /// Overwrite an item's weight without touching its review timing
    SetWeight {
        /// Item key, "collection/item"
        key: String,
        /// New weight (clamped to 0.1..=10)
        weight: f64,
    },

    /// List a collection's items, least familiar first
    Weights {
        /// Collection name
        collection: String,
    },

    /// Show review statistics
    Stats {
        /// Restrict to one collection
        collection: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let app = app::App::new(cli.data_dir, cli.config.as_deref())?;

    match cli.command {
        Command::Collections => {
            commands::collections::run(&app, &cli.format)?;
        }
        Command::Select { collection, count } => {
            commands::select::run(&app, &collection, count, &cli.format)?;
        }
        Command::Feedback { key, label } => {
            commands::feedback::run(&app, &key, label.as_deref(), &cli.format)?;
        }
        Command::SetWeight { key, weight } => {
            commands::feedback::run_set_weight(&app, &key, weight, &cli.format)?;
        }
        Command::Weights { collection } => {
            commands::weights::run(&app, &collection, &cli.format)?;
        }
        Command::Stats { collection } => {
            commands::stats::run(&app, collection.as_deref(), &cli.format)?;
        }
    }

    Ok(())
}
