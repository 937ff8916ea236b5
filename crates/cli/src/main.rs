//! Snip CLI - snip command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod locks;
mod logging;
mod system_config;
mod util;

/// Snip - Remove files from a snapshot with a minimal, auditable commit
#[derive(Parser)]
#[command(name = "snip")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a snip repository in the current directory
    Init,
    /// Snapshot a directory as a new commit
    Import {
        /// Directory to snapshot
        dir: PathBuf,
        /// Branch to commit to (default: prune.branch from config)
        #[arg(short, long)]
        branch: Option<String>,
        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Remove files from the head of a branch
    Prune(cmd::prune::PruneArgs),
    /// List the entries of a snapshot
    LsTree {
        /// Branch or commit (default: the HEAD branch)
        rev: Option<String>,
        /// Recurse into directories
        #[arg(short, long)]
        recursive: bool,
    },
    /// Print the content of a file in a snapshot
    Cat {
        /// <rev>:<path>
        spec: String,
    },
    /// Show commit history
    Log {
        /// Number of commits to show (default: 20)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Branch to show (default: the HEAD branch)
        #[arg(short, long)]
        branch: Option<String>,
    },
    /// Show a commit and the files it changed
    Show {
        /// Branch or commit
        rev: String,
    },
    /// View and edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show all configuration values
    List,
    /// Print one value (e.g. prune.branch)
    Get { key: String },
    /// Set one value and save the file
    Set { key: String, value: String },
    /// Print the config file path
    Path {
        /// Create the file with defaults if missing
        #[arg(long)]
        create: bool,
    },
    /// Print an example config file
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A broken config must not lock the user out of `snip config`
    let (config, config_error) = match system_config::load() {
        Ok(config) => (config, None),
        Err(e) if matches!(cli.command, Commands::Config(_)) => (Default::default(), Some(e)),
        Err(e) => return Err(e),
    };
    logging::init(&config.log, cli.verbose);
    if let Some(e) = config_error {
        tracing::warn!("Using default configuration: {:#}", e);
    }

    match cli.command {
        Commands::Init => cmd::init::run().await,
        Commands::Import { dir, branch, message } => {
            cmd::import::run(&config, &dir, branch, message).await
        }
        Commands::Prune(args) => cmd::prune::run(&config, args).await,
        Commands::LsTree { rev, recursive } => cmd::ls_tree::run(rev, recursive).await,
        Commands::Cat { spec } => cmd::cat::run(&spec).await,
        Commands::Log { limit, branch } => cmd::log::run(limit, branch).await,
        Commands::Show { rev } => cmd::show::run(&rev).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list(&config).await,
            ConfigCommands::Get { key } => cmd::config::run_get(&config, &key).await,
            ConfigCommands::Set { key, value } => cmd::config::run_set(config, &key, &value).await,
            ConfigCommands::Path { create } => cmd::config::run_path(create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}
