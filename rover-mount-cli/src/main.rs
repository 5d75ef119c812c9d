mod replay;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rover_mount::{MountConfig, Transaction};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "rover-mount")]
#[command(version, about = "Replay mounting transactions against a recording host", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON script of transactions and native events
    Replay {
        /// Path to the replay script
        script: PathBuf,
        /// Lua file returning a mount config table
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Apply each transaction as soon as it is read
        #[arg(long)]
        no_coalesce: bool,
        /// Print the final native tree after the events
        #[arg(long)]
        tree: bool,
    },
    /// Report ordering problems in a JSON transaction list
    Check {
        /// Path to a JSON array of transactions
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            script,
            config,
            no_coalesce,
            tree,
        } => run_replay(&script, config.as_deref(), no_coalesce, tree),
        Commands::Check { file } => run_check(&file),
    }
}

fn load_config(path: Option<&Path>) -> Result<MountConfig> {
    match path {
        Some(path) => MountConfig::load_lua_file(path)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(MountConfig::default()),
    }
}

fn init_tracing(level: &str) {
    if level == "off" {
        return;
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_replay(script: &Path, config: Option<&Path>, no_coalesce: bool, tree: bool) -> Result<()> {
    let config = load_config(config)?;
    init_tracing(&config.log_level);

    let loaded = replay::load_script(script)?;
    info!(steps = loaded.steps.len(), "replaying {}", script.display());
    let outcome = replay::run(
        loaded,
        replay::ReplayOptions {
            config,
            immediate: no_coalesce,
        },
    )?;

    for event in &outcome.events {
        println!("{}", serde_json::to_string(event)?);
    }
    if tree {
        print!("{}", outcome.tree);
    }

    let skipped = outcome.skipped();
    if skipped > 0 {
        eprintln!(
            "{} {} mutation(s) skipped",
            "warning:".yellow().bold(),
            skipped
        );
        for error in outcome.reports.iter().flat_map(|r| &r.errors) {
            eprintln!("  {} {}", "•".yellow(), error);
        }
    }
    Ok(())
}

fn run_check(file: &Path) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    let transactions: Vec<Transaction> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid transaction list: {}", file.display()))?;

    let mut problems = 0;
    for transaction in &transactions {
        for violation in transaction.validate() {
            problems += 1;
            println!(
                "{} revision {}: {}",
                "error:".red().bold(),
                transaction.revision,
                violation
            );
        }
    }

    if problems == 0 {
        println!(
            "{} {} transaction(s), no ordering problems",
            "✓".green().bold(),
            transactions.len()
        );
        return Ok(());
    }

    println!();
    println!("{} {} problem(s) found", "✗".red().bold(), problems);
    std::process::exit(1);
}
