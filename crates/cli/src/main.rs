//! Astrograph CLI - structural duplicate detection

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "astrograph")]
#[command(about = "Find structural code duplication across a source tree", long_about = None)]
#[command(version = astrograph_core::VERSION)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Root of the analyzed tree (default: current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the tree for duplicate functions, classes, and blocks
    Analyze {
        /// Minimum AST nodes for exact/pattern duplicates
        #[arg(long)]
        min_nodes: Option<usize>,

        /// Minimum AST nodes for block duplicates
        #[arg(long)]
        min_block_nodes: Option<usize>,

        /// Minimum line span for block duplicates
        #[arg(long)]
        min_block_lines: Option<usize>,

        /// Skip control-flow block extraction
        #[arg(long)]
        no_blocks: bool,

        /// Restrict to specific languages (comma separated ids)
        #[arg(long, value_delimiter = ',')]
        language: Option<Vec<String>>,

        /// Emit machine-readable JSON instead of terminal output
        #[arg(long)]
        json: bool,
    },

    /// Check a file's content for duplicates against the index
    Check {
        /// File whose content to check
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Compare two files for structural isomorphism
    Compare { file_a: PathBuf, file_b: PathBuf },

    /// Suppress a duplicate cluster by key (shown in analyze output)
    Suppress {
        cluster_key: String,

        /// Why this duplication is acceptable
        #[arg(long, default_value = "accepted duplication")]
        reason: String,
    },

    /// Remove a suppression, surfacing its cluster again
    Unsuppress { cluster_key: String },

    /// List recorded suppressions
    Suppressions {
        /// Only suppressions whose evidence still matches the index
        #[arg(long)]
        active: bool,
    },
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let root = cli
        .root
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    let exit_code = match run(cli, root) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            2
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: Cli, root: PathBuf) -> Result<i32> {
    match cli.command {
        Commands::Analyze {
            min_nodes,
            min_block_nodes,
            min_block_lines,
            no_blocks,
            language,
            json,
        } => commands::analyze::run(
            &root,
            commands::analyze::AnalyzeArgs {
                min_nodes,
                min_block_nodes,
                min_block_lines,
                no_blocks,
                language,
                json,
            },
        ),
        Commands::Check { file, json } => commands::check::run(&root, &file, json),
        Commands::Compare { file_a, file_b } => commands::compare::run(&root, &file_a, &file_b),
        Commands::Suppress {
            cluster_key,
            reason,
        } => commands::suppress::run_suppress(&root, &cluster_key, &reason),
        Commands::Unsuppress { cluster_key } => {
            commands::suppress::run_unsuppress(&root, &cluster_key)
        }
        Commands::Suppressions { active } => commands::suppress::run_list(&root, active),
    }
}

fn init_tracing() {
    if std::env::var("ASTROGRAPH_LOG").is_ok() {
        use tracing_subscriber::EnvFilter;
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_env("ASTROGRAPH_LOG"))
            .with_writer(std::io::stderr)
            .init();
    }
}
