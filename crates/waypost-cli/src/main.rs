mod commands;
mod config;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "waypost")]
#[command(version, about = "Waypost - file-system routes for Rust web apps", long_about = None)]
struct Cli {
    /// Project root containing waypost.toml
    #[arg(short = 'C', long, global = true, default_value = ".")]
    root: PathBuf,

    /// Show skipped declarations and debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the app directory and write the registration module
    Generate {
        #[command(flatten)]
        paths: PathArgs,

        /// Crate the generated code registers against
        #[arg(long)]
        runtime_crate: Option<String>,

        /// Import irregular directories in place instead of staging links
        #[arg(long)]
        no_materialize: bool,
    },

    /// Scan and validate without writing anything
    Check {
        #[command(flatten)]
        paths: PathArgs,
    },

    /// List routes in match order with their middleware chains
    Routes {
        #[command(flatten)]
        paths: PathArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Overrides for paths from waypost.toml
#[derive(Args, Clone, Default)]
pub struct PathArgs {
    /// App directory to scan
    #[arg(long)]
    pub app_dir: Option<PathBuf>,

    /// Generated module path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = commands::Context {
        root: cli.root,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Generate {
            paths,
            runtime_crate,
            no_materialize,
        } => {
            commands::generate::execute(&ctx, &paths, runtime_crate, no_materialize)?;
        }
        Commands::Check { paths } => {
            commands::check::execute(&ctx, &paths)?;
        }
        Commands::Routes { paths, json } => {
            commands::routes::execute(&ctx, &paths, json)?;
        }
    }

    Ok(())
}
