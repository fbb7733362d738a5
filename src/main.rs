//! motivate CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use motivate::{
    commands::{
        cmd_format, cmd_ingest, cmd_init, cmd_query, cmd_shell, cmd_status, print_format_report,
        print_ingest_stats, print_query_response, print_status, QueryOptions, ShellSettings,
    },
    config::Config,
    error::Result,
    history::QueryHistory,
    pipeline::QueryEngine,
    progress::LogWriterFactory,
};
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "motivate")]
#[command(version, about = "Ask questions about entrepreneur biographies and podcast transcripts", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and create the transcript directory
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Load, chunk and embed the transcripts into a fresh index
    Ingest {
        /// Transcript directory (defaults to corpus_dir from config)
        #[arg(long)]
        corpus: Option<PathBuf>,
    },

    /// Ask a single question
    Query {
        /// The question
        query: String,

        /// Number of chunks to retrieve
        #[arg(short)]
        k: Option<usize>,

        /// Minimum similarity score (-1 to 1)
        #[arg(short, long, allow_negative_numbers = true)]
        threshold: Option<f32>,

        /// Metadata filter, e.g. "subject:Elon Musk"
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Ask questions interactively
    Shell,

    /// Show index status
    Status,

    /// Add paragraph breaks to raw transcripts
    Format {
        /// Transcript directory (defaults to corpus_dir from config)
        #[arg(long, alias = "directory")]
        dir: Option<PathBuf>,

        /// Report what would change without writing
        #[arg(long, alias = "dry-run")]
        check: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "motivate", &mut std::io::stdout());
        return Ok(());
    }

    if let Commands::Init { force } = cli.command {
        let base_dir = cli.config.as_deref().map(init_base_dir);
        let result = cmd_init(base_dir, force)?;

        println!("✓ motivate initialized");
        println!("  Config:      {}", result.config_path.display());
        println!("  Transcripts: {}", result.corpus_dir.display());
        println!("\nNext steps:");
        println!("  1. Put transcript .md files in the transcripts directory");
        println!("  2. Export OPENAI_API_KEY (or set api_key_env in the config)");
        println!("  3. Build the index: motivate ingest");
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),

        Commands::Ingest { corpus } => {
            let stats = cmd_ingest(&config, corpus).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_ingest_stats(&stats);
            }
        }

        Commands::Query {
            query,
            k,
            threshold,
            filter,
        } => {
            let options = QueryOptions {
                k,
                threshold,
                filter,
            };
            let response = cmd_query(&config, &query, options).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_query_response(&query, &response);
            }
        }

        Commands::Shell => {
            let engine = QueryEngine::from_config(&config).await?;
            let history = QueryHistory::new(config.query.history_size);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            cmd_shell(
                &engine,
                &history,
                ShellSettings::from_config(&config),
                stdin,
                &mut std::io::stdout(),
            )
            .await?;
        }

        Commands::Status => {
            let status = cmd_status(&config).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }

        Commands::Format { dir, check } => {
            let dir = dir.unwrap_or_else(|| config.corpus_dir());
            let report = cmd_format(&dir, check)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_format_report(&dir, &report);
            }
        }
    }

    Ok(())
}

/// Base directory for `init`: the parent of a `.toml` path, else the path itself
fn init_base_dir(path: &Path) -> PathBuf {
    if path.extension().map_or(false, |e| e == "toml") {
        path.parent()
            .map(PathBuf::from)
            .unwrap_or_else(Config::default_base_dir)
    } else {
        path.to_path_buf()
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::load_from(None),
    }
}
