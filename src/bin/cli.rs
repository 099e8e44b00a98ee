//! Board ingest CLI
//!
//! Serves announcement requests from the command line, or line by line
//! from stdin in `interactive` mode.

use std::path::PathBuf;

use board_ingest::{
    error::{AppError, Result},
    models::{Config, DisplayConfig, filter_recent},
    services::{BoardResponse, BoardService, Origin},
};
use chrono::Local;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Department announcement board reader
#[derive(Parser, Debug)]
#[command(
    name = "board-ingest",
    version,
    about = "Fetches, caches and reports department announcements"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show recent announcements for a board
    Board {
        /// Logical board key, e.g. `computer`
        key: String,

        /// Show every announcement, not only recent ones
        #[arg(long)]
        all: bool,
    },

    /// Write a report of a board's announcements
    Report {
        /// Report format, e.g. `json`
        format: String,

        /// Logical board key
        key: String,
    },

    /// List registered boards
    Sources,

    /// Validate the configuration file
    Validate,

    /// Read `/board <key>` and `/report <format> <key>` lines from stdin
    Interactive,
}

/// Initialize logging; `--verbose` overrides the configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config);
    let config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => Config::default(),
    };
    init_logging(cli.verbose, &config.logging.level);

    match loaded {
        Ok(_) => log::info!("Loaded configuration from {}", cli.config.display()),
        Err(e) => log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        ),
    }

    if let Command::Validate = cli.command {
        log::info!("Validating configuration...");
        if let Err(e) = config.validate() {
            log::error!("Config validation failed: {}", e);
            return Err(e);
        }
        log::info!("✓ Config OK ({} sources)", config.sources.len());
        return Ok(());
    }

    config.validate()?;
    let service = BoardService::from_config(&config)?;

    match cli.command {
        Command::Board { key, all } => show_board(&service, &config.display, &key, all).await,
        Command::Report { format, key } => {
            let path = service.report(&format, &key).await?;
            println!("{}", path.display());
        }
        Command::Sources => {
            for (key, source) in service.registry().iter() {
                println!("{key}\t{}\t{}", source.name, source.base_url);
            }
        }
        Command::Interactive => interactive(&service, &config.display).await?,
        Command::Validate => {}
    }

    Ok(())
}

async fn show_board(service: &BoardService, display: &DisplayConfig, key: &str, all: bool) {
    let (entry, origin) = match service.handle_request(key).await {
        BoardResponse::Announcements { entry, origin } => (entry, origin),
        BoardResponse::NoData => {
            println!("No announcements for '{}'.", key.trim());
            return;
        }
        BoardResponse::Failed(e) => {
            println!("Could not load '{}': {}", key.trim(), e);
            return;
        }
    };

    let rows: Vec<_> = if all {
        entry.rows.iter().collect()
    } else {
        filter_recent(&entry.rows, Local::now().date_naive(), display.recent_days)
    };

    let source = match origin {
        Origin::Cache => "cached",
        Origin::Source => "fetched",
    };
    println!(
        "[{}] {} of {} announcements ({}, {})",
        entry.key,
        rows.len(),
        entry.len(),
        source,
        entry.completeness.label()
    );
    for row in rows {
        println!(
            "{}",
            row.format_truncated(&display.template, display.max_title_graphemes)
        );
    }
}

async fn interactive(service: &BoardService, display: &DisplayConfig) -> Result<()> {
    log::info!("Interactive mode. Commands: /board <key>, /report <format> <key>");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (None, ..) => continue,
            (Some("/board"), Some(key), None) => show_board(service, display, key, false).await,
            (Some("/report"), Some(format), Some(key)) => {
                match service.report(format, key).await {
                    Ok(path) => println!("Report written to {}", path.display()),
                    Err(AppError::UnknownFormat(f)) => println!("Unsupported format '{f}'."),
                    Err(e) => println!("Report failed: {e}"),
                }
            }
            (Some("/quit" | "/exit"), ..) => break,
            _ => println!("Usage: /board <key> | /report <format> <key> | /quit"),
        }
    }
    Ok(())
}
