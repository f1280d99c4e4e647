// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! kbchat main entry point - CLI for rendering and history maintenance.

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;

use kbchat::config::{self, CliOptions};
use kbchat::error::TransportError;
use kbchat::history::HistoryStore;
use kbchat::render::render_markdown_with_origin;
use kbchat::stream::{ChunkSource, StreamDriver};
use kbchat::telemetry::{init_telemetry, TelemetryConfig};

/// kbchat version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// kbchat - offline local knowledge-base chat core.
#[derive(Parser)]
#[command(name = "kbchat")]
#[command(author, version = VERSION, about = "Progressive markdown renderer for streamed LM output", long_about = None)]
struct Cli {
    /// Path to the history database
    #[arg(long, env = "KBCHAT_DB")]
    db: Option<PathBuf>,

    /// Knowledge-base folder
    #[arg(long, env = "KBCHAT_KB_FOLDER")]
    kb_folder: Option<PathBuf>,

    /// Origin used to resolve relative link targets
    #[arg(long, env = "KBCHAT_ORIGIN")]
    origin: Option<String>,

    /// Show debug output
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a file (or stdin) to an HTML fragment in one pass
    Render {
        /// Input file; reads stdin when absent
        file: Option<PathBuf>,
    },
    /// Replay a file through the streaming driver in fixed-size chunks
    Stream {
        /// Input file; reads stdin when absent
        file: Option<PathBuf>,
        /// Chunk size in bytes (split at char boundaries)
        #[arg(long, default_value_t = 16)]
        chunk_size: usize,
        /// Delay between chunks in milliseconds
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,
    },
    /// Conversation history maintenance
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List conversations, most recently updated first
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Create a new conversation
    New {
        #[arg(default_value = "New chat")]
        title: String,
    },
    /// Delete a conversation and its messages
    Delete { id: i64 },
}

/// Chunk source that replays a pre-split script with an optional delay,
/// standing in for the HTTP transport.
struct ReplaySource {
    chunks: std::vec::IntoIter<String>,
    delay: Duration,
}

#[async_trait::async_trait]
impl ChunkSource for ReplaySource {
    async fn next_chunk(&mut self) -> Result<Option<String>, TransportError> {
        match self.chunks.next() {
            Some(chunk) => {
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                Ok(Some(chunk))
            }
            None => Ok(None),
        }
    }
}

/// Split text into chunks of roughly `size` bytes on char boundaries.
fn split_chunks(text: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        if current.len() >= size {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn read_input(file: Option<&PathBuf>) -> anyhow::Result<String> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(config::GLOBAL_CONFIG_DIR)
        .join("history.db")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let telemetry = if cli.debug {
        TelemetryConfig::development()
    } else {
        TelemetryConfig::default()
    };
    init_telemetry(&telemetry)?;

    let cwd = std::env::current_dir()?;
    let config = config::load_config(
        &cwd,
        CliOptions {
            kb_folder: cli.kb_folder.clone(),
            origin: cli.origin.clone(),
            ..Default::default()
        },
    )?;
    tracing::debug!(?config, "configuration resolved");

    match cli.command {
        Command::Render { file } => {
            let text = read_input(file.as_ref())?;
            println!("{}", render_markdown_with_origin(&text, &config.origin));
        }
        Command::Stream {
            file,
            chunk_size,
            delay_ms,
        } => {
            let text = read_input(file.as_ref())?;
            let mut source = ReplaySource {
                chunks: split_chunks(&text, chunk_size).into_iter(),
                delay: Duration::from_millis(delay_ms),
            };
            let mut driver = StreamDriver::with_origin(&config.origin);
            if let Err(err) = driver.consume(&mut source).await {
                eprintln!("{} {}", "stream failed:".red(), err);
            }
            println!("{}", driver.html());
        }
        Command::History { command } => {
            let store = HistoryStore::open(&cli.db.unwrap_or_else(default_db_path))?;
            match command {
                HistoryCommand::List { limit } => {
                    for conv in store.list_conversations(limit)? {
                        println!("{:>6}  {}", conv.id.to_string().cyan(), conv.title);
                    }
                }
                HistoryCommand::New { title } => {
                    let conv = store.create_conversation(&title)?;
                    println!("created conversation {}", conv.id.to_string().green());
                }
                HistoryCommand::Delete { id } => {
                    store.delete_conversation(id)?;
                    println!("deleted conversation {}", id.to_string().yellow());
                }
            }
        }
    }

    Ok(())
}
