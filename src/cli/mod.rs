//! CLI module for Corso.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Corso - Course Materials Assistant
///
/// Indexes course documents into a searchable knowledge base and answers
/// questions about them with cited sources.
#[derive(Parser, Debug)]
#[command(name = "corso")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse and index course documents
    Ingest {
        /// Course document or folder of course documents
        path: PathBuf,

        /// Re-index courses that are already indexed
        #[arg(short, long)]
        force: bool,

        /// Clear the store before indexing
        #[arg(long)]
        clear: bool,
    },

    /// Ask a single question about the indexed courses
    Ask {
        /// The question to ask
        question: String,

        /// Continue an existing session
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Start an interactive chat session
    Chat,

    /// Search indexed course content directly
    Search {
        /// Search query
        query: String,

        /// Restrict to one course (partial titles work)
        #[arg(short, long)]
        course: Option<String>,

        /// Restrict to one lesson number
        #[arg(short = 'n', long)]
        lesson: Option<u32>,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// List indexed courses
    List,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
