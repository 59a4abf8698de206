//! CLI module for Charla.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Charla - Grounded practice exercises from lesson transcripts
///
/// A local-first CLI tool for structuring lesson transcripts, indexing them
/// into a searchable practice base, and generating new exercises grounded in
/// that base. The name "Charla" comes from the Spanish word for "chat."
#[derive(Parser, Debug)]
#[command(name = "charla")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Structure raw transcripts into introduction/conversation/Q&A records
    Structure {
        /// Video id of the transcript to structure
        video_id: Option<String>,

        /// Structure every raw transcript in the library
        #[arg(short, long)]
        all: bool,
    },

    /// Embed structured records and load them into the vector store
    Ingest,

    /// Generate a practice exercise grounded in the indexed lessons
    Generate {
        /// Learning objective to ground the exercise on
        query: String,

        /// Question type (e.g. comprehension, vocabulary)
        #[arg(short, long, default_value = "comprehension")]
        question_type: String,
    },

    /// Search the indexed lesson fragments
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Show library and vector store status
    Status,
}
