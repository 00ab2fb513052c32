use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;

/// Index course documents and search them by meaning or by keyword.
#[derive(Parser, Debug)]
#[command(name = "coursedex", version, about)]
pub struct Args {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a file, or every file under a directory, with a collection
    Add {
        collection: String,
        path: PathBuf,

        /// Name recorded as the uploader
        #[arg(short, long, default_value = "unknown")]
        uploader: String,
    },

    /// Extract, chunk and embed the collection's pending documents
    Index {
        collection: String,

        /// Re-process every document and rebuild the index
        #[arg(short, long)]
        force: bool,
    },

    /// Search a collection
    Search {
        collection: String,
        query: String,

        /// vector, keyword or hybrid
        #[arg(short, long, default_value = "vector")]
        mode: String,

        /// Maximum number of results (defaults to the configured value)
        #[arg(short = 'n', long)]
        top_k: Option<usize>,

        /// Minimum cosine similarity for vector hits
        #[arg(long)]
        min_similarity: Option<f32>,

        /// Record the query in this user's history
        #[arg(short, long)]
        user: Option<String>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show document and index statistics for a collection
    Stats {
        collection: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a user's recent searches
    History {
        user: String,

        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Suggest words from the collection's documents that contain a fragment
    Suggest {
        collection: String,
        query: String,

        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Delete a collection's vector index
    Clear { collection: String },
}
