//! CLI module for Noor Search
//!
//! - `serve`: run the HTTP API
//! - `warmup`: generate the embedding cache snapshot for popular queries

pub mod serve;
pub mod warmup;

use clap::{Parser, Subcommand};

/// Noor Search - semantic search over the Quran and Hadith corpus
#[derive(Parser)]
#[command(name = "noor-search")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Generate the embedding cache snapshot
    Warmup(warmup::WarmupArgs),
}
