//! CLI parser.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(about = "Channel harvester: scrape, deduplicate, store and redistribute messages", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Scrape the source channel until a pass finds nothing new (bounded by CONVERGENCE_MAX_ATTEMPTS).
    Scrape,
    /// Run a single ingestion cycle.
    ScrapeOnce,
    /// Send today's messages one by one to the destination channel.
    Send,
    /// Send today's digest to the destination channel.
    Digest,
    /// Print today's messages and store statistics.
    Stats,
    /// Continuous mode: run scrape/send/digest at the configured times until Ctrl-C.
    Auto,
    /// Delete every stored message.
    Purge {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}
