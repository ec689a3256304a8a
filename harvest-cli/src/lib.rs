//! # harvest-cli
//!
//! Command surface of the channel harvester: argument parsing. Wiring lives in `main.rs`.

pub mod cli;

pub use cli::{Cli, Commands};
