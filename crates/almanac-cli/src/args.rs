//! Command-line argument definitions for the Almanac CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control the plan and output paths, configuration
//! file selection, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Almanac calendar layout tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input plan file (TOML)
    #[arg(help = "Path to the plan file")]
    pub input: String,

    /// Path to the output layout file (TOML)
    #[arg(short, long, default_value = "layout.toml")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
