//! Command-line argument definitions for the Whisker CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the template, the model data, the
//! partials directory, the output destination and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Whisker template renderer
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the template file
    #[arg(help = "Path to the template file")]
    pub input: String,

    /// Model data file (`.json` or `.toml`); renders against an empty model when omitted
    #[arg(short, long)]
    pub data: Option<String>,

    /// Output file; writes to stdout when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Directory of partial templates, overriding the configured one
    #[arg(short, long)]
    pub partials: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
