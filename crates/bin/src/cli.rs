//! CLI argument definitions for the Ripple binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// Ripple in-memory reactive graph store
#[derive(Parser, Debug)]
#[command(name = "ripple")]
#[command(about = "Ripple: replay scripted operations against an in-memory reactive graph")]
#[command(version)]
pub struct Cli {
    /// Output format
    #[arg(
        short,
        long,
        global = true,
        value_enum,
        default_value = "human",
        env = "RIPPLE_FORMAT"
    )]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a script and print every listener and acknowledgment event
    Replay(ScriptArgs),
    /// Parse and validate a script without running it
    Check(ScriptArgs),
}

/// Arguments shared by the script commands
#[derive(clap::Args, Debug)]
pub struct ScriptArgs {
    /// Path to the JSON script
    pub script: PathBuf,
}
