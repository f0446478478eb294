// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `pylings`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pylings",
    version,
    about = "Small exercises to get you used to reading and writing Python code.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the workspace config file.
    ///
    /// Default: the first `.pylings.toml` found in the current directory or
    /// one of its parents.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PYLINGS_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Write log lines to this file instead of stderr.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Start the interactive session at the given exercise.
    Run {
        /// Path to the exercise file.
        file: PathBuf,
    },

    /// Run a single exercise once and print its output.
    DryRun {
        /// Path to the exercise file.
        file: PathBuf,
    },

    /// Run a solution file once and print its output.
    Solution {
        /// Path to the solution file.
        file: PathBuf,
    },

    /// Check every exercise once, print the status list and exit.
    Check,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
