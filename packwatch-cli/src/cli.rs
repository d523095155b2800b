//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use packwatch_core::config::Profile;

/// Packwatch -- watch a unit's package counts and text recipients when new ones arrive.
///
/// Use `packwatch <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "packwatch", version, about, long_about = None)]
pub struct Cli {
    /// Path to the packwatch.toml configuration file.
    #[arg(short, long, default_value = "packwatch.toml", global = true)]
    pub config: PathBuf,

    /// Configuration profile (local requires the file, production treats it as optional).
    #[arg(long, global = true)]
    pub profile: Option<ProfileArg>,

    /// Override log level.
    #[arg(
        long,
        global = true,
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Configuration loading profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProfileArg {
    /// Read packwatch.toml (must exist), then apply env overrides.
    Local,
    /// Defaults plus env overrides; packwatch.toml is optional.
    #[value(alias = "prod")]
    Production,
}

impl From<ProfileArg> for Profile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Local => Profile::Local,
            ProfileArg::Production => Profile::Production,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one tracking cycle.
    Run(RunArgs),

    /// Show the stored package counts for the tracked unit.
    Show,

    /// Delete the stored package counts for the tracked unit.
    Reset,

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run ----

/// Fetch, diff, persist and notify.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Fetch and diff only; do not persist or notify.
    #[arg(long)]
    pub dry_run: bool,
}

// ---- config ----

/// Manage packwatch configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults), secrets redacted.
    Show {
        /// Show only a specific section (general, tracker, store, notify).
        section: Option<String>,
    },
}
