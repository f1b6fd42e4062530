//! Clap derive structures for the `gridlet` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// gridlet -- keep an Enphase battery charged when it matters
#[derive(Debug, Parser)]
#[command(
    name = "gridlet",
    version,
    about = "Switch an Enphase battery between self-power and grid charging",
    long_about = "Logs in to Enphase Enlighten, reads the battery mode, and switches it \
        between self-consumption (daytime) and backup-only grid charging (night, or \
        severe weather in the Tomorrow.io forecast).\n\n\
        Every option can also be set in the config file or through a GRIDLET_* \
        environment variable, e.g. GRIDLET_ENPHASE_USER. Command-line flags win over \
        the environment, which wins over the config file.",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Option<Command>,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Decide and log, but do not change the battery mode
    #[arg(long, short = 'n', alias = "dry_run")]
    pub dry_run: bool,

    /// Silence all logging regardless of verbosity
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Increase verbosity (-v, -vv, -vvv, -vvvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Enphase Enlighten user name
    #[arg(long, value_name = "USER", alias = "enphase_user")]
    pub enphase_user: Option<String>,

    /// Enphase Enlighten password
    #[arg(long, value_name = "PASSWORD", alias = "enphase_password")]
    pub enphase_password: Option<String>,

    /// Enlighten portal base URL
    #[arg(long, value_name = "URL", alias = "enphase_url_base")]
    pub enphase_url_base: Option<String>,

    /// Tomorrow.io API key; enables the weather check
    #[arg(long, value_name = "API_KEY", alias = "tomorrow_api_key")]
    pub tomorrow_api_key: Option<String>,

    /// Location for the forecast, e.g. '29.935,-90.109'
    #[arg(long, value_name = "LAT,LNG", alias = "tomorrow_location", allow_hyphen_values = true)]
    pub tomorrow_location: Option<String>,

    /// Tomorrow.io API base URL
    #[arg(long, value_name = "URL", hide = true)]
    pub tomorrow_url_base: Option<String>,

    /// IANA time zone for the schedule (default: system local time)
    #[arg(long, value_name = "ZONE")]
    pub timezone: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Config file to read instead of the default location
    #[arg(long, value_name = "PATH", env = "GRIDLET_CONFIG")]
    pub config: Option<PathBuf>,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
