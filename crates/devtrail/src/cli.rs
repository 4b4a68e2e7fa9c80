//! Clap derive structures for the `devtrail` CLI.
//!
//! Defines the command tree, global flags, and shared grid arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// devtrail -- browse and record device movement events
#[derive(Debug, Parser)]
#[command(
    name = "devtrail",
    version,
    about = "Browse device events and record new ones from the command line",
    long_about = "Lists events and per-device histories from a devtrail backend as\n\
        filterable, sortable, exportable tables, and submits new records.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "DEVTRAIL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend base address (overrides profile)
    #[arg(long, short = 'b', env = "DEVTRAIL_BACKEND", global = true)]
    pub backend: Option<String>,

    /// Access token (overrides env, keyring, and token file)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DEVTRAIL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "DEVTRAIL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "DEVTRAIL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON of the visible records
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// CSV of the displayed values
    Csv,
    /// Plain text, one identifier per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List and record events
    #[command(alias = "ev", alias = "e")]
    Events(EventsArgs),

    /// Device histories and device records
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Grid Arguments ────────────────────────────────────────────

/// View options shared by every grid listing.
#[derive(Debug, Clone, Default, Args)]
pub struct GridArgs {
    /// Column filter, case-insensitive substring (COLUMN=TEXT, repeatable)
    #[arg(long, short = 'f', value_name = "COLUMN=TEXT")]
    pub filter: Vec<String>,

    /// Sort by column (COLUMN or COLUMN:desc)
    #[arg(long, short = 's', value_name = "COLUMN[:desc]")]
    pub sort: Option<String>,

    /// Show child rows under their parent
    #[arg(long, short = 'x')]
    pub expand: bool,

    /// Also write the displayed rows to a CSV file
    #[arg(long, short = 'e', value_name = "FILE")]
    pub export: Option<PathBuf>,
}

/// Raw JSON payload, inline or from a file.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct DataArgs {
    /// JSON payload
    #[arg(long, short = 'd', value_name = "JSON")]
    pub data: Option<String>,

    /// Read the JSON payload from a file
    #[arg(long, short = 'F', value_name = "PATH")]
    pub from_file: Option<PathBuf>,
}

// ── Events ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: EventsCommand,
}

#[derive(Debug, Subcommand)]
pub enum EventsCommand {
    /// List all events
    #[command(alias = "ls")]
    List(GridArgs),

    /// Record a new event
    Create(EventCreateArgs),
}

#[derive(Debug, Args)]
pub struct EventCreateArgs {
    /// Device id
    #[arg(long)]
    pub dev_id: u64,

    /// User id
    #[arg(long)]
    pub user_id: u64,

    /// Location name (max 100 chars)
    #[arg(long, short = 'l')]
    pub location: String,

    /// Company (max 100 chars)
    #[arg(long, short = 'c')]
    pub company: String,

    /// Free-text comment (max 500 chars)
    #[arg(long, default_value = "")]
    pub comment: String,

    /// Event time, RFC 3339 (defaults to the backend's clock)
    #[arg(long, value_name = "TIME")]
    pub at: Option<String>,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List the events of one device
    Events {
        /// Device id
        id: String,

        #[command(flatten)]
        grid: GridArgs,
    },

    /// Register a device from a JSON payload
    Create(DataArgs),
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Show the loaded configuration and where the access token comes from
    Show,

    /// Write a profile to the config file
    Init {
        /// Backend base address
        #[arg(long)]
        backend: String,

        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Environment variable holding the access token
        #[arg(long)]
        token_env: Option<String>,

        /// Directory for CSV exports given as bare file names
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Replace an existing profile with the same name
        #[arg(long)]
        force: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
