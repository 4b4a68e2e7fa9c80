//! CLI error types with miette diagnostics.
//!
//! Maps request, config, and IO failures into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use devtrail_config::ConfigError;
use devtrail_core::{ErrorKind, RequestError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Loading ──────────────────────────────────────────────────────

    /// A grid could not load. Displays the grid's failure literal.
    #[error("{message}")]
    #[diagnostic(code(devtrail::load_failed), help("Request: GET {path}"))]
    LoadFailed {
        message: String,
        path: String,
        #[source]
        source: RequestError,
    },

    /// A mutation failed and its alert has already been shown.
    #[error("{error}")]
    #[diagnostic(code(devtrail::rejected))]
    Rejected { error: RequestError, alerted: bool },

    #[error("Could not set up the HTTP client: {0}")]
    #[diagnostic(
        code(devtrail::client),
        help("Check the ca_cert path in your profile, or use --insecure (-k).")
    )]
    Client(#[from] RequestError),

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(devtrail::validation))]
    Validation { field: String, reason: String },

    #[error("Unknown column '{name}'")]
    #[diagnostic(code(devtrail::unknown_column), help("Available columns: {available}"))]
    UnknownColumn { name: String, available: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(devtrail::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: devtrail config init --backend <URL> --name {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend address configured")]
    #[diagnostic(
        code(devtrail::no_config),
        help(
            "Pass --backend <URL>, set DEVTRAIL_BACKEND, or create a profile with:\n  \
             devtrail config init --backend <URL>\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(devtrail::config))]
    Config(#[from] ConfigError),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(devtrail::json), help("Check the JSON contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(devtrail::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::LoadFailed { source, .. } => request_exit_code(source),
            Self::Rejected { error, .. } => request_exit_code(error),
            Self::Validation { .. } | Self::UnknownColumn { .. } => exit_code::USAGE,
            Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            _ => exit_code::GENERAL,
        }
    }

    /// True when the user has already seen this failure as an alert.
    pub fn already_reported(&self) -> bool {
        matches!(self, Self::Rejected { alerted: true, .. })
    }
}

fn request_exit_code(err: &RequestError) -> i32 {
    if err.is_unauthorized() {
        exit_code::AUTH
    } else if err.is_not_found() {
        exit_code::NOT_FOUND
    } else if err.kind() == ErrorKind::Network {
        exit_code::CONNECTION
    } else {
        exit_code::GENERAL
    }
}
