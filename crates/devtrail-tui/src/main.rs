//! `devtrail-tui` — terminal dashboard for devtrail events.
//!
//! Two grid screens share one backend session: the event log and the
//! per-device history reached by pressing Enter on an event. Logs go to a
//! file (default `/tmp/devtrail-tui.log`) so they never corrupt the UI.

mod action;
mod app;
mod component;
mod event;
mod screen;
mod screens;
mod session;
mod theme;
mod tui;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::session::Session;

/// Terminal dashboard for browsing devtrail events.
#[derive(Parser, Debug, Default)]
#[command(name = "devtrail-tui", version, about)]
pub struct Cli {
    /// Backend address (e.g., https://tracker.example.com/api)
    #[arg(short = 'b', long, env = "DEVTRAIL_BACKEND")]
    backend: Option<String>,

    /// Config profile to use
    #[arg(short = 'p', long, env = "DEVTRAIL_PROFILE")]
    profile: Option<String>,

    /// Access token (overrides env, keyring and token file)
    #[arg(long, hide_env_values = true)]
    token: Option<String>,

    /// Log file path
    #[arg(long, default_value = "/tmp/devtrail-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-only tracing. Hold the guard until exit so buffered lines flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("devtrail_tui={level},devtrail_core={level},devtrail_api={level}"))
    });

    let dir = cli
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(std::path::Path::new("."));
    let name = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("devtrail-tui.log"));

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    // Resolve before touching the terminal so config errors print normally.
    let session = Session::resolve(&cli)?;
    info!(profile = %session.profile_name, "starting devtrail-tui");

    let mut app = App::new(&session);
    app.run().await
}
