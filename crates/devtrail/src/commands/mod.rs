//! Command dispatch: bridges CLI args -> grids / mutations -> output.

pub mod config_cmd;
pub mod devices;
pub mod events;
pub mod grid;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Events(args) => events::handle(session, args, global).await,
        Command::Devices(args) => devices::handle(session, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
