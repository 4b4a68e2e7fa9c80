//! Device command handlers.

use devtrail_core::{DEVICES_PATH, DeviceEventRecord, device_events_grid_spec, device_events_path};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;

use super::{grid, util};

const CREATE_LABEL: &str = "Create device";

pub async fn handle(session: &Session, args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::Events { id, grid: view } => {
            if id.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "id".into(),
                    reason: "device id cannot be empty".into(),
                });
            }
            grid::show::<DeviceEventRecord>(
                session,
                device_events_path(id.trim()),
                device_events_grid_spec(),
                &view,
                global,
            )
            .await
        }
        DevicesCommand::Create(data) => {
            let payload = util::read_payload(&data)?;
            util::submit(session, DEVICES_PATH, CREATE_LABEL, &payload, global).await
        }
    }
}
