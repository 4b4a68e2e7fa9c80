//! Screen components, one per [`ScreenId`].

pub mod grid;

use std::path::Path;
use std::sync::Arc;

use devtrail_core::{
    BackendClient, DeviceEventRecord, EVENTS_PATH, EventRecord, device_events_grid_spec,
    device_events_path, event_grid_spec,
};

use crate::action::Action;
use crate::component::Component;
use crate::screen::ScreenId;

use self::grid::GridScreen;

/// Enter on an event opens that device's history.
fn open_device(event: &EventRecord) -> Option<Action> {
    let dev_id = event.dev_id.as_deref().filter(|id| !id.trim().is_empty())?;
    Some(Action::OpenGrid {
        screen: ScreenId::DeviceEvents,
        path: device_events_path(dev_id),
        subtitle: Some(event.dev_name.clone().unwrap_or_else(|| dev_id.to_owned())),
    })
}

/// Build every screen. The events grid starts fetching immediately; the
/// device grid waits for a drill-down.
pub fn create_screens(
    client: &Arc<BackendClient>,
    export_dir: &Path,
) -> Vec<(ScreenId, Box<dyn Component>)> {
    let mut events = GridScreen::<EventRecord>::new(
        ScreenId::Events,
        Arc::clone(client),
        event_grid_spec(),
        export_dir.to_path_buf(),
    )
    .on_select(open_device);
    events.open(EVENTS_PATH, None);

    let devices = GridScreen::<DeviceEventRecord>::new(
        ScreenId::DeviceEvents,
        Arc::clone(client),
        device_events_grid_spec(),
        export_dir.to_path_buf(),
    )
    .placeholder(" Select an event and press Enter to see its device history.");

    let events: Box<dyn Component> = Box::new(events);
    let devices: Box<dyn Component> = Box::new(devices);
    vec![(ScreenId::Events, events), (ScreenId::DeviceEvents, devices)]
}
