//! The concrete grids: all events, and the events of one device.

use crate::grid::{Column, Formatter, GridSpec, timefmt};
use crate::model::{DeviceEventRecord, EventRecord};

/// Resource path of the events collection.
pub const EVENTS_PATH: &str = "events";

/// Resource path of the collection the `create device` action posts to.
pub const DEVICES_PATH: &str = "devices";

/// Resource path of one device's event history.
///
/// The id is percent-encoded as a single path segment, so `/`, `?` and `#`
/// inside it cannot change the path or add a query.
pub fn device_events_path(device_id: &str) -> String {
    let segment: String =
        url::form_urlencoded::byte_serialize(device_id.trim_matches('/').as_bytes()).collect();
    // form encoding writes spaces as `+`; a literal `+` is already `%2B`.
    format!("{DEVICES_PATH}/{}/events", segment.replace('+', "%20"))
}

/// Events grid, timestamps shown in the local zone.
pub fn event_grid_spec() -> GridSpec<EventRecord> {
    event_grid_spec_with(timefmt::local_formatter())
}

pub fn event_grid_spec_with(time: Formatter) -> GridSpec<EventRecord> {
    GridSpec {
        title: "Events",
        loading_message: "Loading devices...",
        failure_message: "Failed to load devices.\nPlease try again later.",
        columns: vec![
            Column::new("user_email", "Email", |r: &EventRecord| r.user_email.as_deref()).flex(5),
            Column::new("user_name", "User name", |r: &EventRecord| r.user_name.as_deref()).flex(4),
            Column::new("move_time", "Date/Time", |r: &EventRecord| r.move_time.as_deref())
                .flex(5)
                .formatter(time),
            Column::new("loc_name", "Location", |r: &EventRecord| r.loc_name.as_deref()).flex(4),
            Column::new("company", "Company", |r: &EventRecord| r.company.as_deref()).flex(4),
            Column::new("dev_name", "Device", |r: &EventRecord| r.dev_name.as_deref()).flex(4),
        ],
    }
}

/// Device history grid, timestamps shown in the local zone.
pub fn device_events_grid_spec() -> GridSpec<DeviceEventRecord> {
    device_events_grid_spec_with(timefmt::local_formatter())
}

pub fn device_events_grid_spec_with(time: Formatter) -> GridSpec<DeviceEventRecord> {
    GridSpec {
        title: "Device events",
        loading_message: "Loading events...",
        failure_message: "Failed to load events.\nPlease try again later.",
        columns: vec![
            Column::new("event_id", "ID", |r: &DeviceEventRecord| r.event_id.as_deref()).flex(4),
            Column::new("user_id", "User", |r: &DeviceEventRecord| r.user_id.as_deref()).flex(4),
            Column::new("move_time", "Date/Time", |r: &DeviceEventRecord| r.move_time.as_deref())
                .flex(5)
                .formatter(time),
            Column::new("loc", "Location", |r: &DeviceEventRecord| r.loc.as_deref()).flex(5),
        ],
    }
}
