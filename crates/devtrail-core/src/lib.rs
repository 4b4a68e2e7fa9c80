// devtrail-core: request lifecycle and tabular presentation shared by the CLI and TUI.

pub mod alert;
pub mod config;
pub mod error;
pub mod fetch;
pub mod grid;
pub mod grids;
pub mod model;
pub mod mutate;
pub mod state;

// ── Primary re-exports ──────────────────────────────────────────────
pub use alert::{AlertSink, ChannelAlerts, NoAlerts};
pub use config::{BackendConfig, TlsVerification};
pub use error::{ErrorKind, RequestError};
pub use fetch::{FetchResource, Rows, decode_rows, load_rows};
pub use grid::{
    Column, FilterKind, GridPhase, GridRow, GridSpec, GridView, RecordGrid, Sort, SortOrder,
    TabularView, VisibleRow,
};
pub use grids::{
    DEVICES_PATH, EVENTS_PATH, device_events_grid_spec, device_events_path, event_grid_spec,
};
pub use model::{DeviceEventRecord, EventRecord, NewEvent};
pub use mutate::MutateResource;
pub use state::RequestState;

// Re-export the transport types consumers need to build a client.
pub use devtrail_api::{BackendClient, NoToken, StaticToken, TokenProvider};
