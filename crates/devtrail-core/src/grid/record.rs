// ── Record grid ──
//
// Binds a FetchResource to a TabularView. The grid has three phases and
// moves between them only when the underlying request state changes.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::debug;

use devtrail_api::BackendClient;

use crate::error::RequestError;
use crate::fetch::{FetchResource, Rows};
use crate::state::RequestState;

use super::GridRow;
use super::column::Column;
use super::table::TabularView;

/// Static description of one grid: literals shown outside the ready phase
/// plus the column set.
pub struct GridSpec<R> {
    pub title: &'static str,
    pub loading_message: &'static str,
    pub failure_message: &'static str,
    pub columns: Vec<Column<R>>,
}

impl<R> Clone for GridSpec<R> {
    fn clone(&self) -> Self {
        Self {
            title: self.title,
            loading_message: self.loading_message,
            failure_message: self.failure_message,
            columns: self.columns.clone(),
        }
    }
}

impl<R> std::fmt::Debug for GridSpec<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridSpec")
            .field("title", &self.title)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridPhase {
    Loading,
    Failed,
    Ready,
}

impl GridPhase {
    /// Phase implied by a request state. `Idle` counts as loading.
    pub fn from_state<T>(state: &RequestState<T>) -> Self {
        match state {
            RequestState::Idle | RequestState::Loading => Self::Loading,
            RequestState::Failed(_) => Self::Failed,
            RequestState::Ready(_) => Self::Ready,
        }
    }
}

/// What a renderer should draw. Only `Ready` carries a table.
#[derive(Debug)]
pub enum GridView<'a, R> {
    Loading(&'a str),
    Failed(&'a str),
    Ready(&'a TabularView<R>),
}

pub struct RecordGrid<R> {
    spec: GridSpec<R>,
    fetch: FetchResource<R>,
    phase: GridPhase,
    error: Option<RequestError>,
    table: Option<TabularView<R>>,
}

impl<R> RecordGrid<R>
where
    R: GridRow + DeserializeOwned + Send + Sync + 'static,
{
    /// Start fetching `path` and return the grid in the loading phase.
    pub fn mount(client: Arc<BackendClient>, path: impl Into<String>, spec: GridSpec<R>) -> Self {
        Self::from_resource(FetchResource::mount(client, path), spec)
    }

    /// Bind an existing resource. Nothing is sent.
    pub fn from_resource(fetch: FetchResource<R>, spec: GridSpec<R>) -> Self {
        let mut grid = Self {
            spec,
            fetch,
            phase: GridPhase::Loading,
            error: None,
            table: None,
        };
        grid.sync();
        grid
    }

    pub fn spec(&self) -> &GridSpec<R> {
        &self.spec
    }

    pub fn path(&self) -> &str {
        self.fetch.path()
    }

    pub fn resource(&self) -> &FetchResource<R> {
        &self.fetch
    }

    /// Pull the latest request state. Returns the resulting phase.
    pub fn sync(&mut self) -> GridPhase {
        let state = self.fetch.state();
        self.apply(&state)
    }

    /// Move to the phase implied by `state`.
    pub fn apply(&mut self, state: &RequestState<Rows<R>>) -> GridPhase {
        let phase = GridPhase::from_state(state);
        match state {
            RequestState::Idle | RequestState::Loading => {
                self.table = None;
                self.error = None;
            }
            RequestState::Failed(e) => {
                self.table = None;
                self.error = Some(e.clone());
            }
            RequestState::Ready(rows) => {
                // Keep filters and sort when the same row set is re-applied.
                let fresh = self
                    .table
                    .as_ref()
                    .is_none_or(|t| !std::ptr::eq(t.rows(), rows.as_slice()));
                if fresh {
                    self.table = Some(TabularView::new(self.spec.columns.clone(), Arc::clone(rows)));
                }
                self.error = None;
            }
        }
        if phase != self.phase {
            debug!(grid = self.spec.title, ?phase, "grid phase changed");
            self.phase = phase;
        }
        phase
    }

    /// Wait until the current request settles, then sync.
    pub async fn settled(&mut self) -> GridPhase {
        let mut rx = self.fetch.subscribe();
        // A closed channel means the resource is gone; report what we have.
        drop(rx.wait_for(RequestState::is_settled).await);
        self.sync()
    }

    /// Rebind to another resource path, restarting the lifecycle.
    pub fn set_path(&mut self, path: impl Into<String>) -> Option<JoinHandle<()>> {
        let handle = self.fetch.set_path(path);
        if handle.is_some() {
            self.sync();
        }
        handle
    }

    pub fn phase(&self) -> GridPhase {
        self.phase
    }

    /// The error behind the failed phase, for logging.
    pub fn error(&self) -> Option<&RequestError> {
        self.error.as_ref()
    }

    pub fn view(&self) -> GridView<'_, R> {
        match (self.phase, &self.table) {
            (GridPhase::Ready, Some(table)) => GridView::Ready(table),
            (GridPhase::Failed, _) => GridView::Failed(self.spec.failure_message),
            _ => GridView::Loading(self.spec.loading_message),
        }
    }

    pub fn table(&self) -> Option<&TabularView<R>> {
        self.table.as_ref()
    }

    pub fn table_mut(&mut self) -> Option<&mut TabularView<R>> {
        self.table.as_mut()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{FixedOffset, Utc};
    use devtrail_api::NoToken;
    use url::Url;

    use super::*;
    use crate::config::BackendConfig;
    use crate::error::ErrorKind;
    use crate::grids::{EVENTS_PATH, event_grid_spec, event_grid_spec_with};
    use crate::grid::timefmt;
    use crate::model::EventRecord;

    fn grid(spec: GridSpec<EventRecord>) -> RecordGrid<EventRecord> {
        let client = BackendConfig::new(Url::parse("http://127.0.0.1:9/").unwrap())
            .build_client(Arc::new(NoToken))
            .unwrap();
        RecordGrid::from_resource(FetchResource::new(client, EVENTS_PATH), spec)
    }

    #[test]
    fn loading_state_shows_only_loading_literal() {
        let mut g = grid(event_grid_spec());
        assert_eq!(g.apply(&RequestState::Loading), GridPhase::Loading);
        assert!(matches!(g.view(), GridView::Loading("Loading devices...")));
        assert!(g.table().is_none());
    }

    #[test]
    fn failure_shows_only_failure_literal() {
        let mut g = grid(event_grid_spec());
        let err = RequestError::new(ErrorKind::Status(500), "500 Internal Server Error");
        assert_eq!(g.apply(&RequestState::Failed(err)), GridPhase::Failed);
        match g.view() {
            GridView::Failed(text) => {
                assert_eq!(text, "Failed to load devices.\nPlease try again later.");
            }
            other => panic!("unexpected view {other:?}"),
        }
        assert!(g.table().is_none());
        assert_eq!(g.error().unwrap().kind(), ErrorKind::Status(500));
    }

    #[test]
    fn ready_formats_time_in_viewer_zone() {
        let berlin = FixedOffset::east_opt(3600).unwrap();
        let mut g = grid(event_grid_spec_with(timefmt::formatter_in(berlin)));
        let row = EventRecord {
            move_time: Some("2024-12-12 23:59:59".into()),
            ..EventRecord::default()
        };
        g.apply(&RequestState::Ready(Arc::new(vec![row])));

        let GridView::Ready(table) = g.view() else {
            panic!("grid not ready");
        };
        let col = table.column_index("Date/Time").unwrap();
        let visible = table.visible_rows();
        assert_eq!(visible.len(), 1);
        assert_eq!(table.cell_text(visible[0].record, col), "13/12/2024, 00:59");
    }

    #[test]
    fn ready_with_utc_viewer_keeps_wall_clock() {
        let mut g = grid(event_grid_spec_with(timefmt::formatter_in(Utc)));
        let row = EventRecord {
            move_time: Some("2024-12-12 23:59:59".into()),
            ..EventRecord::default()
        };
        g.apply(&RequestState::Ready(Arc::new(vec![row])));
        let table = g.table().unwrap();
        assert_eq!(table.display_rows()[0][2], "12/12/2024, 23:59");
    }

    #[test]
    fn reapplying_same_rows_keeps_view_options() {
        let mut g = grid(event_grid_spec());
        let rows = Arc::new(vec![EventRecord::default()]);
        g.apply(&RequestState::Ready(Arc::clone(&rows)));
        g.table_mut().unwrap().set_filter(0, "x");
        g.apply(&RequestState::Ready(rows));
        assert!(g.table().unwrap().has_filters());
    }

    #[test]
    fn empty_rows_render_header_only() {
        let mut g = grid(event_grid_spec());
        g.apply(&RequestState::Ready(Arc::new(Vec::new())));
        let table = g.table().unwrap();
        assert!(table.visible_rows().is_empty());
        assert_eq!(
            table.export_csv(),
            "Email,User name,Date/Time,Location,Company,Device\n"
        );
    }
}
