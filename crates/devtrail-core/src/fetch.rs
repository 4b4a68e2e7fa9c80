// ── Fetch-with-state ──
//
// One GET per invocation against a resource path, published through a
// `watch` channel. Invocations are numbered; only the newest may write.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use devtrail_api::BackendClient;

use crate::error::RequestError;
use crate::state::RequestState;

/// Rows of a settled fetch. Shared so subscribers clone cheaply.
pub type Rows<T> = Arc<Vec<T>>;

/// Authenticated GET of a resource path, exposed as a [`RequestState`].
///
/// The state starts as `Loading` and settles exactly once per invocation.
/// A response belonging to an older invocation is discarded, so the state
/// always reflects the most recent call regardless of arrival order.
/// Dropping the resource cancels every in-flight request; nothing is
/// written after that.
pub struct FetchResource<T> {
    client: Arc<BackendClient>,
    path: String,
    generation: Arc<AtomicU64>,
    state: Arc<watch::Sender<RequestState<Rows<T>>>>,
    cancel: CancellationToken,
}

impl<T> FetchResource<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Create the resource in the `Loading` state without sending anything.
    pub fn new(client: Arc<BackendClient>, path: impl Into<String>) -> Self {
        let (state, _) = watch::channel(RequestState::Loading);
        Self {
            client,
            path: path.into(),
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
            cancel: CancellationToken::new(),
        }
    }

    /// Create the resource and issue the first GET.
    pub fn mount(client: Arc<BackendClient>, path: impl Into<String>) -> Self {
        let resource = Self::new(client, path);
        // Detached: the task reports through the state channel.
        drop(resource.fetch());
        resource
    }

    /// The resource path currently bound.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> RequestState<Rows<T>> {
        self.state.borrow().clone()
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<RequestState<Rows<T>>> {
        self.state.subscribe()
    }

    /// Rebind to a new path. A different path restarts the lifecycle and
    /// returns the handle of the new request; the same path is a no-op.
    pub fn set_path(&mut self, path: impl Into<String>) -> Option<JoinHandle<()>> {
        let path = path.into();
        if path == self.path {
            return None;
        }
        debug!(from = %self.path, to = %path, "resource path changed");
        self.path = path;
        Some(self.fetch())
    }

    /// Start a new invocation: reset to `Loading` and spawn one GET.
    ///
    /// Must be called from within a tokio runtime.
    pub fn fetch(&self) -> JoinHandle<()> {
        // Bump and reset under the channel lock so a settling task can
        // never interleave between the two.
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = RequestState::Loading;
        });

        let client = Arc::clone(&self.client);
        let path = self.path.clone();
        let current = Arc::clone(&self.generation);
        let state = Arc::clone(&self.state);
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                () = cancel.cancelled() => {
                    debug!(%path, generation, "fetch cancelled before settling");
                    return;
                }
                result = load_rows::<T>(&client, &path) => result,
            };

            match &outcome {
                Ok(rows) => info!(%path, rows = rows.len(), "fetch settled"),
                Err(e) => warn!(%path, error = %e, "fetch failed"),
            }

            let settled: RequestState<Rows<T>> = outcome.map(Arc::new).into();
            let written = state.send_if_modified(|slot| {
                if cancel.is_cancelled() || current.load(Ordering::SeqCst) != generation {
                    return false;
                }
                *slot = settled;
                true
            });
            if !written {
                debug!(%path, generation, "discarding stale response");
            }
        })
    }
}

impl<T> Drop for FetchResource<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// GET `path` and decode the body into rows.
pub async fn load_rows<T: DeserializeOwned>(
    client: &BackendClient,
    path: &str,
) -> Result<Vec<T>, RequestError> {
    let body = client.get_json(path).await?;
    decode_rows(body)
}

/// Normalise a response body into rows.
///
/// An array yields its elements, `null` yields no rows, and any other value
/// (a single-resource object) becomes a one-row list. A row that does not
/// decode fails the whole body; partial data is never returned.
pub fn decode_rows<T: DeserializeOwned>(body: Value) -> Result<Vec<T>, RequestError> {
    let items = match body {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            serde_json::from_value(item)
                .map_err(|e| RequestError::parse(format!("row {idx}: {e}")))
        })
        .collect()
}
