// ── Mutate-with-state ──
//
// Imperative POST of a payload to a resource path. The state is `Loading`
// strictly while a submission is in flight; a drop guard releases it on
// every exit path, including a cancelled future.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, warn};

use devtrail_api::BackendClient;

use crate::alert::{AlertSink, NoAlerts};
use crate::error::RequestError;
use crate::state::RequestState;

/// Authenticated POST of payloads to one resource path.
///
/// Failures are reported as `"{label} failed: {reason}"` and, when a
/// non-blank action label is configured, also raised through the
/// [`AlertSink`]. Without a label the failure is only recorded in the
/// state; callers opt out of the alert by leaving the label unset.
pub struct MutateResource<R> {
    client: Arc<BackendClient>,
    path: String,
    action_label: Option<String>,
    alerts: Arc<dyn AlertSink>,
    generation: AtomicU64,
    state: watch::Sender<RequestState<R>>,
}

impl<R> MutateResource<R>
where
    R: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(client: Arc<BackendClient>, path: impl Into<String>) -> Self {
        let (state, _) = watch::channel(RequestState::Idle);
        Self {
            client,
            path: path.into(),
            action_label: None,
            alerts: Arc::new(NoAlerts),
            generation: AtomicU64::new(0),
            state,
        }
    }

    /// Label used in failure messages; enables alerts when non-blank.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.action_label = Some(label.into());
        self
    }

    pub fn with_alerts(mut self, alerts: Arc<dyn AlertSink>) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn state(&self) -> RequestState<R> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<R>> {
        self.state.subscribe()
    }

    fn label(&self) -> Option<&str> {
        self.action_label
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }

    /// Message recorded for a failed submission.
    pub fn failure_message(&self, err: &RequestError) -> String {
        match self.label() {
            Some(label) => format!("{label} failed: {err}"),
            None => format!("Request failed: {err}"),
        }
    }

    /// POST `payload` as JSON and settle the state with the outcome.
    ///
    /// The newest submission owns the state; an older one that settles
    /// later only returns its outcome to its caller.
    pub async fn submit<P>(&self, payload: &P) -> RequestState<R>
    where
        P: Serialize + Sync + ?Sized,
    {
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = RequestState::Loading;
        });
        let guard = LoadingGuard {
            state: &self.state,
            current: &self.generation,
            generation,
        };

        debug!(path = %self.path, generation, "submitting");
        let outcome = self
            .client
            .post_json(&self.path, payload)
            .await
            .map_err(RequestError::from)
            .and_then(|body| {
                serde_json::from_value::<R>(body).map_err(|e| RequestError::parse(e.to_string()))
            });

        let settled = match outcome {
            Ok(result) => RequestState::Ready(result),
            Err(err) => {
                let message = self.failure_message(&err);
                warn!(path = %self.path, error = %err, "{message}");
                if self.label().is_some() {
                    self.alerts.alert(&message);
                }
                RequestState::Failed(err.with_message(message))
            }
        };

        guard.settle(settled.clone());
        settled
    }
}

/// Releases `Loading` when a submission ends, however it ends.
struct LoadingGuard<'a, R> {
    state: &'a watch::Sender<RequestState<R>>,
    current: &'a AtomicU64,
    generation: u64,
}

impl<R> LoadingGuard<'_, R> {
    fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }

    fn settle(self, outcome: RequestState<R>) {
        self.state.send_if_modified(|slot| {
            if !self.is_current() {
                return false;
            }
            *slot = outcome;
            true
        });
        // Drop runs next and sees a settled state.
    }
}

impl<R> Drop for LoadingGuard<'_, R> {
    fn drop(&mut self) {
        self.state.send_if_modified(|slot| {
            if slot.is_loading() && self.is_current() {
                *slot = RequestState::Idle;
                return true;
            }
            false
        });
    }
}
