// ── Request state ──
//
// Outcome of one asynchronous backend call. Shared by the read path
// (FetchResource) and the write path (MutateResource).

use crate::error::RequestError;

/// Lifecycle of a backend request.
///
/// The `{data, loading, error}` triple is encoded as one variant at a time,
/// so "loading with an error" or "error with data" cannot be represented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestState<T> {
    /// Nothing requested yet. Only mutations start here.
    #[default]
    Idle,
    /// A request is in flight.
    Loading,
    /// The most recent request succeeded.
    Ready(T),
    /// The most recent request failed.
    Failed(RequestError),
}

impl<T> RequestState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready(_) | Self::Failed(_))
    }

    /// The settled data, or `None` while idle, loading, or failed.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RequestError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

impl<T> From<Result<T, RequestError>> for RequestState<T> {
    fn from(result: Result<T, RequestError>) -> Self {
        match result {
            Ok(data) => Self::Ready(data),
            Err(err) => Self::Failed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_has_neither_data_nor_error() {
        let state: RequestState<Vec<u8>> = RequestState::Loading;
        assert!(state.is_loading());
        assert!(state.data().is_none());
        assert!(state.error().is_none());
        assert!(!state.is_settled());
    }

    #[test]
    fn result_conversion() {
        let ok: RequestState<u8> = Ok(3).into();
        assert_eq!(ok.data(), Some(&3));
        assert!(ok.is_settled());

        let err: RequestState<u8> = Err(RequestError::parse("bad")).into();
        assert_eq!(err.error().map(RequestError::message), Some("bad"));
        assert!(!err.is_loading());
    }
}
