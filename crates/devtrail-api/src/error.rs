use thiserror::Error;

/// Top-level error type for the `devtrail-api` crate.
///
/// Every failure of a backend call lands in one of three buckets:
/// the request never completed, the backend answered with a non-2xx status,
/// or the body could not be decoded. `devtrail-core` folds these into a
/// single displayable error for the UI.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Request could not be sent or the response could not be received
    /// (connection refused, DNS failure, TLS handshake, timeout).
    #[error("{message}")]
    Network { message: String },

    // ── HTTP ────────────────────────────────────────────────────────
    /// Response received with a non-2xx status. Only the status line is
    /// kept; the body is intentionally dropped.
    #[error("{status} {reason}")]
    Status { status: u16, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Response body is not valid JSON.
    #[error("invalid response body: {message}")]
    Parse { message: String },

    // ── Setup ───────────────────────────────────────────────────────
    /// Resource path could not be joined onto the backend address.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP client could not be built (CA bundle unreadable, etc.)
    #[error("TLS error: {0}")]
    Tls(String),
}

impl Error {
    /// Build a network error from a `reqwest` failure without leaking
    /// anything beyond its description.
    pub(crate) fn network(err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_owned()
        } else if err.is_connect() {
            "could not connect to backend".to_owned()
        } else {
            err.to_string()
        };
        Self::Network { message }
    }
}
