// ── Request error ──
//
// The single error value a RequestState carries. UI code only ever shows
// `message`; `kind` is kept for logging and exit-code mapping.

use thiserror::Error;

/// Which stage of a backend call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request could not be sent or received.
    Network,
    /// Backend answered with a non-2xx status.
    Status(u16),
    /// Body could not be decoded into the expected shape.
    Parse,
}

/// Displayable failure of a fetch or mutation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RequestError {
    kind: ErrorKind,
    message: String,
}

impl RequestError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The backend refused the credentials (or their absence).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.kind, ErrorKind::Status(401 | 403))
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::Status(404)
    }

    /// Same kind, new message. Used to prefix mutation failures with the
    /// action label.
    pub(crate) fn with_message(&self, message: String) -> Self {
        Self {
            kind: self.kind,
            message,
        }
    }
}

impl From<devtrail_api::Error> for RequestError {
    fn from(err: devtrail_api::Error) -> Self {
        use devtrail_api::Error as E;

        let kind = match &err {
            E::Status { status, .. } => ErrorKind::Status(*status),
            E::Parse { .. } => ErrorKind::Parse,
            E::Network { .. } | E::InvalidUrl(_) | E::Tls(_) => ErrorKind::Network,
        };
        Self::new(kind, err.to_string())
    }
}
