//! Async HTTP client for the devtrail event-tracking backend.
//!
//! - **[`BackendClient`]** — resource-path GET/POST returning decoded JSON.
//! - **[`TokenProvider`]** — injected, read-only source of the bearer token.
//! - **[`TransportConfig`]** — shared TLS and timeout settings.
//! - **[`Error`]** — network, status, and parse failures.

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;

pub use auth::{NoToken, StaticToken, TokenProvider};
pub use client::BackendClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
