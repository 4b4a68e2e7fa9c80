// Backend HTTP client
//
// Wraps `reqwest::Client` with resource-path URL construction, bearer
// token attachment, and status/body normalisation. Callers hand in a
// relative resource path ("events", "devices/42/events") and get back
// decoded JSON or a typed `Error`.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{TokenProvider, bearer_value};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Raw HTTP client for the tracking backend.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenProvider>,
}

impl fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl BackendClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the backend address every resource path is appended to
    /// (e.g. `https://tracker.example.com/api`).
    pub fn new(
        base_url: Url,
        transport: &TransportConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, tokens))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            http,
            base_url,
            tokens,
        }
    }

    /// The backend base address.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether the credential provider currently has a token.
    pub fn has_token(&self) -> bool {
        bearer_value(self.tokens.as_ref()).is_some()
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/{path}` with exactly one slash at the joint.
    pub fn resource_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        let full = format!("{base}/{path}");
        Url::parse(&full).map_err(|e| Error::InvalidUrl(format!("{full}: {e}")))
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send one GET for a resource path and decode the JSON body.
    pub async fn get_json(&self, path: &str) -> Result<Value, Error> {
        let url = self.resource_url(path)?;
        debug!("GET {}", url);

        let builder = self.authorize(self.http.get(url));
        let resp = builder.send().await.map_err(|e| Error::network(&e))?;

        Self::read_json(resp).await
    }

    /// Send one POST with a JSON body and decode the JSON response.
    pub async fn post_json<P>(&self, path: &str, payload: &P) -> Result<Value, Error>
    where
        P: Serialize + Sync + ?Sized,
    {
        let url = self.resource_url(path)?;
        debug!("POST {}", url);

        // `.json()` sets `Content-Type: application/json`.
        let builder = self.authorize(self.http.post(url).json(payload));
        let resp = builder.send().await.map_err(|e| Error::network(&e))?;

        Self::read_json(resp).await
    }

    /// Attach `Authorization: Bearer <token>` iff the provider has a token.
    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let Some(value) = bearer_value(self.tokens.as_ref()) else {
            return builder;
        };
        match HeaderValue::from_str(&value) {
            Ok(mut header) => {
                header.set_sensitive(true);
                builder.header(AUTHORIZATION, header)
            }
            Err(_) => {
                warn!("access token is not a valid header value, sending anonymously");
                builder
            }
        }
    }

    /// Check the status line, then decode the body. An empty 2xx body
    /// decodes as `null`.
    async fn read_json(resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();

        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_owned(),
            });
        }

        let body = resp.bytes().await.map_err(|e| Error::network(&e))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&body).map_err(|e| Error::Parse {
            message: e.to_string(),
        })
    }
}
