// ── Backend connection settings ──
//
// Resolved by the config crate (profile + flags) and turned into a
// `BackendClient` here, so binaries never touch transport details.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use devtrail_api::{BackendClient, TlsMode, TokenProvider, TransportConfig};

use crate::error::RequestError;

/// TLS certificate verification policy.
#[derive(Debug, Clone, Default)]
pub enum TlsVerification {
    #[default]
    SystemDefaults,
    CustomCa(PathBuf),
    DangerAcceptInvalid,
}

/// Everything needed to talk to one backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// `BACKEND_ADDR` -- every resource path is appended to this.
    pub base_url: Url,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }

    /// Build a shared client that reads credentials from `tokens`.
    pub fn build_client(
        &self,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Arc<BackendClient>, RequestError> {
        let client = BackendClient::new(self.base_url.clone(), &self.transport(), tokens)?;
        Ok(Arc::new(client))
    }
}
