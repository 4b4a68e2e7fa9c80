//! Backend session built from the shared config file plus flag overrides.

use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::eyre::{Result, eyre};
use tracing::debug;

use devtrail_config::{Config, TokenStore, config_path, parse_backend, profile_to_backend_config};
use devtrail_core::{BackendClient, BackendConfig, StaticToken, TlsVerification, TokenProvider};

use crate::Cli;

pub struct Session {
    pub profile_name: String,
    pub client: Arc<BackendClient>,
    /// Where exported CSV files land.
    pub export_dir: PathBuf,
}

impl Session {
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let cfg = devtrail_config::load_config_or_default();
        Self::resolve_with(&cfg, cli)
    }

    pub fn resolve_with(cfg: &Config, cli: &Cli) -> Result<Self> {
        let profile_name = cfg.profile_name(cli.profile.as_deref()).to_owned();
        let profile = cfg.profile(&profile_name);

        let backend = match (cli.backend.as_deref(), profile) {
            (Some(raw), _) => {
                let mut backend = BackendConfig::new(parse_backend(raw)?);
                backend.timeout = cfg.timeout_for(profile);
                if cfg.insecure_for(profile) {
                    backend.tls = TlsVerification::DangerAcceptInvalid;
                }
                backend
            }
            (None, Some(p)) => profile_to_backend_config(cfg, p, &profile_name)?,
            (None, None) => {
                return Err(eyre!(
                    "no backend configured for profile '{profile_name}': pass --backend or add it to {}",
                    config_path().display()
                ));
            }
        };

        let tokens: Arc<dyn TokenProvider> = match cli.token.as_deref() {
            Some(token) => Arc::new(StaticToken::new(token)),
            None => Arc::new(TokenStore::for_profile(&profile_name, profile)),
        };

        debug!(profile = %profile_name, backend = %backend.base_url, "session resolved");

        Ok(Self {
            client: backend.build_client(tokens)?,
            export_dir: profile
                .and_then(|p| p.export_dir.clone())
                .unwrap_or_else(|| PathBuf::from(".")),
            profile_name,
        })
    }
}
