//! CLI configuration: thin wrapper around `devtrail_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--backend, --token, --insecure, --timeout).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use devtrail_core::{BackendConfig, StaticToken, TlsVerification, TokenProvider};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use devtrail_config::{
    Config, Profile, TokenStore, config_path, load_config_file_from, load_config_or_default,
    save_config_to,
};

/// Everything a backend-bound command needs.
pub struct Session {
    pub profile_name: String,
    pub backend: BackendConfig,
    pub tokens: Arc<dyn TokenProvider>,
    pub export_dir: Option<PathBuf>,
}

impl Session {
    /// Place a bare export file name under the profile's export directory.
    pub fn export_path(&self, requested: &Path) -> PathBuf {
        match &self.export_dir {
            Some(dir) if requested.is_relative() && requested.parent() == Some(Path::new("")) => {
                dir.join(requested)
            }
            _ => requested.to_path_buf(),
        }
    }
}

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref()).to_owned()
}

/// Build a session from the config file, profile, and CLI overrides.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_session(global: &GlobalOpts) -> Result<Session, CliError> {
    let cfg = load_config_or_default();
    resolve_session_with(&cfg, global)
}

pub fn resolve_session_with(cfg: &Config, global: &GlobalOpts) -> Result<Session, CliError> {
    let profile_name = active_profile_name(global, cfg);
    let profile = cfg.profile(&profile_name);

    // An explicitly named profile must exist unless the backend is given.
    if profile.is_none() && global.profile.is_some() && global.backend.is_none() {
        let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
        available.sort();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }

    // 1. Backend address (flag > env > profile)
    let raw = global
        .backend
        .as_deref()
        .or(profile.map(|p| p.backend.as_str()))
        .filter(|b| !b.trim().is_empty())
        .ok_or_else(|| CliError::NoConfig {
            path: config_path().display().to_string(),
        })?;
    let base_url = devtrail_config::parse_backend(raw)?;

    // 2. TLS verification
    let tls = if global.insecure || cfg.insecure_for(profile) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ca_path) = profile.and_then(|p| p.ca_cert.clone()) {
        TlsVerification::CustomCa(ca_path)
    } else {
        TlsVerification::SystemDefaults
    };

    // 3. Timeout
    let timeout = global
        .timeout
        .map_or_else(|| cfg.timeout_for(profile), Duration::from_secs);

    // 4. Access token (flag > env > keyring > token file)
    let tokens: Arc<dyn TokenProvider> = match global.token.as_deref() {
        Some(token) => Arc::new(StaticToken::new(token)),
        None => Arc::new(TokenStore::for_profile(&profile_name, profile)),
    };

    tracing::debug!(profile = %profile_name, backend = %base_url, "session resolved");

    Ok(Session {
        backend: BackendConfig {
            base_url,
            tls,
            timeout,
        },
        tokens,
        export_dir: profile.and_then(|p| p.export_dir.clone()),
        profile_name,
    })
}
