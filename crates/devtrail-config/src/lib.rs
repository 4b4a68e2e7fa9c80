//! Shared configuration for the devtrail CLI and TUI.
//!
//! TOML profiles, the read-only access-token chain (env + keyring + token
//! file), and translation to `devtrail_core::BackendConfig`. Both binaries
//! depend on this crate; the CLI layers flag overrides on top.

mod token;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use devtrail_core::{BackendConfig, TlsVerification};

pub use token::{DEFAULT_TOKEN_ENV, TokenSource, TokenStore, token_file_path};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in {}", path.display())]
    UnknownProfile { name: String, path: PathBuf },

    #[error("no backend address configured for profile '{profile}'")]
    NoBackend { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some(DEFAULT_PROFILE.into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

pub const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base address (e.g., "https://tracking.example.com/api").
    #[serde(default)]
    pub backend: String,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout, in seconds.
    pub timeout: Option<u64>,

    /// Environment variable holding the access token.
    pub token_env: Option<String>,

    /// Where exported CSV files go when no path is given.
    pub export_dir: Option<PathBuf>,
}

impl Config {
    /// Name of the profile to use: explicit choice, then `default_profile`.
    pub fn profile_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .or(self.default_profile.as_deref())
            .unwrap_or(DEFAULT_PROFILE)
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Timeout for `profile`, falling back to the global default.
    pub fn timeout_for(&self, profile: Option<&Profile>) -> Duration {
        Duration::from_secs(
            profile
                .and_then(|p| p.timeout)
                .unwrap_or(self.defaults.timeout),
        )
    }

    pub fn insecure_for(&self, profile: Option<&Profile>) -> bool {
        profile
            .and_then(|p| p.insecure)
            .unwrap_or(self.defaults.insecure)
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "devtrail", "devtrail")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory for data owned by other tools (the login flow writes the
/// token file here).
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(dirs_fallback, |dirs| dirs.data_dir().to_path_buf())
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("devtrail");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// Environment keys use `__` as the nesting separator, e.g.
/// `DEVTRAIL_DEFAULTS__TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DEVTRAIL_").split("__"));

    let config: Config = figment.extract()?;
    tracing::debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load only what is stored in the file at `path`, without environment
/// overrides. Use this before rewriting the file. A missing file yields the
/// defaults; a malformed one is an error.
pub fn load_config_file_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Backend config ──────────────────────────────────────────────────

/// Parse a backend address. A missing trailing slash is fine.
pub fn parse_backend(raw: &str) -> Result<url::Url, ConfigError> {
    let raw = raw.trim();
    let url: url::Url = raw.parse().map_err(|e| ConfigError::Validation {
        field: "backend".into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "backend".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// Build a `BackendConfig` from a profile, with no CLI flag overrides.
pub fn profile_to_backend_config(
    config: &Config,
    profile: &Profile,
    profile_name: &str,
) -> Result<BackendConfig, ConfigError> {
    if profile.backend.trim().is_empty() {
        return Err(ConfigError::NoBackend {
            profile: profile_name.into(),
        });
    }
    let base_url = parse_backend(&profile.backend)?;

    let tls = if config.insecure_for(Some(profile)) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(BackendConfig {
        base_url,
        tls,
        timeout: config.timeout_for(Some(profile)),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "lab"

[defaults]
timeout = 12

[profiles.lab]
backend = "https://tracking.example.com/api"
token_env = "LAB_TOKEN"

[profiles.local]
backend = "http://localhost:8000"
insecure = true
timeout = 3
"#;

    fn write_sample() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        (dir, path)
    }

    #[test]
    fn file_layer_rejects_malformed_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[defaults]\ntimeout = \"ten\"\n").unwrap();

        assert!(matches!(
            load_config_file_from(&path),
            Err(ConfigError::Figment(_))
        ));
    }

    #[test]
    fn file_layer_reads_profiles() {
        let (_dir, path) = write_sample();
        let cfg = load_config_file_from(&path).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("lab"));
        assert_eq!(cfg.profiles.len(), 2);
    }

    #[test]
    fn loads_profiles_and_defaults() {
        let (_dir, path) = write_sample();
        let cfg = load_config_from(&path).unwrap();

        assert_eq!(cfg.profile_name(None), "lab");
        assert_eq!(cfg.profile_name(Some("local")), "local");
        let lab = cfg.profile("lab").unwrap();
        assert_eq!(lab.token_env.as_deref(), Some("LAB_TOKEN"));
        assert_eq!(cfg.timeout_for(Some(lab)), Duration::from_secs(12));
        assert_eq!(cfg.defaults.output, "table");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.profile_name(None), DEFAULT_PROFILE);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn profile_overrides_tls_and_timeout() {
        let (_dir, path) = write_sample();
        let cfg = load_config_from(&path).unwrap();

        let local = profile_to_backend_config(&cfg, cfg.profile("local").unwrap(), "local").unwrap();
        assert!(matches!(local.tls, TlsVerification::DangerAcceptInvalid));
        assert_eq!(local.timeout, Duration::from_secs(3));

        let lab = profile_to_backend_config(&cfg, cfg.profile("lab").unwrap(), "lab").unwrap();
        assert!(matches!(lab.tls, TlsVerification::SystemDefaults));
        assert_eq!(lab.base_url.as_str(), "https://tracking.example.com/api");
    }

    #[test]
    fn empty_backend_is_rejected() {
        let cfg = Config::default();
        let err = profile_to_backend_config(&cfg, &Profile::default(), "default").unwrap_err();
        assert!(matches!(err, ConfigError::NoBackend { .. }));
    }

    #[test]
    fn non_http_backend_is_rejected() {
        assert!(parse_backend("ftp://example.com").is_err());
        assert!(parse_backend("not a url").is_err());
        assert!(parse_backend(" http://localhost:8000 ").is_ok());
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                backend: "https://tracking.example.com".into(),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }
}
