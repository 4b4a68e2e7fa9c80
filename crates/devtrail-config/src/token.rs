// ── Access-token lookup ──
//
// Read-only chain consulted on every backend call:
//   env var → OS keyring → token file
// Nothing here writes a token; the login flow owns that.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use secrecy::SecretString;
use tracing::trace;

use devtrail_core::TokenProvider;

use crate::Profile;

/// Environment variable read when the profile names none.
pub const DEFAULT_TOKEN_ENV: &str = "DEVTRAIL_ACCESS_TOKEN";

const KEYRING_SERVICE: &str = "devtrail";

/// How long a keyring answer (hit or miss) is reused. The keyring call
/// blocks, and runs on every backend request otherwise.
const KEYRING_TTL: Duration = Duration::from_secs(30);

/// Default location of the persisted token: `{data_dir}/access_token`.
pub fn token_file_path() -> PathBuf {
    crate::data_dir().join("access_token")
}

/// Where a token was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// Passed explicitly on the command line.
    Flag,
    Env(String),
    Keyring,
    File(PathBuf),
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => f.write_str("--token flag"),
            Self::Env(var) => write!(f, "env ${var}"),
            Self::Keyring => f.write_str("keyring"),
            Self::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

type EnvLookup = fn(&str) -> Option<String>;

/// Keyring read for a profile name.
type KeyringLookup = fn(&str) -> Option<String>;

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn os_keyring(profile: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile}/access_token"))
        .and_then(|entry| entry.get_password())
        .ok()
}

/// Last keyring answer and when it was read. Shared between clones.
type KeyringCache = Arc<Mutex<Option<(Instant, Option<SecretString>)>>>;

/// Token provider backed by the environment, the OS keyring, and a file.
#[derive(Clone)]
pub struct TokenStore {
    profile: String,
    env_var: String,
    env: EnvLookup,
    keyring: Option<KeyringLookup>,
    keyring_cache: KeyringCache,
    token_file: Option<PathBuf>,
}

impl TokenStore {
    /// The chain for a named profile, using its `token_env` if set.
    pub fn for_profile(profile_name: &str, profile: Option<&Profile>) -> Self {
        let env_var = profile
            .and_then(|p| p.token_env.clone())
            .unwrap_or_else(|| DEFAULT_TOKEN_ENV.into());
        Self {
            profile: profile_name.into(),
            env_var,
            env: process_env,
            keyring: Some(os_keyring),
            keyring_cache: KeyringCache::default(),
            token_file: Some(token_file_path()),
        }
    }

    pub fn without_keyring(mut self) -> Self {
        self.keyring = None;
        self
    }

    pub fn with_keyring(mut self, lookup: KeyringLookup) -> Self {
        self.keyring = Some(lookup);
        self.keyring_cache = KeyringCache::default();
        self
    }

    pub fn with_token_file(mut self, path: Option<PathBuf>) -> Self {
        self.token_file = path;
        self
    }

    pub fn with_env(mut self, lookup: EnvLookup) -> Self {
        self.env = lookup;
        self
    }

    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    pub fn token_file(&self) -> Option<&Path> {
        self.token_file.as_deref()
    }

    /// First non-blank token in the chain, with where it came from.
    pub fn lookup(&self) -> Option<(SecretString, TokenSource)> {
        if let Some(token) = non_blank((self.env)(&self.env_var)) {
            trace!(var = %self.env_var, "access token from env");
            return Some((token, TokenSource::Env(self.env_var.clone())));
        }

        if let Some(token) = self.keyring_token() {
            trace!(profile = %self.profile, "access token from keyring");
            return Some((token, TokenSource::Keyring));
        }

        let path = self.token_file.as_ref()?;
        let token = non_blank(std::fs::read_to_string(path).ok())?;
        trace!(path = %path.display(), "access token from file");
        Some((token, TokenSource::File(path.clone())))
    }

    /// Where the current token would come from, if anywhere.
    pub fn source(&self) -> Option<TokenSource> {
        self.lookup().map(|(_, source)| source)
    }

    fn keyring_token(&self) -> Option<SecretString> {
        let lookup = self.keyring?;
        let Ok(mut cache) = self.keyring_cache.lock() else {
            return non_blank(lookup(&self.profile));
        };
        if let Some((_, token)) = cache
            .as_ref()
            .filter(|(read_at, _)| read_at.elapsed() < KEYRING_TTL)
        {
            return token.clone();
        }
        let token = non_blank(lookup(&self.profile));
        *cache = Some((Instant::now(), token.clone()));
        token
    }
}

fn non_blank(raw: Option<String>) -> Option<SecretString> {
    let raw = raw?;
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| SecretString::from(trimmed.to_owned()))
}

impl TokenProvider for TokenStore {
    fn access_token(&self) -> Option<SecretString> {
        self.lookup().map(|(token, _)| token)
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("profile", &self.profile)
            .field("env_var", &self.env_var)
            .field("keyring", &self.keyring.is_some())
            .field("token_file", &self.token_file)
            .finish_non_exhaustive()
    }
}
