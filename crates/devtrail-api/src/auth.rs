use secrecy::{ExposeSecret, SecretString};

/// Source of the bearer credential attached to backend calls.
///
/// Implementations are read-only: this layer never stores or rotates a
/// token. The provider is asked on every request, so a token that appears
/// (or disappears) between calls takes effect immediately.
pub trait TokenProvider: Send + Sync {
    /// The current access token, or `None` when the caller is anonymous.
    fn access_token(&self) -> Option<SecretString>;
}

/// Anonymous access -- never attaches an `Authorization` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

impl TokenProvider for NoToken {
    fn access_token(&self) -> Option<SecretString> {
        None
    }
}

/// A fixed token supplied up front (CLI flag, tests).
#[derive(Debug, Clone)]
pub struct StaticToken(SecretString);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }
}

impl TokenProvider for StaticToken {
    fn access_token(&self) -> Option<SecretString> {
        Some(self.0.clone())
    }
}

/// Render the `Authorization` header value for a provider, if it has a
/// usable token. Blank tokens count as absent.
pub(crate) fn bearer_value(tokens: &dyn TokenProvider) -> Option<String> {
    let token = tokens.access_token()?;
    let raw = token.expose_secret().trim();
    if raw.is_empty() {
        None
    } else {
        Some(format!("Bearer {raw}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_token_yields_no_header() {
        assert!(bearer_value(&NoToken).is_none());
    }

    #[test]
    fn static_token_renders_bearer() {
        let tokens = StaticToken::new("abc.def");
        assert_eq!(bearer_value(&tokens).as_deref(), Some("Bearer abc.def"));
    }

    #[test]
    fn blank_token_is_treated_as_absent() {
        assert!(bearer_value(&StaticToken::new("   ")).is_none());
    }
}
