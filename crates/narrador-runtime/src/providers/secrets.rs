//! Secure credential handling for providers and the service token.
//!
//! - **No accidental logging**: credentials never appear in Debug/Display output
//! - **Memory safety**: values are zeroed on drop (via `secrecy`)
//! - **Explicit exposure**: the raw value is only reachable through [`ApiCredential::expose`]
//!
//! ## Usage
//!
//! ```ignore
//! use narrador_runtime::providers::ApiCredential;
//!
//! let lookup = |key: &str| std::env::var(key).ok();
//! let cred = ApiCredential::from_lookup(lookup, "GROQ_API_KEY", "Groq API key");
//!
//! // Use in HTTP header (explicit exposure)
//! request.bearer_auth(cred.expose());
//! ```

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Where a credential was loaded from.
///
/// Useful for debugging configuration issues without exposing the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from an environment variable (or `.env` file)
    Environment,
    /// Built-in fallback value
    Default,
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Default => write!(f, "default"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored credential.
///
/// `Debug` shows `[REDACTED]`; the value is only reachable via `.expose()`.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    /// Wrap a value. It cannot be logged after this point.
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load from a variable lookup. Unset and empty values both count as absent.
    pub fn from_lookup<F>(lookup: F, env_var: &str, name: &'static str) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(env_var)
            .filter(|value| !value.is_empty())
            .map(|value| Self::new(value, CredentialSource::Environment, name))
    }

    /// Expose the value for use in an outbound request.
    ///
    /// Only call this where the credential is actually needed. Never store
    /// the exposed value.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    /// Compare against a presented value (e.g. an incoming request token).
    pub fn matches(&self, presented: &str) -> bool {
        let expected = self.expose().as_bytes();
        let presented = presented.as_bytes();
        expected.len() == presented.len()
            && expected
                .iter()
                .zip(presented)
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }

    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Clone for ApiCredential {
    fn clone(&self) -> Self {
        Self::new(self.expose(), self.source, self.name)
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_credential_redacted_in_debug() {
        let secret = "gsk-super-secret-key-12345";
        let cred = ApiCredential::new(secret, CredentialSource::Programmatic, "Test API key");

        let debug = format!("{:?}", cred);
        assert!(!debug.contains(secret), "Secret exposed in Debug!");
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_credential_redacted_in_display() {
        let secret = "sk-super-secret-key-12345";
        let cred = ApiCredential::new(secret, CredentialSource::Environment, "Test API key");

        let display = format!("{}", cred);
        assert!(!display.contains(secret), "Secret exposed in Display!");
        assert!(display.contains("[REDACTED]"));
        assert!(display.contains("Test API key"));
        assert!(display.contains("environment"));
    }

    #[test]
    fn test_credential_expose_and_clone() {
        let cred = ApiCredential::new("secret", CredentialSource::Default, "Token");
        let copy = cred.clone();

        assert_eq!(copy.expose(), "secret");
        assert_eq!(copy.source(), CredentialSource::Default);
        assert_eq!(copy.name(), "Token");
    }

    #[test]
    fn test_from_lookup_ignores_unset_and_empty() {
        let vars: HashMap<&str, &str> = [("SET", "value"), ("EMPTY", "")].into_iter().collect();
        let lookup = |key: &str| vars.get(key).map(|v| v.to_string());

        let cred = ApiCredential::from_lookup(lookup, "SET", "Set key").unwrap();
        assert_eq!(cred.expose(), "value");
        assert_eq!(cred.source(), CredentialSource::Environment);

        assert!(ApiCredential::from_lookup(lookup, "EMPTY", "Empty key").is_none());
        assert!(ApiCredential::from_lookup(lookup, "MISSING", "Missing key").is_none());
    }

    #[test]
    fn test_matches() {
        let cred = ApiCredential::new("123456", CredentialSource::Default, "API token");

        assert!(cred.matches("123456"));
        assert!(!cred.matches("12345"));
        assert!(!cred.matches("123457"));
        assert!(!cred.matches(""));
    }
}
