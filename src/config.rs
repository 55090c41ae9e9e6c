use std::env;
use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Url;

use crate::ClientError;

/// Production API host.
pub const DEFAULT_HOST: &str = "cdp.cintworks.net";

/// Transport scheme used to reach the API host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Scheme {
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    #[default]
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = ClientError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(ClientError::Configuration(format!(
                "unsupported scheme '{other}': expected http or https"
            ))),
        }
    }
}

/// Immutable connection settings for a client.
///
/// Defaults to `https://cdp.cintworks.net` with no default resource key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    scheme: Scheme,
    host: String,
    resource_key: Option<String>,
    // The default key was taken from attached credentials, not configured.
    key_from_credentials: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::default(),
            host: DEFAULT_HOST.to_owned(),
            resource_key: None,
            key_from_credentials: false,
        }
    }
}

impl ClientConfig {
    /// Builds a configuration from `CINT_SCHEME`, `CINT_HOST` and
    /// `CINT_RESOURCE_KEY`, falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ClientError> {
        let mut config = Self::default();
        if let Some(scheme) = env_non_empty("CINT_SCHEME") {
            config.scheme = scheme.parse()?;
        }
        if let Some(host) = env_non_empty("CINT_HOST") {
            config = config.with_host(host);
        }
        if let Some(key) = env_non_empty("CINT_RESOURCE_KEY") {
            config = config.with_resource_key(key);
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets the API host, optionally with a port (`127.0.0.1:8080`).
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into().trim().trim_end_matches('/').to_owned();
        self
    }

    /// Sets the panel key used when a facade call omits one.
    #[must_use]
    pub fn with_resource_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.resource_key = (!key.is_empty()).then_some(key);
        self.key_from_credentials = false;
        self
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn resource_key(&self) -> Option<&str> {
        self.resource_key.as_deref()
    }

    /// Uses a credential identifier as the default key unless one was
    /// configured explicitly. Re-attaching credentials replaces a key that
    /// came from earlier credentials.
    pub(crate) fn adopt_credential_key(&mut self, key: &str) {
        if key.is_empty() {
            return;
        }
        if self.resource_key.is_none() || self.key_from_credentials {
            self.resource_key = Some(key.to_owned());
            self.key_from_credentials = true;
        }
    }

    /// Returns `{scheme}://{host}/`.
    pub fn base_url(&self) -> Result<Url, ClientError> {
        if self.host.is_empty() {
            return Err(ClientError::Configuration("host must not be empty".to_owned()));
        }
        let raw = format!("{}://{}/", self.scheme, self.host);
        Url::parse(&raw)
            .map_err(|_| ClientError::Configuration(format!("invalid host '{}'", self.host)))
    }
}

/// API credential pair (panel key and secret).
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    identifier: String,
    secret: String,
}

impl Credentials {
    /// Fails with [`ClientError::Configuration`] when either part is empty.
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Result<Self, ClientError> {
        let identifier = identifier.into();
        let secret = secret.into();
        if identifier.is_empty() || secret.is_empty() {
            return Err(ClientError::Configuration(
                "options `key` and `secret` are required".to_owned(),
            ));
        }
        Ok(Self { identifier, secret })
    }

    /// Reads `CINT_KEY` and `CINT_SECRET`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(
            env_non_empty("CINT_KEY").unwrap_or_default(),
            env_non_empty("CINT_SECRET").unwrap_or_default(),
        )
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    fn basic_token(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.identifier, self.secret))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Authentication state of a client.
///
/// Clients start [`Auth::Unauthenticated`]; attaching [`Credentials`] moves
/// them to [`Auth::Basic`], which holds the pre-encoded token.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Auth {
    #[default]
    Unauthenticated,
    Basic { token: String },
}

impl Auth {
    pub fn basic(credentials: &Credentials) -> Self {
        Self::Basic {
            token: credentials.basic_token(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Basic { .. })
    }

    /// Value for the `Authorization` header, if authenticated.
    pub(crate) fn header_value(&self) -> Option<String> {
        match self {
            Self::Unauthenticated => None,
            Self::Basic { token } => Some(format!("Basic {token}")),
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => f.write_str("Unauthenticated"),
            Self::Basic { .. } => f.write_str("Basic(<redacted>)"),
        }
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{Auth, ClientConfig, Credentials, Scheme};
    use crate::ClientError;

    #[test]
    fn default_config_targets_production_over_https() {
        let config = ClientConfig::default();
        let url = config.base_url().expect("valid url");
        assert_eq!(url.as_str(), "https://cdp.cintworks.net/");
        assert_eq!(config.resource_key(), None);
    }

    #[test]
    fn host_with_port_and_plain_scheme() {
        let config = ClientConfig::default()
            .with_scheme(Scheme::Http)
            .with_host("127.0.0.1:8080/");
        let url = config.base_url().expect("valid url");
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn empty_host_is_a_configuration_error() {
        let error = ClientConfig::default()
            .with_host("")
            .base_url()
            .expect_err("empty host should fail");
        assert!(matches!(error, ClientError::Configuration(_)));
    }

    #[test]
    fn scheme_parses_case_insensitively() {
        assert_eq!("HTTPS".parse::<Scheme>().expect("valid"), Scheme::Https);
        assert_eq!(" http ".parse::<Scheme>().expect("valid"), Scheme::Http);
        assert!(matches!(
            "ftp".parse::<Scheme>(),
            Err(ClientError::Configuration(_))
        ));
    }

    #[test]
    fn empty_resource_key_is_ignored() {
        let config = ClientConfig::default().with_resource_key("");
        assert_eq!(config.resource_key(), None);
    }

    #[test]
    fn credential_key_never_overrides_configured_key() {
        let mut derived = ClientConfig::default();
        derived.adopt_credential_key("k1");
        derived.adopt_credential_key("k2");
        assert_eq!(derived.resource_key(), Some("k2"));

        let mut configured = ClientConfig::default().with_resource_key("panel");
        configured.adopt_credential_key("k1");
        assert_eq!(configured.resource_key(), Some("panel"));
    }

    #[test]
    fn credentials_require_both_parts() {
        assert!(matches!(
            Credentials::new("key", ""),
            Err(ClientError::Configuration(_))
        ));
        assert!(matches!(
            Credentials::new("", "secret"),
            Err(ClientError::Configuration(_))
        ));
    }

    #[test]
    fn basic_token_is_base64_of_pair() {
        let credentials = Credentials::new("key", "secret").expect("valid credentials");
        let auth = Auth::basic(&credentials);
        assert!(auth.is_authenticated());
        assert_eq!(auth.header_value().as_deref(), Some("Basic a2V5OnNlY3JldA=="));
        assert_eq!(Auth::Unauthenticated.header_value(), None);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let credentials = Credentials::new("key", "secret").expect("valid credentials");
        let rendered = format!("{credentials:?} {:?}", Auth::basic(&credentials));
        assert!(!rendered.contains("secret\""));
        assert!(!rendered.contains("a2V5"));
    }
}
