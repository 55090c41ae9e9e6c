use std::env;

use serde::Serialize;

use crate::config::{Auth, Credentials};
use crate::{ApiClient, ApiRequest, CandidateRespondent, ClientConfig, ClientError, Payload};

/// Async client exposing one method per Cint panel API operation.
///
/// Panel-scoped methods take an optional `key`; `None` falls back to the
/// configured default resource key. Argument errors
/// ([`ClientError::MissingArgument`]) are returned before any request is
/// sent. Use the constructors on [`ApiRequest`] to validate a call without
/// awaiting anything.
///
/// The client starts unauthenticated. Public paths (`/`, `/genders`,
/// `/statuses`, `/transaction_types`) work without credentials; everything
/// else fails with [`ClientError::AuthenticationRequired`] until
/// [`CintClient::set_credentials`] or [`CintClient::with_credentials`] is called.
#[derive(Clone, Debug)]
pub struct CintClient {
    config: ClientConfig,
    inner: ApiClient,
}

impl CintClient {
    /// Creates an unauthenticated client.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            inner: ApiClient::new(&config)?,
            config,
        })
    }

    /// Creates a client with credentials attached.
    pub fn authenticated(
        config: ClientConfig,
        identifier: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Self::new(config)?.with_credentials(identifier, secret)
    }

    /// Creates a client from `CINT_*` environment variables.
    ///
    /// Credentials are attached when `CINT_KEY` is set, in which case
    /// `CINT_SECRET` is required too.
    pub fn from_env() -> Result<Self, ClientError> {
        let mut client = Self::new(ClientConfig::from_env()?)?;
        if env::var_os("CINT_KEY").is_some() {
            client.attach(&Credentials::from_env()?);
        }
        Ok(client)
    }

    /// Returns a new client authenticated with `identifier:secret`.
    pub fn with_credentials(
        mut self,
        identifier: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, ClientError> {
        self.set_credentials(identifier, secret)?;
        Ok(self)
    }

    /// Moves the client to the authenticated state.
    ///
    /// When no default resource key is configured, the credential identifier
    /// becomes the default key, and later credentials replace it.
    pub fn set_credentials(
        &mut self,
        identifier: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<(), ClientError> {
        let credentials = Credentials::new(identifier, secret)?;
        self.attach(&credentials);
        Ok(())
    }

    fn attach(&mut self, credentials: &Credentials) {
        self.config.adopt_credential_key(credentials.identifier());
        self.inner.set_auth(Auth::basic(credentials));
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.is_authenticated()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn resolve_key<'a>(&'a self, key: Option<&'a str>) -> Result<&'a str, ClientError> {
        key.or(self.config.resource_key())
            .ok_or(ClientError::MissingArgument("key"))
    }

    /// Dispatches an arbitrary request built by hand.
    pub async fn request(&self, request: ApiRequest) -> Result<Payload, ClientError> {
        self.inner.dispatch(request).await
    }

    /// `GET /`
    pub async fn get_main(&self) -> Result<Payload, ClientError> {
        self.request(ApiRequest::main()).await
    }

    /// `GET /panels/{panel_id}`
    pub async fn get_panel(&self, panel_id: &str) -> Result<Payload, ClientError> {
        let request = ApiRequest::panel(panel_id)?;
        self.request(request).await
    }

    /// `GET /panel/settings`
    pub async fn get_setting(&self) -> Result<Payload, ClientError> {
        self.request(ApiRequest::settings()).await
    }

    /// `GET /genders` (public).
    pub async fn get_genders(&self) -> Result<Payload, ClientError> {
        self.request(ApiRequest::genders()).await
    }

    /// `GET /statuses` (public).
    pub async fn get_statuses(&self) -> Result<Payload, ClientError> {
        self.request(ApiRequest::statuses()).await
    }

    /// `GET /transaction_types` (public).
    pub async fn get_transaction_types(&self) -> Result<Payload, ClientError> {
        self.request(ApiRequest::transaction_types()).await
    }

    /// `GET /panels/{key}/questions`; resolves to raw XML text.
    pub async fn get_questions(&self, key: Option<&str>) -> Result<Payload, ClientError> {
        let request = ApiRequest::questions(self.resolve_key(key)?)?;
        self.request(request).await
    }

    /// `GET /panels/{key}/panelists` filtered by `search_params`
    /// (typically `member_id` or `email`).
    pub async fn get_panelists(
        &self,
        search_params: &[(&str, &str)],
        key: Option<&str>,
    ) -> Result<Payload, ClientError> {
        let request = ApiRequest::panelists(search_params, self.resolve_key(key)?)?;
        self.request(request).await
    }

    /// `POST /panels/{key}/panelists`
    pub async fn create_panelist<T: Serialize + ?Sized>(
        &self,
        body: &T,
        key: Option<&str>,
    ) -> Result<Payload, ClientError> {
        let request = ApiRequest::create_panelist(body, self.resolve_key(key)?)?;
        self.request(request).await
    }

    /// `PATCH /panels/{key}/panelists/{panelist_id}`
    pub async fn update_panelist<T: Serialize + ?Sized>(
        &self,
        body: &T,
        panelist_id: &str,
        key: Option<&str>,
    ) -> Result<Payload, ClientError> {
        let request = ApiRequest::update_panelist(body, panelist_id, self.resolve_key(key)?)?;
        self.request(request).await
    }

    /// `DELETE /panels/{key}/panelists/{panelist_id}`
    pub async fn delete_panelist(
        &self,
        panelist_id: &str,
        key: Option<&str>,
    ) -> Result<Payload, ClientError> {
        let request = ApiRequest::delete_panelist(panelist_id, self.resolve_key(key)?)?;
        self.request(request).await
    }

    /// `GET /panels/{key}/panelists/{panelist_id}`
    pub async fn get_panelist(
        &self,
        panelist_id: &str,
        key: Option<&str>,
    ) -> Result<Payload, ClientError> {
        let request = ApiRequest::panelist(panelist_id, self.resolve_key(key)?)?;
        self.request(request).await
    }

    /// `GET /panels/{key}/respondent`
    pub async fn get_respondents(&self, key: Option<&str>) -> Result<Payload, ClientError> {
        let request = ApiRequest::respondents(self.resolve_key(key)?)?;
        self.request(request).await
    }

    /// `GET /panels/{key}/respondent_quotas`
    pub async fn get_respondent_quotas(&self, key: Option<&str>) -> Result<Payload, ClientError> {
        let request = ApiRequest::respondent_quotas(self.resolve_key(key)?)?;
        self.request(request).await
    }

    /// `GET /panels/{key}/events`
    pub async fn get_events(&self, key: Option<&str>) -> Result<Payload, ClientError> {
        let request = ApiRequest::events(self.resolve_key(key)?)?;
        self.request(request).await
    }

    /// `GET /panels/{key}/panelists/{panelist_id}/survey_invitations`
    pub async fn get_survey_invitations(
        &self,
        panelist_id: &str,
        key: Option<&str>,
    ) -> Result<Payload, ClientError> {
        let request = ApiRequest::survey_invitations(panelist_id, self.resolve_key(key)?)?;
        self.request(request).await
    }

    /// Nominates a panelist for a survey and wraps the created record.
    ///
    /// `POST /panels/{key}/panelists/{panelist_id}/candidate_respondents`
    pub async fn candidate_respondent<T: Serialize + ?Sized>(
        &self,
        body: &T,
        panelist_id: &str,
        key: Option<&str>,
    ) -> Result<CandidateRespondent, ClientError> {
        let request = ApiRequest::candidate_respondent(body, panelist_id, self.resolve_key(key)?)?;
        let payload = self.request(request).await?;
        CandidateRespondent::from_payload(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::CintClient;
    use crate::{ClientConfig, ClientError};

    #[test]
    fn explicit_key_wins_over_default() {
        let client = CintClient::new(ClientConfig::default().with_resource_key("default"))
            .expect("valid config");
        assert_eq!(client.resolve_key(Some("other")).expect("key"), "other");
        assert_eq!(client.resolve_key(None).expect("key"), "default");
    }

    #[test]
    fn missing_default_key_is_an_argument_error() {
        let client = CintClient::new(ClientConfig::default()).expect("valid config");
        assert!(matches!(
            client.resolve_key(None),
            Err(ClientError::MissingArgument("key"))
        ));
    }

    #[test]
    fn credentials_transition_to_authenticated() {
        let mut client = CintClient::new(ClientConfig::default()).expect("valid config");
        assert!(!client.is_authenticated());

        client.set_credentials("panel-key", "s3cret").expect("valid credentials");
        assert!(client.is_authenticated());
        assert_eq!(client.config().resource_key(), Some("panel-key"));
    }

    #[test]
    fn reattached_credentials_replace_derived_key() {
        let mut client = CintClient::new(ClientConfig::default()).expect("valid config");
        client.set_credentials("k1", "s1").expect("valid credentials");
        client.set_credentials("k2", "s2").expect("valid credentials");
        assert_eq!(client.config().resource_key(), Some("k2"));
        assert_eq!(client.resolve_key(None).expect("key"), "k2");
    }

    #[test]
    fn credentials_keep_configured_resource_key() {
        let client = CintClient::authenticated(
            ClientConfig::default().with_resource_key("configured"),
            "panel-key",
            "s3cret",
        )
        .expect("valid credentials");
        assert_eq!(client.config().resource_key(), Some("configured"));
    }

    #[test]
    fn empty_credentials_are_a_configuration_error() {
        let error = CintClient::authenticated(ClientConfig::default(), "panel-key", "")
            .expect_err("missing secret should fail");
        assert!(matches!(error, ClientError::Configuration(_)));
    }
}
