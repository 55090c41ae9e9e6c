use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde_json::Value;
use tracing::{Span, debug, instrument};

use crate::config::{Auth, ClientConfig};
use crate::policy::{self, ContentType};
use crate::{ApiRequest, ClientError, Payload};

/// Async request dispatcher shared by every API operation.
///
/// Each call negotiates the response format from the path, attaches Basic
/// authorization unless the path is public, sends the request once and
/// normalizes the response into a [`Payload`]. There is no retry, caching or
/// timeout; a failed request fails the returned future.
///
/// For named operations use [`crate::CintClient`].
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: Url,
    auth: Auth,
    http: reqwest::Client,
}

impl ApiClient {
    /// Creates an unauthenticated dispatcher for the configured scheme and host.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: config.base_url()?,
            auth: Auth::Unauthenticated,
            http: reqwest::Client::new(),
        })
    }

    /// Replaces the authentication state used for non-public paths.
    pub fn set_auth(&mut self, auth: Auth) {
        self.auth = auth;
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sends `request` and resolves the response.
    ///
    /// - `204 No Content` resolves to [`Payload::empty`] without reading the body.
    /// - XML-negotiated paths resolve to the raw body text.
    /// - Everything else must be valid JSON, otherwise
    ///   [`ClientError::InvalidResponse`] carries the raw body.
    ///
    /// Non-2xx statuses are not errors; their bodies go through the same rules.
    #[instrument(
        name = "cint_request",
        skip(self, request),
        fields(
            http.method = %request.method(),
            http.path = %request.path(),
            http.status_code = tracing::field::Empty,
        )
    )]
    pub async fn dispatch(&self, request: ApiRequest) -> Result<Payload, ClientError> {
        let content_type = policy::negotiate(request.path());
        let url = self.build_url(request.path())?;
        let mut builder = self
            .http
            .request(request.method().clone(), url.clone())
            .header(ACCEPT, content_type.mime());

        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }

        let authenticated = !policy::is_public(request.path());
        if authenticated {
            let value = self
                .auth
                .header_value()
                .ok_or_else(|| ClientError::AuthenticationRequired {
                    path: request.path().to_owned(),
                })?;
            builder = builder.header(AUTHORIZATION, value);
        }

        if let Some(body) = request.body() {
            let serialized = serde_json::to_string(body)?;
            debug!(body = %serialized, "request with body");
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .header(CONTENT_LENGTH, serialized.len())
                .body(serialized);
        }

        debug!(
            method = %request.method(),
            url = %url,
            path = %request.path_and_query(),
            accept = content_type.mime(),
            authenticated,
            "request with params"
        );

        let response = builder.send().await?;
        let status = response.status();
        Span::current().record("http.status_code", status.as_u16());
        debug!(status = status.as_u16(), "response status");

        if status == StatusCode::NO_CONTENT {
            return Ok(Payload::empty());
        }

        let text = response.text().await?;
        decode(content_type, text)
    }

    fn build_url(&self, path: &str) -> Result<Url, ClientError> {
        let relative = path.trim_start_matches('/');
        self.base_url
            .join(relative)
            .map_err(|_| ClientError::InvalidPath(path.to_owned()))
    }
}

fn decode(content_type: ContentType, body: String) -> Result<Payload, ClientError> {
    match content_type {
        ContentType::Xml => {
            debug!(response = %body, "raw response");
            Ok(Payload::Xml(body))
        }
        ContentType::Json => match serde_json::from_str::<Value>(&body) {
            Ok(value) => {
                debug!(response = %value, "response");
                Ok(Payload::Json(value))
            }
            Err(source) => {
                debug!(response = %body, "invalid response");
                Err(ClientError::InvalidResponse { body, source })
            }
        },
    }
}
