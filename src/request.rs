use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded::Serializer;

use crate::ClientError;

/// Transient description of one API call: verb, path, query and optional body.
///
/// The per-operation constructors validate their arguments and return
/// [`ClientError::MissingArgument`] before anything touches the network, so
/// callers can build and inspect a request without awaiting anything.
/// Resource keys passed here are already resolved; see
/// [`crate::CintClient`] for default-key handling.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl Default for ApiRequest {
    fn default() -> Self {
        Self::new(Method::GET, "/")
    }
}

impl ApiRequest {
    /// Creates a request without query or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Appends query parameters.
    #[must_use]
    pub fn with_query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(key, value)| (key.into(), value.into())));
        self
    }

    /// Attaches a JSON body.
    pub fn with_body<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path without query string; this is what dispatch policy is matched against.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Path with the URL-encoded query string appended, if any.
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let encoded = Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{}?{encoded}", self.path)
    }

    /// `GET /`
    pub fn main() -> Self {
        Self::default()
    }

    /// `GET /panels/{panel_id}`
    pub fn panel(panel_id: &str) -> Result<Self, ClientError> {
        let panel_id = required("panel_id", panel_id)?;
        Ok(Self::new(Method::GET, format!("/panels/{panel_id}")))
    }

    /// `GET /panel/settings`
    pub fn settings() -> Self {
        Self::new(Method::GET, "/panel/settings")
    }

    /// `GET /genders`
    pub fn genders() -> Self {
        Self::new(Method::GET, "/genders")
    }

    /// `GET /statuses`
    pub fn statuses() -> Self {
        Self::new(Method::GET, "/statuses")
    }

    /// `GET /transaction_types`
    pub fn transaction_types() -> Self {
        Self::new(Method::GET, "/transaction_types")
    }

    /// `GET /panels/{key}/questions` (answered as XML).
    pub fn questions(key: &str) -> Result<Self, ClientError> {
        Ok(Self::new(Method::GET, panel_path(key, "/questions")?))
    }

    /// `GET /panels/{key}/panelists?{search_params}`
    ///
    /// The service expects at least a `member_id` or `email` filter, so an
    /// empty parameter list is rejected.
    pub fn panelists(search_params: &[(&str, &str)], key: &str) -> Result<Self, ClientError> {
        if search_params.is_empty() {
            return Err(ClientError::MissingArgument("search_params"));
        }
        Ok(Self::new(Method::GET, panel_path(key, "/panelists")?)
            .with_query(search_params.iter().copied()))
    }

    /// `POST /panels/{key}/panelists`
    pub fn create_panelist<T: Serialize + ?Sized>(body: &T, key: &str) -> Result<Self, ClientError> {
        Self::new(Method::POST, panel_path(key, "/panelists")?).with_body(body)
    }

    /// `PATCH /panels/{key}/panelists/{panelist_id}`
    pub fn update_panelist<T: Serialize + ?Sized>(
        body: &T,
        panelist_id: &str,
        key: &str,
    ) -> Result<Self, ClientError> {
        Self::new(Method::PATCH, panelist_path(panelist_id, key, "")?).with_body(body)
    }

    /// `DELETE /panels/{key}/panelists/{panelist_id}`
    pub fn delete_panelist(panelist_id: &str, key: &str) -> Result<Self, ClientError> {
        Ok(Self::new(
            Method::DELETE,
            panelist_path(panelist_id, key, "")?,
        ))
    }

    /// `GET /panels/{key}/panelists/{panelist_id}`
    pub fn panelist(panelist_id: &str, key: &str) -> Result<Self, ClientError> {
        Ok(Self::new(Method::GET, panelist_path(panelist_id, key, "")?))
    }

    /// `GET /panels/{key}/respondent`
    pub fn respondents(key: &str) -> Result<Self, ClientError> {
        Ok(Self::new(Method::GET, panel_path(key, "/respondent")?))
    }

    /// `GET /panels/{key}/respondent_quotas`
    pub fn respondent_quotas(key: &str) -> Result<Self, ClientError> {
        Ok(Self::new(Method::GET, panel_path(key, "/respondent_quotas")?))
    }

    /// `GET /panels/{key}/events`
    pub fn events(key: &str) -> Result<Self, ClientError> {
        Ok(Self::new(Method::GET, panel_path(key, "/events")?))
    }

    /// `GET /panels/{key}/panelists/{panelist_id}/survey_invitations`
    pub fn survey_invitations(panelist_id: &str, key: &str) -> Result<Self, ClientError> {
        Ok(Self::new(
            Method::GET,
            panelist_path(panelist_id, key, "/survey_invitations")?,
        ))
    }

    /// `POST /panels/{key}/panelists/{panelist_id}/candidate_respondents`
    pub fn candidate_respondent<T: Serialize + ?Sized>(
        body: &T,
        panelist_id: &str,
        key: &str,
    ) -> Result<Self, ClientError> {
        Self::new(
            Method::POST,
            panelist_path(panelist_id, key, "/candidate_respondents")?,
        )
        .with_body(body)
    }
}

fn required(name: &'static str, value: &str) -> Result<String, ClientError> {
    if value.is_empty() {
        return Err(ClientError::MissingArgument(name));
    }
    Ok(encode_path_segment(value))
}

fn panel_path(key: &str, suffix: &str) -> Result<String, ClientError> {
    let key = required("key", key)?;
    Ok(format!("/panels/{key}{suffix}"))
}

fn panelist_path(panelist_id: &str, key: &str, suffix: &str) -> Result<String, ClientError> {
    let panelist_id = required("panelist_id", panelist_id)?;
    panel_path(key, &format!("/panelists/{panelist_id}{suffix}"))
}

// Everything except RFC 3986 unreserved characters.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn encode_path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT_ENCODE_SET).to_string()
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde_json::json;

    use super::ApiRequest;
    use crate::ClientError;

    #[test]
    fn default_request_is_get_root() {
        let request = ApiRequest::default();
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.path(), "/");
        assert!(request.body().is_none());
        assert_eq!(ApiRequest::main(), request);
    }

    #[test]
    fn panel_requires_id() {
        let error = ApiRequest::panel("").expect_err("empty id should fail");
        assert!(matches!(error, ClientError::MissingArgument("panel_id")));
        assert_eq!(ApiRequest::panel("p1").expect("valid").path(), "/panels/p1");
    }

    #[test]
    fn public_endpoints_have_fixed_paths() {
        assert_eq!(ApiRequest::genders().path(), "/genders");
        assert_eq!(ApiRequest::statuses().path(), "/statuses");
        assert_eq!(ApiRequest::transaction_types().path(), "/transaction_types");
        assert_eq!(ApiRequest::settings().path(), "/panel/settings");
    }

    #[test]
    fn panelists_serializes_search_params_into_query() {
        let request = ApiRequest::panelists(&[("email", "a b@example.com")], "key1")
            .expect("valid request");
        assert_eq!(request.path(), "/panels/key1/panelists");
        assert_eq!(
            request.path_and_query(),
            "/panels/key1/panelists?email=a+b%40example.com"
        );
    }

    #[test]
    fn panelists_requires_search_params() {
        let error = ApiRequest::panelists(&[], "key1").expect_err("empty search should fail");
        assert!(matches!(error, ClientError::MissingArgument("search_params")));
    }

    #[test]
    fn create_panelist_carries_json_body() {
        let request =
            ApiRequest::create_panelist(&json!({"name": "x"}), "key1").expect("valid request");
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.path(), "/panels/key1/panelists");
        assert_eq!(request.body(), Some(&json!({"name": "x"})));
    }

    #[test]
    fn update_panelist_requires_panelist_id() {
        let error = ApiRequest::update_panelist(&json!({}), "", "key1")
            .expect_err("empty panelist id should fail");
        assert!(matches!(error, ClientError::MissingArgument("panelist_id")));

        let request =
            ApiRequest::update_panelist(&json!({"email": "e"}), "42", "key1").expect("valid");
        assert_eq!(request.method(), &Method::PATCH);
        assert_eq!(request.path(), "/panels/key1/panelists/42");
    }

    #[test]
    fn panelist_scoped_paths() {
        assert_eq!(
            ApiRequest::delete_panelist("42", "k").expect("valid").method(),
            &Method::DELETE
        );
        assert_eq!(
            ApiRequest::panelist("42", "k").expect("valid").path(),
            "/panels/k/panelists/42"
        );
        assert_eq!(
            ApiRequest::survey_invitations("42", "k").expect("valid").path(),
            "/panels/k/panelists/42/survey_invitations"
        );
        assert_eq!(
            ApiRequest::candidate_respondent(&json!({}), "42", "k")
                .expect("valid")
                .path(),
            "/panels/k/panelists/42/candidate_respondents"
        );
    }

    #[test]
    fn panel_scoped_paths() {
        assert_eq!(
            ApiRequest::questions("k").expect("valid").path(),
            "/panels/k/questions"
        );
        assert_eq!(
            ApiRequest::respondents("k").expect("valid").path(),
            "/panels/k/respondent"
        );
        assert_eq!(
            ApiRequest::respondent_quotas("k").expect("valid").path(),
            "/panels/k/respondent_quotas"
        );
        assert_eq!(ApiRequest::events("k").expect("valid").path(), "/panels/k/events");
    }

    #[test]
    fn empty_key_is_rejected() {
        let error = ApiRequest::events("").expect_err("empty key should fail");
        assert!(matches!(error, ClientError::MissingArgument("key")));
    }

    #[test]
    fn path_segments_are_encoded() {
        let request = ApiRequest::panelist("a/b", "k").expect("valid");
        assert_eq!(request.path(), "/panels/k/panelists/a%2Fb");

        let request = ApiRequest::panelist("a b+c", "k").expect("valid");
        assert_eq!(request.path(), "/panels/k/panelists/a%20b%2Bc");

        let request = ApiRequest::panelist("4ef3f874-380c_1.x~", "k").expect("valid");
        assert_eq!(request.path(), "/panels/k/panelists/4ef3f874-380c_1.x~");
    }
}
