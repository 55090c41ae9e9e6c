use serde::Deserialize;
use serde_json::{Map, Value};

use crate::ClientError;

/// Body of a resolved API call.
///
/// JSON endpoints resolve to [`Payload::Json`]; endpoints negotiated as XML
/// resolve to the raw text in [`Payload::Xml`] without parsing. A `204 No
/// Content` response is an empty JSON object.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Json(Value),
    Xml(String),
}

impl Payload {
    /// The payload for `204 No Content`.
    pub fn empty() -> Self {
        Self::Json(Value::Object(Map::new()))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Xml(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Xml(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Xml(text) => Some(text),
        }
    }

    /// True for an empty JSON object or empty XML text.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Json(Value::Object(map)) => map.is_empty(),
            Self::Json(_) => false,
            Self::Xml(text) => text.is_empty(),
        }
    }
}

/// Hypermedia link attached to API resources.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(rename = "type", default)]
    pub media_type: Option<String>,
}

/// Invitation record returned when nominating a panelist for a survey.
///
/// Read-only view over the server mapping. The `start` link is where the
/// respondent is sent to begin the survey.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateRespondent {
    properties: Map<String, Value>,
}

impl CandidateRespondent {
    /// Wraps a parsed response; fails unless the payload is a JSON object.
    pub fn from_payload(payload: Payload) -> Result<Self, ClientError> {
        match payload {
            Payload::Json(Value::Object(properties)) => Ok(Self { properties }),
            Payload::Json(other) => Err(ClientError::InvalidProjection(format!(
                "candidate respondent must be an object, got {other}"
            ))),
            Payload::Xml(_) => Err(ClientError::InvalidProjection(
                "candidate respondent must be JSON, got XML".to_owned(),
            )),
        }
    }

    /// Raw `respondent_params` string (for example `p1=a&p2=b`).
    pub fn params(&self) -> Option<&str> {
        self.properties.get("respondent_params").and_then(Value::as_str)
    }

    pub fn public_id(&self) -> Option<&str> {
        self.properties.get("public_id").and_then(Value::as_str)
    }

    /// Decodes the `links` array.
    pub fn links(&self) -> Result<Vec<Link>, ClientError> {
        let links = self
            .properties
            .get("links")
            .ok_or_else(|| ClientError::InvalidProjection("missing `links` array".to_owned()))?;
        Vec::<Link>::deserialize(links)
            .map_err(|error| ClientError::InvalidProjection(format!("invalid `links`: {error}")))
    }

    /// `href` of the single link whose `rel` is `start`.
    ///
    /// Only `start` entries are inspected; other links may have any shape.
    pub fn link_start(&self) -> Result<String, ClientError> {
        let links = self
            .properties
            .get("links")
            .and_then(Value::as_array)
            .ok_or_else(|| ClientError::InvalidProjection("missing `links` array".to_owned()))?;
        let mut starts = links
            .iter()
            .filter(|link| link.get("rel").and_then(Value::as_str) == Some("start"));
        match (starts.next(), starts.next()) {
            (Some(link), None) => link
                .get("href")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or_else(|| {
                    ClientError::InvalidProjection("`start` link has no string `href`".to_owned())
                }),
            _ => Err(ClientError::MissingLink("start")),
        }
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }
}

impl TryFrom<Payload> for CandidateRespondent {
    type Error = ClientError;

    fn try_from(payload: Payload) -> Result<Self, Self::Error> {
        Self::from_payload(payload)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CandidateRespondent, Payload};
    use crate::ClientError;

    fn candidate(value: serde_json::Value) -> CandidateRespondent {
        CandidateRespondent::from_payload(Payload::Json(value)).expect("object payload")
    }

    #[test]
    fn start_link_is_extracted_among_others() {
        let respondent = candidate(json!({
            "public_id": "29ed785d",
            "respondent_params": "p1=a&p2=b",
            "links": [
                {"rel": "start", "href": "X"},
                {"rel": "self", "href": "Y", "type": "application/json"}
            ]
        }));
        assert_eq!(respondent.link_start().expect("start link"), "X");
        assert_eq!(respondent.params(), Some("p1=a&p2=b"));
        assert_eq!(respondent.public_id(), Some("29ed785d"));
        assert_eq!(respondent.links().expect("links").len(), 2);
    }

    #[test]
    fn missing_or_duplicate_start_link_fails() {
        let none = candidate(json!({"links": [{"rel": "self", "href": "Y"}]}));
        assert!(matches!(none.link_start(), Err(ClientError::MissingLink("start"))));

        let twice = candidate(json!({"links": [
            {"rel": "start", "href": "X"},
            {"rel": "start", "href": "Z"}
        ]}));
        assert!(matches!(twice.link_start(), Err(ClientError::MissingLink("start"))));
    }

    #[test]
    fn start_link_ignores_unrelated_malformed_links() {
        let respondent = candidate(json!({"links": [
            {"rel": "start", "href": "X"},
            {"rel": "parent"},
            {"rel": "self", "href": 3},
            "not-a-link"
        ]}));
        assert_eq!(respondent.link_start().expect("start link"), "X");
        assert!(matches!(
            respondent.links(),
            Err(ClientError::InvalidProjection(_))
        ));
    }

    #[test]
    fn start_link_without_href_fails() {
        let respondent = candidate(json!({"links": [{"rel": "start"}]}));
        assert!(matches!(
            respondent.link_start(),
            Err(ClientError::InvalidProjection(_))
        ));
    }

    #[test]
    fn missing_links_array_fails() {
        let respondent = candidate(json!({"respondent_params": ""}));
        assert!(matches!(
            respondent.link_start(),
            Err(ClientError::InvalidProjection(_))
        ));
    }

    #[test]
    fn non_object_payloads_are_rejected() {
        assert!(CandidateRespondent::try_from(Payload::Json(json!([1]))).is_err());
        assert!(CandidateRespondent::try_from(Payload::Xml("<a/>".to_owned())).is_err());
    }

    #[test]
    fn empty_payload_is_empty_object() {
        let payload = Payload::empty();
        assert!(payload.is_empty());
        assert_eq!(payload.as_json(), Some(&json!({})));
        assert_eq!(payload.as_text(), None);
    }
}
