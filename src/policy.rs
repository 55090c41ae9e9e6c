//! Fixed dispatch policy: response content negotiation and public paths.

use std::sync::LazyLock;

use regex::Regex;

/// Response format requested via the `Accept` header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentType {
    Json,
    Xml,
}

impl ContentType {
    pub fn mime(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
        }
    }
}

struct NegotiationRule {
    pattern: Regex,
    content_type: ContentType,
}

// Evaluated in order; the first match wins.
static NEGOTIATION_RULES: LazyLock<Vec<NegotiationRule>> = LazyLock::new(|| {
    [(r"^/panels/[^/]+/questions$", ContentType::Xml)]
        .into_iter()
        .filter_map(|(pattern, content_type)| {
            Regex::new(pattern).ok().map(|pattern| NegotiationRule {
                pattern,
                content_type,
            })
        })
        .collect()
});

/// Paths that are served without authentication.
pub const PUBLIC_PATHS: &[&str] = &["/", "/genders", "/statuses", "/transaction_types"];

/// Selects the response content type for `path`, defaulting to JSON.
pub fn negotiate(path: &str) -> ContentType {
    NEGOTIATION_RULES
        .iter()
        .find(|rule| rule.pattern.is_match(path))
        .map_or(ContentType::Json, |rule| rule.content_type)
}

/// Returns true when `path` must not carry an `Authorization` header.
pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}
