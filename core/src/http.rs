//! HTTP envelope types shared by the client, the transport and the retry loop.
//!
//! # Design
//! Requests and responses are plain data. `TeamCityClient` builds an
//! `HttpRequest`, hands it to a `Transport` for the actual round-trip and
//! classifies the returned `HttpResponse` into an `Outcome`. Keeping the
//! envelopes free of any HTTP library type lets the pure build/classify steps
//! be tested without a server.

use std::fmt;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload format negotiated for a call. Used for both `Content-Type` and
/// `Accept`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// Structured entities.
    Json,
    /// Scalar field reads and writes.
    Text,
}

impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::Text => "text/plain",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `path` is the fully resolved URL. Headers always carry exactly one
/// `Authorization` entry.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Short label naming the attempted operation, used in errors and logs.
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}

/// Result of a classified call that did not fail.
///
/// `NotFound` is the "absent" sentinel: the entity does not exist on the
/// server. It is a legitimate steady state, not an error, so it travels on
/// the `Ok` side together with the raw response.
#[derive(Debug, Clone)]
pub enum Outcome {
    Found(HttpResponse),
    NotFound(HttpResponse),
}

impl Outcome {
    pub fn found(self) -> Option<HttpResponse> {
        match self {
            Outcome::Found(response) => Some(response),
            Outcome::NotFound(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Outcome::NotFound(_))
    }

    pub fn response(&self) -> &HttpResponse {
        match self {
            Outcome::Found(response) | Outcome::NotFound(response) => response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            path: "http://localhost/app/rest".to_string(),
            headers: vec![("Authorization".to_string(), "Bearer t".to_string())],
            body: None,
        };
        assert_eq!(req.header("authorization"), Some("Bearer t"));
        assert_eq!(req.header("accept"), None);
    }

    #[test]
    fn label_names_method_and_url() {
        let req = HttpRequest {
            method: HttpMethod::Delete,
            path: "http://localhost/app/rest/projects/id:A".to_string(),
            headers: Vec::new(),
            body: None,
        };
        assert_eq!(req.label(), "DELETE http://localhost/app/rest/projects/id:A");
    }

    #[test]
    fn not_found_outcome_has_no_payload() {
        let outcome = Outcome::NotFound(HttpResponse::new(404, "gone"));
        assert!(outcome.is_not_found());
        assert_eq!(outcome.response().body, "gone");
        assert!(outcome.found().is_none());
    }
}
