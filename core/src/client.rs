//! Authenticated request/response primitive for the TeamCity REST API.
//!
//! # Design
//! `TeamCityClient` holds an immutable `Connection` and a shared `Transport`
//! and carries no mutable state between calls. Every call goes through the
//! same three steps: `build_request` (pure, produces an `HttpRequest` with
//! exactly one `Authorization` header), the transport round-trip, and
//! `classify` (pure, maps the status code onto `Outcome` or `ApiError`).
//! Per-entity operations in `crate::api` are thin wrappers over the JSON and
//! text helpers defined here.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::connection::Connection;
use crate::error::ApiError;
use crate::http::{ContentType, HttpMethod, HttpRequest, HttpResponse, Outcome};
use crate::locator::{Endpoint, Locator, Root};
use crate::retry::{run_with_retry, RetryConfig, RetryPolicy};
use crate::transport::{Transport, UreqTransport};

/// Blocking client for one TeamCity server. Cheap to clone; clones share
/// the transport.
#[derive(Clone)]
pub struct TeamCityClient {
    connection: Connection,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for TeamCityClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeamCityClient")
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

impl TeamCityClient {
    /// Client with a `ureq` transport honouring the connection timeout.
    pub fn new(connection: Connection) -> Self {
        let transport = UreqTransport::new(connection.timeout());
        Self::with_transport(connection, transport)
    }

    pub fn with_transport(connection: Connection, transport: impl Transport + 'static) -> Self {
        Self {
            connection,
            transport: Arc::new(transport),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    // -----------------------------------------------------------------------
    // Build / classify
    // -----------------------------------------------------------------------

    pub fn build_request(
        &self,
        method: HttpMethod,
        endpoint: &Endpoint,
        body: Option<String>,
        content_type: ContentType,
    ) -> Result<HttpRequest, ApiError> {
        let base = match endpoint.root() {
            Root::Rest => self.connection.rest_url(),
            Root::App => self.connection.app_url(),
        };
        let url = endpoint.resolve(base)?;
        Ok(HttpRequest {
            method,
            path: url.to_string(),
            headers: vec![
                ("Authorization".to_string(), self.connection.authorization()),
                ("Content-Type".to_string(), content_type.mime().to_string()),
                ("Accept".to_string(), content_type.mime().to_string()),
            ],
            body,
        })
    }

    // -----------------------------------------------------------------------
    // Execution
    // -----------------------------------------------------------------------

    /// Execute a built request once and classify the response.
    pub fn send(&self, request: &HttpRequest) -> Result<Outcome, ApiError> {
        debug!(method = %request.method, url = %request.path, "sending request");
        let response = self
            .transport
            .execute(request)
            .map_err(|source| ApiError::Transport {
                request: request.label(),
                source,
            })?;
        debug!(status = response.status, url = %request.path, "received response");
        classify(&request.label(), response)
    }

    /// Build, execute once, classify. No retries at this layer.
    pub fn request(
        &self,
        method: HttpMethod,
        endpoint: &Endpoint,
        body: Option<String>,
        content_type: ContentType,
    ) -> Result<Outcome, ApiError> {
        let request = self.build_request(method, endpoint, body, content_type)?;
        self.send(&request)
    }

    /// Like [`request`](Self::request), but repeats the round-trip while
    /// `policy` asks for it, within the `retry` budget. The final attempt is
    /// classified normally.
    pub fn retryable_request(
        &self,
        method: HttpMethod,
        endpoint: &Endpoint,
        body: Option<String>,
        content_type: ContentType,
        policy: &dyn RetryPolicy,
        retry: &RetryConfig,
    ) -> Result<Outcome, ApiError> {
        let request = self.build_request(method, endpoint, body, content_type)?;
        self.send_with_retry(&request, policy, retry)
    }

    /// Retrying counterpart of [`send`](Self::send) for an already built
    /// request.
    pub fn send_with_retry(
        &self,
        request: &HttpRequest,
        policy: &dyn RetryPolicy,
        retry: &RetryConfig,
    ) -> Result<Outcome, ApiError> {
        debug!(method = %request.method, url = %request.path, "sending retryable request");
        let result = run_with_retry(retry, policy, || self.transport.execute(request))
            .map_err(|source| ApiError::RetryAborted {
                request: request.label(),
                source,
            })?;
        let response = result.map_err(|source| ApiError::Transport {
            request: request.label(),
            source,
        })?;
        classify(&request.label(), response)
    }

    // -----------------------------------------------------------------------
    // JSON helpers
    // -----------------------------------------------------------------------

    /// GET a JSON entity. `Ok(None)` when the server reports it absent.
    pub fn get_json<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<Option<T>, ApiError> {
        let request = self.build_request(HttpMethod::Get, endpoint, None, ContentType::Json)?;
        match self.send(&request)?.found() {
            Some(response) => decode(&request.label(), &response.body).map(Some),
            None => Ok(None),
        }
    }

    /// Build a request carrying `body` as JSON.
    pub fn build_json_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        endpoint: &Endpoint,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let mut request = self.build_request(method, endpoint, None, ContentType::Json)?;
        let json = serde_json::to_string(body).map_err(|source| ApiError::Serialization {
            request: request.label(),
            source,
        })?;
        request.body = Some(json);
        Ok(request)
    }

    fn exchange_json<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        endpoint: &Endpoint,
        body: &B,
    ) -> Result<(String, HttpResponse), ApiError> {
        let request = self.build_json_request(method, endpoint, body)?;
        let label = request.label();
        let response = expect_found(&label, self.send(&request)?)?;
        Ok((label, response))
    }

    /// Send a JSON body and return the raw response. A 404 is a failure for
    /// writes: the target collection or parent does not exist.
    pub fn write_json<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        endpoint: &Endpoint,
        body: &B,
    ) -> Result<HttpResponse, ApiError> {
        self.exchange_json(method, endpoint, body)
            .map(|(_, response)| response)
    }

    pub fn post_json<B, T>(&self, endpoint: &Endpoint, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (request, response) = self.exchange_json(HttpMethod::Post, endpoint, body)?;
        decode(&request, &response.body)
    }

    pub fn put_json<B, T>(&self, endpoint: &Endpoint, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (request, response) = self.exchange_json(HttpMethod::Put, endpoint, body)?;
        decode(&request, &response.body)
    }

    /// DELETE an entity. Deleting something already absent succeeds.
    pub fn delete(&self, endpoint: &Endpoint) -> Result<(), ApiError> {
        self.request(HttpMethod::Delete, endpoint, None, ContentType::Json)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Plain-text helpers
    // -----------------------------------------------------------------------

    /// GET a plain-text value. `Ok(None)` when absent.
    pub fn get_text(&self, endpoint: &Endpoint) -> Result<Option<String>, ApiError> {
        let outcome = self.request(HttpMethod::Get, endpoint, None, ContentType::Text)?;
        Ok(outcome.found().map(|response| response.body))
    }

    /// Send a plain-text body and return the echoed text.
    pub fn send_text(
        &self,
        method: HttpMethod,
        endpoint: &Endpoint,
        body: Option<&str>,
    ) -> Result<String, ApiError> {
        let request =
            self.build_request(method, endpoint, body.map(str::to_string), ContentType::Text)?;
        let outcome = self.send(&request)?;
        expect_found(&request.label(), outcome).map(|response| response.body)
    }

    // -----------------------------------------------------------------------
    // Scalar field endpoints
    // -----------------------------------------------------------------------

    /// Read `<collection>/<locator>/<field>` as text.
    pub fn get_field(
        &self,
        collection: &str,
        locator: &Locator,
        field: &str,
    ) -> Result<Option<String>, ApiError> {
        self.get_text(&field_endpoint(collection, locator, field))
    }

    /// Write `<collection>/<locator>/<field>` as text: PUT when `value` is
    /// present, DELETE to clear it. Returns the server's echo.
    pub fn set_field(
        &self,
        collection: &str,
        locator: &Locator,
        field: &str,
        value: Option<&str>,
    ) -> Result<String, ApiError> {
        let endpoint = field_endpoint(collection, locator, field);
        match value {
            Some(value) => self.send_text(HttpMethod::Put, &endpoint, Some(value)),
            None => self.send_text(HttpMethod::Delete, &endpoint, None),
        }
    }

    /// JSON-bodied variant of [`set_field`](Self::set_field).
    pub fn set_field_json<B: Serialize + ?Sized>(
        &self,
        collection: &str,
        locator: &Locator,
        field: &str,
        value: Option<&B>,
    ) -> Result<String, ApiError> {
        let endpoint = field_endpoint(collection, locator, field);
        match value {
            Some(value) => self
                .write_json(HttpMethod::Put, &endpoint, value)
                .map(|response| response.body),
            None => {
                let request =
                    self.build_request(HttpMethod::Delete, &endpoint, None, ContentType::Json)?;
                let outcome = self.send(&request)?;
                expect_found(&request.label(), outcome).map(|response| response.body)
            }
        }
    }

    /// Check that the REST root answers with the configured credentials.
    pub fn verify_connection(&self) -> Result<String, ApiError> {
        let request =
            self.build_request(HttpMethod::Get, &Endpoint::rest(), None, ContentType::Text)?;
        match self.send(&request) {
            Ok(outcome) => expect_found(&request.label(), outcome).map(|response| response.body),
            Err(ApiError::Status { status, .. }) if status == 401 || status == 403 => Err(
                ApiError::Config(format!("got status {status} when trying connection to the server")),
            ),
            Err(err) => Err(err),
        }
    }
}

fn field_endpoint(collection: &str, locator: &Locator, field: &str) -> Endpoint {
    Endpoint::rest()
        .segment(collection)
        .locator(locator)
        .path(field)
}

/// Map a response status onto the three outcomes callers distinguish.
///
/// 200 and 204 are success, 404 is the "absent" sentinel, everything else is
/// a failure carrying the status and body verbatim.
pub fn classify(request: &str, response: HttpResponse) -> Result<Outcome, ApiError> {
    match response.status {
        200 | 204 => Ok(Outcome::Found(response)),
        404 => Ok(Outcome::NotFound(response)),
        status => Err(ApiError::Status {
            request: request.to_string(),
            status,
            body: response.body,
        }),
    }
}

/// Treat "absent" as a failure, for calls where the target must exist.
pub fn expect_found(request: &str, outcome: Outcome) -> Result<HttpResponse, ApiError> {
    match outcome {
        Outcome::Found(response) => Ok(response),
        Outcome::NotFound(response) => Err(ApiError::Status {
            request: request.to_string(),
            status: response.status,
            body: response.body,
        }),
    }
}

pub(crate) fn decode<T: DeserializeOwned>(request: &str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|source| ApiError::Deserialization {
        request: request.to_string(),
        body: body.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;

    struct Unreachable;

    impl Transport for Unreachable {
        fn execute(&self, _: &HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::new("connection refused"))
        }
    }

    fn client(token: &str) -> TeamCityClient {
        let conn = Connection::new("http://localhost:8111", token, "admin", "secret").unwrap();
        TeamCityClient::with_transport(conn, Unreachable)
    }

    fn auth_headers(req: &HttpRequest) -> Vec<&str> {
        req.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("authorization"))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[test]
    fn bearer_header_when_token_set() {
        let req = client("abc")
            .build_request(HttpMethod::Get, &Endpoint::rest(), None, ContentType::Json)
            .unwrap();
        assert_eq!(auth_headers(&req), vec!["Bearer abc"]);
    }

    #[test]
    fn basic_header_when_token_empty() {
        let req = client("")
            .build_request(HttpMethod::Get, &Endpoint::rest(), None, ContentType::Json)
            .unwrap();
        assert_eq!(auth_headers(&req), vec!["Basic YWRtaW46c2VjcmV0"]);
    }

    #[test]
    fn build_request_resolves_path_and_content_type() {
        let endpoint = Endpoint::rest().segment("projects").locator(&Locator::id("Test"));
        let req = client("t")
            .build_request(HttpMethod::Put, &endpoint, Some("x".to_string()), ContentType::Text)
            .unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "http://localhost:8111/app/rest/projects/id:Test");
        assert_eq!(req.header("content-type"), Some("text/plain"));
        assert_eq!(req.header("accept"), Some("text/plain"));
        assert_eq!(req.body.as_deref(), Some("x"));
    }

    #[test]
    fn app_root_endpoints_skip_rest_prefix() {
        let req = client("t")
            .build_request(
                HttpMethod::Get,
                &Endpoint::app().path("email/rest"),
                None,
                ContentType::Json,
            )
            .unwrap();
        assert_eq!(req.path, "http://localhost:8111/app/email/rest");
    }

    #[test]
    fn classify_success_statuses_keep_body() {
        for status in [200, 204] {
            let outcome = classify("GET x", HttpResponse::new(status, "payload")).unwrap();
            assert_eq!(outcome.found().unwrap().body, "payload");
        }
    }

    #[test]
    fn classify_not_found_is_sentinel() {
        let outcome = classify("GET x", HttpResponse::new(404, "")).unwrap();
        assert!(outcome.is_not_found());
    }

    #[test]
    fn classify_other_status_is_failure_with_body() {
        for status in [201, 301, 400, 401, 409, 500, 503] {
            let err = classify("GET x", HttpResponse::new(status, "boom")).unwrap_err();
            let text = err.to_string();
            assert!(text.contains(&status.to_string()), "{text}");
            assert!(text.contains("boom"), "{text}");
            assert!(matches!(err, ApiError::Status { .. }));
        }
    }

    #[test]
    fn expect_found_turns_absent_into_failure() {
        let err = expect_found("PUT x", Outcome::NotFound(HttpResponse::new(404, "no"))).unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn transport_failure_names_the_request() {
        let err = client("t")
            .get_json::<serde_json::Value>(&Endpoint::rest().segment("projects"))
            .unwrap_err();
        match err {
            ApiError::Transport { request, .. } => {
                assert_eq!(request, "GET http://localhost:8111/app/rest/projects")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn decode_failure_keeps_body() {
        let err = decode::<serde_json::Value>("GET x", "not json").unwrap_err();
        match err {
            ApiError::Deserialization { body, .. } => assert_eq!(body, "not json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unserializable_body_names_the_request() {
        let scripted = crate::testing::Scripted::new([]);
        let body: std::collections::BTreeMap<(u8, u8), u8> = [((1, 2), 3)].into();
        let err = scripted
            .client()
            .write_json(HttpMethod::Put, &Endpoint::rest().segment("projects"), &body)
            .unwrap_err();
        match err {
            ApiError::Serialization { request, .. } => {
                assert_eq!(request, "PUT http://tc:8111/app/rest/projects")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(scripted.requests().is_empty());
    }
}
