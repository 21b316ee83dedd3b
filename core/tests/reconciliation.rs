//! Call-count checks for versioned-settings reconciliation, driven through
//! the public API with an in-process transport.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use teamcity_core::types::{SynchronizationMode, VersionedSettings};
use teamcity_core::{
    ApiError, Connection, HttpMethod, HttpRequest, HttpResponse, RetryConfig, TeamCityClient,
    Transport, TransportError,
};

#[derive(Clone, Default)]
struct Recorder {
    responses: Arc<Mutex<VecDeque<HttpResponse>>>,
    seen: Arc<Mutex<Vec<HttpRequest>>>,
}

impl Recorder {
    fn answering(responses: &[(u16, &str)]) -> Self {
        let recorder = Self::default();
        recorder.responses.lock().unwrap().extend(
            responses
                .iter()
                .map(|(status, body)| HttpResponse::new(*status, *body)),
        );
        recorder
    }

    fn client(&self) -> TeamCityClient {
        let conn = Connection::new("http://tc.example.com/", "", "admin", "secret")
            .unwrap()
            .with_retry(RetryConfig::new(1, Duration::ZERO, Duration::ZERO));
        TeamCityClient::with_transport(conn, self.clone())
    }

    fn seen(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for Recorder {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::new("connection reset"))
    }
}

fn requested() -> VersionedSettings {
    let mut settings = VersionedSettings::new(SynchronizationMode::Enabled);
    settings.format = Some("kotlin".to_string());
    settings.show_settings_changes = Some(true);
    settings
}

#[test]
fn equal_echo_means_exactly_one_call() {
    let recorder = Recorder::answering(&[(
        200,
        r#"{"synchronizationMode":"enabled","format":"kotlin","showSettingsChanges":true}"#,
    )]);
    let result = recorder.client().set_versioned_settings("Test", &requested()).unwrap();
    assert_eq!(result, requested());
    assert_eq!(recorder.seen().len(), 1);
}

#[test]
fn differing_echo_means_exactly_two_calls() {
    let recorder = Recorder::answering(&[
        (200, r#"{"synchronizationMode":"enabled","format":"kotlin","showSettingsChanges":false}"#),
        (200, "true"),
    ]);
    let result = recorder.client().set_versioned_settings("Test", &requested()).unwrap();
    assert_eq!(result.show_settings_changes, Some(true));

    let seen = recorder.seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].method, HttpMethod::Put);
    assert_eq!(
        seen[1].path,
        "http://tc.example.com/app/rest/projects/id:Test/versionedSettings/config/parameters/showSettingsChanges"
    );
    for request in &seen {
        let auth: Vec<_> = request
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("authorization"))
            .collect();
        assert_eq!(auth.len(), 1);
        assert_eq!(auth[0].1, "Basic YWRtaW46c2VjcmV0");
    }
}

#[test]
fn correction_echo_is_authoritative() {
    let recorder = Recorder::answering(&[
        (200, r#"{"synchronizationMode":"enabled","showSettingsChanges":false}"#),
        (200, "false"),
    ]);
    let result = recorder.client().set_versioned_settings("Test", &requested()).unwrap();
    assert_eq!(result.show_settings_changes, Some(false));
    assert_eq!(recorder.seen().len(), 2);
}

#[test]
fn correction_transport_failure_is_wrapped() {
    let recorder = Recorder::answering(&[(
        200,
        r#"{"synchronizationMode":"enabled","showSettingsChanges":false}"#,
    )]);
    let err = recorder
        .client()
        .set_versioned_settings("Test", &requested())
        .unwrap_err();
    match &err {
        ApiError::CorrectionFailed { property, source } => {
            assert_eq!(*property, "showSettingsChanges");
            assert!(matches!(**source, ApiError::Transport { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn correction_gives_up_after_retry_budget() {
    let recorder = Recorder::answering(&[
        (200, r#"{"synchronizationMode":"enabled","showSettingsChanges":false}"#),
        (500, "not applied"),
        (500, "still not applied"),
    ]);
    let err = recorder
        .client()
        .set_versioned_settings("Test", &requested())
        .unwrap_err();
    assert!(err.is_reconciliation());
    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("still not applied"), "{err}");
    assert_eq!(recorder.seen().len(), 3);
}

#[test]
fn rejected_credentials_are_a_configuration_error() {
    let recorder = Recorder::answering(&[(401, "Authentication required")]);
    let err = recorder.client().verify_connection().unwrap_err();
    assert!(matches!(err, ApiError::Config(_)), "{err:?}");
}
