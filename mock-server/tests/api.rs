use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, new_db, router, Project};
use serde_json::Value;
use tower::ServiceExt;

const AUTH: &str = "Bearer test-token";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes: bytes::Bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, AUTH)
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, AUTH)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn text_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, AUTH)
        .header(http::header::CONTENT_TYPE, "text/plain")
        .body(body.to_string())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_authorization_returns_401() {
    let db = new_db();
    let resp = router(db.clone())
        .oneshot(Request::builder().uri("/app/rest").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let state = db.read().await;
    assert_eq!(state.requests.len(), 1);
    assert_eq!(state.requests[0].authorization, None);
}

#[tokio::test]
async fn root_answers_with_credentials() {
    let resp = app().oneshot(get("/app/rest")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "TeamCity REST API");
}

#[tokio::test]
async fn requests_are_recorded_with_headers_and_body() {
    let db = new_db();
    router(db.clone())
        .oneshot(json_request("POST", "/app/rest/projects", r#"{"name":"Test"}"#))
        .await
        .unwrap();

    let state = db.read().await;
    let recorded = &state.requests[0];
    assert_eq!(recorded.method, "POST");
    assert_eq!(recorded.path, "/app/rest/projects");
    assert_eq!(recorded.authorization.as_deref(), Some(AUTH));
    assert_eq!(recorded.content_type.as_deref(), Some("application/json"));
    assert_eq!(recorded.body, r#"{"name":"Test"}"#);
}

// --- projects ---

#[tokio::test]
async fn create_project_derives_id_and_root_parent() {
    let resp = app()
        .oneshot(json_request("POST", "/app/rest/projects", r#"{"name":"my project"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let project: Project = body_json(resp).await;
    assert_eq!(project.id, "MyProject");
    assert_eq!(project.parent_project.unwrap().id, "_Root");
}

#[tokio::test]
async fn duplicate_project_id_returns_400() {
    let db = new_db();
    let body = r#"{"name":"Test","id":"Test"}"#;
    router(db.clone())
        .oneshot(json_request("POST", "/app/rest/projects", body))
        .await
        .unwrap();
    let resp = router(db)
        .oneshot(json_request("POST", "/app/rest/projects", body))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(resp).await.contains("already used"));
}

#[tokio::test]
async fn get_missing_project_returns_404() {
    let resp = app().oneshot(get("/app/rest/projects/id:Missing")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- versioned settings ---

#[tokio::test]
async fn settings_for_missing_project_return_404() {
    let resp = app()
        .oneshot(json_request(
            "PUT",
            "/app/rest/projects/id:Missing/versionedSettings/config",
            r#"{"synchronizationMode":"enabled"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn coercion_resets_show_settings_changes() {
    let db = new_db();
    db.write().await.coerce_show_settings_changes = true;
    router(db.clone())
        .oneshot(json_request("POST", "/app/rest/projects", r#"{"name":"P"}"#))
        .await
        .unwrap();

    let resp = router(db.clone())
        .oneshot(json_request(
            "PUT",
            "/app/rest/projects/id:P/versionedSettings/config",
            r#"{"synchronizationMode":"enabled","showSettingsChanges":true}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let echoed: Value = body_json(resp).await;
    assert_eq!(echoed["showSettingsChanges"], false);

    let resp = router(db)
        .oneshot(text_request(
            "PUT",
            "/app/rest/projects/id:P/versionedSettings/config/parameters/showSettingsChanges",
            "true",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "true");
}

#[tokio::test]
async fn property_write_before_settings_returns_500() {
    let resp = app()
        .oneshot(text_request(
            "PUT",
            "/app/rest/projects/id:P/versionedSettings/config/parameters/showSettingsChanges",
            "true",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn correction_override_replaces_echo() {
    let db = new_db();
    db.write().await.correction_override = Some("not_boolean".to_string());
    router(db.clone())
        .oneshot(json_request("POST", "/app/rest/projects", r#"{"name":"P"}"#))
        .await
        .unwrap();
    router(db.clone())
        .oneshot(json_request(
            "PUT",
            "/app/rest/projects/id:P/versionedSettings/config",
            r#"{"synchronizationMode":"enabled"}"#,
        ))
        .await
        .unwrap();

    let resp = router(db)
        .oneshot(text_request(
            "PUT",
            "/app/rest/projects/id:P/versionedSettings/config/parameters/showSettingsChanges",
            "true",
        ))
        .await
        .unwrap();
    assert_eq!(body_text(resp).await, "not_boolean");
}

// --- build types ---

#[tokio::test]
async fn build_type_appears_after_hidden_lookups() {
    let db = new_db();
    db.write().await.add_build_type("P", "P_Build", "Build", 2);

    for _ in 0..2 {
        let resp = router(db.clone())
            .oneshot(get("/app/rest/buildTypes/id:P_Build"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
    let resp = router(db)
        .oneshot(get("/app/rest/buildTypes/id:P_Build"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let build: Value = body_json(resp).await;
    assert_eq!(build["projectId"], "P");
}

// --- full project lifecycle ---

#[tokio::test]
async fn project_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/app/rest/projects", r#"{"name":"Test"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // parameter
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(text_request("PUT", "/app/rest/projects/id:Test/parameters/env", "prod"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/app/rest/projects/id:Test/parameters/env"))
        .await
        .unwrap();
    assert_eq!(body_text(resp).await, "prod");

    // rename
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(text_request("PUT", "/app/rest/projects/id:Test/name", "Renamed"))
        .await
        .unwrap();
    assert_eq!(body_text(resp).await, "Renamed");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/app/rest/projects/id:Test"))
        .await
        .unwrap();
    let project: Project = body_json(resp).await;
    assert_eq!(project.name, "Renamed");

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("DELETE")
                .uri("/app/rest/projects/id:Test")
                .header(http::header::AUTHORIZATION, AUTH)
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // get after delete: 404, parameters gone with it
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/app/rest/projects/id:Test"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/app/rest/projects/id:Test/parameters/env"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- licensing ---

#[tokio::test]
async fn license_keys_lifecycle() {
    let db = new_db();
    let resp = router(db.clone())
        .oneshot(text_request("POST", "/app/rest/server/licensingData/licenseKeys", "KEY-1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = router(db.clone())
        .oneshot(get("/app/rest/server/licensingData/licenseKeys/KEY-1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = router(db.clone())
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/app/rest/server/licensingData/licenseKeys/KEY-1")
                .header(http::header::AUTHORIZATION, AUTH)
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(db.read().await.license_keys.is_empty());
}
