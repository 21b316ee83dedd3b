//! In-memory imitation of the TeamCity REST surface used by the client
//! tests.
//!
//! Only the routes the client exercises are implemented. Two server quirks
//! are reproduced on demand: a full versioned-settings write can silently
//! reset `showSettingsChanges`, and build configurations become visible a
//! few lookups after they are registered.

use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

pub const REST_ROOT: &str = "/app/rest";

/// One request as seen by the server, after routing and before handling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectRef {
    pub id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_project: Option<ProjectRef>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub id: Option<String>,
    pub parent_project: Option<ProjectRef>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuildType {
    pub id: String,
    pub name: String,
    pub project_id: String,
}

/// A build configuration that answers 404 for its first `hidden_for`
/// lookups.
#[derive(Clone, Debug)]
pub struct PendingBuildType {
    pub build_type: BuildType,
    pub hidden_for: u32,
}

#[derive(Debug)]
pub struct ServerState {
    pub version: String,
    pub projects: BTreeMap<String, Project>,
    pub versioned_settings: BTreeMap<String, Map<String, Value>>,
    pub parameters: BTreeMap<(String, String), String>,
    pub license_keys: BTreeSet<String>,
    pub build_types: BTreeMap<String, PendingBuildType>,
    /// Reset `showSettingsChanges` to `false` on full-record writes.
    pub coerce_show_settings_changes: bool,
    /// Answer property writes with this body instead of the stored value.
    pub correction_override: Option<String>,
    pub requests: Vec<RecordedRequest>,
}

impl Default for ServerState {
    fn default() -> Self {
        Self {
            version: "2024.03 (build 156321)".to_string(),
            projects: BTreeMap::new(),
            versioned_settings: BTreeMap::new(),
            parameters: BTreeMap::new(),
            license_keys: BTreeSet::new(),
            build_types: BTreeMap::new(),
            coerce_show_settings_changes: false,
            correction_override: None,
            requests: Vec::new(),
        }
    }
}

impl ServerState {
    /// Register a build configuration that shows up after `hidden_for`
    /// lookups.
    pub fn add_build_type(&mut self, project_id: &str, id: &str, name: &str, hidden_for: u32) {
        self.build_types.insert(
            id.to_string(),
            PendingBuildType {
                build_type: BuildType {
                    id: id.to_string(),
                    name: name.to_string(),
                    project_id: project_id.to_string(),
                },
                hidden_for,
            },
        );
    }

    /// Recorded requests whose path ends with `suffix`.
    pub fn requests_to(&self, suffix: &str) -> Vec<&RecordedRequest> {
        self.requests
            .iter()
            .filter(|r| r.path.ends_with(suffix))
            .collect()
    }
}

pub type Db = Arc<RwLock<ServerState>>;

pub fn new_db() -> Db {
    Arc::new(RwLock::new(ServerState::default()))
}

pub fn app() -> Router {
    router(new_db())
}

pub fn router(db: Db) -> Router {
    let rest = Router::new()
        .route("/", get(root))
        .route("/server/version", get(version))
        .route("/server/licensingData/licenseKeys", post(add_license))
        .route(
            "/server/licensingData/licenseKeys/{key}",
            get(get_license).delete(delete_license),
        )
        .route("/projects", post(create_project))
        .route("/projects/{locator}", get(get_project).delete(delete_project))
        .route("/projects/{locator}/{field}", put(set_project_field))
        .route(
            "/projects/{locator}/parameters/{name}",
            get(get_parameter).put(set_parameter).delete(delete_parameter),
        )
        .route(
            "/projects/{locator}/versionedSettings/config",
            get(get_settings).put(set_settings),
        )
        .route(
            "/projects/{locator}/versionedSettings/config/parameters/{property}",
            put(set_settings_property),
        )
        .route("/buildTypes/{locator}", get(get_build_type));

    Router::new()
        .nest(REST_ROOT, rest)
        .layer(middleware::from_fn_with_state(db.clone(), record))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, new_db()).await
}

pub async fn serve(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, router(db)).await
}

/// Start the server on a random local port in a background thread.
pub fn spawn(db: Db) -> std::io::Result<SocketAddr> {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = std_listener.local_addr()?;
    std_listener.set_nonblocking(true)?;

    std::thread::spawn(move || -> std::io::Result<()> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        rt.block_on(async {
            let listener = TcpListener::from_std(std_listener)?;
            serve(listener, db).await
        })
    });

    Ok(addr)
}

/// Record every request and reject unauthenticated ones.
async fn record(State(db): State<Db>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };
    let header_value = |name: header::HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let recorded = RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        authorization: header_value(header::AUTHORIZATION),
        content_type: header_value(header::CONTENT_TYPE),
        body: String::from_utf8_lossy(&bytes).into_owned(),
    };
    debug!(method = %recorded.method, path = %recorded.path, "mock request");
    let authorized = recorded.authorization.is_some();
    db.write().await.requests.push(recorded);

    if !authorized {
        return (StatusCode::UNAUTHORIZED, "Authentication required").into_response();
    }
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn locator_id(locator: &str) -> &str {
    locator.strip_prefix("id:").unwrap_or(locator)
}

/// Project id the server derives from a display name.
pub fn derive_project_id(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
                .unwrap_or_default()
        })
        .collect()
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

fn text_value(raw: &str) -> Value {
    match raw.trim() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        other => Value::String(other.to_string()),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn root() -> &'static str {
    "TeamCity REST API"
}

async fn version(State(db): State<Db>) -> String {
    db.read().await.version.clone()
}

// --- licensing ---

async fn add_license(State(db): State<Db>, body: String) -> StatusCode {
    db.write().await.license_keys.insert(body.trim().to_string());
    StatusCode::OK
}

async fn get_license(State(db): State<Db>, Path(key): Path<String>) -> Result<Json<Value>, StatusCode> {
    let state = db.read().await;
    if state.license_keys.contains(&key) {
        Ok(Json(serde_json::json!({ "key": key, "valid": true })))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn delete_license(State(db): State<Db>, Path(key): Path<String>) -> StatusCode {
    if db.write().await.license_keys.remove(&key) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// --- projects ---

async fn create_project(
    State(db): State<Db>,
    Json(input): Json<NewProject>,
) -> Result<Json<Project>, (StatusCode, String)> {
    let mut state = db.write().await;
    let id = input
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| derive_project_id(&input.name));
    if state.projects.contains_key(&id) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Project ID \"{id}\" is already used by another project"),
        ));
    }
    let project = Project {
        id: id.clone(),
        name: input.name,
        parent_project: Some(input.parent_project.unwrap_or(ProjectRef {
            id: "_Root".to_string(),
        })),
    };
    state.projects.insert(id, project.clone());
    Ok(Json(project))
}

async fn get_project(
    State(db): State<Db>,
    Path(locator): Path<String>,
) -> Result<Json<Project>, StatusCode> {
    let state = db.read().await;
    state
        .projects
        .get(locator_id(&locator))
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn delete_project(State(db): State<Db>, Path(locator): Path<String>) -> StatusCode {
    let mut state = db.write().await;
    let id = locator_id(&locator).to_string();
    if state.projects.remove(&id).is_none() {
        return StatusCode::NOT_FOUND;
    }
    state.versioned_settings.remove(&id);
    state.parameters.retain(|(project, _), _| *project != id);
    StatusCode::NO_CONTENT
}

async fn set_project_field(
    State(db): State<Db>,
    Path((locator, field)): Path<(String, String)>,
    body: String,
) -> Result<String, (StatusCode, String)> {
    let mut state = db.write().await;
    let id = locator_id(&locator).to_string();
    let mut project = state
        .projects
        .remove(&id)
        .ok_or((StatusCode::NOT_FOUND, format!("No project found by locator '{locator}'")))?;
    let echoed = match field.as_str() {
        "name" => {
            project.name = body.clone();
            body
        }
        "id" => {
            project.id = body.clone();
            body
        }
        "parentProject" => {
            let parent: ProjectRef = serde_json::from_str(&body)
                .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;
            let echoed = serde_json::to_string(&parent).unwrap_or_default();
            project.parent_project = Some(parent);
            echoed
        }
        other => {
            state.projects.insert(id, project);
            return Err((StatusCode::BAD_REQUEST, format!("unknown field {other}")));
        }
    };
    if project.id != id {
        if let Some(settings) = state.versioned_settings.remove(&id) {
            state.versioned_settings.insert(project.id.clone(), settings);
        }
    }
    state.projects.insert(project.id.clone(), project);
    Ok(echoed)
}

// --- parameters ---

async fn get_parameter(
    State(db): State<Db>,
    Path((locator, name)): Path<(String, String)>,
) -> Result<String, StatusCode> {
    let state = db.read().await;
    state
        .parameters
        .get(&(locator_id(&locator).to_string(), name))
        .cloned()
        .ok_or(StatusCode::NOT_FOUND)
}

async fn set_parameter(
    State(db): State<Db>,
    Path((locator, name)): Path<(String, String)>,
    headers: HeaderMap,
    body: String,
) -> Result<String, (StatusCode, String)> {
    let mut state = db.write().await;
    let id = locator_id(&locator).to_string();
    if !state.projects.contains_key(&id) {
        return Err((StatusCode::NOT_FOUND, format!("No project found by locator '{locator}'")));
    }
    let value = if is_json(&headers) {
        let param: Value = serde_json::from_str(&body)
            .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;
        param
            .get("value")
            .map(value_text)
            .ok_or((StatusCode::BAD_REQUEST, "missing value".to_string()))?
    } else {
        body
    };
    state.parameters.insert((id, name), value.clone());
    Ok(value)
}

async fn delete_parameter(
    State(db): State<Db>,
    Path((locator, name)): Path<(String, String)>,
) -> StatusCode {
    let key = (locator_id(&locator).to_string(), name);
    if db.write().await.parameters.remove(&key).is_some() {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// --- versioned settings ---

async fn get_settings(
    State(db): State<Db>,
    Path(locator): Path<String>,
) -> Result<Json<Map<String, Value>>, StatusCode> {
    let state = db.read().await;
    state
        .versioned_settings
        .get(locator_id(&locator))
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn set_settings(
    State(db): State<Db>,
    Path(locator): Path<String>,
    Json(mut settings): Json<Map<String, Value>>,
) -> Result<Json<Map<String, Value>>, (StatusCode, String)> {
    let mut state = db.write().await;
    let id = locator_id(&locator).to_string();
    if !state.projects.contains_key(&id) {
        return Err((StatusCode::NOT_FOUND, format!("No project found by locator '{locator}'")));
    }
    if !settings.contains_key("synchronizationMode") {
        return Err((StatusCode::BAD_REQUEST, "synchronizationMode is required".to_string()));
    }
    if state.coerce_show_settings_changes && settings.contains_key("showSettingsChanges") {
        settings.insert("showSettingsChanges".to_string(), Value::Bool(false));
    }
    state.versioned_settings.insert(id, settings.clone());
    Ok(Json(settings))
}

async fn set_settings_property(
    State(db): State<Db>,
    Path((locator, property)): Path<(String, String)>,
    body: String,
) -> Result<String, (StatusCode, String)> {
    let mut state = db.write().await;
    let override_body = state.correction_override.clone();
    let settings = state
        .versioned_settings
        .get_mut(locator_id(&locator))
        .ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Versioned settings are not configured".to_string(),
        ))?;
    let value = text_value(&body);
    let echoed = value_text(&value);
    settings.insert(property, value);
    Ok(override_body.unwrap_or(echoed))
}

// --- build types ---

async fn get_build_type(
    State(db): State<Db>,
    Path(locator): Path<String>,
) -> Result<Json<BuildType>, StatusCode> {
    let mut state = db.write().await;
    let pending = state
        .build_types
        .get_mut(locator_id(&locator))
        .ok_or(StatusCode::NOT_FOUND)?;
    if pending.hidden_for > 0 {
        pending.hidden_for -= 1;
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(pending.build_type.clone()))
}
