use std::net::SocketAddr;

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::{net::TcpListener, task::JoinHandle};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::{
    CoreError,
    api::{CreateKeysResponse, Platform},
    service::{LocalizationService, NewKey},
    timestamps::now_rfc3339,
};

const MISSING_API_KEY: &str = "LOKALISE_API_KEY environment variable is required.";

#[derive(Clone, Debug)]
pub struct HttpState {
    /// `None` when no credential is configured; mutations then answer 500.
    pub service: Option<LocalizationService>,
}

impl HttpState {
    pub fn new(service: Option<LocalizationService>) -> Self {
        Self { service }
    }
}

#[derive(Debug)]
pub struct HttpServerHandle {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl HttpServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn shutdown(self) {
        self.task.abort();
    }

    /// Wait for the server task; it only ends on error or abort.
    pub async fn wait(self) {
        if let Err(err) = self.task.await {
            if !err.is_cancelled() {
                error!(error = ?err, "HTTP server task failed");
            }
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    endpoints: [&'static str; 3],
}

/// One key in an HTTP request body. Everything is optional so that missing
/// fields can be reported as 400 instead of a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl HttpKey {
    fn is_complete(&self) -> bool {
        filled(&self.key_name).is_some() && filled(&self.default_value).is_some()
    }

    fn into_new_key(self, default_platforms: bool) -> NewKey {
        let platforms = match self.platforms {
            Some(platforms) => Some(platforms),
            None if default_platforms => {
                Some(Platform::ALL.iter().map(|p| p.as_str().to_string()).collect())
            }
            None => None,
        };
        NewKey {
            key_name: self.key_name.unwrap_or_default(),
            default_value: self.default_value,
            platforms,
            description: self.description.filter(|d| !d.is_empty()),
            tags: self.tags,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AddKeyBody {
    project_name: Option<String>,
    #[serde(flatten)]
    key: HttpKey,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AddKeysBody {
    project_name: Option<String>,
    /// Items stay raw so a bad entry is reported by index.
    keys: Option<Vec<Value>>,
}

#[derive(Serialize)]
struct AddKeyResponse {
    success: bool,
    result: CreateKeysResponse,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddKeysSummary {
    project_name: String,
    keys_added: usize,
    keys: Vec<String>,
}

#[derive(Serialize)]
struct AddKeysResponse {
    success: bool,
    result: CreateKeysResponse,
    summary: AddKeysSummary,
}

#[derive(Debug)]
enum ApiError {
    /// 400 with a caller-facing body.
    BadRequest(Value),
    MissingCredential,
    Operation { message: String, details: Option<Value> },
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<CoreError>() {
            Ok(core) => {
                if core.is_caller_error() {
                    warn!(kind = core.kind(), error = %core, "request rejected");
                } else {
                    error!(kind = core.kind(), error = %core, "request failed");
                }
                ApiError::Operation { details: core.remote_body().cloned(), message: core.to_string() }
            }
            Err(other) => {
                error!(error = %format!("{other:#}"), "request failed");
                ApiError::Operation { message: format!("{other:#}"), details: None }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(body) => (StatusCode::BAD_REQUEST, Json(body)).into_response(),
            ApiError::MissingCredential => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": MISSING_API_KEY })))
                    .into_response()
            }
            ApiError::Operation { message, details } => {
                let mut body = json!({ "error": message });
                if let Some(details) = details {
                    body["details"] = details;
                }
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn require_service(state: &HttpState) -> Result<&LocalizationService, ApiError> {
    state.service.as_ref().ok_or(ApiError::MissingCredential)
}

pub fn build_router(state: HttpState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        .route("/add-key", post(add_key))
        .route("/add-keys", post(add_keys))
        .route("/health", get(get_health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn spawn_http_server(state: HttpState, addr: SocketAddr) -> Result<HttpServerHandle> {
    let router = build_router(state);
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    info!("HTTP server listening on {}", local_addr);

    let task = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            error!("HTTP server terminated with error: {err}");
        }
    });

    Ok(HttpServerHandle { addr: local_addr, task })
}

async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: now_rfc3339(),
        endpoints: [
            "POST /add-key - Add a single translation key",
            "POST /add-keys - Add multiple translation keys",
            "GET /health - Health check",
        ],
    })
}

async fn add_key(
    State(state): State<HttpState>,
    body: Result<Json<AddKeyBody>, JsonRejection>,
) -> Result<Json<AddKeyResponse>, ApiError> {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!(error = %rejection, "unreadable /add-key body");
            AddKeyBody::default()
        }
    };

    let project_name = filled(&body.project_name).map(str::to_string);
    let Some(project_name) = project_name.filter(|_| body.key.is_complete()) else {
        return Err(ApiError::BadRequest(json!({
            "error": "Missing required fields. projectName, keyName, and defaultValue are required.",
            "required": ["projectName", "keyName", "defaultValue"],
            "optional": ["platforms", "description", "tags"]
        })));
    };

    let service = require_service(&state)?;
    let key = body.key.into_new_key(true);
    let result = service.add_keys(&project_name, std::slice::from_ref(&key)).await?;
    Ok(Json(AddKeyResponse { success: true, result }))
}

async fn add_keys(
    State(state): State<HttpState>,
    body: Result<Json<AddKeysBody>, JsonRejection>,
) -> Result<Json<AddKeysResponse>, ApiError> {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!(error = %rejection, "unreadable /add-keys body");
            AddKeysBody::default()
        }
    };

    let project_name = filled(&body.project_name).map(str::to_string);
    let (Some(project_name), Some(keys)) = (project_name, body.keys.filter(|k| !k.is_empty()))
    else {
        return Err(ApiError::BadRequest(json!({
            "error": "Missing required fields. projectName and keys array are required.",
            "required": ["projectName", "keys"],
            "example": {
                "projectName": "My Project",
                "keys": [{
                    "keyName": "hello_world",
                    "defaultValue": "Hello World",
                    "platforms": ["web"],
                    "description": "Greeting message",
                    "tags": ["greeting"]
                }]
            }
        })));
    };

    let keys = keys
        .into_iter()
        .enumerate()
        .map(|(index, raw)| match serde_json::from_value::<HttpKey>(raw.clone()) {
            Ok(key) if key.is_complete() => Ok(key),
            _ => Err(ApiError::BadRequest(json!({
                "error": format!("Invalid key at index {index}. keyName and defaultValue are required."),
                "keyIndex": index,
                "key": raw
            }))),
        })
        .collect::<Result<Vec<HttpKey>, ApiError>>()?;

    let service = require_service(&state)?;
    let names: Vec<String> =
        keys.iter().map(|key| key.key_name.clone().unwrap_or_default()).collect();
    let new_keys: Vec<NewKey> = keys.into_iter().map(|key| key.into_new_key(false)).collect();
    let result = service.add_keys(&project_name, &new_keys).await?;

    Ok(Json(AddKeysResponse {
        success: true,
        result,
        summary: AddKeysSummary { project_name, keys_added: names.len(), keys: names },
    }))
}
