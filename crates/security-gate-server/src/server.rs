// crates/security-gate-server/src/server.rs
// ============================================================================
// Module: Security Gate HTTP Server
// Description: axum routes for validation, audit reads, and health probes.
// Purpose: Expose the security gate over HTTP with fail-closed handling.
// Dependencies: security-gate-core, security-gate-config, axum, tokio, uuid
// ============================================================================

//! ## Overview
//! Every validation route builds a [`GateRequest`] (UUID v4 request id,
//! `User-Agent` as client, artifact references taken from the upload), then
//! runs the gate on the blocking pool. Multipart fields are read before the
//! gate runs but checked inside it, so authentication is still decided first
//! and a missing field is reported as `SCHEMA_INVALID`.
//!
//! Status mapping: decisions are 200; malformed input is 400; authentication
//! is 401; audit or internal failures are 500.
//! Security posture: request bodies are untrusted and size-limited.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Multipart;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::BytesRejection;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::header::USER_AGENT;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use security_gate_config::SecurityGateConfig;
use security_gate_core::AuditQuery;
use security_gate_core::Decision;
use security_gate_core::FailureKind;
use security_gate_core::FileAuditLog;
use security_gate_core::GateError;
use security_gate_core::GateRequest;
use security_gate_core::GateResponse;
use security_gate_core::ReasonCode;
use security_gate_core::ReferenceMetadata;
use security_gate_core::Scenario;
use security_gate_core::SecurityGate;
use security_gate_core::validate_migration;
use security_gate_core::validate_replication;
use security_gate_core::validate_replication_reference;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::BearerAuth;
use crate::events::StderrDecisionSink;
use crate::object_store::ObjectStoreFetcher;

// ============================================================================
// SECTION: Routes
// ============================================================================

/// Liveness probe route.
pub const HEALTH_PATH: &str = "/healthz";
/// Readiness probe route.
pub const READY_PATH: &str = "/readyz";
/// Migration validation route (scenario T1).
pub const MIGRATION_PATH: &str = "/api/v1/validate/migration";
/// Upload-mode replication validation route (scenario T2).
pub const REPLICATION_PATH: &str = "/api/v1/validate/replication";
/// Reference-mode replication validation route (scenario T2).
pub const REPLICATION_REF_PATH: &str = "/api/v1/validate/replication/ref";
/// Audit log read route.
pub const AUDIT_LOGS_PATH: &str = "/api/v1/audit/logs";

/// Multipart fields of the migration route, in artifact-ref order.
const MIGRATION_FIELDS: [&str; 2] = ["migration_manifest", "app_config"];
/// Multipart fields of the replication route, in artifact-ref order.
const REPLICATION_FIELDS: [&str; 2] = ["replication_manifest", "snapshot"];

// ============================================================================
// SECTION: Server
// ============================================================================

/// Shared handler state.
pub struct AppState {
    /// Decision gate.
    gate: SecurityGate,
    /// Bearer authenticator.
    auth: BearerAuth,
}

impl AppState {
    /// Creates handler state over a gate and authenticator.
    #[must_use]
    pub const fn new(gate: SecurityGate, auth: BearerAuth) -> Self {
        Self {
            gate,
            auth,
        }
    }

    /// Authenticates a request for the gate lifecycle.
    fn authorize(&self, header: Option<&str>) -> Result<(), GateError> {
        self.auth.authorize(header).map_err(|_| GateError::Auth)
    }
}

/// Builds the HTTP router.
#[must_use]
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(handle_health))
        .route(READY_PATH, get(handle_ready))
        .route(MIGRATION_PATH, post(handle_migration))
        .route(REPLICATION_PATH, post(handle_replication))
        .route(REPLICATION_REF_PATH, post(handle_replication_reference))
        .route(AUDIT_LOGS_PATH, get(handle_audit_logs))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(Arc::new(state))
}

/// Security gate HTTP server.
pub struct SecurityGateServer {
    /// Bind address.
    addr: SocketAddr,
    /// Maximum request body size.
    max_body_bytes: usize,
    /// Handler state.
    state: AppState,
}

impl SecurityGateServer {
    /// Builds a server from configuration: file audit log, S3 fetcher, stderr
    /// decision events.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration or initialization fails.
    pub fn from_config(config: &SecurityGateConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let addr =
            config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let fetcher = ObjectStoreFetcher::from_config(&config.object_store)
            .map_err(|err| ServerError::Init(err.to_string()))?;
        let gate = SecurityGate::new(
            Arc::new(FileAuditLog::new(config.audit.path.trim())),
            Arc::new(fetcher),
            Arc::new(StderrDecisionSink),
        );
        Ok(Self {
            addr,
            max_body_bytes: config.server.max_body_bytes,
            state: AppState::new(gate, BearerAuth::from_config(&config.server.auth)),
        })
    }

    /// Returns the configured bind address.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serves requests until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let app = router(self.state, self.max_body_bytes);
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|_| ServerError::Transport("http bind failed".to_string()))?;
        axum::serve(listener, app)
            .await
            .map_err(|_| ServerError::Transport("http server failed".to_string()))
    }
}

// ============================================================================
// SECTION: Probe Handlers
// ============================================================================

/// Probe response body.
#[derive(Debug, Serialize)]
struct StatusBody {
    /// Probe status.
    status: &'static str,
}

/// Handles the liveness probe.
async fn handle_health() -> Json<StatusBody> {
    Json(StatusBody {
        status: "ok",
    })
}

/// Handles the readiness probe; ready only when the audit log is writable.
async fn handle_ready(State(state): State<Arc<AppState>>) -> Response {
    match state.gate.check_ready() {
        Ok(()) => (
            StatusCode::OK,
            Json(StatusBody {
                status: "ok",
            }),
        )
            .into_response(),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(StatusBody {
                status: "audit_unavailable",
            }),
        )
            .into_response(),
    }
}

// ============================================================================
// SECTION: Validation Handlers
// ============================================================================

/// Handles migration validation (multipart `migration_manifest`, `app_config`).
async fn handle_migration(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let form = UploadForm::read(multipart, &MIGRATION_FIELDS).await;
    let request = gate_request(&headers, Scenario::Migration, MIGRATION_PATH)
        .with_artifact_refs(upload_refs(&form, &MIGRATION_FIELDS));
    let authorization = authorization_header(&headers);
    let response = run_blocking(&state, request, move |state, request| {
        state.gate.decide(
            request,
            || state.authorize(authorization.as_deref()),
            |ctx| {
                let form = form?;
                let manifest = form.bytes(MIGRATION_FIELDS[0])?;
                let config = form.bytes(MIGRATION_FIELDS[1])?;
                validate_migration(ctx, manifest, config).map_err(GateError::from)
            },
        )
    })
    .await;
    decision_response(response)
}

/// Handles upload-mode replication validation (multipart
/// `replication_manifest`, `snapshot`; `wal_files` accepted and ignored).
async fn handle_replication(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let form = UploadForm::read(multipart, &REPLICATION_FIELDS).await;
    let request = gate_request(&headers, Scenario::Replication, REPLICATION_PATH)
        .with_artifact_refs(upload_refs(&form, &REPLICATION_FIELDS));
    let authorization = authorization_header(&headers);
    let response = run_blocking(&state, request, move |state, request| {
        state.gate.decide(
            request,
            || state.authorize(authorization.as_deref()),
            |ctx| {
                let form = form?;
                let manifest = form.bytes(REPLICATION_FIELDS[0])?;
                let snapshot = form.bytes(REPLICATION_FIELDS[1])?;
                validate_replication(ctx, manifest, snapshot).map_err(GateError::from)
            },
        )
    })
    .await;
    decision_response(response)
}

/// Handles reference-mode replication validation (raw YAML manifest body).
async fn handle_replication_reference(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = body.map_err(|_| GateError::MalformedInput {
        code: ReasonCode::InvalidManifest,
        message: "Failed to read replication manifest".to_string(),
    });
    let metadata =
        body.as_ref().map(|bytes| ReferenceMetadata::extract(bytes)).unwrap_or_default();
    let request = gate_request(&headers, Scenario::Replication, REPLICATION_REF_PATH)
        .with_artifact_refs(metadata.artifact_refs)
        .with_policy_version(metadata.policy_version);
    let authorization = authorization_header(&headers);
    let response = run_blocking(&state, request, move |state, request| {
        state.gate.decide(
            request,
            || state.authorize(authorization.as_deref()),
            |ctx| {
                let body = body?;
                validate_replication_reference(ctx, state.gate.fetcher(), &body)
                    .map_err(GateError::from)
            },
        )
    })
    .await;
    decision_response(response)
}

// ============================================================================
// SECTION: Audit Handler
// ============================================================================

/// Audit read query parameters.
#[derive(Debug, Deserialize)]
struct AuditLogParams {
    /// Maximum records returned.
    limit: Option<usize>,
    /// Decision filter (`ALLOW` or `BLOCK`).
    decision: Option<String>,
    /// Scenario filter (`T1` or `T2`).
    scenario: Option<String>,
}

impl AuditLogParams {
    /// Converts raw parameters into an audit query.
    fn to_query(&self) -> Result<AuditQuery, &'static str> {
        let decision = self
            .decision
            .as_deref()
            .map(|value| Decision::parse(value).ok_or("decision must be ALLOW or BLOCK"))
            .transpose()?;
        let scenario = self
            .scenario
            .as_deref()
            .map(|value| Scenario::parse(value).ok_or("scenario must be T1 or T2"))
            .transpose()?;
        Ok(AuditQuery {
            limit: self.limit.unwrap_or(AuditQuery::DEFAULT_LIMIT),
            decision,
            scenario,
        })
    }
}

/// Error response body for non-decision routes.
#[derive(Debug, Serialize)]
struct ErrorBody {
    /// Error description.
    detail: &'static str,
}

/// Builds an error response for non-decision routes.
fn error_response(status: StatusCode, detail: &'static str) -> Response {
    (
        status,
        Json(ErrorBody {
            detail,
        }),
    )
        .into_response()
}

/// Handles bearer-authenticated audit log reads.
async fn handle_audit_logs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<AuditLogParams>,
) -> Response {
    if state.auth.authorize(authorization_header(&headers).as_deref()).is_err() {
        return error_response(StatusCode::UNAUTHORIZED, "Authentication failed");
    }
    let query = match params.to_query() {
        Ok(query) => query,
        Err(detail) => return error_response(StatusCode::BAD_REQUEST, detail),
    };
    let reader = Arc::clone(&state);
    match tokio::task::spawn_blocking(move || reader.gate.read_audit(&query)).await {
        Ok(Ok(records)) => (StatusCode::OK, Json(records)).into_response(),
        Ok(Err(_)) | Err(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Audit log unavailable")
        }
    }
}

// ============================================================================
// SECTION: Multipart Uploads
// ============================================================================

/// Uploaded multipart file.
struct UploadedFile {
    /// Form field name.
    field: String,
    /// Client-supplied file name, when present.
    file_name: Option<String>,
    /// File content.
    bytes: Vec<u8>,
}

/// Wanted files of a multipart upload; other fields are drained and dropped.
struct UploadForm {
    /// First occurrence of each wanted field, in arrival order.
    files: Vec<UploadedFile>,
}

impl UploadForm {
    /// Reads the multipart stream, keeping the first occurrence of each
    /// wanted field.
    async fn read(
        multipart: Result<Multipart, MultipartRejection>,
        wanted: &[&str],
    ) -> Result<Self, GateError> {
        let mut multipart = multipart.map_err(|_| multipart_error())?;
        let mut files: Vec<UploadedFile> = Vec::new();
        while let Some(field) = multipart.next_field().await.map_err(|_| multipart_error())? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.map_err(|_| multipart_error())?;
            if wanted.contains(&name.as_str()) && !files.iter().any(|file| file.field == name) {
                files.push(UploadedFile {
                    field: name,
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
        }
        Ok(Self {
            files,
        })
    }

    /// Returns the content of a required field.
    fn bytes(&self, field: &str) -> Result<&[u8], GateError> {
        self.files
            .iter()
            .find(|file| file.field == field)
            .map(|file| file.bytes.as_slice())
            .ok_or_else(|| GateError::MalformedInput {
                code: ReasonCode::SchemaInvalid,
                message: format!("Missing required field: {field}"),
            })
    }
}

/// Returns artifact references (file name, else field name) for present fields.
fn upload_refs(form: &Result<UploadForm, GateError>, fields: &[&str]) -> Vec<String> {
    let Ok(form) = form else {
        return Vec::new();
    };
    fields
        .iter()
        .filter_map(|field| form.files.iter().find(|file| file.field == *field))
        .map(|file| file.file_name.clone().unwrap_or_else(|| file.field.clone()))
        .collect()
}

/// Error reported when the multipart body cannot be read.
fn multipart_error() -> GateError {
    GateError::MalformedInput {
        code: ReasonCode::ParseError,
        message: "Failed to read multipart body".to_string(),
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds request metadata with a fresh request id and the caller's user agent.
fn gate_request(headers: &HeaderMap, scenario: Scenario, endpoint: &str) -> GateRequest {
    let client =
        headers.get(USER_AGENT).and_then(|value| value.to_str().ok()).map(str::to_string);
    GateRequest::new(Uuid::new_v4().to_string(), scenario, endpoint).with_client(client)
}

/// Returns the `Authorization` header value, when it is valid UTF-8.
fn authorization_header(headers: &HeaderMap) -> Option<String> {
    headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()).map(str::to_string)
}

/// Runs a gate job on the blocking pool; a join failure becomes `INTERNAL_ERROR`.
async fn run_blocking<F>(state: &Arc<AppState>, request: GateRequest, job: F) -> GateResponse
where
    F: FnOnce(&AppState, &GateRequest) -> GateResponse + Send + 'static,
{
    let worker_state = Arc::clone(state);
    let worker_request = request.clone();
    match tokio::task::spawn_blocking(move || job(&worker_state, &worker_request)).await {
        Ok(response) => response,
        Err(err) => state.gate.reject(&request, GateError::Internal(err.to_string())),
    }
}

/// Maps a gate response to an HTTP response.
fn decision_response(response: GateResponse) -> Response {
    (status_for(response.failure), Json(response.result)).into_response()
}

/// Returns the HTTP status for a failure classification.
const fn status_for(failure: Option<FailureKind>) -> StatusCode {
    match failure {
        None => StatusCode::OK,
        Some(FailureKind::MalformedInput) => StatusCode::BAD_REQUEST,
        Some(FailureKind::Auth) => StatusCode::UNAUTHORIZED,
        Some(FailureKind::AuditUnavailable | FailureKind::Internal) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
