// crates/security-gate-server/tests/common/mod.rs
// ============================================================================
// Module: Common HTTP Test Fixtures
// Description: Router harness, multipart builder, and fixture manifests.
// Purpose: Drive the axum router in-process with deterministic backends.
// Dependencies: security-gate-server, security-gate-core, tempfile, tower
// ============================================================================

//! ## Overview
//! Builds the router over a temp-dir file audit log, a recording event sink,
//! and an in-memory artifact fetcher, then drives it with
//! `tower::ServiceExt::oneshot`.

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test fixtures use explicit unwraps for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use axum::http::header::USER_AGENT;
use http_body_util::BodyExt;
use security_gate_core::ArtifactFetcher;
use security_gate_core::AuditLog;
use security_gate_core::AuditQuery;
use security_gate_core::AuditRecord;
use security_gate_core::FetchError;
use security_gate_core::FileAuditLog;
use security_gate_core::InMemoryDecisionSink;
use security_gate_core::ObjectLocation;
use security_gate_core::SecurityGate;
use security_gate_core::sha256_hex;
use security_gate_server::AppState;
use security_gate_server::BearerAuth;
use security_gate_server::router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Token accepted by the harness.
pub const TOKEN: &str = "test-token";
/// Default body limit for the harness.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;
/// Multipart boundary used by [`multipart`].
const BOUNDARY: &str = "security-gate-test-boundary";

/// Config that passes every policy in prod.
pub const CLEAN_PROD_CONFIG: &str = "\
tls:
  enabled: true
ports:
  - bind: 127.0.0.1
    port: 8443
secrets_ref: vault://apps/billing
";

// ============================================================================
// SECTION: Fetcher
// ============================================================================

/// In-memory artifact fetcher keyed by `s3://bucket/key`.
#[derive(Default)]
pub struct StaticFetcher {
    /// Stored objects.
    objects: BTreeMap<String, Vec<u8>>,
}

impl StaticFetcher {
    /// Stores `bytes` under `uri`.
    pub fn with_object(mut self, uri: &str, bytes: &[u8]) -> Self {
        self.objects.insert(uri.to_string(), bytes.to_vec());
        self
    }
}

impl ArtifactFetcher for StaticFetcher {
    fn fetch(&self, location: &ObjectLocation) -> Result<Vec<u8>, FetchError> {
        self.objects
            .get(&location.to_string())
            .cloned()
            .ok_or_else(|| FetchError("NoSuchKey".to_string()))
    }
}

// ============================================================================
// SECTION: Harness
// ============================================================================

/// Router plus the backends it was built over.
pub struct Harness {
    /// Router under test.
    pub router: Router,
    /// Recording event sink.
    pub events: Arc<InMemoryDecisionSink>,
    /// Audit log path.
    pub audit_path: PathBuf,
    /// Temp dir owning the audit log.
    _dir: TempDir,
}

impl Harness {
    /// Builds a harness with an empty fetcher.
    pub fn new() -> Self {
        Self::with_fetcher(StaticFetcher::default())
    }

    /// Builds a harness over `fetcher`.
    pub fn with_fetcher(fetcher: StaticFetcher) -> Self {
        Self::build(fetcher, MAX_BODY_BYTES, false)
    }

    /// Builds a harness whose audit log path is a directory (never writable).
    pub fn with_broken_audit() -> Self {
        Self::build(StaticFetcher::default(), MAX_BODY_BYTES, true)
    }

    /// Builds a harness with a custom body limit.
    pub fn with_body_limit(max_body_bytes: usize) -> Self {
        Self::build(StaticFetcher::default(), max_body_bytes, false)
    }

    /// Builds the harness.
    fn build(fetcher: StaticFetcher, max_body_bytes: usize, broken_audit: bool) -> Self {
        let dir = TempDir::new().unwrap();
        let audit_path =
            if broken_audit { dir.path().to_path_buf() } else { dir.path().join("audit.log") };
        let events = Arc::new(InMemoryDecisionSink::new());
        let gate = SecurityGate::new(
            Arc::new(FileAuditLog::new(audit_path.clone())),
            Arc::new(fetcher),
            events.clone(),
        );
        let state = AppState::new(gate, BearerAuth::new([TOKEN.to_string()]));
        Self {
            router: router(state, max_body_bytes),
            events,
            audit_path,
            _dir: dir,
        }
    }

    /// Sends a request and returns the status plus JSON body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    /// Reads every audit record written so far.
    pub fn audit_records(&self) -> Vec<AuditRecord> {
        let query = AuditQuery {
            limit: usize::MAX,
            ..AuditQuery::default()
        };
        FileAuditLog::new(self.audit_path.clone()).read(&query).unwrap()
    }
}

// ============================================================================
// SECTION: Request Builders
// ============================================================================

/// Multipart part: field name, optional file name, content.
pub type Part<'a> = (&'a str, Option<&'a str>, &'a [u8]);

/// Builds a multipart body and its content type.
pub fn multipart(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, file_name, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let disposition = match file_name {
            Some(file_name) => format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
            ),
            None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n"),
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

/// Builds an authenticated multipart POST.
pub fn multipart_post(uri: &str, parts: &[Part<'_>], token: Option<&str>) -> Request<Body> {
    let (content_type, body) = multipart(parts);
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, content_type)
        .header(USER_AGENT, "gate-tests/1.0");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).unwrap()
}

/// Builds an authenticated raw-body POST.
pub fn raw_post(uri: &str, body: &[u8], token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/yaml")
        .header(USER_AGENT, "gate-tests/1.0");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_vec())).unwrap()
}

/// Builds a GET, optionally authenticated.
pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

// ============================================================================
// SECTION: Manifests
// ============================================================================

/// Migration manifest whose digest matches `config`.
pub fn migration_manifest(env: &str, config: &str) -> Vec<u8> {
    migration_manifest_with_hash(env, &sha256_hex(config.as_bytes()))
}

/// Migration manifest declaring `config_sha256`.
pub fn migration_manifest_with_hash(env: &str, config_sha256: &str) -> Vec<u8> {
    serde_json::json!({
        "app_id": "billing",
        "env": env,
        "version": "1.4.2",
        "config_sha256": config_sha256,
    })
    .to_string()
    .into_bytes()
}

/// Replication manifest declaring `expected_snapshot_hash`.
pub fn replication_manifest(expected_snapshot_hash: &str, sync_mode: &str) -> Vec<u8> {
    format!(
        "source_db: billing-primary\ntarget_db: billing-replica\nexpected_snapshot_hash: \
         \"{expected_snapshot_hash}\"\nsync_mode: {sync_mode}\n"
    )
    .into_bytes()
}

/// Reference manifest naming one snapshot.
pub fn reference_manifest(snapshot_uri: &str, snapshot_sha256: &str) -> Vec<u8> {
    format!(
        "app_id: billing\nenv: prod\nsync_mode: async\npolicy_version: \"2024.1\"\nsnapshot:\n  \
         uri: {snapshot_uri}\n  sha256: \"{snapshot_sha256}\"\n"
    )
    .into_bytes()
}

/// Returns the reason codes of a decision body.
pub fn reason_codes(body: &Value) -> Vec<String> {
    body["reasons"]
        .as_array()
        .map(|reasons| {
            reasons
                .iter()
                .filter_map(|reason| reason["code"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
