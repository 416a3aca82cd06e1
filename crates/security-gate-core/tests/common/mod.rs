// crates/security-gate-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared fixtures for security gate core tests.
// Purpose: Provide deterministic contexts, manifests, and fetchers.
// Dependencies: security-gate-core
// ============================================================================

//! ## Overview
//! Shared fixtures for the core integration tests: decision contexts bound to
//! a recording sink, manifest builders, and an in-memory artifact fetcher that
//! records every fetch it serves.

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use security_gate_core::ArtifactFetcher;
use security_gate_core::DecisionContext;
use security_gate_core::FetchError;
use security_gate_core::InMemoryDecisionSink;
use security_gate_core::ObjectLocation;
use security_gate_core::Scenario;
use security_gate_core::sha256_hex;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Config that passes every policy in prod.
pub const CLEAN_PROD_CONFIG: &str = "\
tls:
  enabled: true
ports:
  - bind: 127.0.0.1
    port: 8443
secrets_ref: vault://apps/billing
";

/// Creates a decision context bound to `sink`.
pub fn context(sink: &InMemoryDecisionSink, scenario: Scenario) -> DecisionContext<'_> {
    DecisionContext {
        request_id: "req-test",
        scenario,
        endpoint: "test",
        client: Some("test-client"),
        artifact_refs: &[],
        events: sink,
    }
}

/// Builds a migration manifest whose digest matches `config`.
pub fn migration_manifest(env: &str, config: &str) -> Vec<u8> {
    migration_manifest_with_hash(env, &sha256_hex(config.as_bytes()))
}

/// Builds a migration manifest with an explicit declared digest.
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

/// Builds an upload-mode replication manifest.
pub fn replication_manifest(expected_snapshot_hash: &str, sync_mode: &str) -> Vec<u8> {
    format!(
        "source_db: orders-primary\ntarget_db: orders-replica\nexpected_snapshot_hash: \
         \"{expected_snapshot_hash}\"\nsync_mode: {sync_mode}\n"
    )
    .into_bytes()
}

/// Builds a reference-mode replication manifest.
pub fn reference_manifest(
    env: &str,
    sync_mode: &str,
    snapshot: (&str, &str),
    wal: Option<(&str, &str)>,
) -> Vec<u8> {
    let mut text = format!(
        "app_id: orders\nenv: {env}\nsync_mode: {sync_mode}\npolicy_version: \"2024.1\"\n\
         snapshot:\n  uri: \"{}\"\n  sha256: \"{}\"\n",
        snapshot.0, snapshot.1
    );
    if let Some((uri, sha256)) = wal {
        text.push_str(&format!("wal:\n  uri: \"{uri}\"\n  sha256: \"{sha256}\"\n"));
    }
    text.into_bytes()
}

// ============================================================================
// SECTION: Fetcher
// ============================================================================

/// In-memory fetcher keyed by `s3://bucket/key`, recording every call.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    /// Stored objects keyed by URI.
    objects: BTreeMap<String, Vec<u8>>,
    /// URIs requested, in order.
    calls: Mutex<Vec<String>>,
}

impl StaticFetcher {
    /// Creates an empty fetcher; every fetch fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object served at `uri`.
    pub fn with_object(mut self, uri: &str, bytes: &[u8]) -> Self {
        self.objects.insert(uri.to_string(), bytes.to_vec());
        self
    }

    /// Returns the URIs requested so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ArtifactFetcher for StaticFetcher {
    fn fetch(&self, location: &ObjectLocation) -> Result<Vec<u8>, FetchError> {
        let uri = location.to_string();
        self.calls.lock().unwrap().push(uri.clone());
        self.objects.get(&uri).cloned().ok_or_else(|| FetchError(format!("no such object {uri}")))
    }
}
