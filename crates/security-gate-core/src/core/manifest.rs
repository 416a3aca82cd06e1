// crates/security-gate-core/src/core/manifest.rs
// ============================================================================
// Module: Security Gate Manifests
// Description: Typed manifests and parsers for untrusted manifest bytes.
// Purpose: Turn client-submitted JSON/YAML into immutable manifest values.
// Dependencies: crate::core::{document, reason}, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Three manifest shapes are accepted: the migration manifest (JSON), the
//! replication upload manifest (YAML), and the replication reference manifest
//! (YAML). Parsers fail with [`MalformedInput`] carrying a reason code that
//! distinguishes syntax failures from schema failures. Every required field is
//! a string; a value of another type is a schema failure and unknown fields are
//! ignored.
//!
//! Security posture: manifest bytes are untrusted; parsers never panic and
//! never partially accept input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::core::document::Document;
use crate::core::document::decode_json;
use crate::core::document::decode_yaml;
use crate::core::document::decode_yaml_str;
use crate::core::reason::Reason;
use crate::core::reason::ReasonCode;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Keys every migration config document must carry.
pub const REQUIRED_CONFIG_KEYS: [&str; 3] = ["tls", "ports", "secrets_ref"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Client-caused input failure with a stable reason code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct MalformedInput {
    /// Reason code reported to the caller.
    pub code: ReasonCode,
    /// Human-readable message.
    pub message: String,
}

impl MalformedInput {
    /// Builds a malformed-input error.
    #[must_use]
    pub fn new(code: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Converts the error into a decision reason.
    #[must_use]
    pub fn to_reason(&self) -> Reason {
        Reason::new(self.code, self.message.clone())
    }
}

// ============================================================================
// SECTION: Manifest Types
// ============================================================================

/// Migration manifest (scenario T1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationManifest {
    /// Application identifier.
    pub app_id: String,
    /// Target environment tag.
    pub env: String,
    /// Application version string.
    pub version: String,
    /// Declared SHA-256 hex digest of the config document.
    pub config_sha256: String,
}

/// Replication manifest for uploaded snapshots (scenario T2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationManifest {
    /// Source database identifier.
    pub source_db: String,
    /// Target database identifier.
    pub target_db: String,
    /// Declared SHA-256 hex digest of the snapshot.
    pub expected_snapshot_hash: String,
    /// Requested sync mode.
    pub sync_mode: String,
}

/// Artifact referenced by URI with its declared digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceArtifact {
    /// Object-storage URI.
    pub uri: String,
    /// Declared SHA-256 hex digest.
    pub sha256: String,
    /// Optional detached signature (recorded, not verified).
    #[serde(default)]
    pub signature: Option<String>,
}

/// Replication manifest referencing artifacts in object storage (scenario T2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationReferenceManifest {
    /// Application identifier.
    pub app_id: String,
    /// Target environment tag.
    pub env: String,
    /// Snapshot reference.
    pub snapshot: ReferenceArtifact,
    /// Optional WAL reference.
    #[serde(default)]
    pub wal: Option<ReferenceArtifact>,
    /// Requested sync mode.
    pub sync_mode: String,
    /// Optional policy version declared by the client.
    #[serde(default)]
    pub policy_version: Option<String>,
    /// Optional change identifier.
    #[serde(default)]
    pub change_id: Option<String>,
}

// ============================================================================
// SECTION: Parsers
// ============================================================================

/// Parses a migration manifest from JSON bytes.
///
/// # Errors
///
/// Returns [`MalformedInput`] with `PARSE_ERROR` for invalid UTF-8/JSON and
/// `SCHEMA_INVALID` for schema violations.
pub fn parse_migration_manifest(bytes: &[u8]) -> Result<MigrationManifest, MalformedInput> {
    let document = decode_json(bytes).map_err(|_| {
        MalformedInput::new(ReasonCode::ParseError, "Failed to parse migration_manifest JSON")
    })?;
    typed(document).map_err(|_| {
        MalformedInput::new(ReasonCode::SchemaInvalid, "migration_manifest schema invalid")
    })
}

/// Parses a migration config document from YAML bytes.
///
/// # Errors
///
/// Returns [`MalformedInput`] with `PARSE_ERROR` for invalid UTF-8/YAML and
/// `SCHEMA_INVALID` when the document is not a map or lacks a required key.
pub fn parse_migration_config(bytes: &[u8]) -> Result<Document, MalformedInput> {
    let document = decode_yaml(bytes).map_err(|_| {
        MalformedInput::new(ReasonCode::ParseError, "Failed to parse app_config YAML")
    })?;
    let Some(object) = document.as_object() else {
        return Err(MalformedInput::new(
            ReasonCode::SchemaInvalid,
            "app_config must be a YAML object",
        ));
    };
    if REQUIRED_CONFIG_KEYS.iter().any(|key| !object.contains_key(*key)) {
        return Err(MalformedInput::new(
            ReasonCode::SchemaInvalid,
            "app_config missing required fields",
        ));
    }
    Ok(document)
}

/// Parses a replication upload manifest from YAML bytes.
///
/// # Errors
///
/// Returns [`MalformedInput`] with `PARSE_ERROR` for invalid UTF-8/YAML and
/// `SCHEMA_INVALID` for schema violations.
pub fn parse_replication_manifest(bytes: &[u8]) -> Result<ReplicationManifest, MalformedInput> {
    let document = decode_yaml(bytes).map_err(|_| {
        MalformedInput::new(ReasonCode::ParseError, "Failed to parse replication_manifest YAML")
    })?;
    if !document.is_object() {
        return Err(MalformedInput::new(
            ReasonCode::SchemaInvalid,
            "replication_manifest must be a YAML object",
        ));
    }
    typed(document).map_err(|_| {
        MalformedInput::new(ReasonCode::SchemaInvalid, "replication_manifest schema invalid")
    })
}

/// Parses a replication reference manifest from YAML bytes.
///
/// A top-level string containing `:` is treated as re-encoded YAML and parsed
/// once more; if that second parse fails the original string is kept.
///
/// # Errors
///
/// Returns [`MalformedInput`] with `INVALID_MANIFEST` for every failure.
pub fn parse_reference_manifest(
    bytes: &[u8],
) -> Result<ReplicationReferenceManifest, MalformedInput> {
    let document = decode_reference_document(bytes).map_err(|_| {
        MalformedInput::new(ReasonCode::InvalidManifest, "Failed to parse replication manifest")
    })?;
    if !document.is_object() {
        return Err(MalformedInput::new(
            ReasonCode::InvalidManifest,
            "replication manifest must be an object",
        ));
    }
    typed(document).map_err(|_| {
        MalformedInput::new(ReasonCode::InvalidManifest, "replication manifest schema invalid")
    })
}

/// Decodes reference manifest bytes, unwrapping one level of re-encoded YAML.
fn decode_reference_document(
    bytes: &[u8],
) -> Result<Document, crate::core::document::DocumentError> {
    let document = decode_yaml(bytes)?;
    if let Value::String(text) = &document
        && text.contains(':')
        && let Ok(inner) = decode_yaml_str(text)
    {
        return Ok(inner);
    }
    Ok(document)
}

/// Converts a decoded document into a typed manifest.
fn typed<T: DeserializeOwned>(document: Document) -> Result<T, serde_json::Error> {
    serde_json::from_value(document)
}

// ============================================================================
// SECTION: Reference Metadata
// ============================================================================

/// Best-effort metadata extracted from reference manifest bytes for audit
/// enrichment. Extraction never fails; unreadable input yields empty metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceMetadata {
    /// Snapshot and WAL URIs, in that order, when present.
    pub artifact_refs: Vec<String>,
    /// Declared policy version, when present.
    pub policy_version: Option<String>,
}

impl ReferenceMetadata {
    /// Extracts artifact URIs and policy version from raw manifest bytes.
    #[must_use]
    pub fn extract(bytes: &[u8]) -> Self {
        let Ok(Value::Object(object)) = decode_yaml(bytes) else {
            return Self::default();
        };
        let artifact_refs = ["snapshot", "wal"]
            .iter()
            .filter_map(|name| object.get(*name))
            .filter_map(|artifact| artifact.get("uri"))
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        let policy_version =
            object.get("policy_version").and_then(Value::as_str).map(str::to_string);
        Self {
            artifact_refs,
            policy_version,
        }
    }
}
