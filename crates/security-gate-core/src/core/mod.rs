// crates/security-gate-core/src/core/mod.rs
// ============================================================================
// Module: Security Gate Core Types
// Description: Decision model, manifests, documents, hashing, and references.
// Purpose: Provide stable, serializable types shared by every gate surface.
// Dependencies: serde, serde_json, serde_yaml, sha2, thiserror, time
// ============================================================================

//! ## Overview
//! Core types define the manifests accepted by the gate, the decision
//! envelope returned to callers, and the audit record persisted per request.
//! These types are the canonical source of truth for the HTTP and CLI
//! surfaces.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod artifact_ref;
pub mod decision;
pub mod document;
pub mod hashing;
pub mod manifest;
pub mod reason;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use artifact_ref::LocationError;
pub use artifact_ref::ObjectLocation;
pub use artifact_ref::parse_object_uri;
pub use decision::Artifacts;
pub use decision::AuditRecord;
pub use decision::ComputedHashes;
pub use decision::Decision;
pub use decision::Scenario;
pub use decision::ValidationOutcome;
pub use decision::ValidationResult;
pub use decision::utc_timestamp;
pub use document::Document;
pub use document::DocumentError;
pub use hashing::hashes_match;
pub use hashing::sha256_hex;
pub use manifest::MalformedInput;
pub use manifest::MigrationManifest;
pub use manifest::ReferenceArtifact;
pub use manifest::ReferenceMetadata;
pub use manifest::ReplicationManifest;
pub use manifest::ReplicationReferenceManifest;
pub use manifest::parse_migration_config;
pub use manifest::parse_migration_manifest;
pub use manifest::parse_reference_manifest;
pub use manifest::parse_replication_manifest;
pub use reason::Reason;
pub use reason::ReasonCode;
pub use reason::reason_codes;
