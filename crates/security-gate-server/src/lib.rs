// crates/security-gate-server/src/lib.rs
// ============================================================================
// Module: Security Gate Server Library
// Description: HTTP transport, bearer auth, object-store fetch, stderr events.
// Purpose: Wire the core gate to production backends and an axum router.
// Dependencies: security-gate-core, security-gate-config, axum, aws-sdk-s3
// ============================================================================

//! ## Overview
//! `security-gate-server` binds the backend-agnostic core gate to its
//! production backends: a JSON-lines file audit log, an S3-compatible artifact
//! fetcher, and a stderr decision-event sink. It exposes the gate over HTTP
//! with bearer authentication.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod auth;
pub mod events;
pub mod object_store;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use auth::AuthError;
pub use auth::BearerAuth;
pub use events::StderrDecisionSink;
pub use object_store::ObjectStoreError;
pub use object_store::ObjectStoreFetcher;
pub use server::AUDIT_LOGS_PATH;
pub use server::AppState;
pub use server::HEALTH_PATH;
pub use server::MIGRATION_PATH;
pub use server::READY_PATH;
pub use server::REPLICATION_PATH;
pub use server::REPLICATION_REF_PATH;
pub use server::SecurityGateServer;
pub use server::ServerError;
pub use server::router;
