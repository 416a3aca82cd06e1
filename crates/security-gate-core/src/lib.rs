// crates/security-gate-core/src/lib.rs
// ============================================================================
// Module: Security Gate Core Library
// Description: Public API surface for the Security Gate core.
// Purpose: Expose core types, interfaces, validators, and the decision gate.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Security Gate core mediates application migrations and database
//! replications. It parses untrusted manifests, verifies SHA-256 integrity,
//! evaluates a fixed set of configuration policies, and produces a binary
//! ALLOW/BLOCK decision that is durably recorded before it is returned.
//!
//! Transports (HTTP, CLI) and storage backends integrate through the
//! interfaces module; every surface calls into the same [`SecurityGate`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ArtifactFetcher;
pub use interfaces::AuditError;
pub use interfaces::AuditLog;
pub use interfaces::AuditQuery;
pub use interfaces::DecisionContext;
pub use interfaces::DecisionEvent;
pub use interfaces::DecisionEventParams;
pub use interfaces::DecisionEventSink;
pub use interfaces::FetchError;
pub use interfaces::LogLevel;
pub use interfaces::LogType;
pub use runtime::FailureKind;
pub use runtime::FileAuditLog;
pub use runtime::GateError;
pub use runtime::GateRequest;
pub use runtime::GateResponse;
pub use runtime::InMemoryAuditLog;
pub use runtime::InMemoryDecisionSink;
pub use runtime::NoopDecisionSink;
pub use runtime::SecurityGate;
pub use runtime::evaluate_migration_policies;
pub use runtime::validate_migration;
pub use runtime::validate_replication;
pub use runtime::validate_replication_reference;
