// crates/security-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: Security Gate Runtime
// Description: Validators, policy evaluation, audit backends, and the gate.
// Purpose: Execute validation requests against the core interfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the validators and the decision lifecycle. All
//! transports must call into [`SecurityGate`] so every request follows the
//! same readiness, authentication, validation, and audit ordering.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod events;
pub mod gate;
pub mod migration;
pub mod policy;
pub mod replication;
pub mod replication_ref;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileAuditLog;
pub use audit::InMemoryAuditLog;
pub use audit::MAX_AUDIT_RECORD_BYTES;
pub use events::InMemoryDecisionSink;
pub use events::NoopDecisionSink;
pub use gate::FailureKind;
pub use gate::GateError;
pub use gate::GateRequest;
pub use gate::GateResponse;
pub use gate::SecurityGate;
pub use migration::validate_migration;
pub use policy::evaluate_migration_policies;
pub use replication::validate_replication;
pub use replication_ref::validate_replication_reference;
