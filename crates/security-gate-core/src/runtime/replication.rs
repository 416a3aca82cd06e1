// crates/security-gate-core/src/runtime/replication.rs
// ============================================================================
// Module: Security Gate Replication Validator
// Description: Snapshot integrity validation for uploaded replications.
// Purpose: Produce the scenario T2 outcome for the upload mode.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Upload-mode replication hashes the submitted snapshot, compares it with the
//! manifest's `expected_snapshot_hash`, then checks the sync mode.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::Artifacts;
use crate::core::MalformedInput;
use crate::core::Reason;
use crate::core::ReasonCode;
use crate::core::ValidationOutcome;
use crate::core::hashes_match;
use crate::core::parse_replication_manifest;
use crate::core::sha256_hex;
use crate::interfaces::DecisionContext;
use crate::interfaces::LogType;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Sync modes accepted for replication.
pub const SUPPORTED_SYNC_MODES: [&str; 2] = ["sync", "async"];

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates an upload-mode replication request.
///
/// # Errors
///
/// Returns [`MalformedInput`] when the manifest cannot be parsed.
pub fn validate_replication(
    ctx: &DecisionContext<'_>,
    manifest_bytes: &[u8],
    snapshot_bytes: &[u8],
) -> Result<ValidationOutcome, MalformedInput> {
    let manifest = parse_replication_manifest(manifest_bytes)?;

    let computed = sha256_hex(snapshot_bytes);
    let artifacts = Artifacts::with_snapshot(computed.clone());

    if !hashes_match(&manifest.expected_snapshot_hash, &computed) {
        let reason = Reason::new(
            ReasonCode::SnapshotHashMismatch,
            "Snapshot integrity verification failed",
        );
        ctx.emit_block(LogType::Integrity, std::slice::from_ref(&reason));
        return Ok(ValidationOutcome::block(reason, artifacts));
    }

    if !SUPPORTED_SYNC_MODES.contains(&manifest.sync_mode.as_str()) {
        let reason =
            Reason::new(ReasonCode::UnsupportedSyncMode, "sync_mode must be sync or async");
        ctx.emit_block(LogType::Policy, std::slice::from_ref(&reason));
        return Ok(ValidationOutcome::block(reason, artifacts));
    }

    Ok(ValidationOutcome::allow(artifacts))
}
