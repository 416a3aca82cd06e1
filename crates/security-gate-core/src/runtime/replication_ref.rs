// crates/security-gate-core/src/runtime/replication_ref.rs
// ============================================================================
// Module: Security Gate Replication Reference Validator
// Description: Integrity validation for replications referencing stored artifacts.
// Purpose: Produce the scenario T2 outcome for the reference mode.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Reference-mode replication validates manifest content first (environment,
//! sync mode, snapshot URI) and only then fetches. The snapshot is fetched and
//! verified before the optional WAL is considered, so a WAL failure can only
//! be reported after the snapshot passed.
//!
//! Security posture: no fetch is attempted for a malformed URI, and every
//! fetch failure is terminal (no retry).

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::Artifacts;
use crate::core::MalformedInput;
use crate::core::Reason;
use crate::core::ReasonCode;
use crate::core::ReferenceArtifact;
use crate::core::ValidationOutcome;
use crate::core::hashes_match;
use crate::core::parse_object_uri;
use crate::core::parse_reference_manifest;
use crate::core::sha256_hex;
use crate::interfaces::ArtifactFetcher;
use crate::interfaces::DecisionContext;
use crate::interfaces::LogType;
use crate::runtime::migration::KNOWN_ENVIRONMENTS;
use crate::runtime::replication::SUPPORTED_SYNC_MODES;

// ============================================================================
// SECTION: Artifact Kinds
// ============================================================================

/// Referenced artifact role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArtifactKind {
    /// Database snapshot.
    Snapshot,
    /// Write-ahead log segment.
    Wal,
}

impl ArtifactKind {
    /// Reason code reported when the digest does not match.
    const fn mismatch_code(self) -> ReasonCode {
        match self {
            Self::Snapshot => ReasonCode::SnapshotHashMismatch,
            Self::Wal => ReasonCode::WalHashMismatch,
        }
    }

    /// Message reported when the digest does not match.
    const fn mismatch_message(self) -> &'static str {
        match self {
            Self::Snapshot => "Snapshot integrity verification failed",
            Self::Wal => "WAL integrity verification failed",
        }
    }

    /// Message reported when the artifact cannot be fetched.
    const fn fetch_message(self) -> &'static str {
        match self {
            Self::Snapshot => "Failed to fetch snapshot",
            Self::Wal => "Failed to fetch WAL",
        }
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a reference-mode replication request.
///
/// # Errors
///
/// Returns [`MalformedInput`] (`INVALID_MANIFEST`) when the manifest cannot be
/// parsed.
pub fn validate_replication_reference(
    ctx: &DecisionContext<'_>,
    fetcher: &dyn ArtifactFetcher,
    manifest_bytes: &[u8],
) -> Result<ValidationOutcome, MalformedInput> {
    let manifest = parse_reference_manifest(manifest_bytes)?;
    let mut artifacts = Artifacts::default();
    let snapshot_refs = vec![manifest.snapshot.uri.clone()];

    if !KNOWN_ENVIRONMENTS.contains(&manifest.env.as_str()) {
        let reason = Reason::new(ReasonCode::InvalidManifest, "env must be prod or staging");
        return Ok(blocked(ctx, LogType::Policy, reason, snapshot_refs, artifacts));
    }
    if !SUPPORTED_SYNC_MODES.contains(&manifest.sync_mode.as_str()) {
        let reason = Reason::new(ReasonCode::InvalidManifest, "sync_mode must be sync or async");
        return Ok(blocked(ctx, LogType::Policy, reason, snapshot_refs, artifacts));
    }

    match verify_artifact(fetcher, &manifest.snapshot, ArtifactKind::Snapshot) {
        Ok(digest) => artifacts.computed_hashes.snapshot = Some(digest),
        Err(failure) => {
            if let Some(digest) = failure.digest {
                artifacts.computed_hashes.snapshot = Some(digest);
            }
            return Ok(blocked(ctx, failure.log_type, failure.reason, snapshot_refs, artifacts));
        }
    }

    if let Some(wal) = &manifest.wal
        && let Err(failure) = verify_artifact(fetcher, wal, ArtifactKind::Wal)
    {
        let wal_refs = vec![wal.uri.clone()];
        return Ok(blocked(ctx, failure.log_type, failure.reason, wal_refs, artifacts));
    }

    Ok(ValidationOutcome::allow(artifacts))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Failed artifact verification.
struct ArtifactFailure {
    /// Event category for the failure.
    log_type: LogType,
    /// Reason reported to the caller.
    reason: Reason,
    /// Digest computed before the failure, when the fetch succeeded.
    digest: Option<String>,
}

/// Parses, fetches, and verifies one referenced artifact, returning its digest.
fn verify_artifact(
    fetcher: &dyn ArtifactFetcher,
    artifact: &ReferenceArtifact,
    kind: ArtifactKind,
) -> Result<String, ArtifactFailure> {
    let location = parse_object_uri(&artifact.uri).map_err(|err| ArtifactFailure {
        log_type: LogType::Policy,
        reason: Reason::new(ReasonCode::InvalidManifest, err.to_string()),
        digest: None,
    })?;
    let bytes = fetcher.fetch(&location).map_err(|_| ArtifactFailure {
        log_type: LogType::Integrity,
        reason: Reason::new(ReasonCode::ArtifactFetchFailed, kind.fetch_message()),
        digest: None,
    })?;
    let digest = sha256_hex(&bytes);
    if !hashes_match(&artifact.sha256, &digest) {
        return Err(ArtifactFailure {
            log_type: LogType::Integrity,
            reason: Reason::new(kind.mismatch_code(), kind.mismatch_message()),
            digest: Some(digest),
        });
    }
    Ok(digest)
}

/// Emits the BLOCK event and builds the single-reason outcome.
fn blocked(
    ctx: &DecisionContext<'_>,
    log_type: LogType,
    reason: Reason,
    artifact_refs: Vec<String>,
    artifacts: Artifacts,
) -> ValidationOutcome {
    ctx.emit_block_with_refs(log_type, std::slice::from_ref(&reason), artifact_refs);
    ValidationOutcome::block(reason, artifacts)
}
