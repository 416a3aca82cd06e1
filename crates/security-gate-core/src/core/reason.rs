// crates/security-gate-core/src/core/reason.rs
// ============================================================================
// Module: Security Gate Reason Codes
// Description: Closed vocabulary of decision reason codes.
// Purpose: Give audit logs and clients a stable key for every BLOCK cause.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Reason codes form a closed, stable vocabulary. Consumers (audit log,
//! clients, dashboards) key off [`ReasonCode`]; the accompanying message is
//! human text and carries no contract.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Reason Codes
// ============================================================================

/// Stable reason code attached to a decision.
///
/// # Invariants
/// - Variants and their wire names are stable; new codes are additive only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// Input bytes are not valid UTF-8 or not valid JSON/YAML.
    ParseError,
    /// Input is well-formed but violates the expected schema.
    SchemaInvalid,
    /// Reference manifest is malformed or carries unsupported values.
    InvalidManifest,
    /// Config digest does not match the manifest.
    ConfigHashMismatch,
    /// Snapshot digest does not match the manifest.
    SnapshotHashMismatch,
    /// WAL digest does not match the manifest.
    WalHashMismatch,
    /// A referenced artifact could not be fetched.
    ArtifactFetchFailed,
    /// Migration environment is not recognized.
    UnknownEnv,
    /// Replication sync mode is not supported.
    UnsupportedSyncMode,
    /// TLS is not enabled for a production migration.
    TlsDisabledProd,
    /// A production port is bound to the wildcard address.
    PublicPortExposed,
    /// `secrets_ref` is missing or blank.
    SecretsRefMissing,
    /// The config carries inline secret values.
    SecretsInline,
    /// Caller authentication failed.
    AuthFailed,
    /// The audit log is not writable.
    AuditUnavailable,
    /// Unanticipated internal fault.
    InternalError,
}

impl ReasonCode {
    /// Returns the stable wire label for the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ParseError => "PARSE_ERROR",
            Self::SchemaInvalid => "SCHEMA_INVALID",
            Self::InvalidManifest => "INVALID_MANIFEST",
            Self::ConfigHashMismatch => "CONFIG_HASH_MISMATCH",
            Self::SnapshotHashMismatch => "SNAPSHOT_HASH_MISMATCH",
            Self::WalHashMismatch => "WAL_HASH_MISMATCH",
            Self::ArtifactFetchFailed => "ARTIFACT_FETCH_FAILED",
            Self::UnknownEnv => "UNKNOWN_ENV",
            Self::UnsupportedSyncMode => "UNSUPPORTED_SYNC_MODE",
            Self::TlsDisabledProd => "TLS_DISABLED_PROD",
            Self::PublicPortExposed => "PUBLIC_PORT_EXPOSED",
            Self::SecretsRefMissing => "SECRETS_REF_MISSING",
            Self::SecretsInline => "SECRETS_INLINE",
            Self::AuthFailed => "AUTH_FAILED",
            Self::AuditUnavailable => "AUDIT_UNAVAILABLE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Reason
// ============================================================================

/// Coded explanation attached to a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    /// Stable reason code.
    pub code: ReasonCode,
    /// Human-readable message (non-normative).
    pub message: String,
}

impl Reason {
    /// Builds a reason from a code and message.
    #[must_use]
    pub fn new(code: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Collects the codes of a reason list, preserving order.
#[must_use]
pub fn reason_codes(reasons: &[Reason]) -> Vec<ReasonCode> {
    reasons.iter().map(|reason| reason.code).collect()
}
