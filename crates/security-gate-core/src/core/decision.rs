// crates/security-gate-core/src/core/decision.rs
// ============================================================================
// Module: Security Gate Decision Model
// Description: Decisions, scenarios, validation outcomes, and audit records.
// Purpose: Define the return contract of validators and the persisted record.
// Dependencies: crate::core::reason, serde
// ============================================================================

//! ## Overview
//! A validator produces exactly one [`ValidationOutcome`]. The decision
//! assembly layer wraps it into a [`ValidationResult`] (identifiers and
//! timestamp) and derives one [`AuditRecord`] that is appended to the audit
//! log. All three are request-scoped values and are never mutated after
//! construction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::reason::Reason;
use crate::core::reason::ReasonCode;
use crate::core::reason::reason_codes;

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Binary gate decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    /// The operation may proceed.
    Allow,
    /// The operation is blocked.
    Block,
}

impl Decision {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "ALLOW",
            Self::Block => "BLOCK",
        }
    }

    /// Parses a wire label (case-sensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ALLOW" => Some(Self::Allow),
            "BLOCK" => Some(Self::Block),
            _ => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Scenario
// ============================================================================

/// Operation class being gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    /// Application migration (T1).
    #[serde(rename = "T1")]
    Migration,
    /// Database replication, upload or reference mode (T2).
    #[serde(rename = "T2")]
    Replication,
}

impl Scenario {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Migration => "T1",
            Self::Replication => "T2",
        }
    }

    /// Parses a wire label (`T1` or `T2`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "T1" => Some(Self::Migration),
            "T2" => Some(Self::Replication),
            _ => None,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Artifacts
// ============================================================================

/// Digests computed while validating a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedHashes {
    /// SHA-256 of the submitted config document (migration).
    pub config: Option<String>,
    /// SHA-256 of the snapshot (replication).
    pub snapshot: Option<String>,
}

/// Artifact record attached to an outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifacts {
    /// Digests computed during validation.
    pub computed_hashes: ComputedHashes,
}

impl Artifacts {
    /// Artifacts carrying a computed config digest.
    #[must_use]
    pub fn with_config(digest: String) -> Self {
        Self {
            computed_hashes: ComputedHashes {
                config: Some(digest),
                snapshot: None,
            },
        }
    }

    /// Artifacts carrying a computed snapshot digest.
    #[must_use]
    pub fn with_snapshot(digest: String) -> Self {
        Self {
            computed_hashes: ComputedHashes {
                config: None,
                snapshot: Some(digest),
            },
        }
    }
}

// ============================================================================
// SECTION: Validation Outcome
// ============================================================================

/// Sole return contract of every validator.
///
/// # Invariants
/// - `decision == Allow` implies `reasons` is empty.
/// - `decision == Block` implies `reasons` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Gate decision.
    pub decision: Decision,
    /// Ordered reasons (empty for ALLOW).
    pub reasons: Vec<Reason>,
    /// Computed artifacts.
    pub artifacts: Artifacts,
}

impl ValidationOutcome {
    /// Builds an ALLOW outcome.
    #[must_use]
    pub const fn allow(artifacts: Artifacts) -> Self {
        Self {
            decision: Decision::Allow,
            reasons: Vec::new(),
            artifacts,
        }
    }

    /// Builds a BLOCK outcome with a single reason.
    #[must_use]
    pub fn block(reason: Reason, artifacts: Artifacts) -> Self {
        Self {
            decision: Decision::Block,
            reasons: vec![reason],
            artifacts,
        }
    }

    /// Builds a BLOCK outcome with several reasons.
    #[must_use]
    pub const fn block_all(reasons: Vec<Reason>, artifacts: Artifacts) -> Self {
        Self {
            decision: Decision::Block,
            reasons,
            artifacts,
        }
    }

    /// Returns the reason codes in order.
    #[must_use]
    pub fn reason_codes(&self) -> Vec<ReasonCode> {
        reason_codes(&self.reasons)
    }
}

// ============================================================================
// SECTION: Validation Result
// ============================================================================

/// Decision envelope returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Request identifier.
    pub request_id: String,
    /// Gate decision.
    pub decision: Decision,
    /// Scenario tag.
    pub scenario: Scenario,
    /// Ordered reasons.
    pub reasons: Vec<Reason>,
    /// Computed artifacts.
    pub artifacts: Artifacts,
    /// ISO-8601 UTC timestamp.
    pub timestamp: String,
}

impl ValidationResult {
    /// Wraps a validator outcome with identifiers and a timestamp.
    #[must_use]
    pub fn from_outcome(
        request_id: impl Into<String>,
        scenario: Scenario,
        outcome: ValidationOutcome,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            decision: outcome.decision,
            scenario,
            reasons: outcome.reasons,
            artifacts: outcome.artifacts,
            timestamp: timestamp.into(),
        }
    }

    /// Builds a single-reason BLOCK envelope with empty artifacts.
    #[must_use]
    pub fn blocked(
        request_id: impl Into<String>,
        scenario: Scenario,
        reason: Reason,
        timestamp: impl Into<String>,
    ) -> Self {
        Self::from_outcome(
            request_id,
            scenario,
            ValidationOutcome::block(reason, Artifacts::default()),
            timestamp,
        )
    }

    /// Returns the reason codes in order.
    #[must_use]
    pub fn reason_codes(&self) -> Vec<ReasonCode> {
        reason_codes(&self.reasons)
    }
}

// ============================================================================
// SECTION: Audit Record
// ============================================================================

/// Persisted audit log entry, one per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Request identifier.
    pub request_id: String,
    /// Scenario tag.
    pub scenario: Scenario,
    /// Gate decision.
    pub decision: Decision,
    /// Reason codes in decision order.
    pub reasons: Vec<ReasonCode>,
    /// ISO-8601 UTC timestamp.
    pub timestamp: String,
    /// Endpoint or entry point that produced the decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Artifact references named by the request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifact_refs: Vec<String>,
    /// Policy version declared by the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_version: Option<String>,
}

// ============================================================================
// SECTION: Time
// ============================================================================

/// Returns the current time as an RFC 3339 UTC timestamp.
#[must_use]
pub fn utc_timestamp() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}
