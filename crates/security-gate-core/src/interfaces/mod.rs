// crates/security-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Security Gate Interfaces
// Description: Backend-agnostic interfaces for artifact fetch, audit, events.
// Purpose: Define the contract surfaces used by the validators and the gate.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the gate integrates with object storage, durable
//! audit storage, and structured logging without embedding backend details.
//! Implementations must fail closed: a fetch or audit error is never treated
//! as success.
//!
//! Request context travels explicitly through [`DecisionContext`]; nothing in
//! this crate reads ambient per-request state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

use crate::core::AuditRecord;
use crate::core::Decision;
use crate::core::ObjectLocation;
use crate::core::Reason;
use crate::core::ReasonCode;
use crate::core::Scenario;
use crate::core::reason_codes;
use crate::core::utc_timestamp;

// ============================================================================
// SECTION: Artifact Fetcher
// ============================================================================

/// Artifact fetch failure. All storage faults collapse into this error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("artifact fetch failed: {0}")]
pub struct FetchError(pub String);

/// Fetches artifact bytes from object storage.
pub trait ArtifactFetcher: Send + Sync {
    /// Fetches the full object at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] for missing objects, network or auth faults,
    /// timeouts, and oversized objects.
    fn fetch(&self, location: &ObjectLocation) -> Result<Vec<u8>, FetchError>;
}

// ============================================================================
// SECTION: Audit Log
// ============================================================================

/// Audit log errors.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Storage I/O failure.
    #[error("audit log io error: {0}")]
    Io(String),
    /// Record serialization failure.
    #[error("audit record serialization failed: {0}")]
    Serialize(String),
    /// Serialized record exceeds the single-write bound.
    #[error("audit record exceeds {max_bytes} bytes (actual {actual_bytes})")]
    TooLarge {
        /// Maximum allowed record size.
        max_bytes: usize,
        /// Actual serialized record size.
        actual_bytes: usize,
    },
}

/// Filters applied when reading the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditQuery {
    /// Maximum number of records returned.
    pub limit: usize,
    /// Only records with this decision.
    pub decision: Option<Decision>,
    /// Only records with this scenario.
    pub scenario: Option<Scenario>,
}

impl AuditQuery {
    /// Default record limit for audit reads.
    pub const DEFAULT_LIMIT: usize = 100;

    /// Returns true when the record passes the decision and scenario filters.
    #[must_use]
    pub fn matches(&self, record: &AuditRecord) -> bool {
        self.decision.is_none_or(|decision| record.decision == decision)
            && self.scenario.is_none_or(|scenario| record.scenario == scenario)
    }
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            decision: None,
            scenario: None,
        }
    }
}

/// Append-only durable store of decisions.
pub trait AuditLog: Send + Sync {
    /// Verifies the log is writable, creating parent storage when needed.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the log cannot be written.
    fn ensure_ready(&self) -> Result<(), AuditError>;

    /// Appends one record as a complete line.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the record cannot be persisted.
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;

    /// Reads records in storage order, applying the query filters.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when existing storage cannot be read.
    fn read(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError>;
}

// ============================================================================
// SECTION: Decision Events
// ============================================================================

/// Service label stamped on every decision event.
pub const SERVICE_NAME: &str = "security-gate";

/// Severity of a decision event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Informational (ALLOW summaries).
    Info,
    /// Warning (BLOCK points and BLOCK summaries).
    Warn,
}

/// Category of a decision event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    /// Digest or fetch failure.
    Integrity,
    /// Policy or manifest-content failure.
    Policy,
    /// Request summary.
    Audit,
    /// Authentication failure.
    Auth,
}

/// Structured decision event emitted as one JSON line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionEvent {
    /// RFC 3339 UTC timestamp.
    pub timestamp: String,
    /// Event severity.
    pub level: LogLevel,
    /// Service label.
    pub service: &'static str,
    /// Event category.
    pub log_type: LogType,
    /// Request identifier.
    pub request_id: String,
    /// Scenario tag.
    pub scenario: Scenario,
    /// Endpoint or entry point.
    pub endpoint: String,
    /// Client identifier (user agent) when known.
    pub client: Option<String>,
    /// Decision carried by the event.
    pub decision: Decision,
    /// Reason codes in decision order.
    pub reason_codes: Vec<ReasonCode>,
    /// Artifact references relevant to the event.
    pub artifact_refs: Vec<String>,
    /// Request duration for summary events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Inputs required to construct a decision event.
pub struct DecisionEventParams {
    /// Event severity.
    pub level: LogLevel,
    /// Event category.
    pub log_type: LogType,
    /// Request identifier.
    pub request_id: String,
    /// Scenario tag.
    pub scenario: Scenario,
    /// Endpoint or entry point.
    pub endpoint: String,
    /// Client identifier when known.
    pub client: Option<String>,
    /// Decision carried by the event.
    pub decision: Decision,
    /// Reason codes in decision order.
    pub reason_codes: Vec<ReasonCode>,
    /// Artifact references relevant to the event.
    pub artifact_refs: Vec<String>,
    /// Request duration for summary events.
    pub duration_ms: Option<u64>,
}

impl DecisionEvent {
    /// Creates a new decision event stamped with the current time.
    #[must_use]
    pub fn new(params: DecisionEventParams) -> Self {
        Self {
            timestamp: utc_timestamp(),
            level: params.level,
            service: SERVICE_NAME,
            log_type: params.log_type,
            request_id: params.request_id,
            scenario: params.scenario,
            endpoint: params.endpoint,
            client: params.client,
            decision: params.decision,
            reason_codes: params.reason_codes,
            artifact_refs: params.artifact_refs,
            duration_ms: params.duration_ms,
        }
    }
}

/// Sink for structured decision events. Recording never fails the request.
pub trait DecisionEventSink: Send + Sync {
    /// Records a decision event.
    fn record(&self, event: &DecisionEvent);
}

// ============================================================================
// SECTION: Decision Context
// ============================================================================

/// Request-scoped context handed to validators for event emission.
#[derive(Clone, Copy)]
pub struct DecisionContext<'a> {
    /// Request identifier.
    pub request_id: &'a str,
    /// Scenario tag.
    pub scenario: Scenario,
    /// Endpoint or entry point.
    pub endpoint: &'a str,
    /// Client identifier when known.
    pub client: Option<&'a str>,
    /// Artifact references named by the request.
    pub artifact_refs: &'a [String],
    /// Event sink.
    pub events: &'a dyn DecisionEventSink,
}

impl DecisionContext<'_> {
    /// Emits a WARN BLOCK event carrying the request's artifact references.
    pub fn emit_block(&self, log_type: LogType, reasons: &[Reason]) {
        self.emit_block_with_refs(log_type, reasons, self.artifact_refs.to_vec());
    }

    /// Emits a WARN BLOCK event carrying explicit artifact references.
    pub fn emit_block_with_refs(
        &self,
        log_type: LogType,
        reasons: &[Reason],
        artifact_refs: Vec<String>,
    ) {
        self.events.record(&DecisionEvent::new(DecisionEventParams {
            level: LogLevel::Warn,
            log_type,
            request_id: self.request_id.to_string(),
            scenario: self.scenario,
            endpoint: self.endpoint.to_string(),
            client: self.client.map(str::to_string),
            decision: Decision::Block,
            reason_codes: reason_codes(reasons),
            artifact_refs,
            duration_ms: None,
        }));
    }
}
