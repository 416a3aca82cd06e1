// crates/security-gate-core/src/runtime/gate.rs
// ============================================================================
// Module: Security Gate Decision Assembly
// Description: Request lifecycle from readiness check to durable decision.
// Purpose: Wrap validator outcomes into audited, logged decision envelopes.
// Dependencies: crate::{core, interfaces, runtime}, thiserror
// ============================================================================

//! ## Overview
//! [`SecurityGate`] is the single entry point used by every transport. Each
//! request runs, in order: audit readiness, authentication, validation. Any
//! failure becomes a single-reason BLOCK. The resulting envelope is appended
//! to the audit log before it is returned; if that append fails the response
//! is replaced with BLOCK/`AUDIT_UNAVAILABLE`. One summary event is emitted per
//! request.
//!
//! Security posture: fail closed. No decision is returned unless it was
//! recorded, except when the audit log itself is unavailable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use thiserror::Error;

use crate::core::Artifacts;
use crate::core::AuditRecord;
use crate::core::Decision;
use crate::core::MalformedInput;
use crate::core::Reason;
use crate::core::ReasonCode;
use crate::core::Scenario;
use crate::core::ValidationOutcome;
use crate::core::ValidationResult;
use crate::core::utc_timestamp;
use crate::interfaces::ArtifactFetcher;
use crate::interfaces::AuditError;
use crate::interfaces::AuditLog;
use crate::interfaces::AuditQuery;
use crate::interfaces::DecisionContext;
use crate::interfaces::DecisionEvent;
use crate::interfaces::DecisionEventParams;
use crate::interfaces::DecisionEventSink;
use crate::interfaces::LogLevel;
use crate::interfaces::LogType;
use crate::runtime::migration::validate_migration;
use crate::runtime::replication::validate_replication;
use crate::runtime::replication_ref::validate_replication_reference;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Request metadata recorded alongside the decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRequest {
    /// Request identifier.
    pub request_id: String,
    /// Scenario tag.
    pub scenario: Scenario,
    /// Endpoint or entry point.
    pub endpoint: String,
    /// Client identifier (user agent) when known.
    pub client: Option<String>,
    /// Artifact references named by the request.
    pub artifact_refs: Vec<String>,
    /// Policy version declared by the request.
    pub policy_version: Option<String>,
}

impl GateRequest {
    /// Creates request metadata with no client, artifacts, or policy version.
    #[must_use]
    pub fn new(
        request_id: impl Into<String>,
        scenario: Scenario,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            scenario,
            endpoint: endpoint.into(),
            client: None,
            artifact_refs: Vec::new(),
            policy_version: None,
        }
    }

    /// Sets the client identifier.
    #[must_use]
    pub fn with_client(mut self, client: Option<String>) -> Self {
        self.client = client;
        self
    }

    /// Sets the artifact references.
    #[must_use]
    pub fn with_artifact_refs(mut self, artifact_refs: Vec<String>) -> Self {
        self.artifact_refs = artifact_refs;
        self
    }

    /// Sets the declared policy version.
    #[must_use]
    pub fn with_policy_version(mut self, policy_version: Option<String>) -> Self {
        self.policy_version = policy_version;
        self
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Request failure surfaced as a single-reason BLOCK.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// Client-caused input failure.
    #[error("{message}")]
    MalformedInput {
        /// Reason code reported to the caller.
        code: ReasonCode,
        /// Human-readable message.
        message: String,
    },
    /// Caller authentication failed.
    #[error("Authentication failed")]
    Auth,
    /// The audit log is not writable.
    #[error("audit log unavailable: {0}")]
    AuditUnavailable(String),
    /// Unanticipated internal fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Returns the reason reported to the caller. Internal details are not exposed.
    #[must_use]
    pub fn reason(&self) -> Reason {
        match self {
            Self::MalformedInput {
                code,
                message,
            } => Reason::new(*code, message.clone()),
            Self::Auth => Reason::new(ReasonCode::AuthFailed, "Authentication failed"),
            Self::AuditUnavailable(_) => {
                Reason::new(ReasonCode::AuditUnavailable, "Audit log unavailable")
            }
            Self::Internal(_) => Reason::new(ReasonCode::InternalError, "Internal server error"),
        }
    }

    /// Returns the failure classification.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::MalformedInput {
                ..
            } => FailureKind::MalformedInput,
            Self::Auth => FailureKind::Auth,
            Self::AuditUnavailable(_) => FailureKind::AuditUnavailable,
            Self::Internal(_) => FailureKind::Internal,
        }
    }
}

impl From<MalformedInput> for GateError {
    fn from(error: MalformedInput) -> Self {
        Self::MalformedInput {
            code: error.code,
            message: error.message,
        }
    }
}

/// Classification of a failed request, used by transports to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Client-caused input failure.
    MalformedInput,
    /// Authentication failure.
    Auth,
    /// Audit log not writable.
    AuditUnavailable,
    /// Internal fault.
    Internal,
}

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Decision envelope plus the failure classification, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResponse {
    /// Decision envelope returned to the caller.
    pub result: ValidationResult,
    /// Failure classification when the request did not complete validation.
    pub failure: Option<FailureKind>,
}

impl GateResponse {
    /// Returns true when the decision is ALLOW.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.result.decision == Decision::Allow
    }
}

// ============================================================================
// SECTION: Security Gate
// ============================================================================

/// Decision gate shared by every transport.
#[derive(Clone)]
pub struct SecurityGate {
    /// Durable audit log.
    audit: Arc<dyn AuditLog>,
    /// Object-storage fetcher for reference mode.
    fetcher: Arc<dyn ArtifactFetcher>,
    /// Structured event sink.
    events: Arc<dyn DecisionEventSink>,
}

impl SecurityGate {
    /// Creates a gate over the provided backends.
    #[must_use]
    pub fn new(
        audit: Arc<dyn AuditLog>,
        fetcher: Arc<dyn ArtifactFetcher>,
        events: Arc<dyn DecisionEventSink>,
    ) -> Self {
        Self {
            audit,
            fetcher,
            events,
        }
    }

    /// Returns the artifact fetcher.
    #[must_use]
    pub fn fetcher(&self) -> &dyn ArtifactFetcher {
        self.fetcher.as_ref()
    }

    /// Returns the decision event sink.
    #[must_use]
    pub fn events(&self) -> &dyn DecisionEventSink {
        self.events.as_ref()
    }

    /// Verifies the audit log is writable.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the audit log cannot be written.
    pub fn check_ready(&self) -> Result<(), AuditError> {
        self.audit.ensure_ready()
    }

    /// Reads audit records matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the audit log cannot be read.
    pub fn read_audit(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError> {
        self.audit.read(query)
    }

    /// Runs the full request lifecycle: readiness, authentication, validation,
    /// audit append, and summary event.
    #[must_use]
    pub fn decide<A, V>(&self, request: &GateRequest, authorize: A, validate: V) -> GateResponse
    where
        A: FnOnce() -> Result<(), GateError>,
        V: FnOnce(&DecisionContext<'_>) -> Result<ValidationOutcome, GateError>,
    {
        let started = Instant::now();
        let ctx = DecisionContext {
            request_id: &request.request_id,
            scenario: request.scenario,
            endpoint: &request.endpoint,
            client: request.client.as_deref(),
            artifact_refs: &request.artifact_refs,
            events: self.events.as_ref(),
        };
        let verdict = self
            .audit
            .ensure_ready()
            .map_err(|err| GateError::AuditUnavailable(err.to_string()))
            .and_then(|()| authorize().inspect_err(|_| self.emit_auth_failure(request)))
            .and_then(|()| validate(&ctx));
        self.finish(request, verdict, started)
    }

    /// Records a request that failed before validation could run.
    #[must_use]
    pub fn reject(&self, request: &GateRequest, error: GateError) -> GateResponse {
        self.finish(request, Err(error), Instant::now())
    }

    /// Runs migration validation through the full request lifecycle.
    #[must_use]
    pub fn check_migration<A>(
        &self,
        request: &GateRequest,
        authorize: A,
        manifest: &[u8],
        config: &[u8],
    ) -> GateResponse
    where
        A: FnOnce() -> Result<(), GateError>,
    {
        self.decide(request, authorize, |ctx| {
            validate_migration(ctx, manifest, config).map_err(GateError::from)
        })
    }

    /// Runs upload-mode replication validation through the full request lifecycle.
    #[must_use]
    pub fn check_replication<A>(
        &self,
        request: &GateRequest,
        authorize: A,
        manifest: &[u8],
        snapshot: &[u8],
    ) -> GateResponse
    where
        A: FnOnce() -> Result<(), GateError>,
    {
        self.decide(request, authorize, |ctx| {
            validate_replication(ctx, manifest, snapshot).map_err(GateError::from)
        })
    }

    /// Runs reference-mode replication validation through the full request lifecycle.
    #[must_use]
    pub fn check_replication_reference<A>(
        &self,
        request: &GateRequest,
        authorize: A,
        manifest: &[u8],
    ) -> GateResponse
    where
        A: FnOnce() -> Result<(), GateError>,
    {
        self.decide(request, authorize, |ctx| {
            validate_replication_reference(ctx, self.fetcher(), manifest).map_err(GateError::from)
        })
    }

    /// Wraps the verdict, appends the audit record, and emits the summary.
    fn finish(
        &self,
        request: &GateRequest,
        verdict: Result<ValidationOutcome, GateError>,
        started: Instant,
    ) -> GateResponse {
        let (outcome, mut failure) = match verdict {
            Ok(outcome) => (outcome, None),
            Err(error) => {
                (ValidationOutcome::block(error.reason(), Artifacts::default()), Some(error.kind()))
            }
        };
        let mut result = ValidationResult::from_outcome(
            request.request_id.clone(),
            request.scenario,
            outcome,
            utc_timestamp(),
        );
        if failure != Some(FailureKind::AuditUnavailable)
            && let Err(err) = self.audit.append(&audit_record(request, &result))
        {
            let error = GateError::AuditUnavailable(err.to_string());
            result = ValidationResult::blocked(
                request.request_id.clone(),
                request.scenario,
                error.reason(),
                result.timestamp,
            );
            failure = Some(FailureKind::AuditUnavailable);
        }
        self.emit_summary(request, &result, started.elapsed());
        GateResponse {
            result,
            failure,
        }
    }

    /// Emits the per-request summary event.
    fn emit_summary(&self, request: &GateRequest, result: &ValidationResult, elapsed: Duration) {
        let level = match result.decision {
            Decision::Allow => LogLevel::Info,
            Decision::Block => LogLevel::Warn,
        };
        self.events.record(&DecisionEvent::new(DecisionEventParams {
            level,
            log_type: LogType::Audit,
            request_id: request.request_id.clone(),
            scenario: request.scenario,
            endpoint: request.endpoint.clone(),
            client: request.client.clone(),
            decision: result.decision,
            reason_codes: result.reason_codes(),
            artifact_refs: request.artifact_refs.clone(),
            duration_ms: Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)),
        }));
    }

    /// Emits an authentication failure event.
    fn emit_auth_failure(&self, request: &GateRequest) {
        self.events.record(&DecisionEvent::new(DecisionEventParams {
            level: LogLevel::Warn,
            log_type: LogType::Auth,
            request_id: request.request_id.clone(),
            scenario: request.scenario,
            endpoint: request.endpoint.clone(),
            client: request.client.clone(),
            decision: Decision::Block,
            reason_codes: vec![ReasonCode::AuthFailed],
            artifact_refs: request.artifact_refs.clone(),
            duration_ms: None,
        }));
    }
}

/// Derives the persisted audit record from a decision envelope.
fn audit_record(request: &GateRequest, result: &ValidationResult) -> AuditRecord {
    AuditRecord {
        request_id: result.request_id.clone(),
        scenario: result.scenario,
        decision: result.decision,
        reasons: result.reason_codes(),
        timestamp: result.timestamp.clone(),
        endpoint: Some(request.endpoint.clone()),
        artifact_refs: request.artifact_refs.clone(),
        policy_version: request.policy_version.clone(),
    }
}
