// crates/security-gate-server/src/events.rs
// ============================================================================
// Module: Security Gate Stderr Events
// Description: JSON-lines decision event sink for process stderr.
// Purpose: Emit structured decision events without affecting outcomes.
// Dependencies: security-gate-core, serde_json
// ============================================================================

//! ## Overview
//! Decision events are written as one JSON object per line to stderr.
//! Serialization or write failures are dropped; logging never changes a
//! decision.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;

use security_gate_core::DecisionEvent;
use security_gate_core::DecisionEventSink;

// ============================================================================
// SECTION: Sink
// ============================================================================

/// Decision event sink that logs JSON lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrDecisionSink;

impl DecisionEventSink for StderrDecisionSink {
    fn record(&self, event: &DecisionEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}
