// crates/security-gate-core/src/runtime/events.rs
// ============================================================================
// Module: Security Gate Event Sinks
// Description: In-process decision event sinks.
// Purpose: Provide no-op and recording sinks for embedding and tests.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! Sinks that do not touch process I/O. Transport crates provide the stderr
//! JSON-lines sink.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;

use crate::interfaces::DecisionEvent;
use crate::interfaces::DecisionEventSink;

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Event sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDecisionSink;

impl DecisionEventSink for NoopDecisionSink {
    fn record(&self, _event: &DecisionEvent) {}
}

/// Event sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct InMemoryDecisionSink {
    /// Recorded events in emission order.
    events: Mutex<Vec<DecisionEvent>>,
}

impl InMemoryDecisionSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<DecisionEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl DecisionEventSink for InMemoryDecisionSink {
    fn record(&self, event: &DecisionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
