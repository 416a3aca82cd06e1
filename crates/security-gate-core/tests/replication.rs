// crates/security-gate-core/tests/replication.rs
// ============================================================================
// Module: Replication Validator Tests
// Description: Upload-mode scenario T2 validation.
// ============================================================================
//! ## Overview
//! Validates snapshot digest verification and sync-mode checks.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use security_gate_core::Decision;
use security_gate_core::InMemoryDecisionSink;
use security_gate_core::LogType;
use security_gate_core::ReasonCode;
use security_gate_core::Scenario;
use security_gate_core::sha256_hex;
use security_gate_core::validate_replication;

use crate::common::context;
use crate::common::replication_manifest;

const SNAPSHOT: &[u8] = b"PGDMP snapshot bytes";

#[test]
fn matching_snapshot_with_supported_mode_is_allowed() {
    let sink = InMemoryDecisionSink::new();
    let ctx = context(&sink, Scenario::Replication);
    for mode in ["sync", "async"] {
        let manifest = replication_manifest(&sha256_hex(SNAPSHOT), mode);
        let outcome = validate_replication(&ctx, &manifest, SNAPSHOT).unwrap();
        assert_eq!(outcome.decision, Decision::Allow);
        assert_eq!(outcome.artifacts.computed_hashes.snapshot, Some(sha256_hex(SNAPSHOT)));
        assert!(outcome.artifacts.computed_hashes.config.is_none());
    }
}

#[test]
fn snapshot_mismatch_is_blocked_before_sync_mode() {
    let sink = InMemoryDecisionSink::new();
    let ctx = context(&sink, Scenario::Replication);
    let manifest = replication_manifest(&"f".repeat(64), "batch");
    let outcome = validate_replication(&ctx, &manifest, SNAPSHOT).unwrap();
    assert_eq!(outcome.reason_codes(), vec![ReasonCode::SnapshotHashMismatch]);
    assert_eq!(outcome.artifacts.computed_hashes.snapshot, Some(sha256_hex(SNAPSHOT)));
    assert_eq!(sink.events()[0].log_type, LogType::Integrity);
}

#[test]
fn unsupported_sync_mode_is_blocked() {
    let sink = InMemoryDecisionSink::new();
    let ctx = context(&sink, Scenario::Replication);
    let manifest = replication_manifest(&sha256_hex(SNAPSHOT), "SYNC");
    let outcome = validate_replication(&ctx, &manifest, SNAPSHOT).unwrap();
    assert_eq!(outcome.reason_codes(), vec![ReasonCode::UnsupportedSyncMode]);
    assert_eq!(sink.events()[0].log_type, LogType::Policy);
}

#[test]
fn malformed_manifest_is_an_error() {
    let sink = InMemoryDecisionSink::new();
    let ctx = context(&sink, Scenario::Replication);
    let err = validate_replication(&ctx, b"source_db: [", SNAPSHOT).unwrap_err();
    assert_eq!(err.code, ReasonCode::ParseError);
    let err = validate_replication(&ctx, b"source_db: a\n", SNAPSHOT).unwrap_err();
    assert_eq!(err.code, ReasonCode::SchemaInvalid);
}
