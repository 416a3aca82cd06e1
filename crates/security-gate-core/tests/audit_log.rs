// crates/security-gate-core/tests/audit_log.rs
// ============================================================================
// Module: Audit Log Tests
// Description: File-backed JSON-lines audit log behavior.
// ============================================================================
//! ## Overview
//! Validates append/read filtering, limited reads over large logs, tolerance
//! of damaged lines, readiness checks, the record size bound, and line
//! integrity under concurrent appenders.

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

use std::fs;
use std::io::Write;
use std::sync::Arc;
use std::thread;

use security_gate_core::AuditError;
use security_gate_core::AuditLog;
use security_gate_core::AuditQuery;
use security_gate_core::AuditRecord;
use security_gate_core::Decision;
use security_gate_core::FileAuditLog;
use security_gate_core::InMemoryAuditLog;
use security_gate_core::ReasonCode;
use security_gate_core::Scenario;
use tempfile::TempDir;

/// Builds an audit record for tests.
fn record(id: &str, scenario: Scenario, decision: Decision) -> AuditRecord {
    let reasons = match decision {
        Decision::Allow => Vec::new(),
        Decision::Block => vec![ReasonCode::ConfigHashMismatch],
    };
    AuditRecord {
        request_id: id.to_string(),
        scenario,
        decision,
        reasons,
        timestamp: "2026-01-01T00:00:00Z".to_string(),
        endpoint: Some("/api/v1/validate/migration".to_string()),
        artifact_refs: vec!["manifest.json".to_string()],
        policy_version: None,
    }
}

/// Query with the given filters.
fn query(limit: usize, decision: Option<Decision>, scenario: Option<Scenario>) -> AuditQuery {
    AuditQuery {
        limit,
        decision,
        scenario,
    }
}

// ============================================================================
// SECTION: Append and Read
// ============================================================================

#[test]
fn records_are_read_back_in_file_order_with_filters() {
    let dir = TempDir::new().unwrap();
    let log = FileAuditLog::new(dir.path().join("audit.log"));
    log.append(&record("a", Scenario::Migration, Decision::Allow)).unwrap();
    log.append(&record("b", Scenario::Migration, Decision::Block)).unwrap();
    log.append(&record("c", Scenario::Replication, Decision::Block)).unwrap();
    log.append(&record("d", Scenario::Replication, Decision::Allow)).unwrap();

    let all = log.read(&AuditQuery::default()).unwrap();
    let ids: Vec<_> = all.iter().map(|record| record.request_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c", "d"]);
    assert_eq!(all[0], record("a", Scenario::Migration, Decision::Allow));

    let blocks = log.read(&query(10, Some(Decision::Block), None)).unwrap();
    assert_eq!(blocks.len(), 2);
    assert!(blocks.iter().all(|record| record.decision == Decision::Block));

    let t2_blocks =
        log.read(&query(10, Some(Decision::Block), Some(Scenario::Replication))).unwrap();
    assert_eq!(t2_blocks.len(), 1);
    assert_eq!(t2_blocks[0].request_id, "c");

    let limited = log.read(&query(2, None, None)).unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[1].request_id, "b");

    assert!(log.read(&query(0, None, None)).unwrap().is_empty());
}

#[test]
fn limited_read_returns_leading_matches_from_large_log() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.log");
    let log = FileAuditLog::new(&path);
    let mut contents = Vec::new();
    for index in 0 .. 2_000 {
        let decision = if index % 3 == 0 { Decision::Block } else { Decision::Allow };
        let entry = record(&format!("r{index}"), Scenario::Migration, decision);
        serde_json::to_writer(&mut contents, &entry).unwrap();
        contents.push(b'\n');
    }
    contents.extend_from_slice(b"{\"truncated\": ");
    fs::write(&path, contents).unwrap();

    let first = log.read(&query(1, None, None)).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].request_id, "r0");

    let blocks = log.read(&query(3, Some(Decision::Block), None)).unwrap();
    let ids: Vec<_> = blocks.iter().map(|record| record.request_id.as_str()).collect();
    assert_eq!(ids, vec!["r0", "r3", "r6"]);

    let allows = log.read(&query(usize::MAX, Some(Decision::Allow), None)).unwrap();
    assert_eq!(allows.len(), 1_333);
}

#[test]
fn read_fails_when_path_is_a_directory() {
    let dir = TempDir::new().unwrap();
    let log = FileAuditLog::new(dir.path());
    assert!(matches!(log.read(&AuditQuery::default()), Err(AuditError::Io(_))));
}

#[test]
fn serialized_line_uses_wire_labels() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.log");
    let log = FileAuditLog::new(&path);
    log.append(&record("a", Scenario::Replication, Decision::Block)).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.ends_with('\n'));
    let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
    assert_eq!(value["scenario"], "T2");
    assert_eq!(value["decision"], "BLOCK");
    assert_eq!(value["reasons"], serde_json::json!(["CONFIG_HASH_MISMATCH"]));
    assert!(value.get("policy_version").is_none());
}

#[test]
fn missing_file_reads_as_empty() {
    let dir = TempDir::new().unwrap();
    let log = FileAuditLog::new(dir.path().join("absent").join("audit.log"));
    assert!(log.read(&AuditQuery::default()).unwrap().is_empty());
}

#[test]
fn blank_and_damaged_lines_are_skipped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.log");
    let log = FileAuditLog::new(&path);
    log.append(&record("a", Scenario::Migration, Decision::Allow)).unwrap();
    {
        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"\n   \n{not json\n{\"request_id\":\"x\"}\n").unwrap();
    }
    log.append(&record("b", Scenario::Migration, Decision::Block)).unwrap();
    let ids: Vec<_> = log
        .read(&AuditQuery::default())
        .unwrap()
        .into_iter()
        .map(|record| record.request_id)
        .collect();
    assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
}

// ============================================================================
// SECTION: Readiness and Bounds
// ============================================================================

#[test]
fn ensure_ready_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("audit.log");
    let log = FileAuditLog::new(&path);
    log.ensure_ready().unwrap();
    assert!(path.exists());
}

#[test]
fn ensure_ready_fails_when_path_is_a_directory() {
    let dir = TempDir::new().unwrap();
    let log = FileAuditLog::new(dir.path());
    assert!(matches!(log.ensure_ready(), Err(AuditError::Io(_))));
    assert!(log.append(&record("a", Scenario::Migration, Decision::Allow)).is_err());
}

#[test]
fn oversized_record_is_rejected() {
    let dir = TempDir::new().unwrap();
    let log = FileAuditLog::new(dir.path().join("audit.log"));
    let mut big = record("a", Scenario::Migration, Decision::Allow);
    big.artifact_refs = vec!["x".repeat(70 * 1024)];
    assert!(matches!(log.append(&big), Err(AuditError::TooLarge { .. })));
    assert!(log.read(&AuditQuery::default()).unwrap().is_empty());
}

// ============================================================================
// SECTION: Concurrency
// ============================================================================

#[test]
fn concurrent_appends_never_interleave_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.log");
    let log = Arc::new(FileAuditLog::new(&path));
    let handles: Vec<_> = (0 .. 8)
        .map(|worker| {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for index in 0 .. 50 {
                    let mut entry =
                        record(&format!("w{worker}-{index}"), Scenario::Migration, Decision::Allow);
                    entry.artifact_refs = vec!["y".repeat(512)];
                    log.append(&entry).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 400);
    for line in lines {
        serde_json::from_str::<AuditRecord>(line).unwrap();
    }
    assert_eq!(log.read(&query(1000, None, None)).unwrap().len(), 400);
}

// ============================================================================
// SECTION: In-Memory Backend
// ============================================================================

#[test]
fn in_memory_log_applies_same_filters() {
    let log = InMemoryAuditLog::new();
    log.ensure_ready().unwrap();
    log.append(&record("a", Scenario::Migration, Decision::Allow)).unwrap();
    log.append(&record("b", Scenario::Replication, Decision::Block)).unwrap();
    let blocks = log.read(&query(5, Some(Decision::Block), None)).unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(log.records().len(), 2);
}
