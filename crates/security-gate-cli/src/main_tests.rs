// crates/security-gate-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and bounded file reads.
// Purpose: Ensure CLI inputs are parsed strictly and read within limits.
// Dependencies: security-gate-cli main helpers
// ============================================================================

//! ## Overview
//! Validates `read_bytes_with_limit`, filter parsing, and subcommand wiring.
//!
//! Security posture: CLI inputs are untrusted; size limits must fail closed.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use clap::Parser;
use tempfile::TempDir;

use super::ArtifactFetcher;
use super::Cli;
use super::Commands;
use super::Decision;
use super::DisabledFetcher;
use super::ReadLimitError;
use super::Scenario;
use super::ValidateCommand;
use super::file_label;
use super::parse_decision;
use super::parse_scenario;
use super::read_bytes_with_limit;

// ============================================================================
// SECTION: Bounded Reads
// ============================================================================

#[test]
fn read_bytes_with_limit_accepts_file_at_limit() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("input.bin");
    fs::write(&path, [1u8; 16]).unwrap();
    assert_eq!(read_bytes_with_limit(&path, 16).unwrap().len(), 16);
}

#[test]
fn read_bytes_with_limit_rejects_oversized_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("input.bin");
    fs::write(&path, [1u8; 17]).unwrap();
    let err = read_bytes_with_limit(&path, 16).unwrap_err();
    assert!(matches!(
        err,
        ReadLimitError::TooLarge {
            size: 17,
            limit: 16
        }
    ));
}

#[test]
fn read_bytes_with_limit_reports_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = read_bytes_with_limit(&dir.path().join("missing.bin"), 16).unwrap_err();
    assert!(matches!(err, ReadLimitError::Io(_)));
}

// ============================================================================
// SECTION: Argument Parsing
// ============================================================================

#[test]
fn filter_parsers_accept_wire_labels_only() {
    assert_eq!(parse_decision("BLOCK").unwrap(), Decision::Block);
    assert_eq!(parse_scenario("T1").unwrap(), Scenario::Migration);
    assert!(parse_decision("deny").is_err());
    assert!(parse_scenario("T3").is_err());
}

#[test]
fn validate_migration_parses_paths_and_audit_override() {
    let cli = Cli::try_parse_from([
        "security-gate",
        "validate",
        "migration",
        "--manifest",
        "manifest.json",
        "--app-config",
        "app.yaml",
        "--audit-log",
        "/tmp/audit.log",
    ])
    .unwrap();
    let Commands::Validate {
        command: ValidateCommand::Migration(args),
    } = cli.command
    else {
        panic!("expected validate migration");
    };
    assert_eq!(args.manifest, Path::new("manifest.json"));
    assert_eq!(args.app_config, Path::new("app.yaml"));
    assert_eq!(args.gate.audit_log.as_deref(), Some(Path::new("/tmp/audit.log")));
    assert!(args.gate.config.is_none());
}

#[test]
fn audit_rejects_unknown_decision_filter() {
    let result = Cli::try_parse_from(["security-gate", "audit", "--decision", "MAYBE"]);
    assert!(result.is_err());
}

#[test]
fn validate_migration_requires_app_config() {
    let result =
        Cli::try_parse_from(["security-gate", "validate", "migration", "--manifest", "m.json"]);
    assert!(result.is_err());
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

#[test]
fn file_label_uses_file_name() {
    assert_eq!(file_label(Path::new("/srv/releases/app.yaml")), "app.yaml");
}

#[test]
fn disabled_fetcher_always_fails() {
    let location = security_gate_core::parse_object_uri("s3://bucket/key").unwrap();
    assert!(DisabledFetcher.fetch(&location).is_err());
}
