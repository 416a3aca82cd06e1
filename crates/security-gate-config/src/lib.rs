// crates/security-gate-config/src/lib.rs
// ============================================================================
// Module: Security Gate Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for security-gate.toml semantics.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! `security-gate-config` defines the configuration model for the security
//! gate server and CLI. Validation is strict and fail-closed: a config that
//! would start a server without bearer tokens, or talk to object storage over
//! plain HTTP without an explicit opt-in, is rejected.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
