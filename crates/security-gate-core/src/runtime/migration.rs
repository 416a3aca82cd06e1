// crates/security-gate-core/src/runtime/migration.rs
// ============================================================================
// Module: Security Gate Migration Validator
// Description: Integrity and policy validation for application migrations.
// Purpose: Produce the scenario T1 validation outcome.
// Dependencies: crate::{core, interfaces, runtime::policy}
// ============================================================================

//! ## Overview
//! Migration validation parses the JSON manifest and the YAML config, checks
//! the config digest against `config_sha256`, checks the environment tag, and
//! then applies the configuration policies. The first failing stage decides;
//! policy violations are reported together.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::Artifacts;
use crate::core::MalformedInput;
use crate::core::Reason;
use crate::core::ReasonCode;
use crate::core::ValidationOutcome;
use crate::core::hashes_match;
use crate::core::parse_migration_config;
use crate::core::parse_migration_manifest;
use crate::core::sha256_hex;
use crate::interfaces::DecisionContext;
use crate::interfaces::LogType;
use crate::runtime::policy::evaluate_migration_policies;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment tags accepted by the gate.
pub const KNOWN_ENVIRONMENTS: [&str; 2] = ["prod", "staging"];

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a migration request.
///
/// # Errors
///
/// Returns [`MalformedInput`] when the manifest or config cannot be parsed.
pub fn validate_migration(
    ctx: &DecisionContext<'_>,
    manifest_bytes: &[u8],
    config_bytes: &[u8],
) -> Result<ValidationOutcome, MalformedInput> {
    let manifest = parse_migration_manifest(manifest_bytes)?;
    let config = parse_migration_config(config_bytes)?;

    let computed = sha256_hex(config_bytes);
    let artifacts = Artifacts::with_config(computed.clone());

    if !hashes_match(&manifest.config_sha256, &computed) {
        let reason = Reason::new(
            ReasonCode::ConfigHashMismatch,
            "Computed config hash does not match manifest",
        );
        ctx.emit_block(LogType::Integrity, std::slice::from_ref(&reason));
        return Ok(ValidationOutcome::block(reason, artifacts));
    }

    if !KNOWN_ENVIRONMENTS.contains(&manifest.env.as_str()) {
        let reason = Reason::new(ReasonCode::UnknownEnv, "Environment must be prod or staging");
        ctx.emit_block(LogType::Policy, std::slice::from_ref(&reason));
        return Ok(ValidationOutcome::block(reason, artifacts));
    }

    let violations = evaluate_migration_policies(&manifest.env, &config);
    if !violations.is_empty() {
        ctx.emit_block(LogType::Policy, &violations);
        return Ok(ValidationOutcome::block_all(violations, artifacts));
    }

    Ok(ValidationOutcome::allow(artifacts))
}
