// crates/security-gate-core/src/runtime/policy.rs
// ============================================================================
// Module: Security Gate Policy Evaluator
// Description: Fixed configuration policies for migration requests.
// Purpose: Convert a decoded config document into ordered violation reasons.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Policy evaluation is a pure function of the environment tag and the config
//! document. All violations are collected, in a fixed order:
//! TLS (prod), public ports (prod), `secrets_ref`, inline secrets. The
//! evaluator never inspects the manifest and never fails.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::Document;
use crate::core::Reason;
use crate::core::ReasonCode;
use crate::core::document::any_entry;
use crate::core::document::is_truthy;
use crate::core::document::non_blank_str;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment tag that activates production-only policies.
pub const PRODUCTION_ENV: &str = "prod";

/// Wildcard bind address rejected in production.
const WILDCARD_ADDRESS: &str = "0.0.0.0";

/// Port entry keys inspected for a bind address, in priority order.
const BIND_KEYS: [&str; 3] = ["bind", "host", "address"];

/// Keys (lowercase) whose non-blank string values count as inline secrets.
const SECRET_KEYS: [&str; 8] = [
    "secret",
    "secrets",
    "password",
    "token",
    "api_key",
    "apikey",
    "access_key",
    "private_key",
];

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates the migration policies and returns every violation in order.
#[must_use]
pub fn evaluate_migration_policies(env: &str, config: &Document) -> Vec<Reason> {
    let mut reasons = Vec::new();
    if env == PRODUCTION_ENV {
        if !tls_enabled(config) {
            reasons.push(Reason::new(
                ReasonCode::TlsDisabledProd,
                "TLS must be enabled for production migrations",
            ));
        }
        if public_ports_exposed(config.get("ports")) {
            reasons.push(Reason::new(
                ReasonCode::PublicPortExposed,
                "Public ports (0.0.0.0) are not allowed in prod",
            ));
        }
    }
    if config.get("secrets_ref").and_then(non_blank_str).is_none() {
        reasons.push(Reason::new(
            ReasonCode::SecretsRefMissing,
            "secrets_ref must be a non-empty string",
        ));
    }
    if contains_inline_secrets(config) {
        reasons.push(Reason::new(
            ReasonCode::SecretsInline,
            "Inline secrets are not allowed; use secrets_ref",
        ));
    }
    reasons
}

/// Returns true only when `tls.enabled` is the boolean `true`.
fn tls_enabled(config: &Document) -> bool {
    matches!(config.get("tls").and_then(|tls| tls.get("enabled")), Some(Value::Bool(true)))
}

/// Returns true when any port entry binds the wildcard address.
fn public_ports_exposed(ports: Option<&Document>) -> bool {
    let Some(Value::Array(entries)) = ports else {
        return false;
    };
    entries.iter().any(|entry| match entry {
        Value::Object(fields) => BIND_KEYS
            .iter()
            .filter_map(|key| fields.get(*key))
            .find(|value| is_truthy(value))
            .and_then(Value::as_str)
            .is_some_and(|bind| bind.trim() == WILDCARD_ADDRESS),
        Value::String(text) => text.contains(WILDCARD_ADDRESS),
        _ => false,
    })
}

/// Returns true when any secret-named key anywhere holds a non-blank string.
fn contains_inline_secrets(config: &Document) -> bool {
    any_entry(config, &mut |key, value| {
        let key = key.to_lowercase();
        SECRET_KEYS.contains(&key.as_str()) && non_blank_str(value).is_some()
    })
}
