// crates/security-gate-server/src/auth.rs
// ============================================================================
// Module: Security Gate Bearer Auth
// Description: Bearer-token authentication for the HTTP surface.
// Purpose: Fail-closed caller authentication with constant-time comparison.
// Dependencies: security-gate-config, subtle, thiserror
// ============================================================================

//! ## Overview
//! Every validation and audit endpoint requires `Authorization: Bearer <token>`
//! matching one of the configured tokens. The scheme is case-insensitive, the
//! header is size-limited, and tokens are compared in constant time.
//! Security posture: header values are untrusted; no token material is logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use security_gate_config::ServerAuthConfig;
use subtle::Choice;
use subtle::ConstantTimeEq;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted `Authorization` header size in bytes.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `Authorization` header was supplied.
    #[error("missing authorization")]
    Missing,
    /// The header is oversized, not bearer, or carries an empty token.
    #[error("invalid authorization header")]
    Malformed,
    /// The token matches no configured token.
    #[error("invalid bearer token")]
    Rejected,
}

// ============================================================================
// SECTION: Bearer Auth
// ============================================================================

/// Bearer-token authenticator built from server configuration.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    /// Accepted tokens.
    tokens: Vec<String>,
}

impl BearerAuth {
    /// Creates an authenticator accepting `tokens`.
    #[must_use]
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    /// Creates an authenticator from server auth configuration.
    #[must_use]
    pub fn from_config(config: &ServerAuthConfig) -> Self {
        Self::new(config.bearer_tokens.iter().cloned())
    }

    /// Authenticates a raw `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the header is missing, malformed, or names
    /// an unknown token.
    pub fn authorize(&self, header: Option<&str>) -> Result<(), AuthError> {
        let token = parse_bearer_token(header)?;
        let matched = self
            .tokens
            .iter()
            .fold(Choice::from(0), |acc, known| acc | known.as_bytes().ct_eq(token.as_bytes()));
        if bool::from(matched) { Ok(()) } else { Err(AuthError::Rejected) }
    }
}

/// Extracts the token from a bearer `Authorization` header.
fn parse_bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::Missing)?;
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return Err(AuthError::Malformed);
    }
    let (scheme, token) = header.trim().split_once(' ').ok_or(AuthError::Malformed)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::Malformed);
    }
    Ok(token)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
