// crates/security-gate-core/src/core/hashing.rs
// ============================================================================
// Module: Security Gate Content Hashing
// Description: SHA-256 content digests and normalized digest comparison.
// Purpose: Provide the integrity primitives used by every validator.
// Dependencies: sha2
// ============================================================================

//! ## Overview
//! Submitted artifacts are hashed directly over their raw bytes. Declared
//! digests arrive from untrusted manifests, so comparison normalizes both
//! operands (trim, lowercase) before checking equality.
//!
//! Comparison is not constant-time: digests are integrity checks over public
//! artifacts, not secrets.

// ============================================================================
// SECTION: Imports
// ============================================================================

use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Hashing
// ============================================================================

/// Returns the lowercase hex SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

// ============================================================================
// SECTION: Comparison
// ============================================================================

/// Normalizes a hex digest for comparison (trimmed, lowercase).
#[must_use]
pub fn normalize_hex(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Compares an expected digest with an actual digest after normalization.
#[must_use]
pub fn hashes_match(expected: &str, actual: &str) -> bool {
    normalize_hex(expected) == normalize_hex(actual)
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
