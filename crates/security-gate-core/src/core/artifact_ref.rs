// crates/security-gate-core/src/core/artifact_ref.rs
// ============================================================================
// Module: Security Gate Artifact References
// Description: Parsing of `s3://bucket/key` object-storage references.
// Purpose: Validate artifact locations before any fetch is attempted.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Reference manifests point at snapshot and WAL artifacts in object storage.
//! A reference must have the exact form `s3://bucket/key` with both segments
//! non-empty. The key is everything after the first `/` following the bucket
//! and may itself contain `/`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// URI scheme accepted for artifact references.
pub const OBJECT_URI_SCHEME: &str = "s3";

/// URI prefix accepted for artifact references.
const OBJECT_URI_PREFIX: &str = "s3://";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Bucket/key pair addressing an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
    /// Bucket name.
    pub bucket: String,
    /// Object key inside the bucket.
    pub key: String,
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{OBJECT_URI_PREFIX}{}/{}", self.bucket, self.key)
    }
}

/// Malformed artifact reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The reference does not use the object-storage scheme.
    #[error("URI must start with s3://")]
    Scheme,
    /// Bucket or key is missing.
    #[error("URI must include bucket and key")]
    MissingSegment,
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses an `s3://bucket/key` reference.
///
/// # Errors
///
/// Returns [`LocationError`] when the scheme is wrong or a segment is empty.
pub fn parse_object_uri(uri: &str) -> Result<ObjectLocation, LocationError> {
    let path = uri.strip_prefix(OBJECT_URI_PREFIX).ok_or(LocationError::Scheme)?;
    let (bucket, key) = path.split_once('/').ok_or(LocationError::MissingSegment)?;
    if bucket.is_empty() || key.is_empty() {
        return Err(LocationError::MissingSegment);
    }
    Ok(ObjectLocation {
        bucket: bucket.to_string(),
        key: key.to_string(),
    })
}
