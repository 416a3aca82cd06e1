// crates/security-gate-core/src/runtime/audit.rs
// ============================================================================
// Module: Security Gate Audit Log
// Description: Append-only JSON-lines audit log backends.
// Purpose: Durably record one line per decision and serve filtered reads.
// Dependencies: crate::{core, interfaces}, serde_json
// ============================================================================

//! ## Overview
//! [`FileAuditLog`] stores one JSON object per line. Each append serializes the
//! record first, then opens the file in append mode and writes the complete
//! line with a single `write_all`, so concurrent appenders never interleave
//! partial lines and no process-wide lock is held. Reads stream the file line
//! by line, skip blank and unparseable lines, return records in file order,
//! and stop as soon as the query limit is reached.
//!
//! [`InMemoryAuditLog`] is a deterministic backend for tests and embedding.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::OpenOptions;
use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::core::AuditRecord;
use crate::interfaces::AuditError;
use crate::interfaces::AuditLog;
use crate::interfaces::AuditQuery;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum serialized size of a single audit line, newline included.
pub const MAX_AUDIT_RECORD_BYTES: usize = 64 * 1024;

// ============================================================================
// SECTION: File Audit Log
// ============================================================================

/// JSON-lines audit log backed by a local file.
#[derive(Debug, Clone)]
pub struct FileAuditLog {
    /// Audit log file path.
    path: PathBuf,
}

impl FileAuditLog {
    /// Creates a file audit log at `path`. No I/O happens until first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Returns the audit log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates parent directories and opens the file for appending.
    fn open_append(&self) -> io::Result<fs::File> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(&self.path)
    }
}

impl AuditLog for FileAuditLog {
    fn ensure_ready(&self) -> Result<(), AuditError> {
        self.open_append().map(drop).map_err(|err| AuditError::Io(err.to_string()))
    }

    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let line = encode_line(record)?;
        let mut file = self.open_append().map_err(|err| AuditError::Io(err.to_string()))?;
        file.write_all(&line).map_err(|err| AuditError::Io(err.to_string()))?;
        file.sync_data().map_err(|err| AuditError::Io(err.to_string()))
    }

    fn read(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(AuditError::Io(err.to_string())),
        };
        let mut records = Vec::new();
        if query.limit == 0 {
            return Ok(records);
        }
        for line in BufReader::new(file).split(b'\n') {
            let line = line.map_err(|err| AuditError::Io(err.to_string()))?;
            let line = line.trim_ascii();
            if line.is_empty() {
                continue;
            }
            let Ok(record) = serde_json::from_slice::<AuditRecord>(line) else {
                continue;
            };
            if query.matches(&record) {
                records.push(record);
                if records.len() >= query.limit {
                    break;
                }
            }
        }
        Ok(records)
    }
}

/// Serializes a record into one newline-terminated line within the size bound.
fn encode_line(record: &AuditRecord) -> Result<Vec<u8>, AuditError> {
    let mut line =
        serde_json::to_vec(record).map_err(|err| AuditError::Serialize(err.to_string()))?;
    line.push(b'\n');
    if line.len() > MAX_AUDIT_RECORD_BYTES {
        return Err(AuditError::TooLarge {
            max_bytes: MAX_AUDIT_RECORD_BYTES,
            actual_bytes: line.len(),
        });
    }
    Ok(line)
}

// ============================================================================
// SECTION: In-Memory Audit Log
// ============================================================================

/// In-memory audit log for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    /// Records in append order.
    records: Mutex<Vec<AuditRecord>>,
}

impl InMemoryAuditLog {
    /// Creates an empty in-memory audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every appended record.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().map(|records| records.clone()).unwrap_or_default()
    }
}

impl AuditLog for InMemoryAuditLog {
    fn ensure_ready(&self) -> Result<(), AuditError> {
        self.records
            .lock()
            .map(drop)
            .map_err(|_| AuditError::Io("audit log lock poisoned".to_string()))
    }

    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        encode_line(record)?;
        let mut records = self
            .records
            .lock()
            .map_err(|_| AuditError::Io("audit log lock poisoned".to_string()))?;
        records.push(record.clone());
        Ok(())
    }

    fn read(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError> {
        let records = self
            .records
            .lock()
            .map_err(|_| AuditError::Io("audit log lock poisoned".to_string()))?;
        Ok(records
            .iter()
            .filter(|record| query.matches(record))
            .take(query.limit)
            .cloned()
            .collect())
    }
}
