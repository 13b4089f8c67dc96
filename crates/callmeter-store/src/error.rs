//! # Store Error Types
//!
//! Error types for persistence operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Error Propagation                              │
//! │                                                                     │
//! │  std::io::Error / serde_json::Error                                 │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  StoreError (this module) ← adds the file path as context           │
//! │       │                                                             │
//! │       ├── save / export / delete: returned to the caller, who       │
//! │       │   surfaces a transient status and retries on the next       │
//! │       │   mutation                                                  │
//! │       │                                                             │
//! │       └── load / import: recovered locally (default snapshot or     │
//! │           empty import), logged, never propagated                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Persistence operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem access failed.
    ///
    /// ## When This Occurs
    /// - Permission denied on the snapshot path
    /// - Disk full during a save
    /// - The parent directory cannot be created
    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serializing engine state to JSON failed.
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    /// Creates an Io error carrying the offending path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for persistence operations.
pub type StoreResult<T> = Result<T, StoreError>;
