//! # Store Error Types
//!
//! All errors that can occur in the durable state layer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the durable state layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("storage io failure on {path}: {source}")]
    Io {
        /// File the operation targeted.
        path: PathBuf,
        /// Underlying io error.
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not one of our logs.
    #[error("{path} is not a recognized log file")]
    BadMagic {
        /// File that failed the check.
        path: PathBuf,
    },

    /// The file was written by an incompatible format version.
    #[error("unsupported log version {version} in {path}")]
    UnsupportedVersion {
        /// File that failed the check.
        path: PathBuf,
        /// Version found in the header.
        version: u32,
    },

    /// A fully-framed record carried a payload we cannot decode.
    #[error("undecodable record in {path}: {reason}")]
    BadRecord {
        /// File the record came from.
        path: PathBuf,
        /// What was wrong with the payload.
        reason: &'static str,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
