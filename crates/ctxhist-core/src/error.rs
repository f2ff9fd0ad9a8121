//! Typed storage errors.
//!
//! Single-store failures are absorbed at the call site (empty result or
//! `false`, plus a warning); only base-directory failures reach the user.

use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to initialize storage at '{}': {reason}", path.display())]
    Init { path: PathBuf, reason: String },
    #[error("Failed to read store '{}': {reason}", path.display())]
    Read { path: PathBuf, reason: String },
    #[error("Write failed during {operation}: {reason}")]
    Write { operation: String, reason: String },
}

impl StoreError {
    pub fn init(path: &Path, err: std::io::Error) -> Self {
        StoreError::Init {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }

    pub fn read(path: &Path, err: std::io::Error) -> Self {
        StoreError::Read {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }

    pub fn write(operation: &str, err: std::io::Error) -> Self {
        StoreError::Write {
            operation: operation.to_string(),
            reason: err.to_string(),
        }
    }
}
