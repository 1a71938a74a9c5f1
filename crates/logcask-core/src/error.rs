//! Error Types for LogCask
//!
//! This module defines all error types that can occur in LogCask operations.
//!
//! ## Error Categories
//!
//! ### I/O Errors
//! - File system operations (open, append, seek, stat, delete)
//!
//! ### Data Integrity Errors
//! - `CorruptFrame`: a frame's length prefix disagrees with the bytes
//!   actually present, an inner length overruns the frame, or the text
//!   payload is not valid UTF-8
//!
//! ### Lookup Errors
//! - `KeyNotFound`: the key is absent from the in-memory index; this is
//!   a recoverable sentinel, not a failure
//!
//! ### Cancellation
//! - `Canceled`: acquisition of a bounded read slot was aborted before a
//!   file was opened
//!
//! ## Usage
//! All fallible functions in LogCask return `Result<T>` which is aliased
//! to `Result<T, Error>`. This allows using the `?` operator for error
//! propagation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record does not exist")]
    KeyNotFound,

    #[error("corrupt frame: {0}")]
    CorruptFrame(String),

    #[error("read slot acquisition canceled")]
    Canceled,
}

impl Error {
    /// True when the error is the recoverable "no such key" sentinel.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
