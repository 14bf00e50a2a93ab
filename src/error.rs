//! Unified error handling for the xcscore library.
//!
//! All fallible operations return [`Result<T>`](Result), with [`XcError`]
//! carrying enough context to diagnose the failure without a debugger.

use thiserror::Error;

/// Errors that can occur while loading or scoring a flight track.
#[derive(Debug, Error)]
pub enum XcError {
    /// The track file could not be read.
    #[error("failed to read track file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file contained no usable position fixes.
    #[error("no valid B records found in '{path}'")]
    NoFixes { path: String },

    /// A time string such as `12:34:56` could not be parsed.
    #[error("invalid time specification '{input}'")]
    InvalidTime { input: String },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, XcError>;
