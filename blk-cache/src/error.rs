//! # Cache error types
//!
//! Storage failures are recoverable and are reported through these types;
//! contract violations at construction surface as [`CacheError::InvalidConfig`]
//! from the fallible constructors and as panics from the infallible ones.

use std::io;
use thiserror::Error;

/// Block cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Seek to {offset:#x} failed: {source}")]
    Seek {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("Read of block {offset:#x} failed: {source}")]
    Read {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("Write of block {offset:#x} failed: {source}")]
    Write {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("Short write at {offset:#x}: {written} of {expected} bytes")]
    ShortWrite {
        offset: u64,
        expected: usize,
        written: usize,
    },

    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),
}

impl CacheError {
    /// Whether the error came from the underlying storage rather than from
    /// the caller's configuration or an unimplemented operation.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            CacheError::Io(_)
                | CacheError::Seek { .. }
                | CacheError::Read { .. }
                | CacheError::Write { .. }
                | CacheError::ShortWrite { .. }
        )
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, CacheError>;
