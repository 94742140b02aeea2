//! Error and result types shared across the crate.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised by the graph store.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A file could not be opened for reading, already exists on write, or
    /// could not be created.
    #[error("cannot access {}: {source}", path.display())]
    FileInaccessible {
        /// The offending path.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// An I/O operation failed mid-stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// On-disk or in-segment data does not match the expected layout.
    #[error("corruption detected: {0}")]
    Corruption(String),
    /// A caller-supplied value is out of range or inconsistent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Both the text and the binary mapping file exist for the same base path.
    #[error("ambiguous mapping: both {} and {} exist", text.display(), binary.display())]
    AmbiguousMapping {
        /// Path of the text-format mapping file.
        text: PathBuf,
        /// Path of the binary-format mapping file.
        binary: PathBuf,
    },
    /// A mapping artifact was requested but no mapping has been loaded.
    #[error("no identifier mapping loaded")]
    MappingMissing,
    /// No shared segment is registered under the given key.
    #[error("invalid shared segment key {0}")]
    BadSegmentKey(i32),
    /// A shared segment exists but could not be mapped or read.
    #[error("cannot map shared segment: {0}")]
    SegmentMap(String),
}
