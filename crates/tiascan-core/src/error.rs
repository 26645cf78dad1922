//! Error types for the tiascan-core library.
//!
//! Almost nothing in this crate is allowed to fail hard: the container
//! format is undocumented, so anything schema-shaped degrades to an empty
//! result instead of an error. The variants here cover the few conditions
//! that must be reported to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tiascan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all tiascan operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The project directory itself could not be resolved
    #[error("project directory not found: '{path}'")]
    ProjectNotFound {
        /// The path that failed to resolve
        path: PathBuf,
    },

    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The project descriptor file did not parse as XML
    #[error("failed to parse project descriptor '{path}': {details}")]
    DescriptorParse {
        /// Path to the descriptor file
        path: PathBuf,
        /// Detailed description of the issue
        details: String,
    },
}

impl Error {
    /// Creates a new project-not-found error
    pub fn project_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ProjectNotFound { path: path.into() }
    }

    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new descriptor parse error
    pub fn descriptor_parse(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        Self::DescriptorParse {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Returns true if this is a recoverable error that callers should
    /// absorb rather than propagate (schema-shaped failures)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DescriptorParse { .. })
    }
}
