//! Error types for exclusion evaluation and enumeration.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for exclusion operations.
pub type Result<T> = std::result::Result<T, ExclusionError>;

/// Errors that can occur while evaluating or enumerating paths.
#[derive(Error, Debug)]
pub enum ExclusionError {
    /// The candidate path cannot be evaluated.
    #[error("malformed path: {0}")]
    MalformedPath(String),

    /// A node could not be read during enumeration.
    #[error("failed to read {}: {source}", path.display())]
    Walk {
        /// Path of the node that failed.
        path: PathBuf,
        /// Underlying walker error.
        #[source]
        source: walkdir::Error,
    },
}
