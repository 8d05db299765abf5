//! Error types for the gallery.

use thiserror::Error;

/// Result type alias for gallery operations.
pub type Result<T> = std::result::Result<T, GalleryError>;

/// Errors that can occur in the gallery.
#[derive(Error, Debug)]
pub enum GalleryError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Exclusion or enumeration error.
    #[error(transparent)]
    Exclusion(#[from] cfb_exclusion::ExclusionError),

    /// Watcher error.
    #[error(transparent)]
    Watcher(#[from] cfb_folder_watcher::WatcherError),

    /// A background refresh could not complete.
    #[error("refresh failed: {0}")]
    Refresh(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
