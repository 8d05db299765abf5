//! # Gallery
//!
//! The consumer side of folder monitoring: persisted settings and named
//! workspaces, the media catalog built from the monitored folders, and the
//! loop that rebuilds the catalog whenever the watcher reports a change.

pub mod catalog;
pub mod error;
pub mod refresh;
pub mod settings;

pub use catalog::{
    Catalog, MediaItem, MediaKind, build_catalog, build_catalog_with, try_build_catalog,
};
pub use error::{GalleryError, Result};
pub use refresh::{FolderSource, WatchSync, follow_folders, refresh_loop};
pub use settings::{Settings, SettingsStore, Workspace};
