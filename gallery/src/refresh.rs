//! Rebuilds the catalog whenever the watcher reports a change.

use std::path::PathBuf;
use std::sync::Arc;

use cfb_exclusion::{ExclusionPolicy, fold};
use cfb_folder_watcher::{ChangeReceiver, FolderWatchManager, SkipReason, WatchSummary};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::catalog::{Catalog, build_catalog};
use crate::error::{GalleryError, Result};
use crate::settings::SettingsStore;

/// Authoritative list of monitored folders, re-read on every refresh.
pub trait FolderSource: Send + Sync + 'static {
    /// Current monitored folders.
    fn monitored_folders(&self) -> Vec<PathBuf>;

    /// Paths to watch for `folders`. Sources backed by a file add the
    /// file's directory so edits to the list are changes too.
    fn watch_paths(&self, folders: &[PathBuf]) -> Vec<PathBuf> {
        folders.to_vec()
    }
}

impl FolderSource for SettingsStore {
    fn monitored_folders(&self) -> Vec<PathBuf> {
        self.load().monitored_paths()
    }

    fn watch_paths(&self, folders: &[PathBuf]) -> Vec<PathBuf> {
        let mut paths = folders.to_vec();
        if let Some(dir) = self.path().parent().filter(|dir| !dir.as_os_str().is_empty()) {
            paths.push(dir.to_path_buf());
        }
        paths
    }
}

impl FolderSource for Vec<PathBuf> {
    fn monitored_folders(&self) -> Vec<PathBuf> {
        self.clone()
    }
}

impl FolderSource for RwLock<Vec<PathBuf>> {
    fn monitored_folders(&self) -> Vec<PathBuf> {
        self.read().clone()
    }
}

/// Remembers the watch set last handed to a [`FolderWatchManager`].
#[derive(Debug, Default)]
pub struct WatchSync {
    applied: Option<Vec<String>>,
    retry_missing: bool,
}

impl WatchSync {
    /// Nothing applied yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the manager's watched set when `paths` differs from the last
    /// request, or when a folder was missing last time.
    ///
    /// Returns the summary if the set was replaced.
    pub fn apply(&mut self, manager: &FolderWatchManager, paths: &[PathBuf]) -> Option<WatchSummary> {
        let mut keys: Vec<String> = paths.iter().map(|p| fold(&p.to_string_lossy())).collect();
        keys.sort_unstable();
        keys.dedup();

        if !self.retry_missing && self.applied.as_ref() == Some(&keys) {
            return None;
        }

        let summary = manager.set_watched_folders(paths);
        self.retry_missing = summary
            .skipped
            .iter()
            .any(|skipped| skipped.reason == SkipReason::Missing);
        self.applied = Some(keys);
        Some(summary)
    }
}

/// Rebuild the catalog once per change notification and send it to `tx`.
///
/// The folder list is re-read from `source` on every change, so edits to
/// it take effect on the next refresh. Notifications that arrive while a
/// rebuild is running collapse into one further rebuild.
///
/// Returns the number of catalogs delivered once the notifier is gone or
/// the receiver is dropped.
pub async fn refresh_loop<S: FolderSource>(
    mut changes: ChangeReceiver,
    source: Arc<S>,
    policy: Arc<ExclusionPolicy>,
    tx: mpsc::Sender<Catalog>,
) -> Result<usize> {
    let mut delivered = 0;

    while changes.changed().await.is_ok() {
        let source = Arc::clone(&source);
        let policy = Arc::clone(&policy);
        let catalog = tokio::task::spawn_blocking(move || {
            let folders = source.monitored_folders();
            build_catalog(&folders, &policy)
        })
        .await
        .map_err(|e| GalleryError::Refresh(e.to_string()))?;

        debug!("Refreshed catalog with {} items", catalog.len());
        if tx.send(catalog).await.is_err() {
            debug!("Catalog receiver dropped, stopping refresh loop");
            return Ok(delivered);
        }
        delivered += 1;
    }

    info!("Change notifier closed after {delivered} refreshes");
    Ok(delivered)
}

/// Keep `manager` watching what `source` lists and rebuild the catalog on
/// every change.
///
/// Sends an initial catalog, then one per change notification. Before each
/// rebuild the source is re-read and the manager's watched set replaced if
/// it no longer matches, so folders added or removed while running are
/// picked up. Runs until the receiver is dropped or the notifier closes.
///
/// Returns the number of catalogs delivered.
pub async fn follow_folders<S: FolderSource>(
    manager: Arc<FolderWatchManager>,
    source: Arc<S>,
    policy: Arc<ExclusionPolicy>,
    tx: mpsc::Sender<Catalog>,
) -> Result<usize> {
    let mut changes = manager.subscribe();
    let mut sync = WatchSync::new();
    let mut delivered = 0;

    loop {
        let (next_sync, catalog) = {
            let manager = Arc::clone(&manager);
            let source = Arc::clone(&source);
            let policy = Arc::clone(&policy);
            tokio::task::spawn_blocking(move || {
                let folders = source.monitored_folders();
                if let Some(summary) = sync.apply(&manager, &source.watch_paths(&folders)) {
                    info!("Now watching {} folders", summary.watched.len());
                }
                let catalog = build_catalog(&folders, &policy);
                (sync, catalog)
            })
            .await
            .map_err(|e| GalleryError::Refresh(e.to_string()))?
        };
        sync = next_sync;

        if tx.send(catalog).await.is_err() {
            break;
        }
        delivered += 1;

        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    info!("Change notifier closed after {delivered} catalogs");
                    break;
                }
            }
            () = tx.closed() => break,
        }
    }

    debug!("Stopped following folders after {delivered} catalogs");
    Ok(delivered)
}
