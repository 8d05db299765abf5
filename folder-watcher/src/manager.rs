//! Folder watch manager implementation.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use notify::{RecommendedWatcher, Watcher};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, info, trace, warn};

use crate::config::WatchConfig;
use crate::debounce::{DebounceTimer, DebounceTrigger};
use crate::error::{Result, WatcherError};
use crate::event::FileEventKind;
use crate::notifier::{ChangeNotifier, ChangeReceiver};

/// A directory under active surveillance.
struct WatchedRoot {
    path: PathBuf,
    key: String,
    active: Arc<AtomicBool>,
    _watcher: RecommendedWatcher,
}

impl Drop for WatchedRoot {
    fn drop(&mut self) {
        // Late events from the native watcher must not arm the timer.
        self.active.store(false, Ordering::Release);
        debug!("Stopped watching: {}", self.path.display());
    }
}

/// Keeps one recursive watch per monitored folder and reports changes
/// under any of them as a single debounced signal.
pub struct FolderWatchManager {
    config: WatchConfig,

    /// Active roots. The lock also serializes every mutation of the set.
    roots: Mutex<Vec<WatchedRoot>>,

    timer: DebounceTimer,

    notifier: ChangeNotifier,
}

impl FolderWatchManager {
    /// Create a manager on the current tokio runtime.
    pub fn new(config: WatchConfig) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| WatcherError::NoRuntime)?;
        Ok(Self::with_handle(config, &handle))
    }

    /// Create a manager whose debounce timer runs on `handle`.
    pub fn with_handle(config: WatchConfig, handle: &Handle) -> Self {
        let notifier = ChangeNotifier::new();
        let timer = DebounceTimer::spawn(handle, config.debounce(), notifier.clone());

        Self {
            config,
            roots: Mutex::new(Vec::new()),
            timer,
            notifier,
        }
    }

    /// Subscribe to coalesced change notifications.
    pub fn subscribe(&self) -> ChangeReceiver {
        self.notifier.subscribe()
    }

    /// Replace the whole watched set.
    ///
    /// Every existing watch is released before the new ones are created.
    /// Paths that are missing, not directories, duplicates (compared
    /// case-insensitively), or refused by the OS are skipped and reported
    /// in the summary; they never fail the call.
    pub fn set_watched_folders<I, P>(&self, paths: I) -> WatchSummary
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut roots = self.roots.lock();

        let released = roots.len();
        roots.clear();

        let trigger = self.timer.trigger();
        let mut seen = HashSet::new();
        let mut summary = WatchSummary::default();

        for path in paths {
            let path = path.as_ref();
            let key = root_key(path);

            if !seen.insert(key.clone()) {
                summary.skip(path, SkipReason::Duplicate);
                continue;
            }

            match self.watch_root(path, key, trigger.clone()) {
                Ok(root) => {
                    summary.watched.push(root.path.clone());
                    roots.push(root);
                }
                Err(e) => {
                    let reason = SkipReason::from(e);
                    warn!("Not watching {}: {reason}", path.display());
                    summary.skip(path, reason);
                }
            }
        }

        info!(
            "Watching {} folders (released {released}, skipped {})",
            summary.watched.len(),
            summary.skipped.len()
        );
        summary
    }

    /// Add one folder to the watched set.
    ///
    /// Returns `false` if it is already watched or cannot be watched.
    pub fn add_folder(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let key = root_key(path);
        let mut roots = self.roots.lock();

        if roots.iter().any(|root| root.key == key) {
            debug!("Already watching: {}", path.display());
            return false;
        }

        match self.watch_root(path, key, self.timer.trigger()) {
            Ok(root) => {
                info!("Added watched folder: {}", path.display());
                roots.push(root);
                true
            }
            Err(e) => {
                warn!("Not watching {}: {}", path.display(), SkipReason::from(e));
                false
            }
        }
    }

    /// Remove one folder from the watched set.
    ///
    /// Returns `false` if it was not being watched.
    pub fn remove_folder(&self, path: impl AsRef<Path>) -> bool {
        let key = root_key(path.as_ref());
        let mut roots = self.roots.lock();

        match roots.iter().position(|root| root.key == key) {
            Some(index) => {
                let root = roots.remove(index);
                info!("Removed watched folder: {}", root.path.display());
                true
            }
            None => false,
        }
    }

    /// Release every watch and cancel any pending notification.
    ///
    /// Safe to call when idle. No notification is delivered after this
    /// returns until folders are watched again.
    pub fn stop_all(&self) {
        let mut roots = self.roots.lock();
        let released = roots.len();
        roots.clear();
        self.timer.cancel();

        if released > 0 {
            info!("Stopped watching {released} folders");
        }
    }

    /// Folders currently watched, in the order they were added.
    pub fn watched_folders(&self) -> Vec<PathBuf> {
        self.roots
            .lock()
            .iter()
            .map(|root| root.path.clone())
            .collect()
    }

    /// Whether at least one folder is watched.
    pub fn is_watching(&self) -> bool {
        !self.roots.lock().is_empty()
    }

    /// Get the configuration.
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Get statistics about the watcher.
    pub fn stats(&self) -> WatcherStats {
        WatcherStats {
            watched_roots: self.roots.lock().len(),
            notifications_sent: self.timer.fired(),
            debounce: self.timer.quiet_period(),
        }
    }

    fn watch_root(&self, path: &Path, key: String, trigger: DebounceTrigger) -> Result<WatchedRoot> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => WatcherError::DirectoryNotFound(path.display().to_string()),
            _ => WatcherError::Io(e),
        })?;
        if !metadata.is_dir() {
            return Err(WatcherError::NotADirectory(path.display().to_string()));
        }

        let active = Arc::new(AtomicBool::new(true));
        let handler_active = active.clone();
        let root_path = path.to_path_buf();

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    if !handler_active.load(Ordering::Acquire) {
                        return;
                    }
                    let kind = FileEventKind::from(event.kind);
                    if !kind.is_change() {
                        return;
                    }
                    trace!(
                        "{kind:?} under {}: {:?}",
                        root_path.display(),
                        event.paths
                    );
                    trigger.arm();
                }
                Err(e) => {
                    warn!("Watch error under {}: {e}", root_path.display());
                }
            },
        )?;

        watcher.watch(path, self.config.recursive_mode())?;
        debug!("Started watching: {}", path.display());

        Ok(WatchedRoot {
            path: path.to_path_buf(),
            key,
            active,
            _watcher: watcher,
        })
    }
}

impl Drop for FolderWatchManager {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// Case-insensitive identity of a watched folder.
fn root_key(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .trim_end_matches('/')
        .to_lowercase()
}

/// Outcome of [`FolderWatchManager::set_watched_folders`].
#[derive(Debug, Clone, Default)]
pub struct WatchSummary {
    /// Folders now being watched.
    pub watched: Vec<PathBuf>,

    /// Folders that were requested but not watched.
    pub skipped: Vec<SkippedRoot>,
}

impl WatchSummary {
    fn skip(&mut self, path: &Path, reason: SkipReason) {
        self.skipped.push(SkippedRoot {
            path: path.to_path_buf(),
            reason,
        });
    }
}

/// A requested folder that is not being watched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRoot {
    /// The requested path.
    pub path: PathBuf,

    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Why a requested folder is not being watched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The path does not exist.
    Missing,

    /// The path exists but is not a directory.
    NotADirectory,

    /// The same folder appeared earlier in the request.
    Duplicate,

    /// The existence check or the native watch failed.
    WatchFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("directory not found"),
            Self::NotADirectory => f.write_str("not a directory"),
            Self::Duplicate => f.write_str("duplicate"),
            Self::WatchFailed(reason) => write!(f, "watch failed: {reason}"),
        }
    }
}

impl From<WatcherError> for SkipReason {
    fn from(error: WatcherError) -> Self {
        match error {
            WatcherError::DirectoryNotFound(_) => Self::Missing,
            WatcherError::NotADirectory(_) => Self::NotADirectory,
            other => Self::WatchFailed(other.to_string()),
        }
    }
}

/// Statistics about the folder watcher.
#[derive(Debug, Clone)]
pub struct WatcherStats {
    /// Number of watched folders.
    pub watched_roots: usize,

    /// Notifications delivered so far.
    pub notifications_sent: u64,

    /// Quiet period.
    pub debounce: Duration,
}
