//! Persisted application settings.
//!
//! Settings live in a single JSON document whose keys match the
//! `appsettings.json` written by earlier versions of the browser, so an
//! existing file keeps its monitored folders. Unknown keys (window
//! geometry and the like) are ignored.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cfb_exclusion::{ExclusionPolicy, fold};
use cfb_folder_watcher::{FolderWatchManager, WatchConfig};
use cfb_folder_watcher::config::DEFAULT_DEBOUNCE_MS;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{GalleryError, Result};

/// File name used inside the config directory.
pub const SETTINGS_FILE: &str = "appsettings.json";

/// Application directory name under the platform config directory.
pub const APP_DIR: &str = "creative-file-browser";

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Settings {
    /// Folders whose contents populate the gallery.
    pub monitored_folders: Vec<String>,

    /// Saved sets of monitored folders.
    pub workspaces: Vec<Workspace>,

    /// Watcher quiet period in milliseconds.
    pub debounce_ms: u64,

    /// Extra folder names to exclude.
    pub excluded_names: Vec<String>,

    /// Extra substring patterns to exclude.
    pub excluded_patterns: Vec<String>,

    /// Extra paths to exclude along with their descendants.
    pub excluded_paths: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            monitored_folders: Vec::new(),
            workspaces: Vec::new(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            excluded_names: Vec::new(),
            excluded_patterns: Vec::new(),
            excluded_paths: Vec::new(),
        }
    }
}

impl Settings {
    /// Add a monitored folder. Returns `false` if it is already present
    /// (compared case-insensitively).
    pub fn add_monitored_folder(&mut self, folder: &str) -> bool {
        let key = fold(folder);
        if key.is_empty() || self.monitored_folders.iter().any(|f| fold(f) == key) {
            return false;
        }
        self.monitored_folders.push(folder.to_string());
        true
    }

    /// Remove a monitored folder. Returns `false` if it was not present.
    pub fn remove_monitored_folder(&mut self, folder: &str) -> bool {
        let key = fold(folder);
        let before = self.monitored_folders.len();
        self.monitored_folders.retain(|f| fold(f) != key);
        self.monitored_folders.len() != before
    }

    /// Monitored folders as paths.
    pub fn monitored_paths(&self) -> Vec<PathBuf> {
        self.monitored_folders.iter().map(PathBuf::from).collect()
    }

    /// Snapshot the monitored folders as a named workspace.
    ///
    /// A workspace with the same name (ignoring case) is replaced.
    pub fn save_workspace(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GalleryError::Config("workspace name is empty".to_string()));
        }

        let workspace = Workspace {
            name: name.to_string(),
            monitored_folders: self.monitored_folders.clone(),
            selected_system_folder: None,
        };

        match self
            .workspaces
            .iter_mut()
            .find(|w| w.name.eq_ignore_ascii_case(name))
        {
            Some(existing) => *existing = workspace,
            None => self.workspaces.push(workspace),
        }
        Ok(())
    }

    /// Make a saved workspace's folders the monitored folders.
    pub fn load_workspace(&mut self, name: &str) -> Result<&Workspace> {
        let workspace = self
            .workspaces
            .iter()
            .find(|w| w.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| GalleryError::Config(format!("no workspace named {name:?}")))?;

        self.monitored_folders = workspace.monitored_folders.clone();
        Ok(workspace)
    }

    /// Watcher configuration derived from these settings.
    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig {
            debounce_ms: self.debounce_ms,
            ..WatchConfig::default()
        }
    }

    /// Start a watch manager configured from these settings.
    ///
    /// Must be called inside a tokio runtime.
    pub fn watch_manager(&self) -> Result<FolderWatchManager> {
        Ok(FolderWatchManager::new(self.watch_config())?)
    }

    /// Host exclusion policy extended with the configured extras.
    pub fn exclusion_policy(&self) -> ExclusionPolicy {
        let policy = ExclusionPolicy::for_current_host();
        self.apply_exclusions(&policy);
        policy
    }

    /// Add the configured extra exclusions to `policy`.
    pub fn apply_exclusions(&self, policy: &ExclusionPolicy) {
        for name in &self.excluded_names {
            policy.add_name_exclusion(name);
        }
        for pattern in &self.excluded_patterns {
            policy.add_pattern_exclusion(pattern);
        }
        for path in &self.excluded_paths {
            policy.add_exact_path_exclusion(path);
        }
    }
}

/// A named, saved set of monitored folders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Workspace {
    /// Display name.
    pub name: String,

    /// Monitored folders captured by this workspace.
    pub monitored_folders: Vec<String>,

    /// Folder selected in the system tree when the workspace was saved.
    pub selected_system_folder: Option<String>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            name: "Untitled".to_string(),
            monitored_folders: Vec::new(),
            selected_system_folder: None,
        }
    }
}

/// Reads and writes the settings document.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Create a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform's default location.
    pub fn default_location() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| GalleryError::Config("no config directory on this platform".to_string()))?;
        Ok(Self::new(dir.join(APP_DIR).join(SETTINGS_FILE)))
    }

    /// Path of the settings document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, falling back to defaults when the file is missing
    /// or unreadable.
    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(settings) => settings,
            Err(GalleryError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No settings at {}, using defaults", self.path.display());
                Settings::default()
            }
            Err(e) => {
                warn!(
                    "Failed to load settings from {}, using defaults: {e}",
                    self.path.display()
                );
                Settings::default()
            }
        }
    }

    /// Load settings, reporting any failure.
    pub fn try_load(&self) -> Result<Settings> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write settings atomically.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(settings)?;

        // Write atomically using a temp file
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;

        info!("Saved settings to {}", self.path.display());
        Ok(())
    }
}
