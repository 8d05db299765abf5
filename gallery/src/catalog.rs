//! Media catalog built from the monitored folders.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use cfb_exclusion::{EntryKind, ErrorPolicy, ExclusionPolicy, WalkEntry, WalkOptions, fold, walk};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::Result;

/// Kind of media file shown in the gallery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Still image.
    Image,
    /// Video clip.
    Video,
    /// Layered design document.
    Design,
    /// Camera raw.
    Raw,
}

impl MediaKind {
    /// Classify a file extension (without the dot, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "tiff" | "bmp" | "heic" => Some(Self::Image),
            "mp4" | "mov" => Some(Self::Video),
            "psd" => Some(Self::Design),
            "raw" => Some(Self::Raw),
            _ => None,
        }
    }

    /// Classify a path by its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Get MIME type from a media file extension.
pub fn mime_type(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "psd" => "image/vnd.adobe.photoshop",
        _ => "application/octet-stream",
    }
}

/// A media file found under a monitored folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    /// Full path.
    pub path: PathBuf,

    /// File name.
    pub name: String,

    /// Media kind.
    pub kind: MediaKind,

    /// Size in bytes.
    pub size: u64,

    /// Last modification time, if known.
    pub modified: Option<DateTime<Utc>>,
}

impl MediaItem {
    /// MIME type derived from the extension.
    pub fn mime_type(&self) -> &'static str {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map_or("application/octet-stream", mime_type)
    }
}

/// Snapshot of the media under the monitored folders.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Media items, newest first.
    pub items: Vec<MediaItem>,

    /// Folders that were enumerated.
    pub folders_scanned: usize,

    /// Monitored folders that no longer exist.
    pub folders_missing: Vec<PathBuf>,

    /// When the catalog was built.
    pub built_at: DateTime<Utc>,
}

impl Catalog {
    /// Number of items of a given kind.
    pub fn count(&self, kind: MediaKind) -> usize {
        self.items.iter().filter(|item| item.kind == kind).count()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Enumerate the media under `folders`.
///
/// Folders are deduplicated case-insensitively and re-checked for
/// existence; missing ones are recorded rather than treated as errors.
/// Unreadable nodes are skipped and logged.
pub fn build_catalog<P: AsRef<Path>>(folders: &[P], policy: &ExclusionPolicy) -> Catalog {
    build_catalog_with(folders, policy, WalkOptions::default())
}

/// [`build_catalog`] with explicit walk options.
pub fn build_catalog_with<P: AsRef<Path>>(
    folders: &[P],
    policy: &ExclusionPolicy,
    options: WalkOptions,
) -> Catalog {
    let mut collector = Collector::new();
    for folder in folders {
        let folder = folder.as_ref();
        if !collector.enter(folder) {
            continue;
        }
        let entries = walk(folder, policy, options.clone(), ErrorPolicy::SkipAndLog);
        for entry in entries.flatten() {
            collector.add(entry);
        }
    }
    collector.finish()
}

/// Like [`build_catalog_with`], but the first unreadable node fails the
/// whole build instead of being skipped.
pub fn try_build_catalog<P: AsRef<Path>>(
    folders: &[P],
    policy: &ExclusionPolicy,
    options: WalkOptions,
) -> Result<Catalog> {
    let mut collector = Collector::new();
    for folder in folders {
        let folder = folder.as_ref();
        if !collector.enter(folder) {
            continue;
        }
        for entry in walk(folder, policy, options.clone(), ErrorPolicy::Propagate) {
            collector.add(entry?);
        }
    }
    Ok(collector.finish())
}

struct Collector {
    start: Instant,
    seen_folders: HashSet<String>,
    seen_items: HashSet<String>,
    items: Vec<MediaItem>,
    folders_scanned: usize,
    folders_missing: Vec<PathBuf>,
}

impl Collector {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            seen_folders: HashSet::new(),
            seen_items: HashSet::new(),
            items: Vec::new(),
            folders_scanned: 0,
            folders_missing: Vec::new(),
        }
    }

    /// Whether `folder` is new and present, recording it either way.
    fn enter(&mut self, folder: &Path) -> bool {
        if !self.seen_folders.insert(fold(&folder.to_string_lossy())) {
            return false;
        }
        if !folder.is_dir() {
            debug!("Monitored folder not available: {}", folder.display());
            self.folders_missing.push(folder.to_path_buf());
            return false;
        }
        self.folders_scanned += 1;
        true
    }

    fn add(&mut self, entry: WalkEntry) {
        let is_file = match entry.kind {
            EntryKind::File => true,
            // Unfollowed links still count when they point at a file.
            EntryKind::Symlink => entry.path.is_file(),
            EntryKind::Directory => false,
        };
        if !is_file {
            return;
        }
        let Some(kind) = MediaKind::from_path(&entry.path) else {
            return;
        };
        if !self.seen_items.insert(fold(&entry.path.to_string_lossy())) {
            return;
        }

        let metadata = entry.path.metadata().ok();
        self.items.push(MediaItem {
            size: metadata.as_ref().map_or(0, std::fs::Metadata::len),
            modified: metadata
                .as_ref()
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from),
            path: entry.path,
            name: entry.name,
            kind,
        });
    }

    fn finish(mut self) -> Catalog {
        self.items.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.path.cmp(&b.path))
        });

        info!(
            "Catalogued {} media files from {} folders in {:?} ({} missing)",
            self.items.len(),
            self.folders_scanned,
            self.start.elapsed(),
            self.folders_missing.len()
        );

        Catalog {
            items: self.items,
            folders_scanned: self.folders_scanned,
            folders_missing: self.folders_missing,
            built_at: Utc::now(),
        }
    }
}
