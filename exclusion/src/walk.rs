//! Exclusion-aware directory enumeration.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{ExclusionError, Result};
use crate::policy::ExclusionPolicy;

/// Options controlling a walk.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Maximum depth below the root (None = unlimited).
    pub max_depth: Option<usize>,

    /// Whether files are yielded, or only directories.
    pub include_files: bool,

    /// Whether to follow symbolic links.
    pub follow_symlinks: bool,
}

impl WalkOptions {
    /// Set the maximum depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Only yield directories.
    pub fn directories_only(mut self) -> Self {
        self.include_files = false;
        self
    }

    /// Enable following symbolic links.
    pub fn follow_symlinks(mut self) -> Self {
        self.follow_symlinks = true;
        self
    }
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            include_files: true,
            follow_symlinks: false,
        }
    }
}

/// What to do when a node cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Log the error and carry on with the next node.
    #[default]
    SkipAndLog,

    /// Yield the error, then carry on with the next node.
    Propagate,
}

/// Kind of an enumerated entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory.
    Directory,
    /// A regular file.
    File,
    /// A symbolic link that was not followed.
    Symlink,
}

/// An entry produced by [`walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Full path.
    pub path: PathBuf,

    /// Last path component.
    pub name: String,

    /// Entry kind.
    pub kind: EntryKind,

    /// Depth below the walk root (children of the root are at depth 1).
    pub depth: usize,
}

impl WalkEntry {
    fn from_dir_entry(entry: &DirEntry) -> Self {
        let file_type = entry.file_type();
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_symlink() {
            EntryKind::Symlink
        } else {
            EntryKind::File
        };

        Self {
            path: entry.path().to_path_buf(),
            name: entry.file_name().to_string_lossy().into_owned(),
            kind,
            depth: entry.depth(),
        }
    }
}

type EntryFilter<'a> = Box<dyn FnMut(&DirEntry) -> bool + 'a>;

/// Lazy sequence of entries under a root, skipping excluded subtrees.
pub struct Walk<'a> {
    root: PathBuf,
    inner: walkdir::FilterEntry<walkdir::IntoIter, EntryFilter<'a>>,
    include_files: bool,
    on_error: ErrorPolicy,
}

/// Enumerate `root` lazily, consulting `policy` for every descendant.
///
/// The root itself is trusted and never evaluated or yielded. Excluded
/// directories are pruned without being read.
pub fn walk<'a>(
    root: impl AsRef<Path>,
    policy: &'a ExclusionPolicy,
    options: WalkOptions,
    on_error: ErrorPolicy,
) -> Walk<'a> {
    let root = root.as_ref().to_path_buf();

    let filter: EntryFilter<'a> = Box::new(move |entry: &DirEntry| {
        if entry.depth() == 0 {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        let path = entry.path().to_string_lossy();
        !policy.should_exclude(&name, &path)
    });

    let inner = WalkDir::new(&root)
        .follow_links(options.follow_symlinks)
        .max_depth(options.max_depth.unwrap_or(usize::MAX))
        .sort_by_file_name()
        .into_iter()
        .filter_entry(filter);

    debug!("Walking {}", root.display());

    Walk {
        root,
        inner,
        include_files: options.include_files,
        on_error,
    }
}

impl Iterator for Walk<'_> {
    type Item = Result<WalkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(entry) => {
                    if entry.depth() == 0 {
                        continue;
                    }
                    let entry = WalkEntry::from_dir_entry(&entry);
                    if entry.kind != EntryKind::Directory && !self.include_files {
                        continue;
                    }
                    return Some(Ok(entry));
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    match self.on_error {
                        ErrorPolicy::SkipAndLog => {
                            warn!("Skipping {}: {e}", path.display());
                        }
                        ErrorPolicy::Propagate => {
                            return Some(Err(ExclusionError::Walk { path, source: e }));
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn names(walk: Walk<'_>) -> Vec<String> {
        walk.filter_map(std::result::Result::ok)
            .map(|e| e.name)
            .collect()
    }

    fn fixture() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("Shoots/2024")).unwrap();
        fs::create_dir_all(root.join("Shoots/.cache")).unwrap();
        fs::create_dir_all(root.join("Private Stuff/nested")).unwrap();
        fs::write(root.join("Shoots/2024/a.jpg"), b"a").unwrap();
        fs::write(root.join("Shoots/thumbs.db"), b"").unwrap();
        fs::write(root.join("Shoots/.cache/b.jpg"), b"b").unwrap();
        fs::write(root.join("Private Stuff/nested/c.jpg"), b"c").unwrap();
        temp_dir
    }

    #[test]
    fn test_walk_skips_excluded_subtrees() {
        let temp_dir = fixture();
        let policy = ExclusionPolicy::empty().with_platform(Platform::Other);
        policy.add_name_exclusion("private stuff");

        let found = names(walk(
            temp_dir.path(),
            &policy,
            WalkOptions::default(),
            ErrorPolicy::SkipAndLog,
        ));

        assert_eq!(found, vec!["Shoots", "2024", "a.jpg"]);
    }

    #[test]
    fn test_walk_exact_path_prunes_descendants() {
        let temp_dir = fixture();
        let policy = ExclusionPolicy::empty().with_platform(Platform::Other);
        policy.add_exact_path_exclusion(&temp_dir.path().join("Shoots").to_string_lossy());

        let found = names(walk(
            temp_dir.path(),
            &policy,
            WalkOptions::default(),
            ErrorPolicy::SkipAndLog,
        ));

        assert_eq!(found, vec!["Private Stuff", "nested", "c.jpg"]);
    }

    #[test]
    fn test_walk_directories_only_with_depth() {
        let temp_dir = fixture();
        let policy = ExclusionPolicy::empty().with_platform(Platform::Other);

        let entries: Vec<WalkEntry> = walk(
            temp_dir.path(),
            &policy,
            WalkOptions::default().directories_only().with_max_depth(1),
            ErrorPolicy::SkipAndLog,
        )
        .collect::<Result<_>>()
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.kind == EntryKind::Directory));
        assert!(entries.iter().all(|e| e.depth == 1));
    }

    #[test]
    fn test_walk_missing_root() {
        let policy = ExclusionPolicy::empty();
        let missing = Path::new("/nonexistent/walk/root/12345");

        let skipped: Vec<_> = walk(
            missing,
            &policy,
            WalkOptions::default(),
            ErrorPolicy::SkipAndLog,
        )
        .collect();
        assert!(skipped.is_empty());

        let propagated: Vec<_> = walk(
            missing,
            &policy,
            WalkOptions::default(),
            ErrorPolicy::Propagate,
        )
        .collect();
        assert_eq!(propagated.len(), 1);
        assert!(matches!(
            propagated[0],
            Err(ExclusionError::Walk { .. })
        ));
    }
}
