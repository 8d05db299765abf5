//! The exclusion policy consulted before enumerating a path.

use std::fmt;
use std::fs;
use std::path::Path;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::{ExclusionError, Result};
use crate::normalize::{last_component, normalize};
use crate::platform::Platform;
use crate::rules::{ExclusionRuleSet, RuleCounts};

/// Known junk file names excluded on every platform.
const COMMON_JUNK_FILES: &[&str] = &["thumbs.db", ".ds_store"];

/// Directory holding the macOS system volumes.
pub const MACOS_SYSTEM_VOLUMES: &str = "/System/Volumes";

/// Which tier excluded a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionMatch {
    /// The path equals, or lies below, a configured exact path.
    ExactPath(String),
    /// The last component is an excluded name.
    Name,
    /// A platform heuristic matched.
    Platform(Platform),
    /// Hidden entry or known junk file.
    CommonFile,
    /// The path contains a configured substring pattern.
    Pattern(String),
}

impl ExclusionMatch {
    /// Short tier label for diagnostics.
    pub fn tier(&self) -> &'static str {
        match self {
            Self::ExactPath(_) => "exact-path",
            Self::Name => "name",
            Self::Platform(_) => "platform",
            Self::CommonFile => "common-file",
            Self::Pattern(_) => "pattern",
        }
    }
}

impl fmt::Display for ExclusionMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactPath(path) => write!(f, "exact path {path}"),
            Self::Name => f.write_str("excluded name"),
            Self::Platform(platform) => write!(f, "{platform:?} system path"),
            Self::CommonFile => f.write_str("hidden or junk file"),
            Self::Pattern(pattern) => write!(f, "pattern {pattern}"),
        }
    }
}

/// Decides whether a folder or file must be skipped during enumeration.
///
/// The policy is an explicit value owned by whoever walks the tree; share
/// it behind an `Arc` when several walkers need it. Rules can be added at
/// runtime through `&self`, and only ever grow.
#[derive(Debug)]
pub struct ExclusionPolicy {
    rules: RwLock<ExclusionRuleSet>,
    platform: Platform,
}

impl ExclusionPolicy {
    /// Create a policy from an existing rule set, for the current platform.
    pub fn from_rules(rules: ExclusionRuleSet) -> Self {
        Self {
            rules: RwLock::new(rules),
            platform: Platform::current(),
        }
    }

    /// Create a policy with no configured rules.
    ///
    /// The platform and common-file tiers still apply.
    pub fn empty() -> Self {
        Self::from_rules(ExclusionRuleSet::new())
    }

    /// Create a policy with the built-in default rules.
    pub fn with_defaults() -> Self {
        Self::from_rules(ExclusionRuleSet::defaults())
    }

    /// Create a default policy and add whatever the host needs at runtime.
    ///
    /// On macOS this discovers the children of `/System/Volumes`.
    pub fn for_current_host() -> Self {
        let policy = Self::with_defaults();
        if policy.platform == Platform::MacOs {
            policy.add_system_volume_exclusions(Path::new(MACOS_SYSTEM_VOLUMES));
        }
        policy
    }

    /// Evaluate platform rules as if running on `platform`.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Platform whose heuristics this policy applies.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Normalize a path the way every tier sees it.
    pub fn normalize(path: &str) -> String {
        normalize(path)
    }

    /// Whether enumeration must skip `path` (whose last component is `name`).
    ///
    /// Never fails: malformed input is logged and reported as not excluded.
    pub fn should_exclude(&self, name: &str, path: &str) -> bool {
        match self.evaluate(name, path) {
            Ok(Some(hit)) => {
                debug!("Excluding {path} ({hit})");
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Exclusion check failed, not excluding {path:?}: {e}");
                false
            }
        }
    }

    /// [`should_exclude`](Self::should_exclude) for a filesystem path.
    pub fn should_exclude_path(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        self.should_exclude(&name, &path_str)
    }

    /// Evaluate every tier and report the first one that matches.
    ///
    /// Tiers are OR'd together, so the order only decides which match is
    /// reported. An empty `name` is derived from the path.
    pub fn evaluate(&self, name: &str, path: &str) -> Result<Option<ExclusionMatch>> {
        if path.trim().is_empty() {
            return Err(ExclusionError::MalformedPath("empty path".to_string()));
        }
        if path.contains('\0') || name.contains('\0') {
            return Err(ExclusionError::MalformedPath(format!(
                "{path:?} contains a NUL character"
            )));
        }

        let folded = normalize(path).to_lowercase();
        let name = if name.is_empty() {
            last_component(&folded).to_string()
        } else {
            name.to_lowercase()
        };

        let rules = self.rules.read();

        if let Some(exact) = rules.match_exact_path(&folded) {
            return Ok(Some(ExclusionMatch::ExactPath(exact.to_string())));
        }

        if rules.matches_name(&name) {
            return Ok(Some(ExclusionMatch::Name));
        }

        if self.platform.matches(&folded) {
            return Ok(Some(ExclusionMatch::Platform(self.platform)));
        }

        if is_common_file(last_component(&folded)) {
            return Ok(Some(ExclusionMatch::CommonFile));
        }

        if let Some(pattern) = rules.match_pattern(&folded) {
            return Ok(Some(ExclusionMatch::Pattern(pattern.to_string())));
        }

        Ok(None)
    }

    /// Exclude `path` and everything below it.
    pub fn add_exact_path_exclusion(&self, path: &str) -> bool {
        self.rules.write().add_exact_path(path)
    }

    /// Exclude every folder or file called `name`.
    pub fn add_name_exclusion(&self, name: &str) -> bool {
        self.rules.write().add_name(name)
    }

    /// Exclude every path containing `pattern`.
    pub fn add_pattern_exclusion(&self, pattern: &str) -> bool {
        self.rules.write().add_pattern(pattern)
    }

    /// Add every directory under `volumes_dir` as an exact exclusion.
    ///
    /// The `Data` volume also gets its `home` and `private` children
    /// excluded. Returns how many rules were new.
    pub fn add_system_volume_exclusions(&self, volumes_dir: &Path) -> usize {
        let entries = match fs::read_dir(volumes_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Cannot read system volumes at {}: {e}",
                    volumes_dir.display()
                );
                return 0;
            }
        };

        let mut added = 0;
        for entry in entries.flatten() {
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }

            if self.add_exact_path_exclusion(&dir.to_string_lossy()) {
                added += 1;
            }

            let is_data = entry
                .file_name()
                .to_string_lossy()
                .eq_ignore_ascii_case("data");
            if is_data {
                for child in ["home", "private"] {
                    let child_path = dir.join(child);
                    if child_path.is_dir()
                        && self.add_exact_path_exclusion(&child_path.to_string_lossy())
                    {
                        added += 1;
                    }
                }
            }
        }

        info!(
            "Added {added} system volume exclusions from {}",
            volumes_dir.display()
        );
        added
    }

    /// Snapshot of the rule tier sizes.
    pub fn rule_counts(&self) -> RuleCounts {
        self.rules.read().counts()
    }
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn is_common_file(name: &str) -> bool {
    name.starts_with('.') || COMMON_JUNK_FILES.contains(&name) || name.contains("timemachine")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn mac_defaults() -> ExclusionPolicy {
        ExclusionPolicy::with_defaults().with_platform(Platform::MacOs)
    }

    #[test]
    fn test_documented_examples() {
        let policy = mac_defaults();

        assert!(policy.should_exclude("thumbs.db", "/Users/me/Pictures/thumbs.db"));
        assert!(!policy.should_exclude("Vacation", "/Users/me/Pictures/Vacation"));
        assert_eq!(
            policy.evaluate("home", "/System/Volumes/Data/home").unwrap(),
            Some(ExclusionMatch::ExactPath("/system/volumes/data".to_string()))
        );
    }

    #[test]
    fn test_exact_path_wins_regardless_of_name() {
        let policy = ExclusionPolicy::empty().with_platform(Platform::Other);
        policy.add_exact_path_exclusion(r"D:\Archive\Raw");

        for (name, path) in [
            ("Raw", "D:/Archive/Raw"),
            ("anything", "d:/archive/raw/2023/anything"),
            ("", r"D:\Archive\Raw\"),
        ] {
            assert!(
                matches!(
                    policy.evaluate(name, path).unwrap(),
                    Some(ExclusionMatch::ExactPath(_))
                ),
                "{path} should be exact-excluded"
            );
        }
        assert!(!policy.should_exclude("Raw2", "D:/Archive/Raw2"));
    }

    #[test]
    fn test_name_tier_is_case_insensitive() {
        let policy = ExclusionPolicy::with_defaults().with_platform(Platform::Other);

        assert_eq!(
            policy
                .evaluate("System Volume Information", "E:/System Volume Information")
                .unwrap(),
            Some(ExclusionMatch::Name)
        );
        assert!(policy.should_exclude("__MACOSX", "/Users/me/Downloads/__MACOSX"));
    }

    #[test]
    fn test_platform_tier_only_on_matching_platform() {
        let path = "/private/var/folders";

        assert_eq!(
            ExclusionPolicy::empty()
                .with_platform(Platform::MacOs)
                .evaluate("folders", path)
                .unwrap(),
            Some(ExclusionMatch::Platform(Platform::MacOs))
        );
        assert_eq!(
            ExclusionPolicy::empty()
                .with_platform(Platform::Windows)
                .evaluate("folders", path)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_common_file_tier() {
        let policy = ExclusionPolicy::empty().with_platform(Platform::Other);

        assert!(policy.should_exclude(".git", "/work/project/.git"));
        assert!(policy.should_exclude("Thumbs.db", r"C:\Photos\Thumbs.db"));
        assert!(policy.should_exclude("", "/Volumes/Backups.backupdb/MyTimeMachine"));
        assert!(!policy.should_exclude("notes.txt", "/work/notes.txt"));
    }

    #[test]
    fn test_pattern_tier() {
        let policy = ExclusionPolicy::with_defaults().with_platform(Platform::Other);

        assert_eq!(
            policy
                .evaluate("AppData", r"C:\Users\me\AppData")
                .unwrap(),
            None,
            "pattern needs the trailing separator"
        );
        assert_eq!(
            policy
                .evaluate("Temp", r"C:\Users\me\AppData\Local\Temp")
                .unwrap(),
            Some(ExclusionMatch::Pattern("/appdata/".to_string()))
        );
    }

    #[test]
    fn test_arbitrary_user_folders_are_kept() {
        let policy = ExclusionPolicy::with_defaults();

        assert!(!policy.should_exclude("Vacation Photos", "/home/me/Vacation Photos"));
        assert!(!policy.should_exclude("Vacation Photos", r"C:\Users\me\Vacation Photos"));
    }

    #[test]
    fn test_malformed_input_fails_open() {
        let policy = ExclusionPolicy::with_defaults();

        assert!(policy.evaluate("x", "").is_err());
        assert!(policy.evaluate("x", "/a/\0/b").is_err());
        assert!(!policy.should_exclude("x", ""));
        assert!(!policy.should_exclude("thumbs.db", "/a/\0/thumbs.db"));
    }

    #[test]
    fn test_adding_twice_is_idempotent() {
        let policy = ExclusionPolicy::empty();

        assert!(policy.add_name_exclusion("x"));
        let once = policy.rule_counts();
        assert!(!policy.add_name_exclusion("x"));
        assert!(!policy.add_name_exclusion("X"));

        assert_eq!(policy.rule_counts(), once);
        assert!(policy.should_exclude("x", "/data/x"));
    }

    #[test]
    fn test_system_volume_discovery() {
        let temp_dir = TempDir::new().unwrap();
        let volumes = temp_dir.path().join("Volumes");
        fs::create_dir_all(volumes.join("Data/home")).unwrap();
        fs::create_dir_all(volumes.join("Data/private")).unwrap();
        fs::create_dir_all(volumes.join("Preboot")).unwrap();
        fs::write(volumes.join("not-a-volume"), b"").unwrap();

        let policy = ExclusionPolicy::empty().with_platform(Platform::Other);
        assert_eq!(policy.add_system_volume_exclusions(&volumes), 4);
        assert_eq!(policy.add_system_volume_exclusions(&volumes), 0);

        let preboot = volumes.join("Preboot").join("x");
        assert!(policy.should_exclude_path(&preboot));
        assert!(!policy.should_exclude_path(&volumes.join("not-a-volume")));
    }

    #[test]
    fn test_system_volume_discovery_missing_dir() {
        let policy = ExclusionPolicy::empty();
        assert_eq!(
            policy.add_system_volume_exclusions(Path::new("/nonexistent/volumes/12345")),
            0
        );
    }
}
