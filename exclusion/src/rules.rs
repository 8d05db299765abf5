//! Exclusion rule tiers.

use std::collections::HashSet;

use crate::normalize::{SEPARATOR, fold};

/// Folder and file names excluded wherever they appear.
const DEFAULT_NAMES: &[&str] = &[
    "security",
    "system",
    "timemachine",
    "$recycle.bin",
    "system volume information",
    "pagefile.sys",
    "hiberfil.sys",
    "swapfile.sys",
    "thumbs.db",
    ".DS_Store",
    "__MACOSX",
];

/// Substrings that exclude any path containing them.
const DEFAULT_PATTERNS: &[&str] = &[
    "/private/",
    "/System/",
    "/Library/TimeMachine",
    r"\Windows\",
    r"\Program Files\WindowsApps\",
    r"\AppData\",
];

/// Paths excluded together with everything below them.
const DEFAULT_EXACT_PATHS: &[&str] = &[
    "/System/Volumes/Data",
    "/System/Volumes/Preboot",
    "/System/Volumes/VM",
    "/System/Volumes/Update",
    "/private/var/vm",
];

/// The configurable rule tiers of an exclusion policy.
///
/// Every entry is stored normalized and case-folded, so lookups are
/// case-insensitive and separator-agnostic. Tiers only grow.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRuleSet {
    exact_paths: HashSet<String>,
    names: HashSet<String>,
    patterns: Vec<String>,
}

impl ExclusionRuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a rule set populated with the built-in defaults.
    pub fn defaults() -> Self {
        let mut rules = Self::new();
        for path in DEFAULT_EXACT_PATHS {
            rules.add_exact_path(path);
        }
        for name in DEFAULT_NAMES {
            rules.add_name(name);
        }
        for pattern in DEFAULT_PATTERNS {
            rules.add_pattern(pattern);
        }
        rules
    }

    /// Add an exact path. Returns `false` if it was already present.
    pub fn add_exact_path(&mut self, path: &str) -> bool {
        let folded = fold(path);
        if folded.is_empty() {
            return false;
        }
        self.exact_paths.insert(folded)
    }

    /// Add a bare folder or file name. Returns `false` if it was already present.
    pub fn add_name(&mut self, name: &str) -> bool {
        let folded = name.trim().to_lowercase();
        if folded.is_empty() {
            return false;
        }
        self.names.insert(folded)
    }

    /// Add a substring pattern. Returns `false` if it was already present.
    ///
    /// Separators inside the pattern are unified but a trailing separator
    /// is kept, since `/private/` and `/private` match different paths.
    pub fn add_pattern(&mut self, pattern: &str) -> bool {
        let folded = pattern.replace('\\', "/").to_lowercase();
        if folded.is_empty() || self.patterns.contains(&folded) {
            return false;
        }
        self.patterns.push(folded);
        true
    }

    /// Matching exact path, if `folded` equals one or lies below one.
    pub fn match_exact_path(&self, folded: &str) -> Option<&str> {
        if let Some(hit) = self.exact_paths.get(folded) {
            return Some(hit.as_str());
        }
        self.exact_paths
            .iter()
            .find(|exact| is_descendant(folded, exact))
            .map(String::as_str)
    }

    /// Whether `name` is an excluded name.
    pub fn matches_name(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }

    /// Matching substring pattern, if any.
    pub fn match_pattern(&self, folded: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|pattern| folded.contains(pattern.as_str()))
            .map(String::as_str)
    }

    /// Number of rules in each tier.
    pub fn counts(&self) -> RuleCounts {
        RuleCounts {
            exact_paths: self.exact_paths.len(),
            names: self.names.len(),
            patterns: self.patterns.len(),
        }
    }
}

fn is_descendant(folded: &str, ancestor: &str) -> bool {
    if ancestor == "/" {
        return folded.starts_with(SEPARATOR) && folded.len() > 1;
    }
    folded
        .strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with(SEPARATOR))
}

/// Size of each rule tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleCounts {
    /// Exact path rules.
    pub exact_paths: usize,
    /// Name rules.
    pub names: usize,
    /// Substring pattern rules.
    pub patterns: usize,
}
