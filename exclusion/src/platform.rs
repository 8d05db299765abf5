//! Operating-system specific exclusion heuristics.

/// Host operating system family, as far as exclusion is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// macOS.
    MacOs,
    /// Windows.
    Windows,
    /// Linux.
    Linux,
    /// Anything else (no platform rules).
    Other,
}

const MACOS_PREFIXES: &[&str] = &["/system/", "/private/", "/dev/", "/bin/", "/sbin/"];
const MACOS_MARKERS: &[&str] = &["/system/volumes/data", "timemachine"];

const WINDOWS_MARKERS: &[&str] = &[
    "/windows/",
    "/system32/",
    "/system volume information",
    "/$recycle.bin",
];

const LINUX_VIRTUAL_ROOTS: &[&str] = &["/proc", "/sys", "/dev"];

impl Platform {
    /// Platform the process is running on.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }

    /// Check a folded, normalized path against this platform's heuristics.
    pub fn matches(self, folded: &str) -> bool {
        match self {
            Self::MacOs => {
                MACOS_PREFIXES.iter().any(|p| folded.starts_with(p))
                    || MACOS_MARKERS.iter().any(|m| folded.contains(m))
            }
            Self::Windows => WINDOWS_MARKERS.iter().any(|m| folded.contains(m)),
            Self::Linux => LINUX_VIRTUAL_ROOTS.iter().any(|root| {
                folded == *root
                    || folded
                        .strip_prefix(root)
                        .is_some_and(|rest| rest.starts_with('/'))
            }),
            Self::Other => false,
        }
    }
}
