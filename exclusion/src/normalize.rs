//! Path normalization shared by every rule tier.

/// Canonical separator used by normalized paths.
pub const SEPARATOR: char = '/';

/// Convert every separator to `/` and strip a trailing separator.
///
/// A bare root (`/`) is kept as-is. No filesystem access happens here.
pub fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let trimmed = unified.trim_end_matches(SEPARATOR);
    if trimmed.is_empty() && !unified.is_empty() {
        return SEPARATOR.to_string();
    }
    trimmed.to_string()
}

/// Normalize and case-fold a path for case-insensitive comparison.
pub fn fold(path: &str) -> String {
    normalize(path).to_lowercase()
}

/// Last component of a normalized path.
pub(crate) fn last_component(normalized: &str) -> &str {
    normalized
        .rsplit(SEPARATOR)
        .next()
        .unwrap_or(normalized)
}
