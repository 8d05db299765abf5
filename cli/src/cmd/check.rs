use std::path::{Path, PathBuf};

use anyhow::Result;
use cfb_exclusion::{ExclusionMatch, ExclusionPolicy};
use cfb_gallery::SettingsStore;

/// Verdict for one path.
#[derive(Debug, PartialEq, Eq)]
pub enum Verdict {
    Included,
    Excluded(ExclusionMatch),
    /// Evaluation failed; enumeration would include the path.
    Failed(String),
}

pub fn run(store: &SettingsStore, paths: &[PathBuf], name: Option<&str>) -> Result<()> {
    let policy = store.load().exclusion_policy();
    let counts = policy.rule_counts();
    println!(
        "Rules: {} exact paths, {} names, {} patterns ({:?} heuristics)",
        counts.exact_paths,
        counts.names,
        counts.patterns,
        policy.platform()
    );

    for path in paths {
        match verdict(&policy, path, name) {
            Verdict::Included => println!("included  {}", path.display()),
            Verdict::Excluded(hit) => println!("excluded  {}  ({hit})", path.display()),
            Verdict::Failed(e) => println!("included  {}  (evaluation failed: {e})", path.display()),
        }
    }
    Ok(())
}

/// Evaluate `path`. Without `name` the policy derives it from the path.
pub fn verdict(policy: &ExclusionPolicy, path: &Path, name: Option<&str>) -> Verdict {
    match policy.evaluate(name.unwrap_or_default(), &path.to_string_lossy()) {
        Ok(Some(hit)) => Verdict::Excluded(hit),
        Ok(None) => Verdict::Included,
        Err(e) => Verdict::Failed(e.to_string()),
    }
}
