use std::path::Path;

use anyhow::{Result, bail};
use cfb_gallery::SettingsStore;

use crate::FoldersCommand;

pub fn run(store: &SettingsStore, command: FoldersCommand) -> Result<()> {
    match command {
        FoldersCommand::List => list(store),
        FoldersCommand::Add { path } => {
            if add(store, &path)? {
                println!("Monitoring {}", path.display());
            } else {
                println!("Already monitored: {}", path.display());
            }
            Ok(())
        }
        FoldersCommand::Remove { path } => {
            if remove(store, &path)? {
                println!("No longer monitoring {}", path.display());
            } else {
                println!("Not monitored: {}", path.display());
            }
            Ok(())
        }
    }
}

fn list(store: &SettingsStore) -> Result<()> {
    let settings = store.load();
    if settings.monitored_folders.is_empty() {
        println!("No monitored folders");
        return Ok(());
    }

    for folder in &settings.monitored_folders {
        if Path::new(folder).is_dir() {
            println!("{folder}");
        } else {
            println!("{folder}  (unavailable)");
        }
    }
    Ok(())
}

/// Add an existing directory to the monitored folders. Returns `false` if
/// it was already monitored.
pub fn add(store: &SettingsStore, path: &Path) -> Result<bool> {
    let path = std::path::absolute(path)?;
    if !path.is_dir() {
        bail!("{} is not a directory", path.display());
    }

    let mut settings = store.load();
    if !settings.add_monitored_folder(&path.to_string_lossy()) {
        return Ok(false);
    }
    store.save(&settings)?;
    Ok(true)
}

/// Remove a monitored folder, matching either the given or absolute form.
pub fn remove(store: &SettingsStore, path: &Path) -> Result<bool> {
    let mut settings = store.load();
    let mut removed = settings.remove_monitored_folder(&path.to_string_lossy());
    if let Ok(absolute) = std::path::absolute(path) {
        removed |= settings.remove_monitored_folder(&absolute.to_string_lossy());
    }

    if removed {
        store.save(&settings)?;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_add_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = SettingsStore::new(temp_dir.path().join("appsettings.json"));
        let photos = temp_dir.path().join("photos");
        std::fs::create_dir(&photos).unwrap();

        assert!(add(&store, &photos).unwrap());
        assert!(!add(&store, &photos).unwrap());
        assert!(add(&store, &photos.join("missing")).is_err());
        assert_eq!(store.load().monitored_paths(), vec![photos.clone()]);

        assert!(remove(&store, &photos).unwrap());
        assert!(!remove(&store, &photos).unwrap());
        assert!(store.load().monitored_folders.is_empty());
    }
}
