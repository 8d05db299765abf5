//! End-to-end: filesystem change -> debounced signal -> rebuilt catalog.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cfb_exclusion::{ExclusionPolicy, Platform};
use cfb_folder_watcher::{FolderWatchManager, WatchConfig};
use cfb_gallery::{Catalog, MediaKind, Settings, SettingsStore, follow_folders, refresh_loop};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::timeout;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_change_rebuilds_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let folders = vec![temp_dir.path().to_path_buf()];

    let manager = FolderWatchManager::new(WatchConfig::new().with_debounce(Duration::from_millis(200)))
        .unwrap();
    let summary = manager.set_watched_folders(&folders);
    assert_eq!(summary.watched.len(), 1);

    let policy = Arc::new(ExclusionPolicy::empty().with_platform(Platform::Other));
    let (tx, mut rx) = mpsc::channel(4);
    let task = tokio::spawn(refresh_loop(
        manager.subscribe(),
        Arc::new(folders),
        policy,
        tx,
    ));

    fs::create_dir(temp_dir.path().join("shoot")).unwrap();
    fs::write(temp_dir.path().join("shoot/frame.mov"), b"mov").unwrap();
    fs::write(temp_dir.path().join("shoot/readme.txt"), b"txt").unwrap();

    let catalog = timeout(Duration::from_secs(10), rx.recv())
        .await
        .unwrap()
        .unwrap();
    let names: Vec<PathBuf> = catalog.items.iter().map(|i| i.path.clone()).collect();
    assert_eq!(names, vec![temp_dir.path().join("shoot/frame.mov")]);
    assert_eq!(catalog.count(MediaKind::Video), 1);

    drop(manager);
    let delivered = timeout(Duration::from_secs(10), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(delivered >= 1);
}

async fn next_catalog_where(
    rx: &mut mpsc::Receiver<Catalog>,
    predicate: impl Fn(&Catalog) -> bool,
) -> Catalog {
    timeout(Duration::from_secs(10), async {
        loop {
            let catalog = rx.recv().await.unwrap();
            if predicate(&catalog) {
                return catalog;
            }
        }
    })
    .await
    .unwrap()
}

fn has_item(catalog: &Catalog, name: &str) -> bool {
    catalog.items.iter().any(|item| item.name == name)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_follow_tracks_edits_to_monitored_folders() {
    let library = TempDir::new().unwrap();
    let config = TempDir::new().unwrap();
    let a = library.path().join("a");
    let b = library.path().join("b");
    fs::create_dir(&a).unwrap();
    fs::create_dir(&b).unwrap();

    let store = SettingsStore::new(config.path().join("appsettings.json"));
    let mut settings = Settings {
        debounce_ms: 200,
        ..Settings::default()
    };
    settings.add_monitored_folder(&a.to_string_lossy());
    store.save(&settings).unwrap();

    let manager = Arc::new(settings.watch_manager().unwrap());
    let policy = Arc::new(ExclusionPolicy::empty().with_platform(Platform::Other));
    let (tx, mut rx) = mpsc::channel(8);
    let task = tokio::spawn(follow_folders(
        Arc::clone(&manager),
        Arc::new(store.clone()),
        policy,
        tx,
    ));

    let initial = next_catalog_where(&mut rx, |_| true).await;
    assert!(initial.is_empty());
    assert_eq!(
        manager.watched_folders(),
        vec![a.clone(), config.path().to_path_buf()]
    );

    // Adding a folder to the settings is itself a change.
    settings.add_monitored_folder(&b.to_string_lossy());
    store.save(&settings).unwrap();
    next_catalog_where(&mut rx, |c| c.folders_scanned == 2).await;
    assert!(manager.watched_folders().contains(&b));

    // The new folder is watched, not just rescanned.
    fs::write(b.join("new.png"), b"png").unwrap();
    let catalog = next_catalog_where(&mut rx, |c| has_item(c, "new.png")).await;
    assert_eq!(catalog.count(MediaKind::Image), 1);

    settings.remove_monitored_folder(&a.to_string_lossy());
    store.save(&settings).unwrap();
    next_catalog_where(&mut rx, |c| c.folders_scanned == 1).await;
    assert!(!manager.watched_folders().contains(&a));

    drop(rx);
    let delivered = timeout(Duration::from_secs(10), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(delivered >= 4);
}
