use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use cfb_exclusion::ExclusionPolicy;
use cfb_folder_watcher::FolderWatchManager;
use cfb_gallery::{FolderSource, SettingsStore, follow_folders};
use tokio::sync::mpsc;
use tracing::info;

use super::scan::print_summary;

/// Watch folders until Ctrl-C, printing a catalog summary up front and
/// after every debounced change.
///
/// With no `folders` the monitored folders are followed: the settings
/// document is watched too, and folders added or removed while running
/// join or leave the watched set.
pub async fn run(store: SettingsStore, folders: Vec<PathBuf>, debounce_ms: Option<u64>) -> Result<()> {
    let mut settings = store.load();
    if let Some(ms) = debounce_ms {
        settings.debounce_ms = ms;
    }
    let manager = Arc::new(settings.watch_manager()?);
    let policy = Arc::new(settings.exclusion_policy());

    if folders.is_empty() {
        watch(manager, Arc::new(store), policy).await
    } else {
        watch(manager, Arc::new(folders), policy).await
    }
}

async fn watch<S: FolderSource>(
    manager: Arc<FolderWatchManager>,
    source: Arc<S>,
    policy: Arc<ExclusionPolicy>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(4);
    let follow = tokio::spawn(follow_folders(Arc::clone(&manager), source, policy, tx));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            next = rx.recv() => match next {
                Some(catalog) => print_summary(&catalog),
                None => break,
            },
        }
    }

    drop(rx);
    let catalogs = follow.await??;
    manager.stop_all();
    info!("Stopped watching after {catalogs} catalogs");
    Ok(())
}
