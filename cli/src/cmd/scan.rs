use std::path::PathBuf;

use anyhow::Result;
use cfb_exclusion::WalkOptions;
use cfb_gallery::{Catalog, MediaKind, SettingsStore, build_catalog_with, try_build_catalog};

pub fn run(
    store: &SettingsStore,
    dirs: &[PathBuf],
    max_depth: Option<usize>,
    strict: bool,
) -> Result<()> {
    let settings = store.load();
    let policy = settings.exclusion_policy();
    let folders = if dirs.is_empty() {
        settings.monitored_paths()
    } else {
        dirs.to_vec()
    };

    let mut options = WalkOptions::default();
    if let Some(depth) = max_depth {
        options = options.with_max_depth(depth);
    }

    let catalog = if strict {
        try_build_catalog(&folders, &policy, options)?
    } else {
        build_catalog_with(&folders, &policy, options)
    };
    for item in &catalog.items {
        let kind = format!("{:?}", item.kind);
        println!("{kind:<6} {:>12}  {}", item.size, item.path.display());
    }
    print_summary(&catalog);
    Ok(())
}

pub(crate) fn print_summary(catalog: &Catalog) {
    println!(
        "{} items from {} folders: {} images, {} videos, {} designs, {} raw",
        catalog.len(),
        catalog.folders_scanned,
        catalog.count(MediaKind::Image),
        catalog.count(MediaKind::Video),
        catalog.count(MediaKind::Design),
        catalog.count(MediaKind::Raw),
    );
    for missing in &catalog.folders_missing {
        println!("unavailable: {}", missing.display());
    }
}
