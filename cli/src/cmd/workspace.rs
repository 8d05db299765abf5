use anyhow::Result;
use cfb_gallery::SettingsStore;

use crate::WorkspaceCommand;

pub fn run(store: &SettingsStore, command: WorkspaceCommand) -> Result<()> {
    let mut settings = store.load();

    match command {
        WorkspaceCommand::List => {
            if settings.workspaces.is_empty() {
                println!("No saved workspaces");
            }
            for workspace in &settings.workspaces {
                println!(
                    "{}  ({} folders)",
                    workspace.name,
                    workspace.monitored_folders.len()
                );
            }
        }
        WorkspaceCommand::Save { name } => {
            settings.save_workspace(&name)?;
            store.save(&settings)?;
            println!(
                "Saved workspace {name} with {} folders",
                settings.monitored_folders.len()
            );
        }
        WorkspaceCommand::Load { name } => {
            let count = settings.load_workspace(&name)?.monitored_folders.len();
            store.save(&settings)?;
            println!("Loaded workspace {name}: monitoring {count} folders");
        }
    }
    Ok(())
}
