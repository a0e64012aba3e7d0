//! Project discovery.

use std::io::ErrorKind;

use tokio::fs;

use crate::{Config, LauncherError, RunDir};

/// List known projects.
///
/// Entries of the deployed-packages directory come first, sorted by name,
/// followed by the keys of the `[settings]` table. A missing directory or table
/// contributes nothing. Duplicates are kept.
pub async fn project_list(config: &Config, run_dir: &RunDir) -> Result<Vec<String>, LauncherError> {
    let eggs_dir = run_dir.resolve(config.eggs_dir());

    let mut projects = match fs::read_dir(&eggs_dir).await {
        Ok(mut entries) => {
            let mut names = Vec::new();
            while let Some(entry) = entries.next_entry().await? {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
            names.sort();
            names
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("Packages directory {:?} does not exist", eggs_dir);
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };

    projects.extend(config.settings_keys());
    Ok(projects)
}
