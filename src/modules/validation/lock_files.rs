use crate::modules::provider::{Config, LOCK_FILE_SUFFIX};
use crate::modules::validation::{join_sorted, PostProcessor};
use crate::shared::errors::{AppError, AppResult};
use crate::log_info;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reconciliation runs guard themselves with `.lock` marker files. A marker
/// surviving until post-processing means a run crashed midway and the state
/// on disk may be transiently inconsistent.
pub struct NoLockFilesLeftValidationPostProcessor {
    config: Arc<dyn Config>,
}

impl NoLockFilesLeftValidationPostProcessor {
    pub fn new(config: Arc<dyn Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PostProcessor for NoLockFilesLeftValidationPostProcessor {
    fn name(&self) -> &'static str {
        "no lock files left validation"
    }

    async fn process(&self) -> AppResult<bool> {
        let mut leftovers = Vec::new();

        for provider in self.config.metadata_provider_configs() {
            let hostname = provider.hostname();
            let dcs_directory = self
                .config
                .download_control_state_directory()
                .join(&hostname);

            collect_lock_files(&self.config.working_dir(&hostname), &mut leftovers).await?;
            collect_lock_files(&dcs_directory, &mut leftovers).await?;
        }

        if !leftovers.is_empty() {
            return Err(AppError::StateError(format!(
                "Found leftover lock files: [{}].",
                join_sorted(leftovers.iter().map(|path| path.display().to_string()))
            )));
        }

        log_info!("No leftover lock files");
        Ok(true)
    }
}

async fn collect_lock_files(directory: &Path, leftovers: &mut Vec<PathBuf>) -> AppResult<()> {
    if !tokio::fs::try_exists(directory).await? {
        return Ok(());
    }

    let mut dir_entries = tokio::fs::read_dir(directory).await?;
    while let Some(dir_entry) = dir_entries.next_entry().await? {
        let path = dir_entry.path();
        let is_lock_file = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map_or(false, |extension| extension == LOCK_FILE_SUFFIX);
        if is_lock_file {
            leftovers.push(path);
        }
    }

    Ok(())
}
