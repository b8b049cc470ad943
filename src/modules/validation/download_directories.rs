use crate::modules::provider::Config;
use crate::modules::validation::PostProcessor;
use crate::shared::errors::AppResult;
use crate::log_info;
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;

/// Retention sweep over the weekly download snapshot directories: keeps the
/// configured number of most recent `YYYY-WW` directories and deletes the
/// rest. Anything not matching the weekly naming scheme is left alone.
pub struct DeleteOldDownloadDirectoriesPostProcessor {
    config: Arc<dyn Config>,
}

impl DeleteOldDownloadDirectoriesPostProcessor {
    pub fn new(config: Arc<dyn Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PostProcessor for DeleteOldDownloadDirectoriesPostProcessor {
    fn name(&self) -> &'static str {
        "delete old download directories"
    }

    async fn process(&self) -> AppResult<bool> {
        let downloads_directory = self.config.downloads_directory();
        if !tokio::fs::try_exists(&downloads_directory).await? {
            return Ok(true);
        }

        let week_directory_pattern =
            Regex::new(r"^\d{4}-\d{2}$").expect("week directory pattern must compile");

        let mut weekly_directories = Vec::new();
        let mut dir_entries = tokio::fs::read_dir(&downloads_directory).await?;
        while let Some(dir_entry) = dir_entries.next_entry().await? {
            let path = dir_entry.path();
            if !dir_entry.file_type().await?.is_dir() {
                continue;
            }
            let name = match path.file_name().and_then(|name| name.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            if week_directory_pattern.is_match(&name) {
                weekly_directories.push((name, path));
            }
        }

        // "YYYY-WW" with a zero padded week sorts chronologically.
        weekly_directories.sort_by(|a, b| b.0.cmp(&a.0));

        for (name, path) in weekly_directories
            .into_iter()
            .skip(self.config.keep_download_directories())
        {
            tokio::fs::remove_dir_all(&path).await?;
            log_info!("Deleted old download directory [{}]", name);
        }

        Ok(true)
    }
}
