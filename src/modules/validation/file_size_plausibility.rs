use crate::modules::dataset::{DatasetFileAccessor, DatasetFileType, DeadEntriesAccessor};
use crate::modules::provider::Config;
use crate::modules::validation::PostProcessor;
use crate::shared::errors::{AppError, AppResult};
use crate::log_info;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Sanity check on the compression pipeline: for the same content the zip
/// export can never be larger than the minified JSON, which in turn can
/// never be larger than the pretty-printed JSON.
pub struct FileSizePlausibilityValidationPostProcessor {
    config: Arc<dyn Config>,
    dataset_access: Arc<dyn DatasetFileAccessor>,
    dead_entries_access: Arc<dyn DeadEntriesAccessor>,
}

impl FileSizePlausibilityValidationPostProcessor {
    pub fn new(
        config: Arc<dyn Config>,
        dataset_access: Arc<dyn DatasetFileAccessor>,
        dead_entries_access: Arc<dyn DeadEntriesAccessor>,
    ) -> Self {
        Self {
            config,
            dataset_access,
            dead_entries_access,
        }
    }
}

#[async_trait]
impl PostProcessor for FileSizePlausibilityValidationPostProcessor {
    fn name(&self) -> &'static str {
        "file size plausibility validation"
    }

    async fn process(&self) -> AppResult<bool> {
        let json = file_size(&self.dataset_access.offline_database_file(DatasetFileType::Json))
            .await?;
        let minified = file_size(
            &self
                .dataset_access
                .offline_database_file(DatasetFileType::MinifiedJson),
        )
        .await?;
        let zip =
            file_size(&self.dataset_access.offline_database_file(DatasetFileType::Zip)).await?;

        if !(zip <= minified && minified <= json) {
            return Err(AppError::StateError(format!(
                "File sizes of dataset files are implausible: [json={}, minified-json={}, zip={}].",
                json, minified, zip
            )));
        }

        for provider in self.config.metadata_provider_configs() {
            let hostname = provider.hostname();
            if !self.config.dead_entries_supported(&hostname) {
                continue;
            }

            let json = file_size(
                &self
                    .dead_entries_access
                    .dead_entries_file(&hostname, DatasetFileType::Json),
            )
            .await?;
            let minified = file_size(
                &self
                    .dead_entries_access
                    .dead_entries_file(&hostname, DatasetFileType::MinifiedJson),
            )
            .await?;
            let zip = file_size(
                &self
                    .dead_entries_access
                    .dead_entries_file(&hostname, DatasetFileType::Zip),
            )
            .await?;

            if !(zip <= minified && minified <= json) {
                return Err(AppError::StateError(format!(
                    "File sizes of dead entries files of [{}] are implausible: [json={}, minified-json={}, zip={}].",
                    hostname, json, minified, zip
                )));
            }
        }

        log_info!("File sizes are plausible");
        Ok(true)
    }
}

async fn file_size(path: &Path) -> AppResult<u64> {
    let metadata = tokio::fs::metadata(path).await.map_err(|err| {
        AppError::IoError(format!("Unable to read size of [{}]: {}", path.display(), err))
    })?;
    Ok(metadata.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_support::{StubDatasetAccessor, StubDeadEntriesAccessor, TestAppConfig};

    const HOST: &str = "anime.example.org";

    async fn write_dataset_files(
        dataset: &StubDatasetAccessor,
        json_len: usize,
        minified_len: usize,
        zip_len: usize,
    ) {
        let files = [
            (DatasetFileType::Json, json_len),
            (DatasetFileType::MinifiedJson, minified_len),
            (DatasetFileType::Zip, zip_len),
        ];
        for (file_type, len) in files {
            tokio::fs::write(dataset.offline_database_file(file_type), vec![b'x'; len])
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_passes_for_decreasing_sizes() {
        let temp = tempfile::tempdir().unwrap();
        let config = Arc::new(TestAppConfig::new(temp.path().to_path_buf(), &[HOST]));
        let dataset = StubDatasetAccessor {
            files_root: temp.path().to_path_buf(),
            ..Default::default()
        };
        write_dataset_files(&dataset, 1000, 700, 100).await;

        let validator = FileSizePlausibilityValidationPostProcessor::new(
            config,
            Arc::new(dataset),
            Arc::new(StubDeadEntriesAccessor::default()),
        );
        assert!(validator.process().await.unwrap());
    }

    #[tokio::test]
    async fn test_fails_when_zip_is_larger_than_minified_json() {
        let temp = tempfile::tempdir().unwrap();
        let config = Arc::new(TestAppConfig::new(temp.path().to_path_buf(), &[HOST]));
        let dataset = StubDatasetAccessor {
            files_root: temp.path().to_path_buf(),
            ..Default::default()
        };
        write_dataset_files(&dataset, 1000, 700, 800).await;

        let validator = FileSizePlausibilityValidationPostProcessor::new(
            config,
            Arc::new(dataset),
            Arc::new(StubDeadEntriesAccessor::default()),
        );
        let err = validator.process().await.unwrap_err();

        assert!(err
            .to_string()
            .contains("File sizes of dataset files are implausible"));
        assert!(err.to_string().contains("zip=800"));
    }

    #[tokio::test]
    async fn test_fails_when_a_dataset_file_is_missing() {
        let temp = tempfile::tempdir().unwrap();
        let config = Arc::new(TestAppConfig::new(temp.path().to_path_buf(), &[HOST]));
        let dataset = StubDatasetAccessor {
            files_root: temp.path().to_path_buf(),
            ..Default::default()
        };

        let validator = FileSizePlausibilityValidationPostProcessor::new(
            config,
            Arc::new(dataset),
            Arc::new(StubDeadEntriesAccessor::default()),
        );
        let err = validator.process().await.unwrap_err();

        assert!(err.to_string().contains("Unable to read size of"));
    }
}
