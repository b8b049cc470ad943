use crate::modules::dataset::{DatasetFileAccessor, DatasetFileType, DeadEntriesAccessor};
use crate::modules::provider::Config;
use crate::modules::validation::PostProcessor;
use crate::shared::errors::{AppError, AppResult};
use crate::log_info;
use async_trait::async_trait;
use std::sync::Arc;

/// The dataset is exported in three formats which must all contain the same
/// number of entries; likewise for each provider's dead entry exports. A
/// mismatch means one of the writers failed silently.
pub struct NumberOfEntriesValidationPostProcessor {
    config: Arc<dyn Config>,
    dataset_access: Arc<dyn DatasetFileAccessor>,
    dead_entries_access: Arc<dyn DeadEntriesAccessor>,
}

impl NumberOfEntriesValidationPostProcessor {
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
impl PostProcessor for NumberOfEntriesValidationPostProcessor {
    fn name(&self) -> &'static str {
        "number of entries validation"
    }

    async fn process(&self) -> AppResult<bool> {
        let mut dataset_counts = Vec::new();
        for file_type in DatasetFileType::all() {
            let count = self.dataset_access.fetch_entry_count(file_type).await?;
            dataset_counts.push((file_type, count));
        }

        if !all_equal(&dataset_counts) {
            return Err(AppError::StateError(format!(
                "Number of dataset entries differs between file types: [{}].",
                render(&dataset_counts)
            )));
        }

        for provider in self.config.metadata_provider_configs() {
            let hostname = provider.hostname();
            if !self.config.dead_entries_supported(&hostname) {
                continue;
            }

            let mut dead_entry_counts = Vec::new();
            for file_type in DatasetFileType::all() {
                let count = self
                    .dead_entries_access
                    .fetch_dead_entry_count(&hostname, file_type)
                    .await?;
                dead_entry_counts.push((file_type, count));
            }

            if !all_equal(&dead_entry_counts) {
                return Err(AppError::StateError(format!(
                    "Number of dead entries differs between file types for [{}]: [{}].",
                    hostname,
                    render(&dead_entry_counts)
                )));
            }
        }

        log_info!("Entry counts agree across all file types");
        Ok(true)
    }
}

fn all_equal(counts: &[(DatasetFileType, usize)]) -> bool {
    counts.windows(2).all(|pair| pair[0].1 == pair[1].1)
}

fn render(counts: &[(DatasetFileType, usize)]) -> String {
    counts
        .iter()
        .map(|(file_type, count)| format!("{}={}", file_type, count))
        .collect::<Vec<_>>()
        .join(", ")
}
