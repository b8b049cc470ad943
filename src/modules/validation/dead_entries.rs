use crate::modules::dataset::{DatasetFileAccessor, DeadEntriesAccessor};
use crate::modules::download_control::DownloadControlStateAccessor;
use crate::modules::merge_lock::MergeLockAccessor;
use crate::modules::validation::{join_sorted, PostProcessor};
use crate::shared::errors::{AppError, AppResult};
use crate::log_info;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use url::Url;

/// Computes the dead entry set over the dataset sources and verifies that
/// neither the download control state, nor the merge locks, nor the dataset
/// itself still reference any of them.
pub struct DeadEntriesValidationPostProcessor {
    dcs_access: Arc<dyn DownloadControlStateAccessor>,
    merge_lock_access: Arc<dyn MergeLockAccessor>,
    dead_entries_access: Arc<dyn DeadEntriesAccessor>,
    dataset_access: Arc<dyn DatasetFileAccessor>,
}

impl DeadEntriesValidationPostProcessor {
    pub fn new(
        dcs_access: Arc<dyn DownloadControlStateAccessor>,
        merge_lock_access: Arc<dyn MergeLockAccessor>,
        dead_entries_access: Arc<dyn DeadEntriesAccessor>,
        dataset_access: Arc<dyn DatasetFileAccessor>,
    ) -> Self {
        Self {
            dcs_access,
            merge_lock_access,
            dead_entries_access,
            dataset_access,
        }
    }
}

#[async_trait]
impl PostProcessor for DeadEntriesValidationPostProcessor {
    fn name(&self) -> &'static str {
        "dead entries validation"
    }

    async fn process(&self) -> AppResult<bool> {
        let dataset_sources: BTreeSet<Url> = self
            .dataset_access
            .fetch_entries()
            .await?
            .into_iter()
            .flat_map(|anime| anime.sources)
            .collect();

        let dead_entries = self
            .dead_entries_access
            .determine_dead_entries(&dataset_sources)
            .await?;
        if dead_entries.is_empty() {
            log_info!("No dead entries among [{}] sources", dataset_sources.len());
            return Ok(true);
        }

        let dcs_anime = self.dcs_access.all_anime().await?;
        let dead_in_dcs: Vec<&Url> = dcs_anime
            .iter()
            .flat_map(|anime| anime.sources.iter())
            .filter(|source| dead_entries.contains(*source))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if !dead_in_dcs.is_empty() {
            return Err(AppError::StateError(format!(
                "Found dead entries in DCS entries: [{}].",
                join_sorted(dead_in_dcs)
            )));
        }

        let merge_lock_sources = self
            .merge_lock_access
            .all_sources_in_all_merge_lock_entries()
            .await?;
        let dead_in_merge_locks: Vec<&Url> = merge_lock_sources
            .iter()
            .filter(|source| dead_entries.contains(*source))
            .collect();
        if !dead_in_merge_locks.is_empty() {
            return Err(AppError::StateError(format!(
                "Found dead entries in merge locks: [{}].",
                join_sorted(dead_in_merge_locks)
            )));
        }

        let dead_in_dataset: Vec<&Url> = dataset_sources
            .iter()
            .filter(|source| dead_entries.contains(*source))
            .collect();
        if !dead_in_dataset.is_empty() {
            return Err(AppError::StateError(format!(
                "Found dead entries in dataset: [{}].",
                join_sorted(dead_in_dataset)
            )));
        }

        Ok(true)
    }
}
