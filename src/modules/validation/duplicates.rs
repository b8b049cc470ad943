use crate::modules::dataset::DatasetFileAccessor;
use crate::modules::download_control::DownloadControlStateAccessor;
use crate::modules::validation::{join_sorted, PostProcessor};
use crate::shared::errors::{AppError, AppResult};
use crate::log_info;
use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Ensures that neither the download control state nor the dataset contain
/// duplicates: no two equal DCS entries, no two equal anime records, and no
/// source URI claimed by two dataset records.
pub struct DuplicatesValidationPostProcessor {
    dcs_access: Arc<dyn DownloadControlStateAccessor>,
    dataset_access: Arc<dyn DatasetFileAccessor>,
}

impl DuplicatesValidationPostProcessor {
    pub fn new(
        dcs_access: Arc<dyn DownloadControlStateAccessor>,
        dataset_access: Arc<dyn DatasetFileAccessor>,
    ) -> Self {
        Self {
            dcs_access,
            dataset_access,
        }
    }
}

#[async_trait]
impl PostProcessor for DuplicatesValidationPostProcessor {
    fn name(&self) -> &'static str {
        "duplicates validation"
    }

    async fn process(&self) -> AppResult<bool> {
        let dcs_entries = self.dcs_access.all_dcs_entries().await?;
        if dcs_entries.is_empty() {
            return Err(AppError::StateError("No DCS entries found.".to_string()));
        }

        let duplicate_entries = duplicates_of(dcs_entries.iter());
        if !duplicate_entries.is_empty() {
            let offenders = duplicate_entries
                .into_iter()
                .map(|entry| join_sorted(entry.anime().sources.iter()));
            return Err(AppError::StateError(format!(
                "Found duplicate DCS entries: [{}].",
                join_sorted(offenders)
            )));
        }

        let duplicate_anime = duplicates_of(dcs_entries.iter().map(|entry| entry.anime()));
        if !duplicate_anime.is_empty() {
            let offenders = duplicate_anime
                .into_iter()
                .map(|anime| join_sorted(anime.sources.iter()));
            return Err(AppError::StateError(format!(
                "Found duplicate anime in DCS entries: [{}].",
                join_sorted(offenders)
            )));
        }

        let dataset = self.dataset_access.fetch_entries().await?;
        if dataset.is_empty() {
            return Err(AppError::StateError(
                "Dataset doesn't contain any entries.".to_string(),
            ));
        }

        let duplicate_dataset_anime = duplicates_of(dataset.iter());
        if !duplicate_dataset_anime.is_empty() {
            let offenders = duplicate_dataset_anime
                .into_iter()
                .map(|anime| join_sorted(anime.sources.iter()));
            return Err(AppError::StateError(format!(
                "Found duplicate anime in dataset: [{}].",
                join_sorted(offenders)
            )));
        }

        let duplicate_sources =
            duplicates_of(dataset.iter().flat_map(|anime| anime.sources.iter()));
        if !duplicate_sources.is_empty() {
            return Err(AppError::StateError(format!(
                "Found sources claimed by multiple dataset entries: [{}].",
                join_sorted(duplicate_sources)
            )));
        }

        log_info!(
            "No duplicates across [{}] DCS entries and [{}] dataset entries",
            dcs_entries.len(),
            dataset.len()
        );
        Ok(true)
    }
}

fn duplicates_of<T: Eq + Hash>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut counts: HashMap<T, usize> = HashMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(item, _)| item)
        .collect()
}
