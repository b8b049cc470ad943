use crate::modules::anime::Anime;
use crate::modules::dataset::DatasetFileAccessor;
use crate::modules::download_control::DownloadControlStateAccessor;
use crate::modules::provider::{Config, CONVERTED_FILE_SUFFIX};
use crate::modules::validation::{join_sorted, PostProcessor};
use crate::shared::errors::{AppError, AppResult};
use crate::log_info;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use url::Url;

/// Cross-checks the three places a source URI can live: the converted files
/// of the current run, the download control state, and the published
/// dataset.
///
/// Hostnames on the ignore list are exempt from the dataset comparison.
/// Those providers are merge-only: their sources enter the dataset through
/// merging but are never crawled, so they have no DCS entries by design.
pub struct SourcesConsistencyValidationPostProcessor {
    config: Arc<dyn Config>,
    dcs_access: Arc<dyn DownloadControlStateAccessor>,
    dataset_access: Arc<dyn DatasetFileAccessor>,
    ignored_hostnames: BTreeSet<String>,
}

impl SourcesConsistencyValidationPostProcessor {
    pub fn new(
        config: Arc<dyn Config>,
        dcs_access: Arc<dyn DownloadControlStateAccessor>,
        dataset_access: Arc<dyn DatasetFileAccessor>,
        ignored_hostnames: Vec<String>,
    ) -> Self {
        Self {
            config,
            dcs_access,
            dataset_access,
            ignored_hostnames: ignored_hostnames.into_iter().collect(),
        }
    }

    async fn converted_file_sources(&self) -> AppResult<BTreeSet<Url>> {
        let mut sources = BTreeSet::new();

        for provider in self.config.metadata_provider_configs() {
            let working_dir = self.config.working_dir(&provider.hostname());
            if !tokio::fs::try_exists(&working_dir).await? {
                continue;
            }

            let mut dir_entries = tokio::fs::read_dir(&working_dir).await?;
            while let Some(dir_entry) = dir_entries.next_entry().await? {
                let path = dir_entry.path();
                let is_converted_file = path
                    .extension()
                    .and_then(|extension| extension.to_str())
                    .map_or(false, |extension| extension == CONVERTED_FILE_SUFFIX);
                if !is_converted_file {
                    continue;
                }

                let content = tokio::fs::read_to_string(&path).await?;
                let anime: Anime = serde_json::from_str(&content).map_err(|err| {
                    AppError::SerializationError(format!(
                        "Unable to parse converted file [{}]: {}",
                        path.display(),
                        err
                    ))
                })?;
                sources.extend(anime.sources);
            }
        }

        Ok(sources)
    }

    fn is_ignored(&self, source: &Url) -> bool {
        source
            .host_str()
            .map_or(false, |host| self.ignored_hostnames.contains(host))
    }
}

#[async_trait]
impl PostProcessor for SourcesConsistencyValidationPostProcessor {
    fn name(&self) -> &'static str {
        "sources consistency validation"
    }

    async fn process(&self) -> AppResult<bool> {
        let converted_sources = self.converted_file_sources().await?;
        if converted_sources.is_empty() {
            return Err(AppError::StateError(
                "No sources found in converted files.".to_string(),
            ));
        }

        let dcs_sources: BTreeSet<Url> = self
            .dcs_access
            .all_anime()
            .await?
            .into_iter()
            .flat_map(|anime| anime.sources)
            .collect();
        if dcs_sources.is_empty() {
            return Err(AppError::StateError(
                "No sources found in DCS entries.".to_string(),
            ));
        }

        let missing_in_dcs: Vec<&Url> = converted_sources.difference(&dcs_sources).collect();
        if !missing_in_dcs.is_empty() {
            return Err(AppError::StateError(format!(
                "Found sources in converted files which are missing in DCS entries: [{}].",
                join_sorted(missing_in_dcs)
            )));
        }

        let dataset_sources: BTreeSet<Url> = self
            .dataset_access
            .fetch_entries()
            .await?
            .into_iter()
            .flat_map(|anime| anime.sources)
            .filter(|source| !self.is_ignored(source))
            .collect();
        if dataset_sources.is_empty() {
            return Err(AppError::StateError(
                "No sources found in dataset.".to_string(),
            ));
        }

        let comparable_dcs_sources: BTreeSet<Url> = dcs_sources
            .into_iter()
            .filter(|source| !self.is_ignored(source))
            .collect();
        let diverging: Vec<&Url> = dataset_sources
            .symmetric_difference(&comparable_dcs_sources)
            .collect();
        if !diverging.is_empty() {
            return Err(AppError::StateError(format!(
                "Sources in dataset and DCS entries differ: [{}].",
                join_sorted(diverging)
            )));
        }

        log_info!(
            "Sources are consistent across [{}] converted files, DCS and dataset",
            converted_sources.len()
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::download_control::{
        DownloadControlStateAccessorImpl, DownloadControlStateEntry, WeekOfYear,
    };
    use crate::shared::test_support::{
        anime_with_source, source_url, RecordingMergeLockAccessor, StubDatasetAccessor,
        TestAppConfig,
    };

    const HOST: &str = "anime.example.org";

    async fn write_converted_file(config: &TestAppConfig, anime: &Anime, anime_id: &str) {
        let working_dir = config.working_dir(HOST);
        tokio::fs::create_dir_all(&working_dir).await.unwrap();
        tokio::fs::write(
            working_dir.join(format!("{}.{}", anime_id, CONVERTED_FILE_SUFFIX)),
            serde_json::to_string(anime).unwrap(),
        )
        .await
        .unwrap();
    }

    fn entry_for(anime: Anime) -> DownloadControlStateEntry {
        DownloadControlStateEntry::new(
            0,
            WeekOfYear::new(2024, 11).unwrap(),
            WeekOfYear::new(2024, 12).unwrap(),
            anime,
        )
    }

    #[tokio::test]
    async fn test_fails_without_converted_files() {
        let temp = tempfile::tempdir().unwrap();
        let config = Arc::new(TestAppConfig::new(temp.path().to_path_buf(), &[HOST]));
        let accessor = Arc::new(DownloadControlStateAccessorImpl::new(
            config.clone(),
            Arc::new(RecordingMergeLockAccessor::default()),
        ));
        let dataset = Arc::new(StubDatasetAccessor::default());

        let validator = SourcesConsistencyValidationPostProcessor::new(
            config,
            accessor,
            dataset,
            Vec::new(),
        );
        let err = validator.process().await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "State error: No sources found in converted files."
        );
    }

    #[tokio::test]
    async fn test_fails_when_converted_source_is_missing_in_dcs() {
        let temp = tempfile::tempdir().unwrap();
        let config = Arc::new(TestAppConfig::new(temp.path().to_path_buf(), &[HOST]));
        let accessor = Arc::new(DownloadControlStateAccessorImpl::new(
            config.clone(),
            Arc::new(RecordingMergeLockAccessor::default()),
        ));

        let known = anime_with_source("Monster", HOST, "19");
        accessor
            .create_or_update(HOST, "19", entry_for(known.clone()))
            .await
            .unwrap();
        write_converted_file(&config, &known, "19").await;

        let unknown = anime_with_source("Pluto", HOST, "99");
        write_converted_file(&config, &unknown, "99").await;

        let dataset = Arc::new(StubDatasetAccessor {
            entries: vec![known],
            ..Default::default()
        });

        let validator = SourcesConsistencyValidationPostProcessor::new(
            config,
            accessor,
            dataset,
            Vec::new(),
        );
        let err = validator.process().await.unwrap_err();

        assert!(err
            .to_string()
            .contains("missing in DCS entries"));
        assert!(err.to_string().contains("anime/99"));
    }

    #[tokio::test]
    async fn test_ignored_hostnames_are_exempt_from_dataset_comparison() {
        let temp = tempfile::tempdir().unwrap();
        let config = Arc::new(TestAppConfig::new(temp.path().to_path_buf(), &[HOST]));
        let accessor = Arc::new(DownloadControlStateAccessorImpl::new(
            config.clone(),
            Arc::new(RecordingMergeLockAccessor::default()),
        ));

        let crawled = anime_with_source("Monster", HOST, "19");
        accessor
            .create_or_update(HOST, "19", entry_for(crawled.clone()))
            .await
            .unwrap();
        write_converted_file(&config, &crawled, "19").await;

        // The dataset record additionally carries a source of a merge-only
        // provider without DCS entries.
        let mut merged = crawled.clone();
        merged
            .sources
            .insert(source_url("mergeonly.example.com", "monster-19"));
        let dataset = Arc::new(StubDatasetAccessor {
            entries: vec![merged],
            ..Default::default()
        });

        let failing = SourcesConsistencyValidationPostProcessor::new(
            config.clone(),
            accessor.clone(),
            dataset.clone(),
            Vec::new(),
        );
        assert!(failing.process().await.is_err());

        let exempted = SourcesConsistencyValidationPostProcessor::new(
            config,
            accessor,
            dataset,
            vec!["mergeonly.example.com".to_string()],
        );
        assert!(exempted.process().await.unwrap());
    }
}
