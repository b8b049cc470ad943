//! Shared fixtures for unit tests: plain implementations of the
//! collaborator traits, constructed per test.

use crate::modules::anime::{Anime, AnimeStatus, AnimeType};
use crate::modules::dataset::{DatasetFileAccessor, DatasetFileType, DeadEntriesAccessor};
use crate::modules::merge_lock::MergeLockAccessor;
use crate::modules::provider::{Config, MetaDataProviderConfig};
use crate::shared::clock::Clock;
use crate::shared::errors::AppResult;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use url::Url;

pub(crate) struct TestProviderConfig {
    pub hostname: String,
    pub file_suffix: String,
}

impl TestProviderConfig {
    pub fn new(hostname: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            file_suffix: "html".to_string(),
        }
    }
}

impl MetaDataProviderConfig for TestProviderConfig {
    fn hostname(&self) -> String {
        self.hostname.clone()
    }

    fn build_anime_link(&self, anime_id: &str) -> Url {
        Url::parse(&format!("https://{}/anime/{}", self.hostname, anime_id))
            .expect("test link must parse")
    }

    fn file_suffix(&self) -> String {
        self.file_suffix.clone()
    }
}

pub(crate) struct TestAppConfig {
    pub root: PathBuf,
    pub providers: Vec<Arc<dyn MetaDataProviderConfig>>,
    pub id_change_hostnames: HashSet<String>,
    pub dead_entries_hostnames: HashSet<String>,
    pub keep_download_directories: usize,
}

impl TestAppConfig {
    pub fn new(root: PathBuf, hostnames: &[&str]) -> Self {
        Self {
            root,
            providers: hostnames
                .iter()
                .map(|hostname| {
                    Arc::new(TestProviderConfig::new(hostname)) as Arc<dyn MetaDataProviderConfig>
                })
                .collect(),
            id_change_hostnames: HashSet::new(),
            dead_entries_hostnames: HashSet::new(),
            keep_download_directories: 2,
        }
    }

    pub fn with_id_changes(mut self, hostname: &str) -> Self {
        self.id_change_hostnames.insert(hostname.to_string());
        self
    }
}

impl Config for TestAppConfig {
    fn download_control_state_directory(&self) -> PathBuf {
        self.root.join("dcs")
    }

    fn downloads_directory(&self) -> PathBuf {
        self.root.join("downloads")
    }

    fn output_directory(&self) -> PathBuf {
        self.root.join("output")
    }

    fn working_dir(&self, hostname: &str) -> PathBuf {
        self.root.join("workingdir").join(hostname)
    }

    fn metadata_provider_configs(&self) -> Vec<Arc<dyn MetaDataProviderConfig>> {
        self.providers.clone()
    }

    fn can_change_anime_ids(&self, hostname: &str) -> bool {
        self.id_change_hostnames.contains(hostname)
    }

    fn dead_entries_supported(&self, hostname: &str) -> bool {
        self.dead_entries_hostnames.contains(hostname)
    }

    fn keep_download_directories(&self) -> usize {
        self.keep_download_directories
    }
}

/// Merge lock double recording every mutation it receives.
#[derive(Default)]
pub(crate) struct RecordingMergeLockAccessor {
    pub locks: Mutex<HashSet<Url>>,
    pub removed: Mutex<Vec<Url>>,
    pub replaced: Mutex<Vec<(Url, Url)>>,
}

impl RecordingMergeLockAccessor {
    pub fn with_locked(uris: Vec<Url>) -> Self {
        Self {
            locks: Mutex::new(uris.into_iter().collect()),
            removed: Mutex::new(Vec::new()),
            replaced: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MergeLockAccessor for RecordingMergeLockAccessor {
    async fn is_part_of_merge_lock(&self, uri: &Url) -> AppResult<bool> {
        Ok(self.locks.lock().expect("lock poisoned").contains(uri))
    }

    async fn remove_entry(&self, uri: &Url) -> AppResult<()> {
        self.locks.lock().expect("lock poisoned").remove(uri);
        self.removed.lock().expect("lock poisoned").push(uri.clone());
        Ok(())
    }

    async fn replace_uri(&self, old_uri: &Url, new_uri: &Url) -> AppResult<()> {
        let mut locks = self.locks.lock().expect("lock poisoned");
        locks.remove(old_uri);
        locks.insert(new_uri.clone());
        self.replaced
            .lock()
            .expect("lock poisoned")
            .push((old_uri.clone(), new_uri.clone()));
        Ok(())
    }

    async fn all_sources_in_all_merge_lock_entries(&self) -> AppResult<HashSet<Url>> {
        Ok(self.locks.lock().expect("lock poisoned").clone())
    }
}

pub(crate) struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// 2024-03-11, the Monday of ISO week 2024-11.
    pub fn in_week_2024_11() -> Self {
        Self(Utc.with_ymd_and_hms(2024, 3, 11, 12, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Dataset double serving preset entries and counts.
#[derive(Default)]
pub(crate) struct StubDatasetAccessor {
    pub entries: Vec<Anime>,
    pub files_root: PathBuf,
    pub counts: HashMap<DatasetFileType, usize>,
}

#[async_trait]
impl DatasetFileAccessor for StubDatasetAccessor {
    async fn fetch_entries(&self) -> AppResult<Vec<Anime>> {
        Ok(self.entries.clone())
    }

    fn offline_database_file(&self, file_type: DatasetFileType) -> PathBuf {
        let file_name = match file_type {
            DatasetFileType::Json => "dataset.json",
            DatasetFileType::MinifiedJson => "dataset-minified.json",
            DatasetFileType::Zip => "dataset.zip",
        };
        self.files_root.join(file_name)
    }

    async fn fetch_entry_count(&self, file_type: DatasetFileType) -> AppResult<usize> {
        Ok(self
            .counts
            .get(&file_type)
            .copied()
            .unwrap_or(self.entries.len()))
    }
}

/// Dead entries double with a preset dead set and per-format counts.
#[derive(Default)]
pub(crate) struct StubDeadEntriesAccessor {
    pub dead: HashSet<Url>,
    pub files_root: PathBuf,
    pub counts: HashMap<(String, DatasetFileType), usize>,
}

#[async_trait]
impl DeadEntriesAccessor for StubDeadEntriesAccessor {
    async fn determine_dead_entries(&self, sources: &BTreeSet<Url>) -> AppResult<HashSet<Url>> {
        Ok(sources
            .iter()
            .filter(|source| self.dead.contains(source))
            .cloned()
            .collect())
    }

    fn dead_entries_file(&self, hostname: &str, file_type: DatasetFileType) -> PathBuf {
        let extension = match file_type {
            DatasetFileType::Json => "json",
            DatasetFileType::MinifiedJson => "min.json",
            DatasetFileType::Zip => "zip",
        };
        self.files_root
            .join(format!("{}-dead-entries.{}", hostname, extension))
    }

    async fn fetch_dead_entry_count(
        &self,
        hostname: &str,
        file_type: DatasetFileType,
    ) -> AppResult<usize> {
        Ok(self
            .counts
            .get(&(hostname.to_string(), file_type))
            .copied()
            .unwrap_or_default())
    }
}

pub(crate) fn source_url(hostname: &str, anime_id: &str) -> Url {
    Url::parse(&format!("https://{}/anime/{}", hostname, anime_id)).expect("test url must parse")
}

pub(crate) fn anime_with_source(title: &str, hostname: &str, anime_id: &str) -> Anime {
    Anime::new(title)
        .with_sources(vec![source_url(hostname, anime_id)])
        .with_type(AnimeType::Tv)
        .with_status(AnimeStatus::Finished)
        .with_episodes(12)
}
