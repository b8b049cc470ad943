//! Plain implementations of the collaborator traits, constructed per test.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use shuukan::modules::merge_lock::MergeLockAccessor;
use shuukan::modules::provider::{Config, MetaDataProviderConfig};
use shuukan::shared::clock::Clock;
use shuukan::shared::errors::AppResult;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use url::Url;

pub struct TestProviderConfig {
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

pub struct TestAppConfig {
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
pub struct RecordingMergeLockAccessor {
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

pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Noon on the Monday of the given ISO week.
    pub fn in_week(year: i32, week: u32) -> Self {
        let monday = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .expect("test week must be a valid ISO week");
        let noon = NaiveTime::from_hms_opt(12, 0, 0).expect("valid time");
        Self(Utc.from_utc_datetime(&monday.and_time(noon)))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
