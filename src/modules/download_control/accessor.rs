use crate::modules::anime::Anime;
use crate::modules::download_control::entry::DownloadControlStateEntry;
use crate::modules::merge_lock::MergeLockAccessor;
use crate::modules::provider::{
    Config, MetaDataProviderConfig, CONVERTED_FILE_SUFFIX, DOWNLOAD_CONTROL_STATE_FILE_SUFFIX,
};
use crate::shared::errors::{AppError, AppResult};
use crate::{log_debug, log_info};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Owner of the on-disk download control state.
///
/// This is the only component allowed to write DCS files. Everything else
/// reads through it.
#[async_trait]
pub trait DownloadControlStateAccessor: Send + Sync {
    /// Directory containing the DCS files of the given provider, created on
    /// first use.
    async fn download_control_state_directory(&self, hostname: &str) -> AppResult<PathBuf>;

    /// Every persisted entry across all configured providers.
    async fn all_dcs_entries(&self) -> AppResult<Vec<DownloadControlStateEntry>>;

    /// Every persisted entry of a single provider.
    async fn all_dcs_entries_of(&self, hostname: &str)
        -> AppResult<Vec<DownloadControlStateEntry>>;

    /// The anime records of every persisted entry.
    async fn all_anime(&self) -> AppResult<Vec<Anime>>;

    /// The anime records of every persisted entry of a single provider.
    async fn all_anime_of(&self, hostname: &str) -> AppResult<Vec<Anime>>;

    async fn dcs_entry_exists(&self, hostname: &str, anime_id: &str) -> AppResult<bool>;

    async fn dcs_entry(&self, hostname: &str, anime_id: &str)
        -> AppResult<DownloadControlStateEntry>;

    /// Persist an entry. Returns `false` without touching the disk when the
    /// entry is identical to what is already stored.
    async fn create_or_update(
        &self,
        hostname: &str,
        anime_id: &str,
        entry: DownloadControlStateEntry,
    ) -> AppResult<bool>;

    /// Remove the entry of an anime that no longer exists on its provider,
    /// including its membership in any merge lock group. Calling this for a
    /// non-existing entry is a no-op apart from the merge lock check.
    async fn remove_dead_entry(&self, hostname: &str, anime_id: &str) -> AppResult<()>;

    /// Migrate an entry whose provider reassigned its ID. Moves the DCS
    /// file, removes orphaned raw and converted files of the old ID, and
    /// rewrites the merge lock membership. Returns the new DCS file.
    async fn change_id(&self, old_id: &str, new_id: &str, hostname: &str) -> AppResult<PathBuf>;
}

type EntryIndex = DashMap<String, DashMap<String, DownloadControlStateEntry>>;

pub struct DownloadControlStateAccessorImpl {
    config: Arc<dyn Config>,
    merge_lock_access: Arc<dyn MergeLockAccessor>,
    directories: OnceCell<HashMap<String, PathBuf>>,
    index: OnceCell<EntryIndex>,
}

impl DownloadControlStateAccessorImpl {
    pub fn new(config: Arc<dyn Config>, merge_lock_access: Arc<dyn MergeLockAccessor>) -> Self {
        Self {
            config,
            merge_lock_access,
            directories: OnceCell::new(),
            index: OnceCell::new(),
        }
    }

    /// Single-flight creation of the per-provider directories. Runs at most
    /// once per accessor instance, even under concurrent first use.
    async fn directories(&self) -> AppResult<&HashMap<String, PathBuf>> {
        self.directories
            .get_or_try_init(|| async {
                let root = self.config.download_control_state_directory();
                let mut directories = HashMap::new();

                for provider in self.config.metadata_provider_configs() {
                    let hostname = provider.hostname();
                    let directory = root.join(&hostname);
                    tokio::fs::create_dir_all(&directory).await?;
                    directories.insert(hostname, directory);
                }

                log_debug!(
                    "Initialized download control state directories for [{}] providers",
                    directories.len()
                );
                Ok(directories)
            })
            .await
    }

    async fn directory(&self, hostname: &str) -> AppResult<PathBuf> {
        self.directories()
            .await?
            .get(hostname)
            .cloned()
            .ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "Metadata provider [{}] is not configured.",
                    hostname
                ))
            })
    }

    /// Single-flight load of every persisted entry into the in-memory
    /// index. Only entry-reading operations trigger this; directory lookups
    /// don't pay for it.
    async fn index(&self) -> AppResult<&EntryIndex> {
        self.index
            .get_or_try_init(|| async {
                let index = EntryIndex::new();
                let mut total = 0usize;

                for provider in self.config.metadata_provider_configs() {
                    let hostname = provider.hostname();
                    let directory = self.directory(&hostname).await?;
                    let entries = DashMap::new();

                    let mut dir_entries = tokio::fs::read_dir(&directory).await?;
                    while let Some(dir_entry) = dir_entries.next_entry().await? {
                        let path = dir_entry.path();
                        if extension_of(&path) != Some(DOWNLOAD_CONTROL_STATE_FILE_SUFFIX) {
                            continue;
                        }

                        let entry = parse_entry_file(&path).await?;
                        let anime_id = file_stem_of(&path)?;
                        verify_filename_matches_source(provider.as_ref(), &path, &anime_id, &entry)?;

                        entries.insert(anime_id, entry);
                        total += 1;
                    }

                    index.insert(hostname, entries);
                }

                log_info!("Loaded [{}] download control state entries", total);
                Ok(index)
            })
            .await
    }

    fn provider_entries<'a>(
        index: &'a EntryIndex,
        hostname: &str,
    ) -> AppResult<dashmap::mapref::one::Ref<'a, String, DashMap<String, DownloadControlStateEntry>>>
    {
        index.get(hostname).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Metadata provider [{}] is not configured.",
                hostname
            ))
        })
    }

    fn dcs_file(directory: &Path, anime_id: &str) -> PathBuf {
        directory.join(format!("{}.{}", anime_id, DOWNLOAD_CONTROL_STATE_FILE_SUFFIX))
    }
}

#[async_trait]
impl DownloadControlStateAccessor for DownloadControlStateAccessorImpl {
    async fn download_control_state_directory(&self, hostname: &str) -> AppResult<PathBuf> {
        self.directory(hostname).await
    }

    async fn all_dcs_entries(&self) -> AppResult<Vec<DownloadControlStateEntry>> {
        let index = self.index().await?;
        Ok(index
            .iter()
            .flat_map(|provider_entries| {
                provider_entries
                    .value()
                    .iter()
                    .map(|entry| entry.value().clone())
                    .collect::<Vec<_>>()
            })
            .collect())
    }

    async fn all_dcs_entries_of(
        &self,
        hostname: &str,
    ) -> AppResult<Vec<DownloadControlStateEntry>> {
        let index = self.index().await?;
        let entries = Self::provider_entries(index, hostname)?;
        Ok(entries.iter().map(|entry| entry.value().clone()).collect())
    }

    async fn all_anime(&self) -> AppResult<Vec<Anime>> {
        Ok(self
            .all_dcs_entries()
            .await?
            .into_iter()
            .map(|entry| entry.anime().clone())
            .collect())
    }

    async fn all_anime_of(&self, hostname: &str) -> AppResult<Vec<Anime>> {
        Ok(self
            .all_dcs_entries_of(hostname)
            .await?
            .into_iter()
            .map(|entry| entry.anime().clone())
            .collect())
    }

    async fn dcs_entry_exists(&self, hostname: &str, anime_id: &str) -> AppResult<bool> {
        let index = self.index().await?;
        let entries = Self::provider_entries(index, hostname)?;
        Ok(entries.contains_key(anime_id))
    }

    async fn dcs_entry(
        &self,
        hostname: &str,
        anime_id: &str,
    ) -> AppResult<DownloadControlStateEntry> {
        let index = self.index().await?;
        let entries = Self::provider_entries(index, hostname)?;
        entries
            .get(anime_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Unable to find DCS file [{}] of [{}].",
                    anime_id, hostname
                ))
            })
    }

    async fn create_or_update(
        &self,
        hostname: &str,
        anime_id: &str,
        entry: DownloadControlStateEntry,
    ) -> AppResult<bool> {
        let directory = self.directory(hostname).await?;
        let index = self.index().await?;

        let unchanged = Self::provider_entries(index, hostname)?
            .get(anime_id)
            .map_or(false, |existing| *existing == entry);
        if unchanged {
            log_debug!(
                "Skipping write of unchanged DCS entry [{}] of [{}]",
                anime_id,
                hostname
            );
            return Ok(false);
        }

        let file = Self::dcs_file(&directory, anime_id);
        let json = serde_json::to_string_pretty(&entry)?;
        tokio::fs::write(&file, json).await?;
        Self::provider_entries(index, hostname)?.insert(anime_id.to_string(), entry);

        log_debug!("Saved DCS entry [{}] of [{}]", anime_id, hostname);
        Ok(true)
    }

    async fn remove_dead_entry(&self, hostname: &str, anime_id: &str) -> AppResult<()> {
        let directory = self.directory(hostname).await?;
        let index = self.index().await?;
        let entries = Self::provider_entries(index, hostname)?;
        entries.remove(anime_id);
        drop(entries);

        let file = Self::dcs_file(&directory, anime_id);
        if tokio::fs::try_exists(&file).await? {
            tokio::fs::remove_file(&file).await?;
            log_info!("Removed dead DCS entry [{}] of [{}]", anime_id, hostname);
        }

        let provider = self.config.find_metadata_provider_config(hostname)?;
        let link = provider.build_anime_link(anime_id);
        if self.merge_lock_access.is_part_of_merge_lock(&link).await? {
            self.merge_lock_access.remove_entry(&link).await?;
            log_info!("Removed [{}] from its merge lock", link);
        }

        Ok(())
    }

    async fn change_id(&self, old_id: &str, new_id: &str, hostname: &str) -> AppResult<PathBuf> {
        if !self.config.can_change_anime_ids(hostname) {
            return Err(AppError::InvalidInput(format!(
                "Metadata provider [{}] doesn't support changing IDs.",
                hostname
            )));
        }

        let directory = self.directory(hostname).await?;
        let index = self.index().await?;

        let old_file = Self::dcs_file(&directory, old_id);
        if !tokio::fs::try_exists(&old_file).await? {
            return Err(AppError::StateError(format!(
                "DCS file [{}] of [{}] doesn't exist.",
                old_id, hostname
            )));
        }

        // Last write wins if an entry already exists under the new ID.
        let new_file = Self::dcs_file(&directory, new_id);
        if tokio::fs::try_exists(&new_file).await? {
            tokio::fs::remove_file(&new_file).await?;
        }
        tokio::fs::rename(&old_file, &new_file).await?;

        let entries = Self::provider_entries(index, hostname)?;
        if let Some((_, entry)) = entries.remove(old_id) {
            entries.insert(new_id.to_string(), entry);
        }
        drop(entries);

        // Raw and converted files of the old ID are orphaned now. Files of
        // the new ID stay untouched.
        let provider = self.config.find_metadata_provider_config(hostname)?;
        let working_dir = self.config.working_dir(hostname);
        for suffix in [provider.file_suffix(), CONVERTED_FILE_SUFFIX.to_string()] {
            let orphan = working_dir.join(format!("{}.{}", old_id, suffix));
            if tokio::fs::try_exists(&orphan).await? {
                tokio::fs::remove_file(&orphan).await?;
            }
        }

        let old_uri = provider.build_anime_link(old_id);
        if self.merge_lock_access.is_part_of_merge_lock(&old_uri).await? {
            let new_uri = provider.build_anime_link(new_id);
            self.merge_lock_access.replace_uri(&old_uri, &new_uri).await?;
        }

        log_info!(
            "Changed ID of DCS entry [{}] to [{}] for [{}]",
            old_id,
            new_id,
            hostname
        );
        Ok(new_file)
    }
}

async fn parse_entry_file(path: &Path) -> AppResult<DownloadControlStateEntry> {
    let content = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&content).map_err(|err| {
        AppError::SerializationError(format!(
            "Unable to parse DCS file [{}]: {}",
            path.display(),
            err
        ))
    })
}

fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|extension| extension.to_str())
}

fn file_stem_of(path: &Path) -> AppResult<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::InvalidInput(format!("Unable to derive an ID from [{}].", path.display()))
        })
}

/// The file name is the entry's identity. It must match the ID embedded in
/// the record's own source URI, otherwise the storage has been corrupted or
/// tampered with.
fn verify_filename_matches_source(
    provider: &dyn MetaDataProviderConfig,
    path: &Path,
    anime_id: &str,
    entry: &DownloadControlStateEntry,
) -> AppResult<()> {
    let hostname = provider.hostname();
    let matches = match entry.anime().source_of(&hostname) {
        Some(source) => provider.extract_anime_id(source)? == anime_id,
        None => false,
    };

    if matches {
        Ok(())
    } else {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        Err(AppError::ConsistencyError(format!(
            "Filename and id don't match for [{}] of [{}].",
            file_name, hostname
        )))
    }
}
