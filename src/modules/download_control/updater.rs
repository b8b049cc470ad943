use crate::modules::anime::Anime;
use crate::modules::download_control::accessor::DownloadControlStateAccessor;
use crate::modules::download_control::entry::DownloadControlStateEntry;
use crate::modules::download_control::week_of_year::WeekOfYear;
use crate::modules::provider::{Config, MetaDataProviderConfig, CONVERTED_FILE_SUFFIX};
use crate::shared::clock::Clock;
use crate::shared::errors::{AppError, AppResult};
use crate::{log_debug, log_info, log_warn};
use std::path::Path;
use std::sync::Arc;

/// A provider where at least this percentage of the processed entries came
/// back with changed content is considered broken: either the site was
/// restructured or a converter extracts garbage. Publishing such a run
/// would poison the dataset.
const CHANGE_PERCENTAGE_THRESHOLD: u32 = 50;

/// Reconciles freshly converted records into the download control state.
///
/// For every `.conv` file in a provider's working directory the updater
/// either updates the existing entry, migrates it first if the provider
/// reassigned the anime's ID, or creates a new entry for a first sighting.
pub struct DownloadControlStateUpdater {
    config: Arc<dyn Config>,
    dcs_access: Arc<dyn DownloadControlStateAccessor>,
    clock: Arc<dyn Clock>,
}

#[derive(Debug, Default)]
struct ProviderRunStats {
    processed: u32,
    changed: u32,
}

impl ProviderRunStats {
    fn change_percentage(&self) -> u32 {
        if self.processed == 0 {
            0
        } else {
            self.changed * 100 / self.processed
        }
    }
}

impl DownloadControlStateUpdater {
    pub fn new(
        config: Arc<dyn Config>,
        dcs_access: Arc<dyn DownloadControlStateAccessor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            dcs_access,
            clock,
        }
    }

    /// Run the reconciliation for every configured provider.
    ///
    /// Scan-time failures abort immediately. The extraction-problem check
    /// runs only after all providers have been scanned, so one provider's
    /// anomaly doesn't hide another's.
    pub async fn update_all(&self) -> AppResult<()> {
        let current_week = WeekOfYear::current_week(self.clock.as_ref());
        let mut suspicious = Vec::new();

        for provider in self.config.metadata_provider_configs() {
            let hostname = provider.hostname();
            let stats = self
                .update_provider(provider.as_ref(), &hostname, current_week)
                .await?;

            log_info!(
                "Updated [{}] DCS entries of [{}], [{}] with changed content",
                stats.processed,
                hostname,
                stats.changed
            );

            if stats.processed > 0 && stats.change_percentage() >= CHANGE_PERCENTAGE_THRESHOLD {
                suspicious.push(format!("{}={}%", hostname, stats.change_percentage()));
            }
        }

        if !suspicious.is_empty() {
            return Err(AppError::StateError(format!(
                "Possibly found a problem in the extraction process. Please check these metadata providers: [{}].",
                suspicious.join(", ")
            )));
        }

        Ok(())
    }

    async fn update_provider(
        &self,
        provider: &dyn MetaDataProviderConfig,
        hostname: &str,
        current_week: WeekOfYear,
    ) -> AppResult<ProviderRunStats> {
        let working_dir = self.config.working_dir(hostname);
        let mut stats = ProviderRunStats::default();

        if !tokio::fs::try_exists(&working_dir).await? {
            log_debug!("No working directory for [{}], nothing to update", hostname);
            return Ok(stats);
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

            let anime = parse_converted_file(&path).await?;
            let downloaded_id = file_stem_of(&path)?;
            let anime_id = self
                .resolve_id_change(provider, hostname, &path, &downloaded_id, &anime)
                .await?;

            if self.dcs_access.dcs_entry_exists(hostname, &anime_id).await? {
                let existing = self.dcs_access.dcs_entry(hostname, &anime_id).await?;
                let content_changed = existing.anime() != &anime;
                let updated = existing.update(anime, current_week);
                self.dcs_access
                    .create_or_update(hostname, &anime_id, updated)
                    .await?;
                if content_changed {
                    stats.changed += 1;
                }
            } else {
                let entry = DownloadControlStateEntry::new_entry(anime, current_week);
                self.dcs_access
                    .create_or_update(hostname, &anime_id, entry)
                    .await?;
                log_debug!("Created new DCS entry [{}] of [{}]", anime_id, hostname);
            }

            stats.processed += 1;
        }

        Ok(stats)
    }

    /// The downloaded file is named after the ID the crawler requested; the
    /// record's own source URI carries the ID the provider answered with.
    /// When they differ, the provider reassigned the entry's ID and the
    /// persisted state has to be migrated before the update.
    async fn resolve_id_change(
        &self,
        provider: &dyn MetaDataProviderConfig,
        hostname: &str,
        path: &Path,
        downloaded_id: &str,
        anime: &Anime,
    ) -> AppResult<String> {
        let source = anime.source_of(hostname).ok_or_else(|| {
            AppError::ConsistencyError(format!(
                "Converted file [{}] of [{}] doesn't contain a source of its own metadata provider.",
                file_name_of(path),
                hostname
            ))
        })?;
        let source_id = provider.extract_anime_id(source)?;

        if source_id == downloaded_id {
            return Ok(source_id);
        }

        if !self.config.can_change_anime_ids(hostname) {
            return Err(AppError::StateError(format!(
                "Detected ID change for metadata provider [{}] which doesn't support changing IDs: [{}] -> [{}].",
                hostname, downloaded_id, source_id
            )));
        }

        log_warn!(
            "Detected ID change on [{}]: [{}] -> [{}]",
            hostname,
            downloaded_id,
            source_id
        );

        if self
            .dcs_access
            .dcs_entry_exists(hostname, downloaded_id)
            .await?
        {
            self.dcs_access
                .change_id(downloaded_id, &source_id, hostname)
                .await?;
        }

        Ok(source_id)
    }
}

async fn parse_converted_file(path: &Path) -> AppResult<Anime> {
    let content = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&content).map_err(|err| {
        AppError::SerializationError(format!(
            "Unable to parse converted file [{}]: {}",
            path.display(),
            err
        ))
    })
}

fn file_stem_of(path: &Path) -> AppResult<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::InvalidInput(format!("Unable to derive an ID from [{}].", path.display()))
        })
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string()
}
