use crate::modules::download_control::accessor::DownloadControlStateAccessor;
use crate::modules::download_control::week_of_year::WeekOfYear;
use crate::modules::provider::DOWNLOAD_CONTROL_STATE_FILE_SUFFIX;
use crate::shared::clock::Clock;
use crate::shared::errors::{AppError, AppResult};
use crate::log_debug;
use futures::future;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Partitions the existing entries of a provider into those due for
/// re-download this week and those explicitly excluded from it.
///
/// Crawlers fetch the first set and skip the second during pagination-based
/// discovery, so entries in back-off aren't re-fetched early.
pub struct DownloadControlStateScheduler {
    dcs_access: Arc<dyn DownloadControlStateAccessor>,
    clock: Arc<dyn Clock>,
}

/// Minimal view of a DCS file. Only the scheduling field is needed here, so
/// files are read directly instead of paying for the accessor's full index.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleView {
    next_download: WeekOfYear,
}

impl DownloadControlStateScheduler {
    pub fn new(dcs_access: Arc<dyn DownloadControlStateAccessor>, clock: Arc<dyn Clock>) -> Self {
        Self { dcs_access, clock }
    }

    /// IDs of all entries due this week or earlier.
    pub async fn find_entries_scheduled_for_current_week(
        &self,
        hostname: &str,
    ) -> AppResult<HashSet<String>> {
        let current_week = WeekOfYear::current_week(self.clock.as_ref());
        let scheduled = self
            .schedule_views(hostname)
            .await?
            .into_iter()
            .filter(|(_, next_download)| *next_download <= current_week)
            .map(|(anime_id, _)| anime_id)
            .collect::<HashSet<_>>();

        log_debug!(
            "Found [{}] entries of [{}] scheduled for [{}]",
            scheduled.len(),
            hostname,
            current_week
        );
        Ok(scheduled)
    }

    /// IDs of all entries in back-off, the complement of
    /// [`Self::find_entries_scheduled_for_current_week`] within the
    /// existing entries.
    pub async fn find_entries_not_scheduled_for_current_week(
        &self,
        hostname: &str,
    ) -> AppResult<HashSet<String>> {
        let current_week = WeekOfYear::current_week(self.clock.as_ref());
        Ok(self
            .schedule_views(hostname)
            .await?
            .into_iter()
            .filter(|(_, next_download)| *next_download > current_week)
            .map(|(anime_id, _)| anime_id)
            .collect())
    }

    async fn schedule_views(&self, hostname: &str) -> AppResult<Vec<(String, WeekOfYear)>> {
        let directory = self
            .dcs_access
            .download_control_state_directory(hostname)
            .await?;

        let mut paths = Vec::new();
        let mut dir_entries = tokio::fs::read_dir(&directory).await?;
        while let Some(dir_entry) = dir_entries.next_entry().await? {
            let path = dir_entry.path();
            let is_dcs_file = path
                .extension()
                .and_then(|extension| extension.to_str())
                .map_or(false, |extension| {
                    extension == DOWNLOAD_CONTROL_STATE_FILE_SUFFIX
                });
            if is_dcs_file {
                paths.push(path);
            }
        }

        future::try_join_all(paths.into_iter().map(|path| async move {
            let anime_id = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    AppError::InvalidInput(format!(
                        "Unable to derive an ID from [{}].",
                        path.display()
                    ))
                })?;

            let content = tokio::fs::read_to_string(&path).await?;
            let view: ScheduleView = serde_json::from_str(&content).map_err(|err| {
                AppError::SerializationError(format!(
                    "Unable to parse DCS file [{}]: {}",
                    path.display(),
                    err
                ))
            })?;

            Ok((anime_id, view.next_download))
        }))
        .await
    }
}
