use crate::modules::download_control::{DownloadControlStateAccessor, WeekOfYear};
use crate::modules::validation::{join_sorted, PostProcessor};
use crate::shared::clock::Clock;
use crate::shared::errors::{AppError, AppResult};
use crate::log_info;
use async_trait::async_trait;
use std::sync::Arc;

/// After a finished run every entry must be scheduled in the future and
/// none may claim to have been downloaded in the future. Anything else
/// means an entry was skipped or the state was written with a broken clock.
pub struct WeeksValidationPostProcessor {
    dcs_access: Arc<dyn DownloadControlStateAccessor>,
    clock: Arc<dyn Clock>,
}

impl WeeksValidationPostProcessor {
    pub fn new(dcs_access: Arc<dyn DownloadControlStateAccessor>, clock: Arc<dyn Clock>) -> Self {
        Self { dcs_access, clock }
    }
}

#[async_trait]
impl PostProcessor for WeeksValidationPostProcessor {
    fn name(&self) -> &'static str {
        "weeks validation"
    }

    async fn process(&self) -> AppResult<bool> {
        let current_week = WeekOfYear::current_week(self.clock.as_ref());
        let entries = self.dcs_access.all_dcs_entries().await?;

        let scheduled_in_past: Vec<String> = entries
            .iter()
            .filter(|entry| entry.next_download() <= current_week)
            .map(|entry| join_sorted(entry.anime().sources.iter()))
            .collect();
        if !scheduled_in_past.is_empty() {
            return Err(AppError::StateError(format!(
                "Found entries scheduled for the current week or in the past: [{}].",
                join_sorted(scheduled_in_past)
            )));
        }

        let downloaded_in_future: Vec<String> = entries
            .iter()
            .filter(|entry| entry.last_downloaded() > current_week)
            .map(|entry| join_sorted(entry.anime().sources.iter()))
            .collect();
        if !downloaded_in_future.is_empty() {
            return Err(AppError::StateError(format!(
                "Found entries downloaded in the future: [{}].",
                join_sorted(downloaded_in_future)
            )));
        }

        log_info!("Schedule of [{}] entries is plausible", entries.len());
        Ok(true)
    }
}
