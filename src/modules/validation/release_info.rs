use crate::modules::download_control::WeekOfYear;
use crate::modules::provider::Config;
use crate::modules::validation::PostProcessor;
use crate::shared::clock::Clock;
use crate::shared::errors::AppResult;
use crate::log_info;
use async_trait::async_trait;
use std::sync::Arc;

/// Name of the marker file recording the week of the last successful run.
pub const RELEASE_INFO_FILE_NAME: &str = "week.release";

/// Writes the `week.release` marker into the output directory after a
/// successful run. Downstream tooling reads it to tell which weekly
/// snapshot the published dataset belongs to.
pub struct ReleaseInfoFileCreatorPostProcessor {
    config: Arc<dyn Config>,
    clock: Arc<dyn Clock>,
}

impl ReleaseInfoFileCreatorPostProcessor {
    pub fn new(config: Arc<dyn Config>, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }
}

#[async_trait]
impl PostProcessor for ReleaseInfoFileCreatorPostProcessor {
    fn name(&self) -> &'static str {
        "release info file creator"
    }

    async fn process(&self) -> AppResult<bool> {
        let current_week = WeekOfYear::current_week(self.clock.as_ref());
        let output_directory = self.config.output_directory();
        tokio::fs::create_dir_all(&output_directory).await?;

        let file = output_directory.join(RELEASE_INFO_FILE_NAME);
        tokio::fs::write(&file, current_week.to_string()).await?;

        log_info!("Created release info file for [{}]", current_week);
        Ok(true)
    }
}
