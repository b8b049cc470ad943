use crate::modules::validation::PostProcessor;
use crate::shared::errors::AppResult;
use crate::{log_info, log_warn};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Executes the configured post processors in order.
///
/// Processors run sequentially: they are cheap compared to a crawl cycle
/// and a deterministic order keeps the first reported violation stable.
pub struct PostProcessingRunner {
    post_processors: Vec<Arc<dyn PostProcessor>>,
}

impl PostProcessingRunner {
    pub fn new(post_processors: Vec<Arc<dyn PostProcessor>>) -> Self {
        Self { post_processors }
    }

    pub async fn run(&self) -> AppResult<bool> {
        let started = Instant::now();

        for post_processor in &self.post_processors {
            log_info!("Executing post processor [{}]", post_processor.name());
            if !post_processor.process().await? {
                log_warn!("Post processor [{}] reported failure", post_processor.name());
                return Ok(false);
            }
        }

        log_info!(
            "Executed [{}] post processors in [{}ms]",
            self.post_processors.len(),
            started.elapsed().as_millis()
        );
        Ok(true)
    }
}

#[async_trait]
impl PostProcessor for PostProcessingRunner {
    fn name(&self) -> &'static str {
        "post processing runner"
    }

    async fn process(&self) -> AppResult<bool> {
        self.run().await
    }
}
