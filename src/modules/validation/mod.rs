//! Post-processing checks gating publication of a finished run.
//!
//! Every check is an independent [`PostProcessor`]. Violations surface as
//! [`crate::shared::AppError::StateError`] with a precise, deterministic
//! message listing the offending identifiers; these messages are the audit
//! trail, so they are stable and sorted.

pub mod dead_entries;
pub mod download_directories;
pub mod duplicates;
pub mod file_size_plausibility;
pub mod lock_files;
pub mod number_of_entries;
pub mod release_info;
pub mod runner;
pub mod sources_consistency;
pub mod weeks;

pub use dead_entries::DeadEntriesValidationPostProcessor;
pub use download_directories::DeleteOldDownloadDirectoriesPostProcessor;
pub use duplicates::DuplicatesValidationPostProcessor;
pub use file_size_plausibility::FileSizePlausibilityValidationPostProcessor;
pub use lock_files::NoLockFilesLeftValidationPostProcessor;
pub use number_of_entries::NumberOfEntriesValidationPostProcessor;
pub use release_info::ReleaseInfoFileCreatorPostProcessor;
pub use runner::PostProcessingRunner;
pub use sources_consistency::SourcesConsistencyValidationPostProcessor;
pub use weeks::WeeksValidationPostProcessor;

use crate::shared::errors::AppResult;
use async_trait::async_trait;
use std::fmt;

/// A single post-processing step. `process` returns `true` on success;
/// invariant violations are raised as errors, not encoded in the return
/// value, so that failures are distinguishable by message.
#[async_trait]
pub trait PostProcessor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn process(&self) -> AppResult<bool>;
}

/// Deterministic rendering of offender lists for error messages.
pub(crate) fn join_sorted<T: fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    let mut rendered: Vec<String> = items.into_iter().map(|item| item.to_string()).collect();
    rendered.sort();
    rendered.join(", ")
}
