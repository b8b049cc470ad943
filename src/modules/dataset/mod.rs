//! Contracts of the dataset and dead entry stores.
//!
//! The dataset writers (JSON, minified JSON, zip) live outside this crate.
//! Post-processing only reads entries and counts back through these seams
//! to cross-check that the exports agree with each other and with the
//! download control state.

use crate::modules::anime::Anime;
use crate::shared::errors::AppResult;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Export formats of the aggregated dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetFileType {
    Json,
    MinifiedJson,
    Zip,
}

impl DatasetFileType {
    pub fn all() -> [DatasetFileType; 3] {
        [
            DatasetFileType::Json,
            DatasetFileType::MinifiedJson,
            DatasetFileType::Zip,
        ]
    }
}

impl fmt::Display for DatasetFileType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DatasetFileType::Json => "json",
            DatasetFileType::MinifiedJson => "minified-json",
            DatasetFileType::Zip => "zip",
        };
        write!(f, "{}", name)
    }
}

/// Read access to the published dataset files.
#[async_trait]
pub trait DatasetFileAccessor: Send + Sync {
    /// All anime records of the current dataset.
    async fn fetch_entries(&self) -> AppResult<Vec<Anime>>;

    /// Location of the dataset export in the given format.
    fn offline_database_file(&self, file_type: DatasetFileType) -> PathBuf;

    /// Number of entries in the export of the given format.
    async fn fetch_entry_count(&self, file_type: DatasetFileType) -> AppResult<usize>;
}

/// Read access to the per-provider dead entry exports, plus the dead entry
/// computation itself.
#[async_trait]
pub trait DeadEntriesAccessor: Send + Sync {
    /// Determine which of the given sources no longer resolve to a valid
    /// anime page on their provider.
    async fn determine_dead_entries(&self, sources: &BTreeSet<Url>) -> AppResult<HashSet<Url>>;

    /// Location of the dead entries export of a provider in the given format.
    fn dead_entries_file(&self, hostname: &str, file_type: DatasetFileType) -> PathBuf;

    /// Number of dead entries in the export of a provider in the given
    /// format.
    async fn fetch_dead_entry_count(
        &self,
        hostname: &str,
        file_type: DatasetFileType,
    ) -> AppResult<usize>;
}
