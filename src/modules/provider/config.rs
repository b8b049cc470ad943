use crate::shared::errors::{AppError, AppResult};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// File suffix of a persisted download control state entry.
pub const DOWNLOAD_CONTROL_STATE_FILE_SUFFIX: &str = "dcs";

/// File suffix of a converted metadata record in a provider's working
/// directory.
pub const CONVERTED_FILE_SUFFIX: &str = "conv";

/// File suffix of the marker files guarding a reconciliation run.
pub const LOCK_FILE_SUFFIX: &str = "lock";

/// Per-provider configuration for a single metadata provider.
///
/// One implementation exists per supported site. Everything the download
/// control state needs to know about a provider goes through this seam:
/// how its anime links look, how to get an ID back out of one, and which
/// file suffix its raw downloads carry.
pub trait MetaDataProviderConfig: Send + Sync {
    /// Hostname identifying the provider, e.g. `anime.example.org`.
    fn hostname(&self) -> String;

    /// Canonical link to the anime with the given ID on this provider.
    fn build_anime_link(&self, anime_id: &str) -> Url;

    /// Extract the provider-specific anime ID from a source URI.
    ///
    /// The default takes the last path segment, which fits providers with
    /// `/anime/<id>` style links. Providers using query parameters override
    /// this.
    fn extract_anime_id(&self, uri: &Url) -> AppResult<String> {
        uri.path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::InvalidInput(format!("Unable to extract anime id from [{}].", uri))
            })
    }

    /// File suffix of the raw files downloaded from this provider.
    fn file_suffix(&self) -> String;
}

/// Global configuration consumed by the download control state components.
///
/// Loading this from disk or environment is the responsibility of the
/// application shell; the engine only consumes the resolved values.
pub trait Config: Send + Sync {
    /// Root directory containing one subdirectory of `.dcs` files per
    /// configured metadata provider.
    fn download_control_state_directory(&self) -> PathBuf;

    /// Root directory of the weekly download snapshot directories.
    fn downloads_directory(&self) -> PathBuf;

    /// Directory receiving run artifacts such as the release marker file.
    fn output_directory(&self) -> PathBuf;

    /// Working directory holding the current raw and converted files of the
    /// given provider.
    fn working_dir(&self, hostname: &str) -> PathBuf;

    /// All configured metadata providers.
    fn metadata_provider_configs(&self) -> Vec<Arc<dyn MetaDataProviderConfig>>;

    /// Whether the given provider is known to reassign anime IDs over time.
    fn can_change_anime_ids(&self, hostname: &str) -> bool;

    /// Whether dead entry files are maintained for the given provider.
    fn dead_entries_supported(&self, hostname: &str) -> bool;

    /// Number of weekly download directories to keep in the retention sweep.
    fn keep_download_directories(&self) -> usize;

    /// Lookup of a single provider config by hostname.
    fn find_metadata_provider_config(
        &self,
        hostname: &str,
    ) -> AppResult<Arc<dyn MetaDataProviderConfig>> {
        self.metadata_provider_configs()
            .into_iter()
            .find(|config| config.hostname() == hostname)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No metadata provider configured for [{}].",
                    hostname
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PathSegmentProvider;

    impl MetaDataProviderConfig for PathSegmentProvider {
        fn hostname(&self) -> String {
            "anime.example.org".to_string()
        }

        fn build_anime_link(&self, anime_id: &str) -> Url {
            Url::parse(&format!("https://anime.example.org/anime/{}", anime_id)).unwrap()
        }

        fn file_suffix(&self) -> String {
            "html".to_string()
        }
    }

    #[test]
    fn test_default_id_extraction_takes_last_path_segment() {
        let config = PathSegmentProvider;
        let uri = Url::parse("https://anime.example.org/anime/1535").unwrap();

        assert_eq!(config.extract_anime_id(&uri).unwrap(), "1535");
    }

    #[test]
    fn test_default_id_extraction_fails_on_empty_path() {
        let config = PathSegmentProvider;
        let uri = Url::parse("https://anime.example.org/").unwrap();

        let err = config.extract_anime_id(&uri).unwrap_err();
        assert!(err.to_string().contains("Unable to extract anime id"));
    }

    #[test]
    fn test_link_and_extraction_are_inverse() {
        let config = PathSegmentProvider;
        let link = config.build_anime_link("40028");

        assert_eq!(config.extract_anime_id(&link).unwrap(), "40028");
    }
}
