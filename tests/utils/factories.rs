//! Builders for test data and on-disk fixtures.

use shuukan::modules::anime::{Anime, AnimeStatus, AnimeType};
use shuukan::modules::download_control::{DownloadControlStateEntry, WeekOfYear};
use shuukan::modules::provider::{Config, CONVERTED_FILE_SUFFIX};
use url::Url;

use super::doubles::TestAppConfig;

pub fn source_url(hostname: &str, anime_id: &str) -> Url {
    Url::parse(&format!("https://{}/anime/{}", hostname, anime_id)).expect("test url must parse")
}

pub fn anime_with_source(title: &str, hostname: &str, anime_id: &str) -> Anime {
    Anime::new(title)
        .with_sources(vec![source_url(hostname, anime_id)])
        .with_type(AnimeType::Tv)
        .with_status(AnimeStatus::Finished)
        .with_episodes(12)
}

pub fn week(year: i32, week_number: u32) -> WeekOfYear {
    WeekOfYear::new(year, week_number).expect("test week must be valid")
}

pub fn entry(
    weeks_without_change: u32,
    last_downloaded: WeekOfYear,
    next_download: WeekOfYear,
    anime: Anime,
) -> DownloadControlStateEntry {
    DownloadControlStateEntry::new(weeks_without_change, last_downloaded, next_download, anime)
}

/// Serialize an anime into the working directory the way a converter would.
pub async fn write_converted_file(config: &TestAppConfig, hostname: &str, file_id: &str, anime: &Anime) {
    let working_dir = config.working_dir(hostname);
    tokio::fs::create_dir_all(&working_dir)
        .await
        .expect("working dir must be creatable");
    tokio::fs::write(
        working_dir.join(format!("{}.{}", file_id, CONVERTED_FILE_SUFFIX)),
        serde_json::to_string(anime).expect("anime must serialize"),
    )
    .await
    .expect("converted file must be writable");
}

/// Place a raw download file the way a crawler would.
pub async fn write_raw_file(config: &TestAppConfig, hostname: &str, file_id: &str, suffix: &str) {
    let working_dir = config.working_dir(hostname);
    tokio::fs::create_dir_all(&working_dir)
        .await
        .expect("working dir must be creatable");
    tokio::fs::write(working_dir.join(format!("{}.{}", file_id, suffix)), "<html></html>")
        .await
        .expect("raw file must be writable");
}
