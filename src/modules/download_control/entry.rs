use crate::modules::anime::Anime;
use crate::modules::download_control::week_of_year::WeekOfYear;
use serde::{Deserialize, Serialize};

/// Longest allowed gap between two downloads of the same entry, in weeks.
pub const MAX_WEEKS_BETWEEN_DOWNLOADS: u32 = 12;

/// Persisted download control state of a single anime on a single metadata
/// provider.
///
/// The entry does not know its own ID. Identity is the file name within the
/// provider's directory, owned by the accessor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadControlStateEntry {
    weeks_without_change: u32,
    last_downloaded: WeekOfYear,
    next_download: WeekOfYear,
    anime: Anime,
}

impl DownloadControlStateEntry {
    pub fn new(
        weeks_without_change: u32,
        last_downloaded: WeekOfYear,
        next_download: WeekOfYear,
        anime: Anime,
    ) -> Self {
        Self {
            weeks_without_change,
            last_downloaded,
            next_download,
            anime,
        }
    }

    /// Entry for an anime that appeared for the first time. It is checked
    /// again one week later.
    pub fn new_entry(anime: Anime, current_week: WeekOfYear) -> Self {
        Self {
            weeks_without_change: 0,
            last_downloaded: current_week,
            next_download: current_week.plus_weeks(1),
            anime,
        }
    }

    pub fn weeks_without_change(&self) -> u32 {
        self.weeks_without_change
    }

    pub fn last_downloaded(&self) -> WeekOfYear {
        self.last_downloaded
    }

    pub fn next_download(&self) -> WeekOfYear {
        self.next_download
    }

    pub fn anime(&self) -> &Anime {
        &self.anime
    }

    /// Reconcile a freshly converted record into this entry and reschedule.
    ///
    /// Ongoing and upcoming anime are volatile and go straight back into
    /// next week's queue, whether or not their content changed. The same
    /// happens on any detected content change. Otherwise the no-change
    /// streak grows by one and the next download moves out by that many
    /// weeks, capped at [`MAX_WEEKS_BETWEEN_DOWNLOADS`].
    ///
    /// The returned entry always carries the new record so that field
    /// representation differences are normalized even without a detected
    /// change.
    pub fn update(&self, anime: Anime, current_week: WeekOfYear) -> Self {
        if anime.status.is_volatile() || anime != self.anime {
            return Self {
                weeks_without_change: 0,
                last_downloaded: current_week,
                next_download: current_week.plus_weeks(1),
                anime,
            };
        }

        let weeks_without_change = self.weeks_without_change + 1;
        let backoff = weeks_without_change.min(MAX_WEEKS_BETWEEN_DOWNLOADS);

        Self {
            weeks_without_change,
            last_downloaded: current_week,
            next_download: current_week.plus_weeks(i64::from(backoff)),
            anime,
        }
    }
}
