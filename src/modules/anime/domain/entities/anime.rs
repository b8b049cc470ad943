use crate::modules::anime::domain::value_objects::{AnimeSeason, AnimeStatus, AnimeType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use url::Url;

/// Normalized metadata record for a single anime.
///
/// This is the unit that converters emit, the download control state
/// persists, and the dataset aggregates. Structural equality over all fields
/// (including the derived collections) is the change-detection primitive of
/// the reconciliation engine, so every field participates in `PartialEq`.
///
/// Collections are `BTreeSet`s: duplicate-free and deterministically ordered
/// so serialized records are byte-stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anime {
    /// URIs identifying this anime on each metadata provider.
    pub sources: BTreeSet<Url>,

    /// Main title.
    pub title: String,

    #[serde(rename = "type")]
    pub anime_type: AnimeType,

    pub episodes: u32,

    pub status: AnimeStatus,

    pub anime_season: AnimeSeason,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<Url>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Url>,

    /// Alternative titles.
    pub synonyms: BTreeSet<String>,

    /// URIs of related anime on the providers.
    pub related_anime: BTreeSet<Url>,

    pub tags: BTreeSet<String>,
}

impl Anime {
    pub fn new(title: &str) -> Self {
        Self {
            sources: BTreeSet::new(),
            title: title.to_string(),
            anime_type: AnimeType::default(),
            episodes: 0,
            status: AnimeStatus::default(),
            anime_season: AnimeSeason::default(),
            picture: None,
            thumbnail: None,
            synonyms: BTreeSet::new(),
            related_anime: BTreeSet::new(),
            tags: BTreeSet::new(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<Url>) -> Self {
        self.sources = sources.into_iter().collect();
        self
    }

    pub fn with_type(mut self, anime_type: AnimeType) -> Self {
        self.anime_type = anime_type;
        self
    }

    pub fn with_episodes(mut self, episodes: u32) -> Self {
        self.episodes = episodes;
        self
    }

    pub fn with_status(mut self, status: AnimeStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_season(mut self, anime_season: AnimeSeason) -> Self {
        self.anime_season = anime_season;
        self
    }

    pub fn with_synonyms(mut self, synonyms: Vec<&str>) -> Self {
        self.synonyms = synonyms.into_iter().map(str::to_string).collect();
        self
    }

    pub fn with_tags(mut self, tags: Vec<&str>) -> Self {
        self.tags = tags.into_iter().map(str::to_string).collect();
        self
    }

    /// The source URI belonging to the given metadata provider, if any.
    pub fn source_of(&self, hostname: &str) -> Option<&Url> {
        self.sources
            .iter()
            .find(|source| source.host_str() == Some(hostname))
    }
}
