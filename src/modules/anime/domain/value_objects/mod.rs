//! Anime-specific value objects

pub mod anime_season;
pub mod anime_status;
pub mod anime_type;

pub use anime_season::{AnimeSeason, Season};
pub use anime_status::AnimeStatus;
pub use anime_type::AnimeType;
