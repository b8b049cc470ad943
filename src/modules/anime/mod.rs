pub mod domain;

pub use domain::{Anime, AnimeSeason, AnimeStatus, AnimeType, Season};
