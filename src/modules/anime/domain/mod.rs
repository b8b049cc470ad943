pub mod entities;
pub mod value_objects;

pub use entities::Anime;
pub use value_objects::{AnimeSeason, AnimeStatus, AnimeType, Season};
