use serde::{Deserialize, Serialize};
use std::fmt;

/// Release format of an anime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnimeType {
    Tv,
    Movie,
    Ova,
    Ona,
    Special,
    #[default]
    Unknown,
}

impl AnimeType {
    pub fn display_name(&self) -> &'static str {
        match self {
            AnimeType::Tv => "TV",
            AnimeType::Movie => "Movie",
            AnimeType::Ova => "OVA",
            AnimeType::Ona => "ONA",
            AnimeType::Special => "Special",
            AnimeType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AnimeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl From<&str> for AnimeType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "tv" => AnimeType::Tv,
            "movie" => AnimeType::Movie,
            "ova" => AnimeType::Ova,
            "ona" => AnimeType::Ona,
            "special" => AnimeType::Special,
            _ => AnimeType::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_from_provider_strings() {
        assert_eq!(AnimeType::from("TV"), AnimeType::Tv);
        assert_eq!(AnimeType::from("movie"), AnimeType::Movie);
        assert_eq!(AnimeType::from("music video"), AnimeType::Unknown);
    }

    #[test]
    fn test_wire_format() {
        assert_eq!(serde_json::to_string(&AnimeType::Ova).unwrap(), "\"OVA\"");
        assert_eq!(
            serde_json::from_str::<AnimeType>("\"SPECIAL\"").unwrap(),
            AnimeType::Special
        );
    }
}
