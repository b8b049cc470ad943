use serde::{Deserialize, Serialize};
use std::fmt;

/// Season within a year in which an anime premiered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
    #[default]
    Undefined,
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
            Season::Undefined => "Undefined",
        };
        write!(f, "{}", name)
    }
}

impl From<&str> for Season {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "spring" => Season::Spring,
            "summer" => Season::Summer,
            "fall" | "autumn" => Season::Fall,
            "winter" => Season::Winter,
            _ => Season::Undefined,
        }
    }
}

/// Premiere season of an anime. The year is optional because some providers
/// only report the season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnimeSeason {
    pub season: Season,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
}

impl AnimeSeason {
    pub fn new(season: Season, year: Option<u16>) -> Self {
        Self { season, year }
    }
}
