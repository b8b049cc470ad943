use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Airing status of an anime as reported by the metadata providers.
///
/// `Ongoing` and `Upcoming` entries are inherently volatile and are always
/// rescheduled for the next week by the download control state, regardless
/// of whether their content actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnimeStatus {
    Finished,
    Ongoing,
    Upcoming,
    #[default]
    Unknown,
}

impl AnimeStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            AnimeStatus::Finished => "Finished",
            AnimeStatus::Ongoing => "Ongoing",
            AnimeStatus::Upcoming => "Upcoming",
            AnimeStatus::Unknown => "Unknown",
        }
    }

    /// Entries in this status must be re-downloaded every week.
    pub fn is_volatile(&self) -> bool {
        matches!(self, AnimeStatus::Ongoing | AnimeStatus::Upcoming)
    }
}

impl fmt::Display for AnimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl From<&str> for AnimeStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "finished" | "finished airing" => AnimeStatus::Finished,
            "ongoing" | "currently airing" | "airing" => AnimeStatus::Ongoing,
            "upcoming" | "not yet aired" | "not_yet_aired" => AnimeStatus::Upcoming,
            _ => AnimeStatus::Unknown,
        }
    }
}

impl From<String> for AnimeStatus {
    fn from(s: String) -> Self {
        s.as_str().into()
    }
}

impl FromStr for AnimeStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lenient_spellings() {
        assert_eq!(AnimeStatus::from("FINISHED"), AnimeStatus::Finished);
        assert_eq!(AnimeStatus::from("currently airing"), AnimeStatus::Ongoing);
        assert_eq!(AnimeStatus::from("not yet aired"), AnimeStatus::Upcoming);
        assert_eq!(AnimeStatus::from("something else"), AnimeStatus::Unknown);
    }

    #[test]
    fn test_volatile_statuses() {
        assert!(AnimeStatus::Ongoing.is_volatile());
        assert!(AnimeStatus::Upcoming.is_volatile());
        assert!(!AnimeStatus::Finished.is_volatile());
        assert!(!AnimeStatus::Unknown.is_volatile());
    }

    #[test]
    fn test_serializes_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&AnimeStatus::Upcoming).unwrap(),
            "\"UPCOMING\""
        );
        assert_eq!(
            serde_json::from_str::<AnimeStatus>("\"ONGOING\"").unwrap(),
            AnimeStatus::Ongoing
        );
    }
}
