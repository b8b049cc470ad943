use crate::shared::clock::Clock;
use crate::shared::errors::{AppError, AppResult};
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Year of the first known anime. Nothing can have been downloaded before
/// that.
const MIN_YEAR: i32 = 1917;

/// How far into the future a week may lie. Scheduling beyond that indicates
/// corrupted state.
const MAX_YEARS_AHEAD: i32 = 5;

/// A calendar week in the ISO week-of-year definition.
///
/// Weeks are anchored on their Monday. All arithmetic goes through actual
/// calendar dates instead of naive week-number math, because week numbers
/// are not continuous across year boundaries and some years have 53 weeks.
///
/// Serializes as `"YYYY-WW"` with a zero padded week, the format used in
/// the persisted download control state files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekOfYear {
    year: i32,
    week: u32,
}

impl WeekOfYear {
    pub fn new(year: i32, week: u32) -> AppResult<Self> {
        let max_year = Utc::now().year() + MAX_YEARS_AHEAD;
        if year < MIN_YEAR || year > max_year {
            return Err(AppError::InvalidInput(format!(
                "Year [{}] must be within [{}] and [{}].",
                year, MIN_YEAR, max_year
            )));
        }

        if NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).is_none() {
            return Err(AppError::InvalidInput(format!(
                "Week [{}] is not a valid ISO week of year [{}].",
                week, year
            )));
        }

        Ok(Self { year, week })
    }

    /// The week containing "now" as seen by the given clock.
    pub fn current_week(clock: &dyn Clock) -> Self {
        Self::from_date(clock.now().date_naive())
    }

    fn from_date(date: NaiveDate) -> Self {
        let iso_week = date.iso_week();
        Self {
            year: iso_week.year(),
            week: iso_week.week(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    /// Monday of this ISO week.
    pub fn to_local_date(&self) -> NaiveDate {
        // Safe: validated on construction, arithmetic only ever produces
        // representable weeks.
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon)
            .unwrap_or_else(|| panic!("[{}] is not a representable week", self))
    }

    pub fn plus_weeks(&self, weeks: i64) -> Self {
        Self::from_date(self.to_local_date() + Duration::weeks(weeks))
    }

    pub fn minus_weeks(&self, weeks: i64) -> Self {
        self.plus_weeks(-weeks)
    }

    /// Absolute number of whole weeks between the Mondays of both weeks.
    pub fn difference(&self, other: WeekOfYear) -> u64 {
        (self.to_local_date() - other.to_local_date())
            .num_weeks()
            .unsigned_abs()
    }
}

impl fmt::Display for WeekOfYear {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.week)
    }
}

impl FromStr for WeekOfYear {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, week) = s.split_once('-').ok_or_else(|| {
            AppError::InvalidInput(format!("Invalid week format [{}]. Expected [YYYY-WW].", s))
        })?;

        if year.len() != 4 || week.len() != 2 {
            return Err(AppError::InvalidInput(format!(
                "Invalid week format [{}]. Expected [YYYY-WW].",
                s
            )));
        }

        WeekOfYear::new(year.parse()?, week.parse()?)
    }
}

impl TryFrom<String> for WeekOfYear {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeekOfYear> for String {
    fn from(value: WeekOfYear) -> Self {
        value.to_string()
    }
}
