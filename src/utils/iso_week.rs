//! ISO-8601 week arithmetic.
//!
//! Weeks run Monday through Sunday and week 01 is the week that contains the
//! year's first Thursday, so a date in late December can belong to week 01 of
//! the following ISO year and a date in early January can belong to week 52 or
//! 53 of the previous one.
//!
//! The canonical text form of a week is `YYYY-Www`: a zero-padded four digit ISO
//! year, a literal `W` and a zero-padded two digit week. Because the encoding
//! is fixed width and year-major, comparing two canonical keys as plain strings
//! gives the same answer as comparing them chronologically. Storage queries
//! (`week_key BETWEEN ?1 AND ?2`) and [`compare`] rely on this, so every key
//! must be produced through [`WeekKey`] and never formatted by hand.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AppError, AppResult};

/// Upper bound on the number of week keys a single range may expand to.
pub const MAX_SUPPORTED_RANGE_WEEKS: usize = 520;

const MAX_ISO_YEAR: i32 = 9999;

static WEEK_KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-W(\d{2})$").expect("week key pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsoWeek {
    pub iso_year: i32,
    pub iso_week: u32,
}

/// Returns the ISO year and week that `date` falls in.
pub fn to_iso_week(date: NaiveDate) -> IsoWeek {
    let week = date.iso_week();
    IsoWeek {
        iso_year: week.year(),
        iso_week: week.week(),
    }
}

/// Number of ISO weeks in `year`: 53 when the year starts on a Thursday, or
/// on a Wednesday in a leap year, otherwise 52.
pub fn weeks_in_year(year: i32) -> u32 {
    // 28 December always falls in the last ISO week of its year.
    NaiveDate::from_ymd_opt(year, 12, 28)
        .map(|date| date.iso_week().week())
        .unwrap_or(52)
}

/// Compares two canonical week keys.
///
/// Plain lexical comparison is correct here only because of the fixed-width,
/// year-major encoding described in the module docs.
pub fn compare(a: &str, b: &str) -> Ordering {
    a.cmp(b)
}

/// A validated ISO week. Field order makes the derived ordering year-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekKey {
    year: i32,
    week: u32,
}

impl WeekKey {
    pub fn new(year: i32, week: u32) -> AppResult<Self> {
        if !(0..=MAX_ISO_YEAR).contains(&year) {
            return Err(AppError::invalid_range(format!(
                "ISO year {year} cannot be encoded as a week key"
            )));
        }
        if !(1..=53).contains(&week) {
            return Err(AppError::invalid_range(format!(
                "Week number out of range: {year}-W{week:02}"
            )));
        }
        if week > weeks_in_year(year) {
            return Err(AppError::invalid_range(format!(
                "Week {year}-W{week:02} is not valid for {year}"
            )));
        }
        Ok(Self { year, week })
    }

    /// Parses the canonical `YYYY-Www` form.
    pub fn parse(value: &str) -> AppResult<Self> {
        let captures = WEEK_KEY_PATTERN.captures(value).ok_or_else(|| {
            AppError::invalid_range(format!("Invalid ISO week format: {value}"))
        })?;

        let year = captures[1]
            .parse::<i32>()
            .map_err(|_| AppError::invalid_range(format!("Invalid ISO week value: {value}")))?;
        let week = captures[2]
            .parse::<u32>()
            .map_err(|_| AppError::invalid_range(format!("Invalid ISO week value: {value}")))?;

        Self::new(year, week)
    }

    /// The week `date` falls in. Fails for dates whose ISO year has no
    /// four digit encoding.
    pub fn from_date(date: NaiveDate) -> AppResult<Self> {
        let iso = to_iso_week(date);
        Self::new(iso.iso_year, iso.iso_week)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    /// Monday of this week.
    pub fn monday(&self) -> Option<NaiveDate> {
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon)
    }

    /// The following ISO week, rolling the last week of a year into W01 of the
    /// next. `None` once the year no longer fits the four digit encoding.
    pub fn next(&self) -> Option<Self> {
        if self.week < weeks_in_year(self.year) {
            return Some(Self {
                year: self.year,
                week: self.week + 1,
            });
        }
        if self.year >= MAX_ISO_YEAR {
            return None;
        }
        Some(Self {
            year: self.year + 1,
            week: 1,
        })
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year, self.week)
    }
}

impl FromStr for WeekKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        WeekKey::parse(value)
    }
}

impl Serialize for WeekKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        WeekKey::parse(&raw).map_err(de::Error::custom)
    }
}

/// Enumerates every week from `from` to `to`, both inclusive.
pub fn week_key_range(from: WeekKey, to: WeekKey) -> AppResult<Vec<WeekKey>> {
    if from > to {
        return Err(AppError::invalid_range(format!(
            "fromWeek {from} cannot be after toWeek {to}"
        )));
    }

    let mut weeks = vec![from];
    let mut current = from;
    while current != to {
        if weeks.len() >= MAX_SUPPORTED_RANGE_WEEKS {
            return Err(AppError::invalid_range(format!(
                "Week range is too large. Limit to {MAX_SUPPORTED_RANGE_WEEKS} weeks."
            )));
        }
        current = current.next().ok_or_else(|| {
            AppError::invalid_range(format!("Week range overflows after {current}"))
        })?;
        weeks.push(current);
    }

    Ok(weeks)
}

/// An inclusive, ordered pair of week keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekRange {
    pub from_week: WeekKey,
    pub to_week: WeekKey,
}

impl WeekRange {
    /// Builds a range, rejecting `from > to` rather than swapping the bounds.
    pub fn new(from_week: WeekKey, to_week: WeekKey) -> AppResult<Self> {
        if from_week > to_week {
            return Err(AppError::invalid_range(format!(
                "fromWeek {from_week} cannot be after toWeek {to_week}"
            )));
        }
        Ok(Self { from_week, to_week })
    }

    pub fn parse(from_week: &str, to_week: &str) -> AppResult<Self> {
        let from = WeekKey::parse(from_week).map_err(|_| {
            AppError::invalid_range("fromWeek must be provided in the format YYYY-Www.")
        })?;
        let to = WeekKey::parse(to_week).map_err(|_| {
            AppError::invalid_range("toWeek must be provided in the format YYYY-Www.")
        })?;
        Self::new(from, to)
    }

    /// `weeks` weeks ending with the week that contains `today`.
    pub fn trailing(today: NaiveDate, weeks: u32) -> AppResult<Self> {
        let span = Self::span_days(weeks)?;
        let start = today
            .checked_sub_signed(span)
            .ok_or_else(|| AppError::invalid_range("trailing range starts before the calendar"))?;
        Self::new(WeekKey::from_date(start)?, WeekKey::from_date(today)?)
    }

    /// `weeks` weeks starting with the week that contains `today`.
    pub fn upcoming(today: NaiveDate, weeks: u32) -> AppResult<Self> {
        let span = Self::span_days(weeks)?;
        let end = today
            .checked_add_signed(span)
            .ok_or_else(|| AppError::invalid_range("upcoming range ends after the calendar"))?;
        Self::new(WeekKey::from_date(today)?, WeekKey::from_date(end)?)
    }

    pub fn weeks(&self) -> AppResult<Vec<WeekKey>> {
        week_key_range(self.from_week, self.to_week)
    }

    pub fn contains(&self, week: &WeekKey) -> bool {
        *week >= self.from_week && *week <= self.to_week
    }

    fn span_days(weeks: u32) -> AppResult<Duration> {
        if weeks == 0 {
            return Err(AppError::invalid_range("a rolling range needs at least one week"));
        }
        Ok(Duration::weeks(i64::from(weeks) - 1))
    }
}

impl fmt::Display for WeekRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.from_week, self.to_week)
    }
}
