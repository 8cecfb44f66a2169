//! Calendar clock anchored to a fixed reference timezone.
//!
//! Every user shares the same day boundary: "today" is the calendar date in
//! the reference zone, not on the device. Offsets are always derived from the
//! IANA rules in `chrono-tz`, so daylight-saving transitions move the boundary
//! with them.
//!
//! ## Fallback
//!
//! An unknown zone name resolves to UTC and logs a warning. Resolution never
//! fails.

use std::cell::Cell;
use std::fmt;
use std::str::FromStr;

use chrono::offset::LocalResult;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Zone used when no configuration says otherwise.
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// A calendar date, written `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateString(NaiveDate);

impl DateString {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// The calendar date of `instant` as observed in `zone`.
    pub fn in_zone(instant: DateTime<Utc>, zone: Tz) -> Self {
        Self(instant.with_timezone(&zone).date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The month this date falls in.
    pub fn month(&self) -> MonthString {
        MonthString {
            year: self.0.year(),
            month: self.0.month(),
        }
    }

    /// Shift by a number of calendar days, saturating at chrono's range.
    pub fn add_days(&self, days: i64) -> Self {
        self.0
            .checked_add_signed(Duration::days(days))
            .map(Self)
            .unwrap_or(*self)
    }
}

impl fmt::Display for DateString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DateString {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // chrono accepts single-digit fields; the stored format does not.
        if s.len() != 10 {
            return Err(ValidationError::InvalidDate(s.to_string()));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate(s.to_string()))
    }
}

impl TryFrom<String> for DateString {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateString> for String {
    fn from(value: DateString) -> Self {
        value.to_string()
    }
}

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthString {
    year: i32,
    month: u32,
}

impl MonthString {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for MonthString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthString {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidMonth(s.to_string());
        if s.len() != 7 {
            return Err(invalid());
        }
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

impl TryFrom<String> for MonthString {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthString> for String {
    fn from(value: MonthString) -> Self {
        value.to_string()
    }
}

/// Whole calendar days from `from` to `to`. Negative when `to` is earlier.
pub fn days_between(from: DateString, to: DateString) -> i64 {
    to.0.signed_duration_since(from.0).num_days()
}

/// Source of the current instant and the reference zone.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    fn zone(&self) -> Tz;

    /// Today's date in the reference zone.
    fn today(&self) -> DateString {
        DateString::in_zone(self.now(), self.zone())
    }

    /// The current month in the reference zone.
    fn current_month(&self) -> MonthString {
        self.today().month()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn zone(&self) -> Tz {
        (**self).zone()
    }
}

/// Resolve an IANA zone name, falling back to UTC.
pub fn resolve_zone(name: &str) -> Tz {
    match name.trim().parse::<Tz>() {
        Ok(zone) => zone,
        Err(_) => {
            tracing::warn!(zone = name, "unknown timezone, falling back to UTC");
            Tz::UTC
        }
    }
}

/// Wall clock of the running system, read in the reference zone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    zone: Tz,
}

impl SystemClock {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }

    /// Build from a zone name, see [`resolve_zone`].
    pub fn from_name(name: &str) -> Self {
        Self::new(resolve_zone(name))
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::from_name(DEFAULT_TIMEZONE)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn zone(&self) -> Tz {
        self.zone
    }
}

/// A clock that only moves when told to.
///
/// Used by tests and by anything replaying actions at known instants.
#[derive(Debug, Clone)]
pub struct FixedClock {
    instant: Cell<DateTime<Utc>>,
    zone: Tz,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>, zone: Tz) -> Self {
        Self {
            instant: Cell::new(instant),
            zone,
        }
    }

    /// Noon on `date` in `zone`.
    pub fn at_local_noon(date: DateString, zone: Tz) -> Self {
        let noon = date.date().and_hms_opt(12, 0, 0).unwrap_or_default();
        Self::new(resolve_local(zone, noon), zone)
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        self.instant.set(instant);
    }

    pub fn advance(&self, by: Duration) {
        self.instant.set(self.instant.get() + by);
    }

    pub fn advance_days(&self, days: i64) {
        self.advance(Duration::days(days));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant.get()
    }

    fn zone(&self) -> Tz {
        self.zone
    }
}

/// Map a wall-clock time in `zone` to an instant.
///
/// Ambiguous times (clocks falling back) take the earlier instant. Times that
/// do not exist (clocks springing forward) roll forward past the gap.
pub fn resolve_local(zone: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    let mut probe = local;
    for _ in 0..8 {
        match zone.from_local_datetime(&probe) {
            LocalResult::Single(dt) => return dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => return earliest.with_timezone(&Utc),
            LocalResult::None => probe += Duration::minutes(30),
        }
    }
    local.and_utc()
}

/// Time left until the next day boundary in the reference zone.
pub fn time_until_reset(clock: &impl Clock) -> Duration {
    let tomorrow = clock.today().add_days(1);
    let midnight = tomorrow.date().and_hms_opt(0, 0, 0).unwrap_or_default();
    let boundary = resolve_local(clock.zone(), midnight);
    (boundary - clock.now()).max(Duration::zero())
}

/// Short human-readable countdown, e.g. `3h 12m until reset`.
pub fn format_time_until_reset(remaining: Duration) -> String {
    let total = remaining.num_seconds();
    if total <= 0 {
        return "Resetting now...".to_string();
    }
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m until reset")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s until reset")
    } else {
        format!("{seconds}s until reset")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn date_string_parse_and_display() {
        let d: DateString = "2024-03-09".parse().unwrap();
        assert_eq!(d.to_string(), "2024-03-09");
        assert_eq!(d.month().to_string(), "2024-03");
    }

    #[test]
    fn date_string_rejects_malformed() {
        assert!("2024-3-9".parse::<DateString>().is_err());
        assert!("2024-02-30".parse::<DateString>().is_err());
        assert!("yesterday".parse::<DateString>().is_err());
    }

    #[test]
    fn month_string_parse_and_order() {
        let jan: MonthString = "2025-01".parse().unwrap();
        let dec: MonthString = "2024-12".parse().unwrap();
        assert!(dec < jan);
        assert!("2024-13".parse::<MonthString>().is_err());
        assert!("2024-1".parse::<MonthString>().is_err());
    }

    #[test]
    fn date_string_serde_uses_text_form() {
        let d = DateString::from_ymd(2024, 12, 28).unwrap();
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"2024-12-28\"");
        let back: DateString = serde_json::from_str("\"2024-12-28\"").unwrap();
        assert_eq!(back, d);
        assert!(serde_json::from_str::<DateString>("\"28/12/2024\"").is_err());
    }

    #[test]
    fn days_between_counts_calendar_days() {
        let a = DateString::from_ymd(2024, 2, 28).unwrap();
        let b = DateString::from_ymd(2024, 3, 1).unwrap();
        assert_eq!(days_between(a, b), 2);
        assert_eq!(days_between(b, a), -2);
        assert_eq!(days_between(a, a), 0);
    }

    #[test]
    fn today_follows_daylight_saving_offset() {
        // 04:30 UTC in July is 00:30 EDT; a fixed EST offset would say June 30.
        let clock = FixedClock::new(utc("2024-07-01T04:30:00Z"), New_York);
        assert_eq!(clock.today().to_string(), "2024-07-01");

        // 04:30 UTC in January is still 23:30 EST the previous evening.
        let clock = FixedClock::new(utc("2024-01-15T04:30:00Z"), New_York);
        assert_eq!(clock.today().to_string(), "2024-01-14");
    }

    #[test]
    fn current_month_rolls_over_at_local_midnight() {
        let clock = FixedClock::new(utc("2024-11-01T03:59:00Z"), New_York);
        assert_eq!(clock.current_month().to_string(), "2024-10");
        clock.advance(Duration::minutes(2));
        assert_eq!(clock.current_month().to_string(), "2024-11");
    }

    #[test]
    fn unknown_zone_falls_back_to_utc() {
        assert_eq!(resolve_zone("Mars/Olympus_Mons"), Tz::UTC);
        assert_eq!(resolve_zone("America/New_York"), New_York);
        assert_eq!(SystemClock::from_name("").zone(), Tz::UTC);
    }

    #[test]
    fn fixed_clock_advances_by_days() {
        let clock = FixedClock::at_local_noon(DateString::from_ymd(2024, 3, 9).unwrap(), New_York);
        clock.advance_days(1);
        assert_eq!(clock.today().to_string(), "2024-03-10");
    }

    #[test]
    fn time_until_reset_spans_long_fall_back_day() {
        // Midnight EDT on Nov 3; the following midnight is EST, 25 hours later.
        let clock = FixedClock::new(utc("2024-11-03T04:00:00Z"), New_York);
        assert_eq!(time_until_reset(&clock), Duration::hours(25));
    }

    #[test]
    fn resolve_local_rolls_forward_through_gap() {
        let local = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert_eq!(resolve_local(New_York, local), utc("2024-03-10T07:00:00Z"));
    }

    #[test]
    fn countdown_formatting() {
        assert_eq!(
            format_time_until_reset(Duration::minutes(192)),
            "3h 12m until reset"
        );
        assert_eq!(
            format_time_until_reset(Duration::seconds(125)),
            "2m 5s until reset"
        );
        assert_eq!(format_time_until_reset(Duration::seconds(9)), "9s until reset");
        assert_eq!(format_time_until_reset(Duration::zero()), "Resetting now...");
    }
}
