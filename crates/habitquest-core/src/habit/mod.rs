//! Habit records and the aggregate application state.
//!
//! Field names serialize in camelCase so the persisted document keeps the
//! shape older versions of the app wrote.

pub mod store;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::badges::BadgeId;
use crate::clock::{Clock, DateString, MonthString};
use crate::error::ValidationError;

pub use store::{HabitDraft, HabitPatch};

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Palette used when a habit is created without a color.
pub const HABIT_COLORS: [&str; 8] = [
    "#9855f6", // purple
    "#f472b6", // pink
    "#60a5fa", // blue
    "#34d399", // green
    "#fbbf24", // yellow
    "#fb7185", // rose
    "#a78bfa", // violet
    "#38bdf8", // sky
];

pub fn random_habit_color() -> String {
    HABIT_COLORS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(HABIT_COLORS[0])
        .to_string()
}

/// Validate a `#rgb` or `#rrggbb` color, returning it lowercased.
pub fn parse_hex_color(value: &str) -> Result<String, ValidationError> {
    let digits = value.strip_prefix('#').unwrap_or_default();
    if matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(value.to_ascii_lowercase())
    } else {
        Err(ValidationError::InvalidValue {
            field: "color".to_string(),
            message: format!("'{value}' is not a hex color like #34d399"),
        })
    }
}

/// Opaque habit identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(String);

impl HabitId {
    pub fn generate() -> Self {
        Self(format!("habit_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HabitId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for HabitId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Daily reminder wall-clock time, written `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReminderTime(NaiveTime);

impl ReminderTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }
}

impl Default for ReminderTime {
    fn default() -> Self {
        Self(NaiveTime::from_hms_opt(19, 0, 0).unwrap_or_default())
    }
}

impl fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for ReminderTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .map(Self)
            .map_err(|_| ValidationError::InvalidReminderTime(s.to_string()))
    }
}

impl TryFrom<String> for ReminderTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReminderTime> for String {
    fn from(value: ReminderTime) -> Self {
        value.to_string()
    }
}

/// Outcome of one calendar day for one habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: DateString,
    pub completed: bool,
    #[serde(default)]
    pub skipped: bool,
    /// When the action was taken. Absent on records written by old versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A tracked habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub current_streak: u32,
    pub best_streak: u32,
    pub last_check_in: Option<DateString>,
    pub total_completions: u32,
    /// Most recent first; at most one record per date.
    pub history: Vec<DayRecord>,
    pub badges: Vec<BadgeId>,
    pub reminder_time: ReminderTime,
    pub created_at: DateTime<Utc>,
    pub color: String,
    /// Only meaningful while `last_skip_reset_month` is the current month.
    pub monthly_skips_used: u8,
    pub last_skip_reset_month: MonthString,
}

impl Habit {
    /// A fresh habit with zeroed counters.
    pub fn new(draft: HabitDraft, clock: &impl Clock) -> Self {
        Self {
            id: HabitId::generate(),
            name: draft.name,
            current_streak: 0,
            best_streak: 0,
            last_check_in: None,
            total_completions: 0,
            history: Vec::new(),
            badges: Vec::new(),
            reminder_time: draft.reminder_time.unwrap_or_default(),
            created_at: clock.now(),
            color: draft.color.unwrap_or_else(random_habit_color),
            monthly_skips_used: 0,
            last_skip_reset_month: clock.current_month(),
        }
    }

    /// The history record for `date`, if any.
    pub fn record_for(&self, date: DateString) -> Option<&DayRecord> {
        self.history.iter().find(|r| r.date == date)
    }
}

/// Everything the app persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    /// User-visible order.
    pub habits: Vec<Habit>,
    pub version: u32,
    /// Highest `best_streak` ever observed. Never decreases, even when the
    /// habit that set it is deleted.
    pub all_time_longest_streak: u32,
}

impl AppData {
    pub fn empty() -> Self {
        Self {
            habits: Vec::new(),
            version: CURRENT_SCHEMA_VERSION,
            all_time_longest_streak: 0,
        }
    }
}

impl Default for AppData {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
pub(crate) fn test_habit(name: &str) -> Habit {
    let clock = crate::clock::FixedClock::at_local_noon(
        DateString::from_ymd(2024, 6, 1).unwrap(),
        chrono_tz::America::New_York,
    );
    Habit::new(HabitDraft::named(name).with_color("#34d399"), &clock)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_habit_starts_zeroed() {
        let habit = test_habit("Meditate");
        assert_eq!(habit.current_streak, 0);
        assert_eq!(habit.best_streak, 0);
        assert_eq!(habit.total_completions, 0);
        assert!(habit.last_check_in.is_none());
        assert!(habit.history.is_empty());
        assert!(habit.badges.is_empty());
        assert_eq!(habit.reminder_time.to_string(), "19:00");
        assert_eq!(habit.last_skip_reset_month.to_string(), "2024-06");
        assert!(habit.id.as_str().starts_with("habit_"));
    }

    #[test]
    fn random_color_comes_from_palette() {
        let color = random_habit_color();
        assert!(HABIT_COLORS.contains(&color.as_str()));
    }

    #[test]
    fn hex_colors_are_checked() {
        assert_eq!(parse_hex_color("#34D399").unwrap(), "#34d399");
        assert_eq!(parse_hex_color("#fff").unwrap(), "#fff");
        for bad in ["34d399", "#34d39", "#zzzzzz", "red", ""] {
            assert!(parse_hex_color(bad).is_err(), "{bad}");
        }
        for color in HABIT_COLORS {
            assert!(parse_hex_color(color).is_ok());
        }
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(HabitId::generate(), HabitId::generate());
    }

    #[test]
    fn reminder_time_accepts_seconds_but_writes_minutes() {
        let t: ReminderTime = "07:30:00".parse().unwrap();
        assert_eq!(t.to_string(), "07:30");
        assert!("7pm".parse::<ReminderTime>().is_err());
        assert!("25:00".parse::<ReminderTime>().is_err());
    }

    #[test]
    fn habit_serializes_with_camel_case_keys() {
        let habit = test_habit("Walk");
        let json = serde_json::to_value(&habit).unwrap();
        for key in [
            "currentStreak",
            "bestStreak",
            "lastCheckIn",
            "totalCompletions",
            "reminderTime",
            "createdAt",
            "monthlySkipsUsed",
            "lastSkipResetMonth",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json["lastCheckIn"].is_null());
    }

    #[test]
    fn day_record_defaults_skipped_and_timestamp() {
        let record: DayRecord =
            serde_json::from_str(r#"{"date":"2024-05-01","completed":true}"#).unwrap();
        assert!(!record.skipped);
        assert!(record.timestamp.is_none());
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("timestamp"));
    }
}
