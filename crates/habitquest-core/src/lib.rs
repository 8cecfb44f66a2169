//! # Habit Quest Core Library
//!
//! State engine for a single-user daily habit tracker. The CLI binary is a
//! thin layer over this crate; any other front end can drive the same
//! [`HabitTracker`].
//!
//! ## Architecture
//!
//! - **Clock**: "today" is the calendar date in a reference timezone
//!   (`America/New_York` by default), so streaks follow that zone's midnight
//! - **Streak engine**: pure completion and skip transitions, with badge
//!   evaluation and the monthly free-skip allowance
//! - **Storage**: one versioned JSON document in a key-value store (SQLite or
//!   plain files), upgraded through a migration chain on load, and a TOML
//!   configuration file
//! - **Tracker**: applies one user action at a time, persists the result and
//!   reports what happened as [`Event`]s
//!
//! ## Key Components
//!
//! - [`HabitTracker`]: action processing and persistence
//! - [`StreakEngine`]: streak transitions against a [`Clock`]
//! - [`Persistence`]: load/save with schema migration
//! - [`Config`]: application configuration management

pub mod badges;
pub mod clock;
pub mod error;
pub mod events;
pub mod habit;
pub mod reminders;
pub mod skip_allowance;
pub mod stats;
pub mod storage;
pub mod streak;
pub mod tracker;

pub use badges::{BadgeId, BadgeInfo};
pub use clock::{Clock, DateString, FixedClock, MonthString, SystemClock};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use habit::{AppData, DayRecord, Habit, HabitDraft, HabitId, HabitPatch, ReminderTime};
pub use reminders::Reminder;
pub use stats::AppStats;
pub use storage::{
    Config, Database, JsonFileStore, KeyValueStore, MemoryStore, Persistence, StorageBackend,
};
pub use streak::{SkipOutcome, StreakEngine, StreakTier};
pub use tracker::{Applied, HabitTracker, SameDayPolicy};
