use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::badges::BadgeId;
use crate::clock::DateString;
use crate::habit::HabitId;

/// Every tracker action reports what happened as a list of events.
/// Front ends render them; reminder schedulers can react to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    HabitAdded {
        habit_id: HabitId,
        name: String,
        at: DateTime<Utc>,
    },
    HabitUpdated {
        habit_id: HabitId,
        at: DateTime<Utc>,
    },
    HabitDeleted {
        habit_id: HabitId,
        at: DateTime<Utc>,
    },
    HabitCompleted {
        habit_id: HabitId,
        date: DateString,
        current_streak: u32,
        best_streak: u32,
        at: DateTime<Utc>,
    },
    HabitSkipped {
        habit_id: HabitId,
        date: DateString,
        /// The monthly free skip was spent and the streak kept.
        allowance_used: bool,
        current_streak: u32,
        at: DateTime<Utc>,
    },
    BadgeEarned {
        habit_id: HabitId,
        badge: BadgeId,
        at: DateTime<Utc>,
    },
    /// A streak beat the longest streak ever recorded across all habits.
    NewAllTimeRecord {
        habit_id: HabitId,
        streak: u32,
        at: DateTime<Utc>,
    },
    /// The action was ignored because today already has a record.
    AlreadyCheckedIn {
        habit_id: HabitId,
        date: DateString,
        at: DateTime<Utc>,
    },
    /// The action named a habit that does not exist; nothing changed.
    UnknownHabit {
        habit_id: HabitId,
        at: DateTime<Utc>,
    },
}
