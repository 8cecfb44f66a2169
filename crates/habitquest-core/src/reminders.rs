//! Daily reminder feed.
//!
//! Only computes when each habit wants its nudge. Delivering notifications
//! is left to the front end.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::clock::{resolve_local, Clock};
use crate::habit::{AppData, HabitId, ReminderTime};

/// One habit's daily reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reminder {
    pub id: HabitId,
    pub name: String,
    pub reminder_time: ReminderTime,
}

/// Reminders for every habit, earliest time of day first.
pub fn reminders(data: &AppData) -> Vec<Reminder> {
    let mut out: Vec<Reminder> = data
        .habits
        .iter()
        .map(|h| Reminder {
            id: h.id.clone(),
            name: h.name.clone(),
            reminder_time: h.reminder_time,
        })
        .collect();
    // stable: equal times keep list order
    out.sort_by_key(|r| r.reminder_time);
    out
}

/// Next instant the reminder fires, strictly after now.
///
/// The wall time is read in the clock's zone. On a spring-forward day a time
/// inside the gap fires at the first valid minute after it.
pub fn next_reminder_at(reminder: &Reminder, clock: &impl Clock) -> DateTime<Utc> {
    let today = clock.today();
    let at = |day: crate::clock::DateString| {
        resolve_local(clock.zone(), day.date().and_time(reminder.reminder_time.time()))
    };
    let candidate = at(today);
    if candidate > clock.now() {
        candidate
    } else {
        at(today.add_days(1))
    }
}
