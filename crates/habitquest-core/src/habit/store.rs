//! Value-based operations over [`AppData`].
//!
//! Every operation takes the current state by reference and returns the next
//! one. Operations on an unknown id return an unchanged copy.

use super::{AppData, Habit, HabitId, ReminderTime};
use crate::clock::Clock;

/// Input for creating a habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitDraft {
    pub name: String,
    /// Random palette color when absent.
    pub color: Option<String>,
    /// `19:00` when absent.
    pub reminder_time: Option<ReminderTime>,
}

impl HabitDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            reminder_time: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_reminder(mut self, reminder_time: ReminderTime) -> Self {
        self.reminder_time = Some(reminder_time);
        self
    }
}

/// Display metadata edits.
///
/// Streak counters, history and badges are deliberately absent: those only
/// change through the streak engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub reminder_time: Option<ReminderTime>,
}

impl HabitPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_none() && self.reminder_time.is_none()
    }

    fn apply(&self, habit: &Habit) -> Habit {
        let mut next = habit.clone();
        if let Some(name) = &self.name {
            next.name = name.clone();
        }
        if let Some(color) = &self.color {
            next.color = color.clone();
        }
        if let Some(reminder_time) = self.reminder_time {
            next.reminder_time = reminder_time;
        }
        next
    }
}

/// Append a new habit built from `draft`.
pub fn add(data: &AppData, draft: HabitDraft, clock: &impl Clock) -> AppData {
    let mut next = data.clone();
    next.habits.push(Habit::new(draft, clock));
    next
}

/// Merge `patch` into the habit with `id`.
pub fn update(data: &AppData, id: &HabitId, patch: &HabitPatch) -> AppData {
    AppData {
        habits: data
            .habits
            .iter()
            .map(|h| if &h.id == id { patch.apply(h) } else { h.clone() })
            .collect(),
        ..data.clone()
    }
}

/// Swap in a recomputed habit, keeping its position.
pub(crate) fn replace(data: &AppData, habit: Habit) -> AppData {
    let mut next = data.clone();
    if let Some(slot) = next.habits.iter_mut().find(|h| h.id == habit.id) {
        *slot = habit;
    }
    next
}

/// Remove the habit with `id`.
pub fn delete(data: &AppData, id: &HabitId) -> AppData {
    AppData {
        habits: data.habits.iter().filter(|h| &h.id != id).cloned().collect(),
        ..data.clone()
    }
}

pub fn find<'a>(data: &'a AppData, id: &HabitId) -> Option<&'a Habit> {
    data.habits.iter().find(|h| &h.id == id)
}
