//! Action processing on top of the pure engine.
//!
//! [`HabitTracker`] owns the current [`AppData`] and runs each user action to
//! completion before returning: compute the next state, evaluate badges,
//! commit it in memory, then flush it through the persistence gateway.
//!
//! A failed save never blocks the user. It is logged and handed back in
//! [`Applied::save_error`], and the in-memory state stays authoritative.

use serde::{Deserialize, Serialize};

use crate::badges::BadgeId;
use crate::clock::Clock;
use crate::error::StorageError;
use crate::events::Event;
use crate::habit::{store, AppData, Habit, HabitDraft, HabitId, HabitPatch, ReminderTime};
use crate::storage::{KeyValueStore, Persistence};
use crate::streak::{has_checked_in_today, StreakEngine};

/// What to do with a second completion or skip on the same day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameDayPolicy {
    /// Ignore it and report [`Event::AlreadyCheckedIn`].
    #[default]
    Guard,
    /// Recompute from stored counters and overwrite today's record. The
    /// streak and `total_completions` advance again.
    Recompute,
}

/// Result of one tracker action.
#[derive(Debug, Default)]
pub struct Applied {
    pub events: Vec<Event>,
    /// Set when the new state could not be persisted.
    pub save_error: Option<StorageError>,
}

impl Applied {
    /// Badges earned by this action.
    pub fn badges(&self) -> Vec<BadgeId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::BadgeEarned { badge, .. } => Some(*badge),
                _ => None,
            })
            .collect()
    }

    /// Whether the action was refused or had nothing to act on.
    pub fn is_noop(&self) -> bool {
        self.events.iter().all(|e| {
            matches!(
                e,
                Event::AlreadyCheckedIn { .. } | Event::UnknownHabit { .. }
            )
        })
    }
}

/// Single-user habit tracker bound to a store and a clock.
pub struct HabitTracker<S, C> {
    data: AppData,
    persistence: Persistence<S>,
    engine: StreakEngine<C>,
    policy: SameDayPolicy,
    default_reminder: ReminderTime,
}

impl<S: KeyValueStore, C: Clock> HabitTracker<S, C> {
    /// Load state from `store` and start tracking.
    pub fn open(store: S, clock: C) -> Self {
        let persistence = Persistence::new(store);
        let data = persistence.load(&clock);
        Self {
            data,
            persistence,
            engine: StreakEngine::new(clock),
            policy: SameDayPolicy::default(),
            default_reminder: ReminderTime::default(),
        }
    }

    pub fn with_policy(mut self, policy: SameDayPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Reminder time for habits created without one.
    pub fn with_default_reminder(mut self, reminder_time: ReminderTime) -> Self {
        self.default_reminder = reminder_time;
        self
    }

    pub fn data(&self) -> &AppData {
        &self.data
    }

    pub fn clock(&self) -> &C {
        self.engine.clock()
    }

    pub fn policy(&self) -> SameDayPolicy {
        self.policy
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn find(&self, id: &HabitId) -> Option<&Habit> {
        store::find(&self.data, id)
    }

    /// Create a habit at the end of the list.
    pub fn add_habit(&mut self, mut draft: HabitDraft) -> Applied {
        draft.reminder_time = draft.reminder_time.or(Some(self.default_reminder));
        let next = store::add(&self.data, draft, self.clock());
        let events = next
            .habits
            .last()
            .map(|habit| Event::HabitAdded {
                habit_id: habit.id.clone(),
                name: habit.name.clone(),
                at: self.clock().now(),
            })
            .into_iter()
            .collect();
        self.commit(next, events)
    }

    /// Change display metadata.
    pub fn edit_habit(&mut self, id: &HabitId, patch: &HabitPatch) -> Applied {
        if self.find(id).is_none() {
            return self.unknown(id);
        }
        let next = store::update(&self.data, id, patch);
        let event = Event::HabitUpdated {
            habit_id: id.clone(),
            at: self.clock().now(),
        };
        self.commit(next, vec![event])
    }

    pub fn delete_habit(&mut self, id: &HabitId) -> Applied {
        if self.find(id).is_none() {
            return self.unknown(id);
        }
        let next = store::delete(&self.data, id);
        let event = Event::HabitDeleted {
            habit_id: id.clone(),
            at: self.clock().now(),
        };
        self.commit(next, vec![event])
    }

    /// Mark today as done for the habit.
    pub fn complete(&mut self, id: &HabitId) -> Applied {
        let Some(before) = self.find(id).cloned() else {
            return self.unknown(id);
        };
        if let Some(refused) = self.guard(&before) {
            return refused;
        }

        let next = self.engine.complete_in(&self.data, id);
        let now = self.clock().now();
        let mut events = Vec::new();

        if let Some(after) = store::find(&next, id) {
            events.push(Event::HabitCompleted {
                habit_id: id.clone(),
                date: self.clock().today(),
                current_streak: after.current_streak,
                best_streak: after.best_streak,
                at: now,
            });
            for badge in after.badges.iter().filter(|b| !before.badges.contains(b)) {
                tracing::info!(habit = %id, badge = %badge, "badge earned");
                events.push(Event::BadgeEarned {
                    habit_id: id.clone(),
                    badge: *badge,
                    at: now,
                });
            }
            if next.all_time_longest_streak > self.data.all_time_longest_streak {
                tracing::info!(streak = next.all_time_longest_streak, "new all-time streak record");
                events.push(Event::NewAllTimeRecord {
                    habit_id: id.clone(),
                    streak: next.all_time_longest_streak,
                    at: now,
                });
            }
        }

        self.commit(next, events)
    }

    /// Mark today as missed, optionally spending the monthly free skip.
    pub fn skip(&mut self, id: &HabitId, use_allowance: bool) -> Applied {
        let Some(before) = self.find(id).cloned() else {
            return self.unknown(id);
        };
        if let Some(refused) = self.guard(&before) {
            return refused;
        }

        let outcome = self.engine.skip(&before, use_allowance);
        let event = Event::HabitSkipped {
            habit_id: id.clone(),
            date: self.clock().today(),
            allowance_used: outcome.allowance_used,
            current_streak: outcome.habit.current_streak,
            at: self.clock().now(),
        };
        let next = store::replace(&self.data, outcome.habit);
        self.commit(next, vec![event])
    }

    /// Persist the current state again.
    ///
    /// # Errors
    /// Returns an error if the store rejects the write.
    pub fn save(&self) -> Result<(), StorageError> {
        self.persistence.save(&self.data)
    }

    fn guard(&self, habit: &Habit) -> Option<Applied> {
        if self.policy != SameDayPolicy::Guard || !has_checked_in_today(habit, self.clock()) {
            return None;
        }
        tracing::debug!(habit = %habit.id, "already checked in today, ignoring");
        Some(Applied {
            events: vec![Event::AlreadyCheckedIn {
                habit_id: habit.id.clone(),
                date: self.clock().today(),
                at: self.clock().now(),
            }],
            save_error: None,
        })
    }

    fn unknown(&self, id: &HabitId) -> Applied {
        tracing::debug!(habit = %id, "no such habit");
        Applied {
            events: vec![Event::UnknownHabit {
                habit_id: id.clone(),
                at: self.clock().now(),
            }],
            save_error: None,
        }
    }

    fn commit(&mut self, next: AppData, events: Vec<Event>) -> Applied {
        self.data = next;
        let save_error = self.persistence.save(&self.data).err();
        if let Some(e) = &save_error {
            tracing::warn!(error = %e, "could not save habit data, keeping changes in memory");
        }
        Applied { events, save_error }
    }
}
