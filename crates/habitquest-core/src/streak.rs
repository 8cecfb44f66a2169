//! Streak engine.
//!
//! Per habit the engine moves between three situations:
//!
//! ```text
//! no-history --complete--> active-streak --(gap > 1 day)--> lapsed
//!                               ^                               |
//!                               +----------complete-------------+ (restarts at 1)
//! ```
//!
//! A plain skip zeroes the streak, an allowance skip keeps it. All dates come
//! from the [`Clock`], so the day boundary is the reference zone's midnight.
//!
//! `complete` is not guarded against running twice on one day: a second call
//! recomputes from the stored counters and overwrites today's record. Callers
//! that want one completion per day check [`has_checked_in_today`] first, as
//! [`crate::HabitTracker`] does under its default policy.

use serde::{Deserialize, Serialize};

use crate::badges::earned_badges;
use crate::clock::{days_between, Clock};
use crate::habit::{store, AppData, DayRecord, Habit, HabitId};
use crate::skip_allowance::{can_use_allowance, reset_if_new_month};

/// Result of a skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipOutcome {
    pub habit: Habit,
    /// False when no allowance was requested or none was left.
    pub allowance_used: bool,
}

/// Applies completions and skips against a clock.
#[derive(Debug, Clone)]
pub struct StreakEngine<C> {
    clock: C,
}

impl<C: Clock> StreakEngine<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// More than one calendar day has passed since the last check-in.
    pub fn is_lapsed(&self, habit: &Habit) -> bool {
        habit
            .last_check_in
            .is_some_and(|last| days_between(last, self.clock.today()) > 1)
    }

    /// Record today as completed.
    pub fn complete(&self, habit: &Habit) -> Habit {
        let today = self.clock.today();
        let new_streak = if habit.last_check_in.is_none() || self.is_lapsed(habit) {
            1
        } else {
            habit.current_streak.saturating_add(1)
        };

        let mut next = Habit {
            current_streak: new_streak,
            best_streak: habit.best_streak.max(new_streak),
            last_check_in: Some(today),
            total_completions: habit.total_completions.saturating_add(1),
            history: upsert_history(
                &habit.history,
                DayRecord {
                    date: today,
                    completed: true,
                    skipped: false,
                    timestamp: Some(self.clock.now()),
                },
            ),
            ..habit.clone()
        };

        let badges = earned_badges(habit, &next);
        next.badges.extend(badges);

        tracing::debug!(
            habit = %habit.id,
            date = %today,
            streak = new_streak,
            "habit completed"
        );
        next
    }

    /// Record today as missed, spending the monthly allowance when asked and
    /// available.
    pub fn skip(&self, habit: &Habit, use_allowance: bool) -> SkipOutcome {
        let today = self.clock.today();
        let month = self.clock.current_month();
        let habit = reset_if_new_month(habit, month);
        let allowance_used = use_allowance && can_use_allowance(&habit, month);

        if use_allowance && !allowance_used {
            tracing::debug!(habit = %habit.id, "skip allowance exhausted, streak resets");
        }

        let record = DayRecord {
            date: today,
            completed: false,
            skipped: allowance_used,
            timestamp: Some(self.clock.now()),
        };

        let next = if allowance_used {
            Habit {
                monthly_skips_used: habit.monthly_skips_used.saturating_add(1),
                last_check_in: Some(today),
                history: upsert_history(&habit.history, record),
                ..habit
            }
        } else {
            Habit {
                current_streak: 0,
                last_check_in: Some(today),
                history: upsert_history(&habit.history, record),
                ..habit
            }
        };

        tracing::debug!(
            habit = %next.id,
            date = %today,
            allowance_used,
            streak = next.current_streak,
            "habit skipped"
        );
        SkipOutcome {
            habit: next,
            allowance_used,
        }
    }

    /// [`complete`](Self::complete) the habit with `id` inside `data`.
    pub fn complete_in(&self, data: &AppData, id: &HabitId) -> AppData {
        let Some(habit) = store::find(data, id) else {
            return data.clone();
        };
        let next = self.complete(habit);
        let longest = data.all_time_longest_streak.max(next.current_streak);
        AppData {
            all_time_longest_streak: longest,
            ..store::replace(data, next)
        }
    }

    /// [`skip`](Self::skip) the habit with `id` inside `data`.
    pub fn skip_in(&self, data: &AppData, id: &HabitId, use_allowance: bool) -> AppData {
        match store::find(data, id) {
            Some(habit) => store::replace(data, self.skip(habit, use_allowance).habit),
            None => data.clone(),
        }
    }
}

/// Replace any record for the same date, newest first.
fn upsert_history(history: &[DayRecord], record: DayRecord) -> Vec<DayRecord> {
    let mut next: Vec<DayRecord> = history
        .iter()
        .filter(|r| r.date != record.date)
        .cloned()
        .collect();
    next.push(record);
    next.sort_by(|a, b| b.date.cmp(&a.date));
    next
}

/// The habit already has a completion or skip for today.
pub fn has_checked_in_today(habit: &Habit, clock: &impl Clock) -> bool {
    habit.last_check_in == Some(clock.today())
}

/// Encouragement band for a streak length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakTier {
    NotStarted,
    JustStarted,
    Building,
    OnFire,
    Unstoppable,
    Legendary,
}

impl StreakTier {
    pub fn for_streak(streak: u32) -> Self {
        match streak {
            0 => StreakTier::NotStarted,
            1 => StreakTier::JustStarted,
            2..=6 => StreakTier::Building,
            7..=29 => StreakTier::OnFire,
            30..=99 => StreakTier::Unstoppable,
            _ => StreakTier::Legendary,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            StreakTier::NotStarted => "Ready to start your journey? 🚀",
            StreakTier::JustStarted => "Great start! Keep it going! 🎯",
            StreakTier::Building => "You're building momentum! 🔥",
            StreakTier::OnFire => "You're crushing it! 💪",
            StreakTier::Unstoppable => "Absolutely unstoppable! 🏆",
            StreakTier::Legendary => "You're a true legend! 👑",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badges::BadgeId;
    use crate::clock::{DateString, FixedClock};
    use crate::habit::test_habit;
    use chrono_tz::America::New_York;

    fn day(y: i32, m: u32, d: u32) -> DateString {
        DateString::from_ymd(y, m, d).unwrap()
    }

    fn engine_on(date: DateString) -> StreakEngine<FixedClock> {
        StreakEngine::new(FixedClock::at_local_noon(date, New_York))
    }

    fn habit_last_seen(last: DateString, current: u32, best: u32) -> Habit {
        let mut habit = test_habit("Journal");
        habit.last_check_in = Some(last);
        habit.current_streak = current;
        habit.best_streak = best;
        habit
    }

    #[test]
    fn first_completion_starts_streak() {
        let engine = engine_on(day(2024, 6, 1));
        let habit = engine.complete(&test_habit("Journal"));
        assert_eq!(habit.current_streak, 1);
        assert_eq!(habit.best_streak, 1);
        assert_eq!(habit.total_completions, 1);
        assert_eq!(habit.last_check_in, Some(day(2024, 6, 1)));
        assert_eq!(habit.badges, vec![BadgeId::FirstDay]);
        assert!(habit.history[0].completed);
        assert!(habit.history[0].timestamp.is_some());
    }

    #[test]
    fn completion_after_yesterday_extends_streak() {
        let engine = engine_on(day(2024, 6, 10));
        let habit = engine.complete(&habit_last_seen(day(2024, 6, 9), 4, 4));
        assert_eq!(habit.current_streak, 5);
        assert_eq!(habit.best_streak, 5);
    }

    #[test]
    fn completion_after_gap_restarts_at_one() {
        let engine = engine_on(day(2024, 6, 10));
        let habit = engine.complete(&habit_last_seen(day(2024, 6, 8), 40, 40));
        assert_eq!(habit.current_streak, 1);
        assert_eq!(habit.best_streak, 40);
    }

    #[test]
    fn lapse_counts_across_month_end() {
        let engine = engine_on(day(2024, 3, 1));
        assert!(!engine.is_lapsed(&habit_last_seen(day(2024, 2, 29), 1, 1)));
        assert!(engine.is_lapsed(&habit_last_seen(day(2024, 2, 28), 1, 1)));
    }

    #[test]
    fn same_day_completion_replaces_record() {
        let engine = engine_on(day(2024, 6, 1));
        let once = engine.complete(&test_habit("Journal"));
        let twice = engine.complete(&once);
        assert_eq!(twice.history.len(), 1);
        // Unguarded: counters move again.
        assert_eq!(twice.current_streak, 2);
        assert_eq!(twice.total_completions, 2);
    }

    #[test]
    fn plain_skip_zeroes_streak_but_keeps_best() {
        let engine = engine_on(day(2024, 6, 10));
        let outcome = engine.skip(&habit_last_seen(day(2024, 6, 9), 6, 9), false);
        assert!(!outcome.allowance_used);
        assert_eq!(outcome.habit.current_streak, 0);
        assert_eq!(outcome.habit.best_streak, 9);
        assert_eq!(outcome.habit.last_check_in, Some(day(2024, 6, 10)));
        let record = &outcome.habit.history[0];
        assert!(!record.completed && !record.skipped);
    }

    #[test]
    fn allowance_skip_preserves_streak() {
        let engine = engine_on(day(2024, 6, 10));
        let outcome = engine.skip(&habit_last_seen(day(2024, 6, 9), 6, 9), true);
        assert!(outcome.allowance_used);
        assert_eq!(outcome.habit.current_streak, 6);
        assert_eq!(outcome.habit.monthly_skips_used, 1);
        assert!(outcome.habit.history[0].skipped);
    }

    #[test]
    fn exhausted_allowance_falls_back_to_plain_skip() {
        let engine = engine_on(day(2024, 6, 10));
        let mut habit = habit_last_seen(day(2024, 6, 9), 6, 9);
        habit.monthly_skips_used = 1;
        let outcome = engine.skip(&habit, true);
        assert!(!outcome.allowance_used);
        assert_eq!(outcome.habit.current_streak, 0);
        assert_eq!(outcome.habit.monthly_skips_used, 1);
    }

    #[test]
    fn allowance_renews_in_new_month() {
        let engine = engine_on(day(2024, 7, 2));
        let mut habit = habit_last_seen(day(2024, 7, 1), 3, 3);
        habit.monthly_skips_used = 1;
        let outcome = engine.skip(&habit, true);
        assert!(outcome.allowance_used);
        assert_eq!(outcome.habit.monthly_skips_used, 1);
        assert_eq!(outcome.habit.last_skip_reset_month.to_string(), "2024-07");
    }

    #[test]
    fn skip_never_awards_badges() {
        let engine = engine_on(day(2024, 6, 10));
        let outcome = engine.skip(&habit_last_seen(day(2024, 6, 9), 6, 9), true);
        assert!(outcome.habit.badges.is_empty());
    }

    #[test]
    fn history_stays_newest_first() {
        let clock = FixedClock::at_local_noon(day(2024, 6, 1), New_York);
        let engine = StreakEngine::new(&clock);
        let mut habit = test_habit("Journal");
        for _ in 0..3 {
            habit = engine.complete(&habit);
            clock.advance_days(1);
        }
        let dates: Vec<_> = habit.history.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, ["2024-06-03", "2024-06-02", "2024-06-01"]);
    }

    #[test]
    fn complete_in_tracks_all_time_record() {
        let engine = engine_on(day(2024, 6, 10));
        let habit = habit_last_seen(day(2024, 6, 9), 11, 11);
        let id = habit.id.clone();
        let data = AppData {
            habits: vec![habit],
            all_time_longest_streak: 11,
            ..AppData::empty()
        };
        let next = engine.complete_in(&data, &id);
        assert_eq!(next.all_time_longest_streak, 12);
        assert_eq!(store::find(&next, &id).unwrap().current_streak, 12);
    }

    #[test]
    fn unknown_id_leaves_data_untouched() {
        let engine = engine_on(day(2024, 6, 10));
        let data = AppData::empty();
        let ghost = HabitId::from("habit_ghost");
        assert_eq!(engine.complete_in(&data, &ghost), data);
        assert_eq!(engine.skip_in(&data, &ghost, true), data);
    }

    #[test]
    fn checked_in_today_follows_clock() {
        let clock = FixedClock::at_local_noon(day(2024, 6, 1), New_York);
        let habit = StreakEngine::new(&clock).complete(&test_habit("Journal"));
        assert!(has_checked_in_today(&habit, &clock));
        clock.advance_days(1);
        assert!(!has_checked_in_today(&habit, &clock));
    }

    #[test]
    fn streak_tiers() {
        assert_eq!(StreakTier::for_streak(0), StreakTier::NotStarted);
        assert_eq!(StreakTier::for_streak(1), StreakTier::JustStarted);
        assert_eq!(StreakTier::for_streak(6), StreakTier::Building);
        assert_eq!(StreakTier::for_streak(7), StreakTier::OnFire);
        assert_eq!(StreakTier::for_streak(30), StreakTier::Unstoppable);
        assert_eq!(StreakTier::for_streak(100), StreakTier::Legendary);
        assert!(StreakTier::Legendary.message().contains("legend"));
    }
}
