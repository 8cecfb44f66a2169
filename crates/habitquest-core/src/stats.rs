//! Aggregate numbers across all habits.

use serde::Serialize;

use crate::badges::{unique_badges, BadgeId};
use crate::clock::Clock;
use crate::habit::AppData;
use crate::streak::{has_checked_in_today, StreakEngine};

/// Summary shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppStats {
    pub habit_count: usize,
    /// Sum of `total_completions` over current habits.
    pub total_completions: u32,
    /// Distinct badges held by at least one habit.
    pub unique_badges: Vec<BadgeId>,
    /// Habits with a streak that has not lapsed.
    pub active_streaks: usize,
    pub all_time_longest_streak: u32,
    /// Habits already completed or skipped today.
    pub checked_in_today: usize,
}

impl AppStats {
    pub fn compute(data: &AppData, clock: &impl Clock) -> Self {
        let engine = StreakEngine::new(clock);
        let best = data.habits.iter().map(|h| h.best_streak).max().unwrap_or(0);
        Self {
            habit_count: data.habits.len(),
            total_completions: data
                .habits
                .iter()
                .fold(0u32, |acc, h| acc.saturating_add(h.total_completions)),
            unique_badges: unique_badges(data),
            active_streaks: data
                .habits
                .iter()
                .filter(|h| h.current_streak > 0 && !engine.is_lapsed(h))
                .count(),
            all_time_longest_streak: data.all_time_longest_streak.max(best),
            checked_in_today: data
                .habits
                .iter()
                .filter(|h| has_checked_in_today(h, clock))
                .count(),
        }
    }
}
