//! Monthly free-skip allowance.
//!
//! Each habit gets one skip per calendar month that records a missed day
//! without breaking the streak. The counter belongs to
//! `last_skip_reset_month`; once the month changes, the stored count is stale
//! and reads as zero.

use crate::clock::MonthString;
use crate::habit::Habit;

/// Free skips per habit per calendar month.
pub const MONTHLY_SKIP_ALLOWANCE: u8 = 1;

/// Skips used in `month`, treating a count from another month as zero.
pub fn skips_used(habit: &Habit, month: MonthString) -> u8 {
    if habit.last_skip_reset_month == month {
        habit.monthly_skips_used
    } else {
        0
    }
}

/// Start a fresh count when `month` differs from the tracked month.
pub fn reset_if_new_month(habit: &Habit, month: MonthString) -> Habit {
    if habit.last_skip_reset_month == month {
        return habit.clone();
    }
    tracing::debug!(
        habit = %habit.id,
        from = %habit.last_skip_reset_month,
        to = %month,
        "skip allowance renewed"
    );
    Habit {
        monthly_skips_used: 0,
        last_skip_reset_month: month,
        ..habit.clone()
    }
}

pub fn can_use_allowance(habit: &Habit, month: MonthString) -> bool {
    skips_used(habit, month) < MONTHLY_SKIP_ALLOWANCE
}

/// Free skips left this month.
pub fn remaining_allowance(habit: &Habit, month: MonthString) -> u8 {
    MONTHLY_SKIP_ALLOWANCE.saturating_sub(skips_used(habit, month))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::test_habit;

    fn month(s: &str) -> MonthString {
        s.parse().unwrap()
    }

    #[test]
    fn fresh_habit_has_allowance() {
        let habit = test_habit("Stretch");
        assert!(can_use_allowance(&habit, month("2024-06")));
        assert_eq!(remaining_allowance(&habit, month("2024-06")), 1);
    }

    #[test]
    fn used_allowance_blocks_same_month() {
        let mut habit = test_habit("Stretch");
        habit.monthly_skips_used = 1;
        assert!(!can_use_allowance(&habit, month("2024-06")));
        assert_eq!(remaining_allowance(&habit, month("2024-06")), 0);
    }

    #[test]
    fn stale_count_reads_as_zero_next_month() {
        let mut habit = test_habit("Stretch");
        habit.monthly_skips_used = 1;
        assert!(can_use_allowance(&habit, month("2024-07")));
        assert_eq!(skips_used(&habit, month("2024-07")), 0);
    }

    #[test]
    fn reset_moves_tracked_month_forward() {
        let mut habit = test_habit("Stretch");
        habit.monthly_skips_used = 1;
        let reset = reset_if_new_month(&habit, month("2024-07"));
        assert_eq!(reset.monthly_skips_used, 0);
        assert_eq!(reset.last_skip_reset_month, month("2024-07"));

        let same = reset_if_new_month(&habit, month("2024-06"));
        assert_eq!(same, habit);
    }
}
