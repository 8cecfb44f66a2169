//! Milestone badges.
//!
//! Badges are earned only on completion. Each rule fires at most once per
//! habit: a badge already present on the habit before the transition is never
//! awarded again.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::habit::{AppData, Habit};

/// Identifier of a badge in the fixed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BadgeId {
    FirstDay,
    WeekWarrior,
    Champion,
    Legend,
    ComebackKing,
}

/// Display metadata for a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BadgeInfo {
    pub display_name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

impl BadgeId {
    /// Every badge, in catalog order.
    pub const ALL: [BadgeId; 5] = [
        BadgeId::FirstDay,
        BadgeId::WeekWarrior,
        BadgeId::Champion,
        BadgeId::Legend,
        BadgeId::ComebackKing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeId::FirstDay => "first-day",
            BadgeId::WeekWarrior => "week-warrior",
            BadgeId::Champion => "champion",
            BadgeId::Legend => "legend",
            BadgeId::ComebackKing => "comeback-king",
        }
    }

    pub fn info(&self) -> BadgeInfo {
        match self {
            BadgeId::FirstDay => BadgeInfo {
                display_name: "First Step",
                icon: "🎯",
                description: "Complete your first day!",
            },
            BadgeId::WeekWarrior => BadgeInfo {
                display_name: "Week Warrior",
                icon: "🔥",
                description: "7 days in a row!",
            },
            BadgeId::Champion => BadgeInfo {
                display_name: "Champion",
                icon: "🏆",
                description: "30 days strong!",
            },
            BadgeId::Legend => BadgeInfo {
                display_name: "Legend",
                icon: "👑",
                description: "100 days unstoppable!",
            },
            BadgeId::ComebackKing => BadgeInfo {
                display_name: "Comeback King",
                icon: "💪",
                description: "Bounced back after a reset!",
            },
        }
    }

    /// Whether the transition `before -> after` satisfies this badge's rule,
    /// ignoring whether it was already earned.
    fn qualifies(&self, before: &Habit, after: &Habit) -> bool {
        match self {
            BadgeId::FirstDay => after.current_streak == 1,
            BadgeId::WeekWarrior => after.current_streak >= 7,
            BadgeId::Champion => after.current_streak >= 30,
            BadgeId::Legend => after.current_streak >= 100,
            BadgeId::ComebackKing => {
                after.current_streak == 1 && before.best_streak > 0 && before.current_streak == 0
            }
        }
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BadgeId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BadgeId::ALL
            .into_iter()
            .find(|badge| badge.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownBadge(s.to_string()))
    }
}

/// Badges newly earned by a completion, in catalog order.
pub fn earned_badges(before: &Habit, after: &Habit) -> Vec<BadgeId> {
    BadgeId::ALL
        .into_iter()
        .filter(|badge| !before.badges.contains(badge))
        .filter(|badge| badge.qualifies(before, after))
        .collect()
}

/// Distinct badges earned across all habits, in catalog order.
pub fn unique_badges(data: &AppData) -> Vec<BadgeId> {
    BadgeId::ALL
        .into_iter()
        .filter(|badge| data.habits.iter().any(|h| h.badges.contains(badge)))
        .collect()
}
