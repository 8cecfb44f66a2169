//! Habit management commands for CLI.

use clap::Subcommand;
use habitquest_core::habit::parse_hex_color;
use habitquest_core::skip_allowance::remaining_allowance;
use habitquest_core::{
    Applied, Clock, Event, HabitDraft, HabitId, HabitPatch, ReminderTime, StreakTier,
};
use serde::Serialize;

use super::{open_tracker, print_json, CliResult};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit
    Add {
        /// Habit name
        name: String,
        /// Hex color (random palette color when omitted)
        #[arg(long, value_parser = parse_hex_color)]
        color: Option<String>,
        /// Daily reminder time, HH:MM (configured default when omitted)
        #[arg(long)]
        reminder: Option<ReminderTime>,
    },
    /// List habits
    List,
    /// Get habit details
    Show {
        /// Habit ID
        id: String,
    },
    /// Mark today as done
    Complete {
        /// Habit ID
        id: String,
    },
    /// Mark today as missed
    Skip {
        /// Habit ID
        id: String,
        /// Spend this month's free skip to keep the streak
        #[arg(long)]
        use_allowance: bool,
    },
    /// Update a habit's name, color or reminder
    Edit {
        /// Habit ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New hex color
        #[arg(long, value_parser = parse_hex_color)]
        color: Option<String>,
        /// New reminder time, HH:MM
        #[arg(long)]
        reminder: Option<ReminderTime>,
    },
    /// Delete a habit
    Delete {
        /// Habit ID
        id: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HabitSummary<'a> {
    id: &'a HabitId,
    name: &'a str,
    current_streak: u32,
    best_streak: u32,
    tier: StreakTier,
    message: &'static str,
    skips_left: u8,
}

pub fn run(action: HabitAction) -> CliResult {
    let mut tracker = open_tracker()?;

    match action {
        HabitAction::Add {
            name,
            color,
            reminder,
        } => {
            if name.trim().is_empty() {
                return Err("habit name must not be empty".into());
            }
            let draft = HabitDraft {
                name,
                color,
                reminder_time: reminder,
            };
            let applied = tracker.add_habit(draft);
            report(&applied)?;
        }
        HabitAction::List => {
            let month = tracker.clock().current_month();
            let summaries: Vec<_> = tracker
                .data()
                .habits
                .iter()
                .map(|h| {
                    let tier = StreakTier::for_streak(h.current_streak);
                    HabitSummary {
                        id: &h.id,
                        name: &h.name,
                        current_streak: h.current_streak,
                        best_streak: h.best_streak,
                        tier,
                        message: tier.message(),
                        skips_left: remaining_allowance(h, month),
                    }
                })
                .collect();
            print_json(&summaries)?;
        }
        HabitAction::Show { id } => {
            let id = HabitId::from(id);
            let habit = tracker
                .find(&id)
                .ok_or_else(|| format!("habit not found: {id}"))?;
            print_json(habit)?;
        }
        HabitAction::Complete { id } => {
            let applied = tracker.complete(&HabitId::from(id));
            report(&applied)?;
        }
        HabitAction::Skip { id, use_allowance } => {
            let applied = tracker.skip(&HabitId::from(id), use_allowance);
            report(&applied)?;
        }
        HabitAction::Edit {
            id,
            name,
            color,
            reminder,
        } => {
            let patch = HabitPatch {
                name,
                color,
                reminder_time: reminder,
            };
            if patch.is_empty() {
                return Err("nothing to update; pass --name, --color or --reminder".into());
            }
            let applied = tracker.edit_habit(&HabitId::from(id), &patch);
            report(&applied)?;
        }
        HabitAction::Delete { id } => {
            let applied = tracker.delete_habit(&HabitId::from(id));
            report(&applied)?;
        }
    }
    Ok(())
}

/// Print the events of an action; an unknown habit is an error.
fn report(applied: &Applied) -> CliResult {
    if let Some(Event::UnknownHabit { habit_id, .. }) = applied
        .events
        .iter()
        .find(|e| matches!(e, Event::UnknownHabit { .. }))
    {
        return Err(format!("habit not found: {habit_id}").into());
    }
    if let Some(e) = &applied.save_error {
        eprintln!("warning: changes were not saved: {e}");
    }
    print_json(&applied.events)
}
