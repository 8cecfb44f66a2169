//! Read-only views: today, stats, badges, reminders.

use chrono::{DateTime, Utc};
use habitquest_core::clock::{format_time_until_reset, time_until_reset};
use habitquest_core::reminders::{next_reminder_at, reminders as reminder_feed};
use habitquest_core::skip_allowance::remaining_allowance;
use habitquest_core::streak::has_checked_in_today;
use habitquest_core::{AppStats, BadgeId, Clock, DateString, HabitId, Reminder};
use serde::Serialize;

use super::{open_tracker, print_json, CliResult};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TodayView<'a> {
    date: DateString,
    timezone: String,
    resets_in: String,
    habits: Vec<TodayHabit<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TodayHabit<'a> {
    id: &'a HabitId,
    name: &'a str,
    checked_in: bool,
    current_streak: u32,
    skips_left: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BadgeView {
    id: BadgeId,
    name: &'static str,
    icon: &'static str,
    description: &'static str,
    earned_by: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReminderView {
    #[serde(flatten)]
    reminder: Reminder,
    next_at: DateTime<Utc>,
}

pub fn today() -> CliResult {
    let tracker = open_tracker()?;
    let clock = tracker.clock();
    let month = clock.current_month();
    let view = TodayView {
        date: clock.today(),
        timezone: clock.zone().name().to_string(),
        resets_in: format_time_until_reset(time_until_reset(clock)),
        habits: tracker
            .data()
            .habits
            .iter()
            .map(|h| TodayHabit {
                id: &h.id,
                name: &h.name,
                checked_in: has_checked_in_today(h, clock),
                current_streak: h.current_streak,
                skips_left: remaining_allowance(h, month),
            })
            .collect(),
    };
    print_json(&view)
}

pub fn stats() -> CliResult {
    let tracker = open_tracker()?;
    print_json(&AppStats::compute(tracker.data(), tracker.clock()))
}

pub fn badges() -> CliResult {
    let tracker = open_tracker()?;
    let views: Vec<_> = BadgeId::ALL
        .into_iter()
        .map(|badge| {
            let info = badge.info();
            BadgeView {
                id: badge,
                name: info.display_name,
                icon: info.icon,
                description: info.description,
                earned_by: tracker
                    .data()
                    .habits
                    .iter()
                    .filter(|h| h.badges.contains(&badge))
                    .map(|h| h.name.clone())
                    .collect(),
            }
        })
        .collect();
    print_json(&views)
}

pub fn reminders() -> CliResult {
    let tracker = open_tracker()?;
    let views: Vec<_> = reminder_feed(tracker.data())
        .into_iter()
        .map(|reminder| ReminderView {
            next_at: next_reminder_at(&reminder, tracker.clock()),
            reminder,
        })
        .collect();
    print_json(&views)
}
