//! Schema migrations for the persisted habit document.
//!
//! Each step is a pure function taking one version's JSON shape to the next.
//! Steps run in order until the document reaches [`CURRENT_SCHEMA_VERSION`],
//! and only then is it decoded into typed values.
//!
//! | version | shape |
//! |---|---|
//! | 0 | one habit at the top level, no `version` key |
//! | 1 | `habits` array; skip allowance, `skipped` and `allTimeLongestStreak` may be missing |
//! | 2 | every field present, history deduplicated, badge ids known |

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use crate::badges::BadgeId;
use crate::clock::{Clock, DateString, MonthString};
use crate::error::ValidationError;
use crate::habit::{random_habit_color, HabitId, ReminderTime, CURRENT_SCHEMA_VERSION};

/// Values a migration may need to fill in defaults.
#[derive(Debug, Clone)]
pub struct MigrationContext {
    pub current_month: MonthString,
    pub now: DateTime<Utc>,
}

impl MigrationContext {
    pub fn from_clock(clock: &impl Clock) -> Self {
        Self {
            current_month: clock.current_month(),
            now: clock.now(),
        }
    }
}

/// Version a raw document is in.
///
/// Documents without a (non-zero) `version` are legacy single-habit
/// documents when they carry a top-level `name`, and version 1 otherwise.
pub fn schema_version(doc: &Value) -> u32 {
    match doc.get("version").and_then(Value::as_u64) {
        Some(v) if v > 0 => u32::try_from(v).unwrap_or(u32::MAX),
        _ if non_empty_str(doc, "name").is_some() => 0,
        _ => 1,
    }
}

/// Apply all pending migrations to bring `doc` to the current schema version.
///
/// # Errors
/// Returns an error if the document is not a JSON object.
pub fn migrate(doc: Value, ctx: &MigrationContext) -> Result<Value, ValidationError> {
    if !doc.is_object() {
        return Err(ValidationError::InvalidValue {
            field: "document".to_string(),
            message: "expected a JSON object".to_string(),
        });
    }

    let current_version = schema_version(&doc);
    let mut doc = doc;

    if current_version < 1 {
        doc = upgrade_v0_to_v1(doc, ctx);
    }
    if current_version < 2 {
        doc = upgrade_v1_to_v2(doc, ctx);
    }
    if current_version > CURRENT_SCHEMA_VERSION {
        tracing::warn!(
            version = current_version,
            supported = CURRENT_SCHEMA_VERSION,
            "document is newer than this build, loading as-is"
        );
    }

    Ok(doc)
}

/// v0 -> v1: wrap the legacy top-level habit into a `habits` array.
pub fn upgrade_v0_to_v1(doc: Value, ctx: &MigrationContext) -> Value {
    let best_streak = count(&doc, "bestStreak");
    let last_check_in = non_empty_str(&doc, "lastCheckIn")
        .map(Value::from)
        .unwrap_or(Value::Null);

    let habit = json!({
        "id": HabitId::generate(),
        "name": non_empty_str(&doc, "name").unwrap_or("My Habit"),
        "currentStreak": count(&doc, "currentStreak"),
        "bestStreak": best_streak,
        "lastCheckIn": last_check_in,
        "totalCompletions": count(&doc, "totalCompletions"),
        "history": array_or_empty(&doc, "history"),
        "badges": array_or_empty(&doc, "badges"),
        "reminderTime": non_empty_str(&doc, "reminderTime")
            .map(str::to_string)
            .unwrap_or_else(|| ReminderTime::default().to_string()),
        "createdAt": ctx.now,
        "color": random_habit_color(),
        "monthlySkipsUsed": 0,
        "lastSkipResetMonth": ctx.current_month,
    });

    tracing::info!("migrated legacy single-habit document");
    json!({
        "habits": [habit],
        "version": 1,
        "allTimeLongestStreak": best_streak,
    })
}

/// v1 -> v2: fill skip allowance fields and aggregates, clean up history
/// and badges.
pub fn upgrade_v1_to_v2(mut doc: Value, ctx: &MigrationContext) -> Value {
    let Some(root) = doc.as_object_mut() else {
        return doc;
    };

    let habits: Vec<Value> = match root.remove("habits") {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(habit) => Some(Value::Object(normalize_habit(habit, ctx))),
                other => {
                    tracing::warn!(entry = %other, "dropping habit entry that is not an object");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    };

    let derived_longest = habits
        .iter()
        .map(|h| count(h, "bestStreak"))
        .max()
        .unwrap_or(0);
    let longest = root
        .get("allTimeLongestStreak")
        .and_then(Value::as_u64)
        .map_or(derived_longest, |stored| stored.max(derived_longest));

    root.insert("habits".to_string(), Value::Array(habits));
    root.insert("allTimeLongestStreak".to_string(), longest.into());
    root.insert("version".to_string(), 2.into());
    doc
}

fn normalize_habit(mut habit: Map<String, Value>, ctx: &MigrationContext) -> Map<String, Value> {
    fill(&mut habit, "id", || json!(HabitId::generate()));
    fill(&mut habit, "name", || json!("My Habit"));
    fill(&mut habit, "currentStreak", || json!(0));
    fill(&mut habit, "bestStreak", || json!(0));
    fill(&mut habit, "lastCheckIn", || Value::Null);
    fill(&mut habit, "totalCompletions", || json!(0));
    fill(&mut habit, "reminderTime", || {
        json!(ReminderTime::default().to_string())
    });
    fill(&mut habit, "createdAt", || json!(ctx.now));
    fill(&mut habit, "color", || json!(random_habit_color()));
    fill(&mut habit, "monthlySkipsUsed", || json!(0));
    fill(&mut habit, "lastSkipResetMonth", || json!(ctx.current_month));

    let current = habit.get("currentStreak").and_then(Value::as_u64).unwrap_or(0);
    let best = habit.get("bestStreak").and_then(Value::as_u64).unwrap_or(0);
    if current > best {
        tracing::warn!(current, best, "raising best streak to current streak");
        habit.insert("bestStreak".to_string(), current.into());
    }

    let history = normalize_history(habit.remove("history"));
    habit.insert("history".to_string(), history);
    let badges = normalize_badges(habit.remove("badges"));
    habit.insert("badges".to_string(), badges);
    habit
}

/// Keep well-formed records, one per date, newest first.
fn normalize_history(history: Option<Value>) -> Value {
    let Some(Value::Array(items)) = history else {
        return Value::Array(Vec::new());
    };
    let original_len = items.len();

    let mut records: Vec<(DateString, Map<String, Value>)> = items
        .into_iter()
        .filter_map(|item| {
            let Value::Object(mut entry) = item else {
                return None;
            };
            let date = entry
                .get("date")
                .and_then(Value::as_str)?
                .parse::<DateString>()
                .ok()?;
            let flag = |entry: &Map<String, Value>, key: &str| {
                entry.get(key).and_then(Value::as_bool).unwrap_or(false)
            };
            let mut record = Map::new();
            record.insert("date".to_string(), json!(date));
            record.insert("completed".to_string(), flag(&entry, "completed").into());
            record.insert("skipped".to_string(), flag(&entry, "skipped").into());
            if let Some(timestamp) = entry.remove("timestamp").filter(|v| !v.is_null()) {
                record.insert("timestamp".to_string(), timestamp);
            }
            Some((date, record))
        })
        .collect();

    records.sort_by(|a, b| b.0.cmp(&a.0));
    records.dedup_by(|later, earlier| later.0 == earlier.0);

    if records.len() != original_len {
        tracing::warn!(
            dropped = original_len - records.len(),
            "dropped malformed or duplicate history records"
        );
    }
    Value::Array(records.into_iter().map(|(_, r)| Value::Object(r)).collect())
}

/// Keep known badge ids, first occurrence only.
fn normalize_badges(badges: Option<Value>) -> Value {
    let Some(Value::Array(items)) = badges else {
        return Value::Array(Vec::new());
    };
    let mut seen = HashSet::new();
    let kept: Vec<Value> = items
        .iter()
        .filter_map(|item| {
            let id = item.as_str()?;
            match id.parse::<BadgeId>() {
                Ok(badge) => seen.insert(badge).then(|| json!(badge)),
                Err(_) => {
                    tracing::warn!(badge = id, "dropping unknown badge");
                    None
                }
            }
        })
        .collect();
    Value::Array(kept)
}

fn fill(map: &mut Map<String, Value>, key: &str, default: impl FnOnce() -> Value) {
    if map.get(key).map_or(true, Value::is_null) {
        map.insert(key.to_string(), default());
    }
}

fn count(doc: &Value, key: &str) -> u64 {
    doc.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn non_empty_str<'a>(doc: &'a Value, key: &str) -> Option<&'a str> {
    doc.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn array_or_empty(doc: &Value, key: &str) -> Value {
    match doc.get(key) {
        Some(Value::Array(items)) => Value::Array(items.clone()),
        _ => Value::Array(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> MigrationContext {
        MigrationContext {
            current_month: "2024-12".parse().unwrap(),
            now: DateTime::parse_from_rfc3339("2024-12-28T15:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn detects_versions() {
        assert_eq!(schema_version(&json!({"name": "Read", "bestStreak": 3})), 0);
        assert_eq!(schema_version(&json!({"habits": []})), 1);
        assert_eq!(schema_version(&json!({"habits": [], "version": 0})), 1);
        assert_eq!(schema_version(&json!({"habits": [], "version": 2})), 2);
        assert_eq!(schema_version(&json!({})), 1);
    }

    #[test]
    fn v0_wraps_legacy_habit() {
        let legacy = json!({
            "name": "Drink water",
            "currentStreak": 4,
            "bestStreak": 9,
            "lastCheckIn": "2024-12-27",
            "totalCompletions": 20,
            "history": [{"date": "2024-12-27", "completed": true}],
            "badges": ["first-day", "week-warrior"],
        });
        let v1 = upgrade_v0_to_v1(legacy, &ctx());
        assert_eq!(v1["version"], 1);
        assert_eq!(v1["allTimeLongestStreak"], 9);
        let habit = &v1["habits"][0];
        assert_eq!(habit["name"], "Drink water");
        assert_eq!(habit["currentStreak"], 4);
        assert_eq!(habit["reminderTime"], "19:00");
        assert_eq!(habit["lastSkipResetMonth"], "2024-12");
        assert!(habit["id"].as_str().unwrap().starts_with("habit_"));
    }

    #[test]
    fn v0_falls_back_for_missing_fields() {
        let v1 = upgrade_v0_to_v1(json!({"name": "Stretch"}), &ctx());
        let habit = &v1["habits"][0];
        assert_eq!(habit["bestStreak"], 0);
        assert!(habit["lastCheckIn"].is_null());
        assert_eq!(habit["history"], json!([]));
    }

    #[test]
    fn v1_fills_skip_fields_and_longest_streak() {
        let v1 = json!({
            "version": 1,
            "habits": [
                {"id": "habit_a", "name": "A", "bestStreak": 5, "currentStreak": 2,
                 "history": [{"date": "2024-12-01", "completed": true}], "badges": []},
                {"id": "habit_b", "name": "B", "bestStreak": 14, "currentStreak": 0,
                 "history": [], "badges": []},
            ],
        });
        let v2 = upgrade_v1_to_v2(v1, &ctx());
        assert_eq!(v2["version"], 2);
        assert_eq!(v2["allTimeLongestStreak"], 14);
        let a = &v2["habits"][0];
        assert_eq!(a["monthlySkipsUsed"], 0);
        assert_eq!(a["lastSkipResetMonth"], "2024-12");
        assert_eq!(a["history"][0]["skipped"], false);
    }

    #[test]
    fn v1_keeps_stored_longest_streak_when_higher() {
        let v1 = json!({"version": 1, "allTimeLongestStreak": 40,
                        "habits": [{"id": "habit_a", "name": "A", "bestStreak": 5}]});
        let v2 = upgrade_v1_to_v2(v1, &ctx());
        assert_eq!(v2["allTimeLongestStreak"], 40);
    }

    #[test]
    fn v1_deduplicates_history_and_badges() {
        let v1 = json!({"version": 1, "habits": [{
            "id": "habit_a", "name": "A",
            "history": [
                {"date": "2024-12-01", "completed": true},
                {"date": "2024-12-03", "completed": false},
                {"date": "2024-12-01", "completed": false},
                {"date": "not-a-date", "completed": true},
            ],
            "badges": ["first-day", "mystery", "first-day"],
        }]});
        let v2 = upgrade_v1_to_v2(v1, &ctx());
        let habit = &v2["habits"][0];
        let dates: Vec<_> = habit["history"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["date"].as_str().unwrap())
            .collect();
        assert_eq!(dates, ["2024-12-03", "2024-12-01"]);
        assert_eq!(habit["history"][1]["completed"], true);
        assert_eq!(habit["badges"], json!(["first-day"]));
    }

    #[test]
    fn v1_repairs_best_below_current() {
        let v1 = json!({"version": 1, "habits": [{
            "id": "habit_a", "name": "A", "currentStreak": 8, "bestStreak": 3}]});
        let v2 = upgrade_v1_to_v2(v1, &ctx());
        assert_eq!(v2["habits"][0]["bestStreak"], 8);
        assert_eq!(v2["allTimeLongestStreak"], 8);
    }

    #[test]
    fn migrate_rejects_non_objects() {
        assert!(migrate(json!([1, 2, 3]), &ctx()).is_err());
        assert!(migrate(json!("habits"), &ctx()).is_err());
    }

    #[test]
    fn migrate_leaves_current_documents_alone() {
        let doc = json!({"version": 2, "habits": [], "allTimeLongestStreak": 3});
        assert_eq!(migrate(doc.clone(), &ctx()).unwrap(), doc);
    }
}
