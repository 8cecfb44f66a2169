pub mod config;
pub mod habit;
pub mod stats;

use habitquest_core::storage::data_dir;
use habitquest_core::{
    Config, CoreError, Database, HabitTracker, JsonFileStore, KeyValueStore, StorageBackend,
    SystemClock,
};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub type Tracker = HabitTracker<Box<dyn KeyValueStore>, SystemClock>;

/// Open the tracker on the configured backend and zone.
pub fn open_tracker() -> Result<Tracker, CoreError> {
    let config = Config::load_or_default();
    let store: Box<dyn KeyValueStore> = match config.storage.backend {
        StorageBackend::Sqlite => Box::new(Database::open()?),
        StorageBackend::Json => Box::new(JsonFileStore::open(data_dir()?)?),
    };
    tracing::debug!(backend = ?config.storage.backend, zone = %config.clock.timezone, "opening tracker");
    Ok(HabitTracker::open(store, config.clock())
        .with_policy(config.habits.same_day_policy)
        .with_default_reminder(config.habits.default_reminder_time))
}

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
