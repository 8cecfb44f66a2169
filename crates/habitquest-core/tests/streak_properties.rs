//! Property tests for the streak engine.

use chrono_tz::America::New_York;
use habitquest_core::habit::store;
use habitquest_core::{AppData, DateString, FixedClock, HabitDraft, StreakEngine};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Action {
    Complete,
    Skip { use_allowance: bool },
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => Just(Action::Complete),
        1 => any::<bool>().prop_map(|use_allowance| Action::Skip { use_allowance }),
    ]
}

proptest! {
    #[test]
    fn current_streak_never_exceeds_best(
        steps in prop::collection::vec((action(), 0i64..4), 1..60)
    ) {
        let clock = FixedClock::at_local_noon(DateString::from_ymd(2024, 1, 1).unwrap(), New_York);
        let engine = StreakEngine::new(&clock);
        let data = store::add(&AppData::empty(), HabitDraft::named("Read"), &clock);
        let id = data.habits[0].id.clone();
        let mut data = data;

        for (action, gap) in steps {
            clock.advance_days(gap);
            data = match action {
                Action::Complete => engine.complete_in(&data, &id),
                Action::Skip { use_allowance } => engine.skip_in(&data, &id, use_allowance),
            };
            let habit = &data.habits[0];
            prop_assert!(habit.current_streak <= habit.best_streak);
            prop_assert!(data.all_time_longest_streak >= habit.best_streak);

            let mut dates: Vec<_> = habit.history.iter().map(|r| r.date).collect();
            let len = dates.len();
            dates.dedup();
            prop_assert_eq!(dates.len(), len, "duplicate history date");
            prop_assert!(habit.history.windows(2).all(|w| w[0].date > w[1].date));
        }
    }

    #[test]
    fn badges_are_never_duplicated(days in 1usize..120) {
        let clock = FixedClock::at_local_noon(DateString::from_ymd(2024, 1, 1).unwrap(), New_York);
        let engine = StreakEngine::new(&clock);
        let mut data = store::add(&AppData::empty(), HabitDraft::named("Read"), &clock);
        let id = data.habits[0].id.clone();

        for _ in 0..days {
            data = engine.complete_in(&data, &id);
            clock.advance_days(1);
        }
        let badges = &data.habits[0].badges;
        let mut sorted = badges.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), badges.len());
    }
}
