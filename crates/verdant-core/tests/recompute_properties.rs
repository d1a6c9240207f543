//! Property tests for the recalculation engine.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;
use verdant_core::model::{Event, EventKind, SoilCondition};
use verdant_core::{recompute_at, EngineSettings};

fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

#[derive(Debug, Clone)]
struct EventSpec {
    offset_hours: i64,
    kind: EventKind,
    is_anomaly: bool,
    dry: bool,
    snooze_extra_days: Option<i64>,
}

fn event_spec() -> impl Strategy<Value = EventSpec> {
    (
        0_i64..24 * 120,
        prop_oneof![
            Just(EventKind::Water),
            Just(EventKind::Snooze),
            Just(EventKind::Repot),
        ],
        any::<bool>(),
        any::<bool>(),
        proptest::option::of(-2_i64..20),
    )
        .prop_map(|(offset_hours, kind, is_anomaly, dry, snooze_extra_days)| EventSpec {
            offset_hours,
            kind,
            is_anomaly,
            dry,
            snooze_extra_days,
        })
}

/// Build a well-ordered history: ascending timestamps, insertion ids
/// assigned in replay order so ties stay deterministic.
fn build_history(mut specs: Vec<EventSpec>) -> Vec<Event> {
    specs.sort_by_key(|s| s.offset_hours);
    specs
        .into_iter()
        .enumerate()
        .map(|(i, spec)| Event {
            id: i as i64 + 1,
            plant_id: Uuid::nil(),
            kind: spec.kind,
            at: origin() + Duration::hours(spec.offset_hours),
            is_anomaly: spec.is_anomaly,
            soil_condition: if spec.dry {
                Some(SoilCondition::Dry)
            } else {
                None
            },
            snooze_extra_days: spec.snooze_extra_days,
            note: None,
        })
        .collect()
}

proptest! {
    #[test]
    fn recompute_is_bit_identical_on_replay(
        specs in proptest::collection::vec(event_spec(), 0..40),
        default_interval in 0.5_f64..60.0,
    ) {
        let events = build_history(specs);
        let settings = EngineSettings::default();
        let now = origin() + Duration::days(365);

        let a = recompute_at(origin(), default_interval, &events, &settings, now).unwrap();
        let b = recompute_at(origin(), default_interval, &events, &settings, now).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn interval_stays_positive_and_bounded(
        specs in proptest::collection::vec(event_spec(), 1..40),
        default_interval in 0.5_f64..60.0,
    ) {
        let events = build_history(specs);
        let settings = EngineSettings::default();
        let now = origin() + Duration::days(365);

        let state = recompute_at(origin(), default_interval, &events, &settings, now).unwrap();
        prop_assert!(state.current_interval > 0.0);

        // Every EMA step is a convex combination of the running estimate
        // and an observed gap, and no observed gap can exceed the span
        // of the history.
        let span_days = (events.last().unwrap().at - events[0].at).num_milliseconds() as f64
            / 86_400_000.0;
        prop_assert!(state.current_interval <= default_interval.max(span_days) + 1e-9);
    }

    #[test]
    fn next_check_never_precedes_the_last_event(
        specs in proptest::collection::vec(event_spec(), 1..40),
        default_interval in 0.5_f64..60.0,
    ) {
        let events = build_history(specs);
        let settings = EngineSettings::default();
        let now = origin() + Duration::days(365);

        let state = recompute_at(origin(), default_interval, &events, &settings, now).unwrap();
        prop_assert!(state.next_check_at >= events.last().unwrap().at);
    }

    #[test]
    fn removing_the_newest_event_rewinds_to_the_prefix_state(
        specs in proptest::collection::vec(event_spec(), 1..40),
        default_interval in 0.5_f64..60.0,
    ) {
        let events = build_history(specs);
        let settings = EngineSettings::default();
        let now = origin() + Duration::days(365);

        let prefix =
            recompute_at(origin(), default_interval, &events[..events.len() - 1], &settings, now)
                .unwrap();
        let _full = recompute_at(origin(), default_interval, &events, &settings, now).unwrap();
        let rewound =
            recompute_at(origin(), default_interval, &events[..events.len() - 1], &settings, now)
                .unwrap();
        prop_assert_eq!(prefix, rewound);
    }
}
