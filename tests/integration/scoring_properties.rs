use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use cognical_slots::models::context::{CalendarEvent, Chronotype, SchedulingContext};
use cognical_slots::models::request::{DayPartFilter, Priority, SearchWindow, SlotRequest};
use cognical_slots::models::settings::EngineSettings;
use cognical_slots::models::weights::ScoreWeights;
use cognical_slots::services::slot_finder::SlotFinder;
use proptest::prelude::*;

fn base() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .expect("offset")
        .with_ymd_and_hms(2025, 5, 5, 0, 0, 0)
        .single()
        .expect("instant")
}

fn chronotype() -> impl Strategy<Value = Chronotype> {
    prop_oneof![
        Just(Chronotype::Morning),
        Just(Chronotype::Evening),
        Just(Chronotype::Balanced),
    ]
}

fn context_with(events: &[(i64, i64)], chronotype: Chronotype) -> SchedulingContext {
    let events = events
        .iter()
        .enumerate()
        .map(|(idx, (offset, length))| {
            let start = base() + Duration::minutes(*offset);
            let category = if idx % 2 == 0 { "work" } else { "personal" };
            CalendarEvent::new(
                format!("evt-{idx}"),
                start,
                start + Duration::minutes(*length),
                category,
            )
        })
        .collect();
    SchedulingContext::new(base() + Duration::hours(6))
        .with_events(events)
        .with_chronotype(chronotype)
}

proptest! {
    #[test]
    fn normalized_weights_sum_to_one(
        constraints in 0.0f64..5.0,
        energy in 0.0f64..5.0,
        timing in 0.0f64..5.0,
        balance in 0.0f64..5.0,
    ) {
        prop_assume!(constraints + energy + timing + balance > 1e-6);
        let weights = ScoreWeights { constraints, energy, timing, balance }
            .normalized()
            .expect("valid weights");
        prop_assert!((weights.sum() - 1.0).abs() < 1e-9);
        prop_assert!(weights.constraints >= 0.0 && weights.energy >= 0.0);
        prop_assert!(weights.timing >= 0.0 && weights.balance >= 0.0);
    }

    #[test]
    fn ranking_is_sorted_bounded_and_gated(
        events in prop::collection::vec((0i64..2880, 15i64..240), 0..8),
        duration in 15i64..180,
        step in 5i64..120,
        priority in 1u8..=5,
        chronotype in chronotype(),
    ) {
        let finder = SlotFinder::from_settings(&EngineSettings::default()).expect("finder");
        let context = context_with(&events, chronotype);
        let window = SearchWindow::new(base(), base() + Duration::days(2));
        let request = SlotRequest::new(duration, window)
            .with_step_minutes(step)
            .with_priority(Priority::try_from(priority).expect("priority"));

        let ranked = finder.score_slots(&request, &context).expect("scored");
        prop_assert!(ranked.windows(2).all(|pair| pair[0].score >= pair[1].score));
        // Candidates are generated chronologically; ties keep that order.
        prop_assert!(ranked.windows(2).all(|pair| {
            pair[0].score != pair[1].score || pair[0].slot.start_at() < pair[1].slot.start_at()
        }), "ties must keep chronological order");
        for scored in &ranked {
            prop_assert!(scored.score >= 0.0 && scored.score <= 100.0 + 1e-9);
            if scored.is_admissible() {
                prop_assert!(scored.violations.is_empty());
            } else {
                prop_assert_eq!(scored.score, 0.0);
                prop_assert!(scored.breakdown.is_zero());
            }
        }

        let best = finder.find_best_slot(&request, &context).expect("best");
        match (best, ranked.first()) {
            (Some(best), Some(first)) => prop_assert_eq!(&best, first),
            (None, None) => {}
            _ => prop_assert!(false, "best slot disagrees with ranking"),
        }
    }

    #[test]
    fn candidates_respect_window_and_duration(
        duration in 15i64..240,
        step in 5i64..90,
        window_hours in 1i64..72,
        use_focus in any::<bool>(),
    ) {
        let finder = SlotFinder::from_settings(&EngineSettings::default()).expect("finder");
        let context = SchedulingContext::new(base() + Duration::minutes(7));
        let window = SearchWindow::new(base(), base() + Duration::hours(window_hours));
        let mut request = SlotRequest::new(duration, window).with_step_minutes(step);
        if use_focus {
            request = request.with_day_parts(DayPartFilter::Focus);
        }

        let slots = finder.candidates(&request, &context).expect("candidates");
        for slot in &slots {
            prop_assert_eq!(slot.duration_minutes(), duration);
            prop_assert!(slot.start_at() >= context.now);
            prop_assert!(slot.end_at() <= window.end_at);
        }
        prop_assert!(slots.windows(2).all(|pair| pair[0].start_at() < pair[1].start_at()));
    }

    #[test]
    fn scoring_twice_gives_identical_rankings(
        events in prop::collection::vec((0i64..1440, 30i64..180), 0..5),
        duration in 30i64..120,
    ) {
        let finder = SlotFinder::from_settings(&EngineSettings::default()).expect("finder");
        let context = context_with(&events, Chronotype::Balanced);
        let request = SlotRequest::new(duration, SearchWindow::new(base(), base() + Duration::days(1)));

        let first = finder.score_slots(&request, &context).expect("scored");
        let second = finder.score_slots(&request, &context).expect("scored");
        prop_assert_eq!(first, second);
    }
}
