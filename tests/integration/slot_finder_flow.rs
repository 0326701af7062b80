use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};
use cognical_slots::models::constraint::ConstraintSpec;
use cognical_slots::models::context::{CalendarEvent, Chronotype, SchedulingContext, WeeklyWindow};
use cognical_slots::models::request::{DayPartFilter, Priority, SearchWindow, SlotRequest};
use cognical_slots::models::settings::EngineSettings;
use cognical_slots::models::slot::TimeSlot;
use cognical_slots::models::weights::ScoreWeightsUpdate;
use cognical_slots::services::slot_finder::SlotFinder;
use cognical_slots::services::slot_scorer::SlotScorer;
use cognical_slots::AppError;

// 2025-05-04 is a Sunday, so May 4..10 is one scheduling week.
fn at(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
    let tz = FixedOffset::east_opt(0).expect("offset");
    tz.from_local_datetime(
        &NaiveDate::from_ymd_opt(2025, 5, day)
            .expect("date")
            .and_hms_opt(hour, minute, 0)
            .expect("time"),
    )
    .single()
    .expect("instant")
}

fn work_blocking_settings() -> EngineSettings {
    EngineSettings {
        hard_constraints: vec![
            ConstraintSpec::NoOverlap {
                blocking_categories: vec!["work".into()],
            },
            ConstraintSpec::NotInPast,
            ConstraintSpec::OutsideBlockedWindows,
        ],
        ..EngineSettings::default()
    }
}

#[test]
fn overlapping_work_event_rejects_slot() {
    let finder = SlotFinder::from_settings(&work_blocking_settings()).expect("finder");
    let context = SchedulingContext::new(at(5, 8, 0)).with_events(vec![CalendarEvent::new(
        "standup",
        at(5, 10, 0),
        at(5, 11, 0),
        "work",
    )]);
    let request = SlotRequest::new(60, SearchWindow::new(at(5, 8, 0), at(5, 13, 0)));

    let ranked = finder.score_slots(&request, &context).expect("scored");
    let clash = ranked
        .iter()
        .find(|scored| scored.slot.start_at() == at(5, 10, 0))
        .expect("10:00 candidate");
    assert_eq!(clash.score, 0.0);
    assert!(clash.breakdown.is_zero());
    assert!(!clash.violations.is_empty());
    assert!(clash.violations[0].starts_with("no-overlap"));

    // Rejected slots sink to the bottom.
    assert!(ranked.first().expect("best").is_admissible());
}

#[test]
fn non_blocking_categories_do_not_reject() {
    let finder = SlotFinder::from_settings(&work_blocking_settings()).expect("finder");
    let context = SchedulingContext::new(at(5, 8, 0)).with_events(vec![CalendarEvent::new(
        "gym",
        at(5, 10, 0),
        at(5, 11, 0),
        "personal",
    )]);
    let request = SlotRequest::new(60, SearchWindow::new(at(5, 10, 0), at(5, 11, 0)));

    let best = finder
        .find_best_slot(&request, &context)
        .expect("search")
        .expect("one candidate");
    assert!(best.is_admissible());
}

#[test]
fn urgent_priority_timing_inside_and_beyond_ideal_window() {
    let scorer = SlotScorer::new();
    let now = at(5, 8, 0);

    let soon = TimeSlot::new(at(5, 10, 0), at(5, 11, 0)).expect("slot");
    assert_eq!(scorer.timing_score(&soon, now, Priority::HIGHEST), 100.0);

    let later = TimeSlot::new(at(6, 14, 0), at(6, 15, 0)).expect("slot");
    let timing = scorer.timing_score(&later, now, Priority::HIGHEST);
    assert!(timing > 60.0 && timing < 80.0, "timing was {timing}");
}

#[test]
fn heavily_booked_day_scores_low_on_balance() {
    let scorer = SlotScorer::new();
    // 21 hours across the week, 6 of them on Tuesday.
    let context = SchedulingContext::new(at(5, 8, 0)).with_events(vec![
        CalendarEvent::new("mon", at(5, 9, 0), at(5, 17, 0), "work"),
        CalendarEvent::new("tue", at(6, 9, 0), at(6, 15, 0), "work"),
        CalendarEvent::new("wed", at(7, 9, 0), at(7, 16, 0), "work"),
    ]);
    let candidate = TimeSlot::new(at(6, 16, 0), at(6, 17, 0)).expect("slot");

    let balance = scorer.balance_score(&candidate, &context);
    assert!(balance < 50.0, "balance was {balance}");

    let quiet_day = TimeSlot::new(at(8, 9, 0), at(8, 12, 0)).expect("slot");
    assert!(scorer.balance_score(&quiet_day, &context) > balance);
}

#[test]
fn weight_update_is_renormalized() {
    let finder = SlotFinder::from_settings(&EngineSettings::default()).expect("finder");
    let weights = finder
        .update_weights(&ScoreWeightsUpdate {
            energy: Some(0.9),
            ..Default::default()
        })
        .expect("update");

    let expected = 0.9 / (0.9 + 0.4 + 0.2 + 0.15);
    assert!((weights.energy - expected).abs() < 1e-9);
    assert!((finder.weights().expect("weights").energy - expected).abs() < 1e-9);
    assert!((weights.sum() - 1.0).abs() < 1e-9);
}

#[test]
fn invalid_weight_update_keeps_previous_weights() {
    let finder = SlotFinder::from_settings(&EngineSettings::default()).expect("finder");
    let before = finder.weights().expect("weights");
    let err = finder
        .update_weights(&ScoreWeightsUpdate {
            timing: Some(-1.0),
            ..Default::default()
        })
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(finder.weights().expect("weights"), before);
}

#[test]
fn helper_searches_share_one_generator() {
    let finder = SlotFinder::from_settings(&EngineSettings::default()).expect("finder");
    let context = SchedulingContext::new(at(5, 7, 0))
        .with_chronotype(Chronotype::Morning)
        .with_events(vec![CalendarEvent::new(
            "planning",
            at(5, 9, 0),
            at(5, 10, 30),
            "work",
        )]);
    let window = finder.horizon_window(context.now);

    let next = finder
        .next_available_slot(30, window, &context)
        .expect("search")
        .expect("free slot");
    assert_eq!(next.slot.start_at(), at(5, 7, 0));

    let today = SearchWindow::new(context.now, at(5, 23, 0));
    let morning = finder
        .morning_slot(60, Priority::HIGHEST, today, &context)
        .expect("search")
        .expect("morning slot");
    assert!(morning.is_admissible());
    assert_eq!(morning.slot.start_at(), at(5, 10, 30));

    let focus = finder
        .focus_slot(90, Priority::HIGHEST, today, &context)
        .expect("search")
        .expect("focus slot");
    assert!(focus.is_admissible());
    // Both morning focus starts collide with planning.
    let start = focus.slot.start_at();
    assert!(
        start == at(5, 14, 0) || start == at(5, 14, 30),
        "focus slot started at {start}"
    );
}

#[test]
fn blocked_windows_and_day_part_filters_combine() {
    let finder = SlotFinder::from_settings(&EngineSettings::default()).expect("finder");
    // Monday 9:00-11:00 is blocked every week.
    let context = SchedulingContext::new(at(5, 6, 0)).with_blocked_windows(vec![WeeklyWindow {
        weekday: 0,
        start_minute: 9 * 60,
        end_minute: 11 * 60,
    }]);
    let request = SlotRequest::new(60, SearchWindow::new(at(5, 6, 0), at(5, 23, 0)))
        .with_day_parts(DayPartFilter::Morning);

    let ranked = finder.score_slots(&request, &context).expect("scored");
    let admissible: Vec<_> = ranked.iter().filter(|s| s.is_admissible()).collect();
    assert!(!admissible.is_empty());
    for scored in admissible {
        assert!(scored.slot.start_at() >= at(5, 11, 0));
        assert!(scored.slot.end_at() <= at(5, 12, 0));
    }
}

#[test]
fn soft_preferences_from_settings_lower_constraint_score() {
    let settings = EngineSettings {
        soft_constraints: vec![ConstraintSpec::PreferredHours {
            start_minute: 13 * 60,
            end_minute: 17 * 60,
            penalty: 40.0,
        }],
        ..EngineSettings::default()
    };
    let finder = SlotFinder::from_settings(&settings).expect("finder");
    let context = SchedulingContext::new(at(5, 8, 0));
    let request = SlotRequest::new(60, SearchWindow::new(at(5, 9, 0), at(5, 17, 0)));

    let ranked = finder.score_slots(&request, &context).expect("scored");
    let nine = ranked
        .iter()
        .find(|s| s.slot.start_at() == at(5, 9, 0))
        .expect("9:00 candidate");
    assert!((nine.breakdown.constraint - 60.0).abs() < 1e-9);
    assert_eq!(nine.penalties.len(), 1);
    assert_eq!(nine.penalties[0].name, "preferred-hours");

    let two = ranked
        .iter()
        .find(|s| s.slot.start_at() == at(5, 14, 0))
        .expect("14:00 candidate");
    assert_eq!(two.breakdown.constraint, 100.0);
    assert!(two.penalties.is_empty());
}

#[test]
fn working_hours_rule_without_context_fails_open() {
    let settings = EngineSettings {
        hard_constraints: vec![ConstraintSpec::WithinWorkingHours],
        ..EngineSettings::default()
    };
    let finder = SlotFinder::from_settings(&settings).expect("finder");
    let request = SlotRequest::new(60, SearchWindow::new(at(5, 20, 0), at(5, 22, 0)));

    let without_hours = SchedulingContext::new(at(5, 8, 0));
    let ranked = finder.score_slots(&request, &without_hours).expect("scored");
    assert!(ranked.iter().all(|s| s.is_admissible()));

    let with_hours = without_hours.with_working_hours(Default::default());
    let ranked = finder.score_slots(&request, &with_hours).expect("scored");
    assert!(ranked.iter().all(|s| !s.is_admissible()));
}

#[test]
fn past_and_empty_windows_yield_no_candidates() {
    let finder = SlotFinder::from_settings(&EngineSettings::default()).expect("finder");
    let context = SchedulingContext::new(at(6, 8, 0));
    let past = SlotRequest::new(60, SearchWindow::new(at(5, 8, 0), at(5, 18, 0)));
    assert!(finder.candidates(&past, &context).expect("candidates").is_empty());
    assert!(finder.find_best_slot(&past, &context).expect("search").is_none());

    let too_short = SlotRequest::new(120, SearchWindow::new(at(6, 9, 0), at(6, 10, 0)));
    assert!(finder.score_slots(&too_short, &context).expect("scored").is_empty());
}

#[test]
fn malformed_requests_are_validation_errors() {
    let finder = SlotFinder::from_settings(&EngineSettings::default()).expect("finder");
    let context = SchedulingContext::new(at(5, 8, 0));
    let window = SearchWindow::new(at(5, 9, 0), at(5, 17, 0));

    let zero = finder.score_slots(&SlotRequest::new(0, window), &context);
    assert!(matches!(zero, Err(AppError::Validation { .. })));

    let bad_step = finder.score_slots(&SlotRequest::new(30, window).with_step_minutes(0), &context);
    assert!(matches!(bad_step, Err(AppError::Validation { .. })));

    let inverted = SearchWindow::new(at(5, 17, 0), at(5, 9, 0));
    let err = finder
        .find_best_slot(&SlotRequest::new(30, inverted), &context)
        .unwrap_err();
    assert!(err.validation_details().is_some());
}

#[test]
fn custom_step_changes_candidate_density() {
    let finder = SlotFinder::from_settings(&EngineSettings::default()).expect("finder");
    let context = SchedulingContext::new(at(5, 8, 0));
    let window = SearchWindow::new(at(5, 9, 0), at(5, 11, 0));

    let default_step = finder
        .candidates(&SlotRequest::new(60, window), &context)
        .expect("candidates");
    let fine_step = finder
        .candidates(&SlotRequest::new(60, window).with_step_minutes(15), &context)
        .expect("candidates");

    assert_eq!(default_step.len(), 3);
    assert_eq!(fine_step.len(), 5);
    assert!(fine_step
        .windows(2)
        .all(|pair| pair[1].start_at() - pair[0].start_at() == Duration::minutes(15)));
}
