//! Hour-of-day energy curves per chronotype.

use chrono::{DateTime, FixedOffset, Timelike};

use crate::models::context::Chronotype;
use crate::models::slot::TimeSlot;

#[rustfmt::skip]
const MORNING_CURVE: [f64; 24] = [
    0.10, 0.10, 0.10, 0.10, 0.20, 0.40, // 00-05
    0.60, 0.80, 0.90, 1.00, 0.95, 0.90, // 06-11
    0.75, 0.65, 0.65, 0.60, 0.55, 0.50, // 12-17
    0.40, 0.35, 0.30, 0.20, 0.15, 0.10, // 18-23
];

#[rustfmt::skip]
const EVENING_CURVE: [f64; 24] = [
    0.40, 0.30, 0.20, 0.10, 0.10, 0.10, // 00-05
    0.15, 0.25, 0.35, 0.45, 0.55, 0.60, // 06-11
    0.60, 0.60, 0.70, 0.75, 0.85, 0.90, // 12-17
    1.00, 0.95, 0.90, 0.80, 0.65, 0.50, // 18-23
];

// Afternoon mirrors the morning six hours later: h(9 + k) == h(15 + k) for k in 0..=3.
#[rustfmt::skip]
const BALANCED_CURVE: [f64; 24] = [
    0.20, 0.15, 0.10, 0.10, 0.10, 0.20, // 00-05
    0.35, 0.50, 0.65, 0.80, 0.85, 0.85, // 06-11
    0.75, 0.70, 0.75, 0.80, 0.85, 0.85, // 12-17
    0.75, 0.55, 0.45, 0.35, 0.30, 0.25, // 18-23
];

/// Normalized energy in `[0, 1]` for an hour of the day.
///
/// # Panics
/// When `hour` is not in `0..24`; callers derive it from a timestamp.
pub fn energy_level(hour: u32, chronotype: Chronotype) -> f64 {
    assert!(hour < 24, "hour out of range: {hour}");
    let curve = match chronotype {
        Chronotype::Morning => &MORNING_CURVE,
        Chronotype::Evening => &EVENING_CURVE,
        Chronotype::Balanced => &BALANCED_CURVE,
    };
    curve[hour as usize]
}

fn hour_of(dt: DateTime<FixedOffset>) -> u32 {
    dt.hour()
}

/// Energy over a slot, approximated by its start and end hours and scaled to 0-100.
pub fn slot_energy_score(slot: &TimeSlot, chronotype: Chronotype) -> f64 {
    let start = energy_level(hour_of(slot.start_at()), chronotype);
    let end = energy_level(hour_of(slot.end_at()), chronotype);
    (start + end) / 2.0 * 100.0
}
